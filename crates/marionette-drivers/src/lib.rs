// Path: crates/marionette-drivers/src/lib.rs
#![cfg_attr(
    not(test),
    deny(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::panic,
        clippy::todo,
        clippy::unimplemented,
        clippy::indexing_slicing
    )
)]
//! # Marionette Drivers
//!
//! This crate provides the "eyes and hands" of the runtime. It implements the
//! `marionette_api` operator traits for the local desktop (xcap + enigo) and
//! for remote VMs reached over authenticated JSON RPC.

pub mod dispatch;
pub mod factory;
pub mod gui;
pub mod remote;

pub use dispatch::{ActionDispatcher, Plan, SkipReason};
pub use factory::{build_operator, build_session_manager};
pub use gui::LocalOperator;
pub use remote::sandbox::SandboxOperator;
pub use remote::session::{ResourceKind, SessionManager};
pub use remote::subscription::SubscriptionOperator;
