// Path: crates/marionette-api/src/lib.rs
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
//! # Marionette API
//!
//! Core traits and interfaces for the Marionette operator runtime. This crate
//! defines the stable contract between the run loop and the backends that turn
//! model-proposed actions into real input events.

/// The authentication collaborator consumed by remote backends.
pub mod auth;
/// Backend-neutral input primitives.
pub mod input;
/// The external model client consumed by the run loop.
pub mod model;
/// The polymorphic operator contract and its two halves.
pub mod operator;

pub use auth::{AuthHeaderProvider, AuthHeaders};
pub use input::InputEvent;
pub use model::{ModelClient, Prediction, PredictionRequest};
pub use operator::{InputBackend, Operator, ScreenshotProvider};
