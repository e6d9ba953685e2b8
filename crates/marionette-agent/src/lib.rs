// Path: crates/marionette-agent/src/lib.rs
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
//! # Marionette Agent
//!
//! The retry policy wrapped around screenshot, inference and execution, and a
//! reference run loop that drives one `Operator` with one `ModelClient`.

pub mod retry;
pub mod runner;

pub use retry::RetryPolicy;
pub use runner::{AgentRunner, RunControl, RunController, RunReport, RunStatus};
