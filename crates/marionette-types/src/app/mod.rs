// Path: crates/marionette-types/src/app/mod.rs

//! Application-level data structures exchanged between the run loop and an operator.

/// Model-proposed actions and their kinds.
pub mod action;
/// Screen geometry, absolute points and the per-call execution context.
pub mod geometry;
/// Platform-neutral key identifiers.
pub mod keys;
/// Results produced by an operator.
pub mod outcome;

pub use action::*;
pub use geometry::*;
pub use keys::*;
pub use outcome::*;
