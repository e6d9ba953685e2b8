// Path: crates/marionette-types/src/lib.rs
#![forbid(unsafe_code)]
#![deny(missing_docs)]

//! # Marionette Types
//!
//! This crate is the foundational library for the Marionette operator runtime,
//! containing the core data structures, error types, and configuration objects.
//!
//! ## Architectural Role
//!
//! As the base crate, `marionette-types` has minimal dependencies and is itself a
//! dependency for every other crate in the workspace. Values that cross the
//! boundary between the run loop and an operator backend (`ParsedAction`,
//! `ScreenGeometry`, `ExecuteOutcome`, ...) are defined here so that every
//! backend agrees on one canonical shape.

/// A top-level, crate-wide `Result` type alias with a default error type.
pub type Result<T, E = crate::error::OperatorError> = std::result::Result<T, E>;

/// Action, geometry and key data structures shared by every backend.
pub mod app;
/// Configuration structures for operators, retry budgets and remote backends.
pub mod config;
/// The unified error taxonomy used across the workspace.
pub mod error;
