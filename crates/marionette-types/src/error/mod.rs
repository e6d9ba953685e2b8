// Path: crates/marionette-types/src/error/mod.rs
//! Core error types for the Marionette operator runtime.

use thiserror::Error;

/// A trait for assigning a stable, machine-readable string code to an error.
pub trait ErrorCode {
    /// Returns the unique, stable string identifier for this error variant.
    fn code(&self) -> &'static str;
}

/// The operation classes that carry independent retry budgets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RetryClass {
    /// The model inference call.
    Model,
    /// Screenshot capture.
    Screenshot,
    /// Action execution.
    Execute,
}

impl RetryClass {
    /// Stable lower-case label.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Model => "model",
            Self::Screenshot => "screenshot",
            Self::Execute => "execute",
        }
    }
}

impl std::fmt::Display for RetryClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors raised by operators, their backends, and the retry wrapper.
///
/// Malformed actions are deliberately absent: a null point or an unresolvable
/// hotkey is a skipped action, not an error.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum OperatorError {
    /// The remote backend answered with an error envelope or a non-success status.
    #[error("RPC {verb} failed ({code}): {message}")]
    Rpc {
        /// The verb that was called (`ClickMouse`, ...).
        verb: String,
        /// The remote error code, or the HTTP status.
        code: String,
        /// The remote error message.
        message: String,
    },
    /// The request never produced a usable response (connect, timeout, decode).
    #[error("Transport error: {0}")]
    Transport(String),
    /// Screen capture failed.
    #[error("Screen capture failed: {0}")]
    Capture(String),
    /// The OS refused or failed an input injection.
    #[error("Input injection failed: {0}")]
    Input(String),
    /// No sandbox/browser resource could be leased.
    #[error("Resource allocation failed: {0}")]
    Allocation(String),
    /// The authentication collaborator could not produce headers.
    #[error("Authentication failed: {0}")]
    Auth(String),
    /// The operator configuration is invalid.
    #[error("Configuration error: {0}")]
    Config(String),
    /// The external model client failed.
    #[error("Model inference failed: {0}")]
    Model(String),
    /// A retry budget was exhausted; carries the last underlying error.
    #[error("{class} failed after {attempts} attempt(s): {last_error}")]
    RetriesExhausted {
        /// The budget that ran out.
        class: RetryClass,
        /// How many attempts were made.
        attempts: u32,
        /// Display form of the final error.
        last_error: String,
    },
}

impl ErrorCode for OperatorError {
    fn code(&self) -> &'static str {
        match self {
            Self::Rpc { .. } => "OPERATOR_RPC_ERROR",
            Self::Transport(_) => "OPERATOR_TRANSPORT_ERROR",
            Self::Capture(_) => "OPERATOR_CAPTURE_FAILED",
            Self::Input(_) => "OPERATOR_INPUT_FAILED",
            Self::Allocation(_) => "OPERATOR_ALLOCATION_FAILED",
            Self::Auth(_) => "OPERATOR_AUTH_FAILED",
            Self::Config(_) => "OPERATOR_CONFIG_ERROR",
            Self::Model(_) => "OPERATOR_MODEL_ERROR",
            Self::RetriesExhausted { .. } => "OPERATOR_RETRIES_EXHAUSTED",
        }
    }
}
