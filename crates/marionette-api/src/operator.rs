// Path: crates/marionette-api/src/operator.rs

use crate::input::InputEvent;
use async_trait::async_trait;
use marionette_types::app::{
    BackendKind, ExecuteContext, ExecuteOutcome, ParsedAction, Platform, ScreenshotOutput,
};
use marionette_types::error::OperatorError;

/// Captures the current frame of one backend and reports its geometry.
#[async_trait]
pub trait ScreenshotProvider: Send + Sync {
    /// Captures a frame. Geometry is measured fresh on every call.
    async fn capture(&self) -> Result<ScreenshotOutput, OperatorError>;
}

/// Performs input primitives on one backend.
#[async_trait]
pub trait InputBackend: Send + Sync {
    /// Human-readable backend name (e.g. "enigo", "sandbox-rpc").
    fn name(&self) -> &str;

    /// The OS the input lands on; decides hotkey resolution.
    fn platform(&self) -> Platform;

    /// Injects one primitive. Transport failures propagate; nothing is retried here.
    async fn perform(&self, event: &InputEvent, ctx: &ExecuteContext) -> Result<(), OperatorError>;
}

/// Abstract interface for a GUI operator (the "eyes and hands" of the agent).
///
/// Implementations bind one `ScreenshotProvider` and one `InputBackend`.
/// Methods are called sequentially by a single run loop; they are not
/// required to tolerate concurrent callers.
#[async_trait]
pub trait Operator: Send + Sync {
    /// Which backend this operator drives.
    fn backend(&self) -> BackendKind;

    /// Captures the current visual state for the model.
    async fn screenshot(&self) -> Result<ScreenshotOutput, OperatorError>;

    /// Executes one parsed action against the screen described by `ctx`.
    ///
    /// Malformed actions resolve to `ExecuteOutcome::Skipped`; terminal
    /// sentinels resolve to `ExecuteOutcome::End`. Only backend failures are
    /// returned as errors.
    async fn execute(
        &self,
        action: &ParsedAction,
        ctx: &ExecuteContext,
    ) -> Result<ExecuteOutcome, OperatorError>;

    /// Releases any backend session held by this operator.
    async fn teardown(&self) -> Result<(), OperatorError> {
        Ok(())
    }
}
