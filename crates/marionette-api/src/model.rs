// Path: crates/marionette-api/src/model.rs

use async_trait::async_trait;
use marionette_types::app::{ParsedAction, ScreenshotOutput};
use marionette_types::error::OperatorError;

/// Input of one inference turn.
#[derive(Debug, Clone)]
pub struct PredictionRequest {
    /// The user's task.
    pub instruction: String,
    /// The frame captured immediately before this turn.
    pub screenshot: ScreenshotOutput,
    /// Zero-based turn index within the run.
    pub turn: u32,
}

/// Output of one inference turn, already parsed into actions.
#[derive(Debug, Clone, Default)]
pub struct Prediction {
    /// The raw model text, kept for logs.
    pub raw: String,
    /// Actions to execute in order.
    pub actions: Vec<ParsedAction>,
}

/// The vision-language model client and its output parser, treated as one
/// black box by the run loop.
#[async_trait]
pub trait ModelClient: Send + Sync {
    async fn predict(&self, request: &PredictionRequest) -> Result<Prediction, OperatorError>;
}
