// Path: crates/marionette-drivers/src/gui/mod.rs

pub mod clipboard;
pub mod geometry;
pub mod keys;
pub mod operator;
pub mod vision;

use self::operator::EnigoBackend;
use self::vision::LocalScreenCapture;
use crate::dispatch::{execute_plan, ActionDispatcher};
use async_trait::async_trait;
use marionette_api::{InputBackend, Operator, ScreenshotProvider};
use marionette_types::app::{
    BackendKind, ExecuteContext, ExecuteOutcome, ParsedAction, ScreenshotOutput,
};
use marionette_types::config::OperatorConfig;
use marionette_types::error::OperatorError;
use std::time::Duration;

/// Drives the host desktop: xcap for the eyes, enigo for the hands.
pub struct LocalOperator {
    vision: Box<dyn ScreenshotProvider>,
    input: Box<dyn InputBackend>,
    dispatcher: ActionDispatcher,
}

impl LocalOperator {
    pub fn new(config: &OperatorConfig) -> Result<Self, OperatorError> {
        let input = EnigoBackend::new(&config.local)?;
        let vision = LocalScreenCapture::new(
            config.actions.jpeg_quality,
            Duration::from_secs(config.local.capture_timeout_secs),
        );
        let dispatcher = ActionDispatcher::for_backend(&input, config.actions);
        Ok(Self::with_parts(
            Box::new(vision),
            Box::new(input),
            dispatcher,
        ))
    }

    /// Assembles an operator from explicit parts (used by tests and embedders).
    pub fn with_parts(
        vision: Box<dyn ScreenshotProvider>,
        input: Box<dyn InputBackend>,
        dispatcher: ActionDispatcher,
    ) -> Self {
        Self {
            vision,
            input,
            dispatcher,
        }
    }
}

#[async_trait]
impl Operator for LocalOperator {
    fn backend(&self) -> BackendKind {
        BackendKind::Local
    }

    async fn screenshot(&self) -> Result<ScreenshotOutput, OperatorError> {
        let shot = self.vision.capture().await?;
        if !shot.geometry.is_consistent() {
            tracing::warn!(
                target: "operator",
                physical = ?shot.geometry.physical_size,
                logical = ?shot.geometry.logical_size,
                scale = shot.geometry.scale_factor,
                "Screen geometry drifts beyond tolerance"
            );
        }
        Ok(shot)
    }

    async fn execute(
        &self,
        action: &ParsedAction,
        ctx: &ExecuteContext,
    ) -> Result<ExecuteOutcome, OperatorError> {
        execute_plan(
            &self.dispatcher,
            self.input.as_ref(),
            BackendKind::Local,
            action,
            ctx,
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::tests::RecordingBackend;
    use marionette_types::app::{Platform, ScreenGeometry, Size};
    use marionette_types::config::ActionConfig;

    struct StaticVision(ScreenGeometry);

    #[async_trait]
    impl ScreenshotProvider for StaticVision {
        async fn capture(&self) -> Result<ScreenshotOutput, OperatorError> {
            Ok(ScreenshotOutput {
                base64_image: String::new(),
                scale_factor: self.0.scale_factor,
                geometry: self.0.clone(),
            })
        }
    }

    #[tokio::test]
    async fn screenshot_geometry_drives_execution_context() {
        let geometry = ScreenGeometry::from_logical(Size::new(1440, 900), 2.0, "1");
        let op = LocalOperator::with_parts(
            Box::new(StaticVision(geometry)),
            Box::new(RecordingBackend::default()),
            ActionDispatcher::new(Platform::MacOs, ActionConfig::default()),
        );
        let shot = op.screenshot().await.unwrap();
        let ctx = shot.geometry.context();
        assert_eq!((ctx.screen_width, ctx.screen_height), (2880, 1800));

        let action = ParsedAction::new("click").with_input("start_box", "[0.5,0.5,0.5,0.5]");
        let outcome = op.execute(&action, &ctx).await.unwrap();
        assert_eq!(outcome, ExecuteOutcome::Completed);
        assert_eq!(op.backend(), BackendKind::Local);
    }
}
