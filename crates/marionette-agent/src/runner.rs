// Path: crates/marionette-agent/src/runner.rs

//! A reference run loop: screenshot, infer, execute, repeat.

use crate::retry::RetryPolicy;
use marionette_api::{ModelClient, Operator, PredictionRequest};
use marionette_types::app::{ActionKind, ExecuteOutcome};
use marionette_types::error::{OperatorError, RetryClass};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::watch;

/// Default upper bound on turns per run.
pub const DEFAULT_MAX_LOOPS: u32 = 100;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunStatus {
    Init,
    Running,
    Paused,
    End,
    CallUser,
    UserStopped,
    MaxLoop,
    Error(String),
}

impl RunStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Init | Self::Running | Self::Paused)
    }
}

/// External control of a run, observed before each turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunControl {
    Run,
    Pause,
    Stop,
}

/// Handle used by a UI or signal handler to steer a run.
#[derive(Debug, Clone)]
pub struct RunController {
    tx: Arc<watch::Sender<RunControl>>,
}

impl RunController {
    pub fn pause(&self) {
        self.tx.send_replace(RunControl::Pause);
    }

    pub fn resume(&self) {
        self.tx.send_replace(RunControl::Run);
    }

    pub fn stop(&self) {
        self.tx.send_replace(RunControl::Stop);
    }
}

/// Final result of `AgentRunner::run`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunReport {
    pub status: RunStatus,
    pub turns: u32,
}

pub struct AgentRunner {
    operator: Arc<dyn Operator>,
    model: Arc<dyn ModelClient>,
    retry: RetryPolicy,
    max_loops: u32,
    control: watch::Receiver<RunControl>,
    status: watch::Sender<RunStatus>,
}

impl AgentRunner {
    pub fn new(
        operator: Arc<dyn Operator>,
        model: Arc<dyn ModelClient>,
        retry: RetryPolicy,
    ) -> (Self, RunController) {
        let (control_tx, control) = watch::channel(RunControl::Run);
        let (status, _) = watch::channel(RunStatus::Init);
        let runner = Self {
            operator,
            model,
            retry,
            max_loops: DEFAULT_MAX_LOOPS,
            control,
            status,
        };
        (
            runner,
            RunController {
                tx: Arc::new(control_tx),
            },
        )
    }

    pub fn with_max_loops(mut self, max_loops: u32) -> Self {
        self.max_loops = max_loops;
        self
    }

    /// Subscribes to status transitions.
    pub fn status(&self) -> watch::Receiver<RunStatus> {
        self.status.subscribe()
    }

    fn set_status(&self, status: RunStatus) {
        tracing::debug!(target: "agent", ?status, "Run status");
        self.status.send_replace(status);
    }

    /// Blocks while paused. Returns false when the run must stop.
    async fn wait_for_go(&mut self) -> bool {
        loop {
            let control = *self.control.borrow_and_update();
            match control {
                RunControl::Run => return true,
                RunControl::Stop => return false,
                RunControl::Pause => {
                    self.set_status(RunStatus::Paused);
                    if self.control.changed().await.is_err() {
                        return false;
                    }
                }
            }
        }
    }

    /// Drives the loop until a terminal status. The operator is torn down
    /// before returning.
    pub async fn run(&mut self, instruction: &str) -> RunReport {
        let mut turns = 0;
        let status = loop {
            if turns >= self.max_loops {
                break RunStatus::MaxLoop;
            }
            if !self.wait_for_go().await {
                break RunStatus::UserStopped;
            }
            self.set_status(RunStatus::Running);

            match self.turn(instruction, turns).await {
                Ok(Some(status)) => {
                    turns += 1;
                    break status;
                }
                Ok(None) => turns += 1,
                Err(e) => {
                    turns += 1;
                    tracing::error!(target: "agent", error = %e, turn = turns, "Turn failed");
                    break RunStatus::Error(e.to_string());
                }
            }
        };

        if let Err(e) = self.operator.teardown().await {
            tracing::warn!(target: "agent", error = %e, "Operator teardown failed");
        }
        self.set_status(status.clone());
        tracing::info!(target: "agent", ?status, turns, "Run finished");
        RunReport { status, turns }
    }

    /// One screenshot, one prediction, and its actions. `Some` ends the run.
    async fn turn(&self, instruction: &str, turn: u32) -> Result<Option<RunStatus>, OperatorError> {
        let operator = &self.operator;
        let screenshot = self
            .retry
            .run(RetryClass::Screenshot, || operator.screenshot())
            .await?;
        let ctx = screenshot.geometry.context();

        let request = PredictionRequest {
            instruction: instruction.to_string(),
            screenshot,
            turn,
        };
        let model = &self.model;
        let prediction = self
            .retry
            .run(RetryClass::Model, || model.predict(&request))
            .await?;
        tracing::info!(target: "agent", turn, actions = prediction.actions.len(), "Prediction received");

        for action in &prediction.actions {
            let outcome = self
                .retry
                .run(RetryClass::Execute, || operator.execute(action, &ctx))
                .await?;
            if let ExecuteOutcome::End { kind } = outcome {
                return Ok(Some(status_for_sentinel(&ActionKind::parse(&kind))));
            }
        }
        Ok(None)
    }
}

fn status_for_sentinel(kind: &ActionKind) -> RunStatus {
    match kind {
        ActionKind::CallUser => RunStatus::CallUser,
        ActionKind::UserStop => RunStatus::UserStopped,
        ActionKind::ErrorEnv => RunStatus::Error("environment reported an error".into()),
        _ => RunStatus::End,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sentinels_map_to_statuses() {
        assert_eq!(status_for_sentinel(&ActionKind::Finished), RunStatus::End);
        assert_eq!(status_for_sentinel(&ActionKind::CallUser), RunStatus::CallUser);
        assert_eq!(status_for_sentinel(&ActionKind::UserStop), RunStatus::UserStopped);
        assert!(matches!(
            status_for_sentinel(&ActionKind::ErrorEnv),
            RunStatus::Error(_)
        ));
        assert!(RunStatus::MaxLoop.is_terminal());
        assert!(!RunStatus::Paused.is_terminal());
    }
}
