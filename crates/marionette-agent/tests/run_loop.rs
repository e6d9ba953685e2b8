// Path: crates/marionette-agent/tests/run_loop.rs

use async_trait::async_trait;
use marionette_agent::{AgentRunner, RetryPolicy, RunStatus};
use marionette_api::{ModelClient, Operator, Prediction, PredictionRequest};
use marionette_drivers::SubscriptionOperator;
use marionette_types::app::{
    BackendKind, ExecuteContext, ExecuteOutcome, ParsedAction, Platform, ScreenGeometry,
    ScreenshotOutput, Size,
};
use marionette_types::config::{ActionConfig, RetryBudget, RetryConfig, SubscriptionConfig};
use marionette_types::error::OperatorError;
use serde_json::json;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Operator that records executed actions and can fail its screenshots.
#[derive(Default)]
struct ScriptedOperator {
    executed: Mutex<Vec<String>>,
    screenshots: AtomicU32,
    screenshot_failures: AtomicU32,
    teardowns: AtomicU32,
}

#[async_trait]
impl Operator for ScriptedOperator {
    fn backend(&self) -> BackendKind {
        BackendKind::Local
    }

    async fn screenshot(&self) -> Result<ScreenshotOutput, OperatorError> {
        self.screenshots.fetch_add(1, Ordering::SeqCst);
        if self.screenshot_failures.load(Ordering::SeqCst) > 0 {
            self.screenshot_failures.fetch_sub(1, Ordering::SeqCst);
            return Err(OperatorError::Capture("display asleep".into()));
        }
        let geometry = ScreenGeometry::from_physical(Size::new(1000, 800), 1.0, "test");
        Ok(ScreenshotOutput {
            base64_image: String::new(),
            scale_factor: 1.0,
            geometry,
        })
    }

    async fn execute(
        &self,
        action: &ParsedAction,
        _ctx: &ExecuteContext,
    ) -> Result<ExecuteOutcome, OperatorError> {
        self.executed.lock().unwrap().push(action.action_type.clone());
        let kind = action.kind();
        if kind.is_terminal() {
            return Ok(ExecuteOutcome::end(&kind));
        }
        Ok(ExecuteOutcome::Completed)
    }

    async fn teardown(&self) -> Result<(), OperatorError> {
        self.teardowns.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Model that replays a fixed list of turns, then repeats `wait` forever.
struct ScriptedModel {
    turns: Mutex<VecDeque<Vec<ParsedAction>>>,
}

impl ScriptedModel {
    fn new(turns: Vec<Vec<ParsedAction>>) -> Self {
        Self {
            turns: Mutex::new(turns.into()),
        }
    }
}

#[async_trait]
impl ModelClient for ScriptedModel {
    async fn predict(&self, _request: &PredictionRequest) -> Result<Prediction, OperatorError> {
        let actions = self
            .turns
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| vec![ParsedAction::new("move").with_input("start_box", "[0.5,0.5]")]);
        Ok(Prediction {
            raw: String::new(),
            actions,
        })
    }
}

#[tokio::test]
async fn finished_ends_the_run() {
    let operator = Arc::new(ScriptedOperator::default());
    let model = Arc::new(ScriptedModel::new(vec![
        vec![ParsedAction::new("click").with_input("start_box", "[0.1,0.1]")],
        vec![ParsedAction::new("finished")],
    ]));
    let (mut runner, _) = AgentRunner::new(operator.clone(), model, RetryPolicy::default());

    let report = runner.run("open settings").await;
    assert_eq!(report.status, RunStatus::End);
    assert_eq!(report.turns, 2);
    assert_eq!(*operator.executed.lock().unwrap(), vec!["click", "finished"]);
    assert_eq!(operator.teardowns.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn call_user_hands_over() {
    let operator = Arc::new(ScriptedOperator::default());
    let model = Arc::new(ScriptedModel::new(vec![vec![ParsedAction::new("call_user")]]));
    let (mut runner, _) = AgentRunner::new(operator, model, RetryPolicy::default());
    assert_eq!(runner.run("log in").await.status, RunStatus::CallUser);
}

#[tokio::test]
async fn loop_bound_is_enforced() {
    let operator = Arc::new(ScriptedOperator::default());
    let model = Arc::new(ScriptedModel::new(vec![]));
    let (runner, _) = AgentRunner::new(operator.clone(), model, RetryPolicy::default());
    let mut runner = runner.with_max_loops(3);

    let report = runner.run("never done").await;
    assert_eq!(report.status, RunStatus::MaxLoop);
    assert_eq!(report.turns, 3);
    assert_eq!(operator.screenshots.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn stop_is_checked_before_the_first_turn() {
    let operator = Arc::new(ScriptedOperator::default());
    let model = Arc::new(ScriptedModel::new(vec![]));
    let (mut runner, controller) = AgentRunner::new(operator.clone(), model, RetryPolicy::default());
    controller.stop();

    let report = runner.run("anything").await;
    assert_eq!(report.status, RunStatus::UserStopped);
    assert_eq!(operator.screenshots.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn paused_run_resumes() {
    let operator = Arc::new(ScriptedOperator::default());
    let model = Arc::new(ScriptedModel::new(vec![vec![ParsedAction::new("finished")]]));
    let (mut runner, controller) = AgentRunner::new(operator.clone(), model, RetryPolicy::default());
    let mut status = runner.status();
    controller.pause();

    let handle = tokio::spawn(async move { runner.run("resume me").await });
    status
        .wait_for(|s| *s == RunStatus::Paused)
        .await
        .unwrap();
    assert_eq!(operator.screenshots.load(Ordering::SeqCst), 0);

    controller.resume();
    let report = handle.await.unwrap();
    assert_eq!(report.status, RunStatus::End);
}

#[tokio::test]
async fn screenshot_retries_then_errors() {
    let operator = Arc::new(ScriptedOperator::default());
    operator.screenshot_failures.store(10, Ordering::SeqCst);
    let model = Arc::new(ScriptedModel::new(vec![]));
    let retry = RetryPolicy::new(RetryConfig {
        screenshot: RetryBudget::new(3),
        ..Default::default()
    });
    let (mut runner, _) = AgentRunner::new(operator.clone(), model, retry);

    let report = runner.run("look").await;
    assert!(matches!(report.status, RunStatus::Error(ref msg) if msg.contains("3 attempt")));
    assert_eq!(operator.screenshots.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn transient_screenshot_failure_is_absorbed() {
    let operator = Arc::new(ScriptedOperator::default());
    operator.screenshot_failures.store(2, Ordering::SeqCst);
    let model = Arc::new(ScriptedModel::new(vec![vec![ParsedAction::new("finished")]]));
    let (mut runner, _) = AgentRunner::new(operator.clone(), model, RetryPolicy::default());

    let report = runner.run("look").await;
    assert_eq!(report.status, RunStatus::End);
    assert_eq!(operator.screenshots.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn drives_a_subscription_vm_end_to_end() {
    let server = MockServer::start().await;
    let ok = |result: serde_json::Value| {
        ResponseTemplate::new(200).set_body_json(json!({ "ResponseMetadata": {}, "Result": result }))
    };
    Mock::given(method("POST"))
        .and(body_partial_json(json!({ "Action": "GetScreenSize" })))
        .respond_with(ok(json!({ "Width": 1000, "Height": 800 })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(body_partial_json(json!({ "Action": "TakeScreenshot" })))
        .respond_with(ok(json!({ "Screenshot": "data:image/jpeg;base64,/9j/" })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/"))
        .and(body_partial_json(json!({ "Action": "TypeText", "Text": "hello" })))
        .respond_with(ok(json!({})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(body_partial_json(json!({ "Action": "PressKey", "Key": "enter" })))
        .respond_with(ok(json!({})))
        .expect(1)
        .mount(&server)
        .await;

    let config = SubscriptionConfig {
        instance_url: format!("{}/", server.uri()),
        token: Some("tok".into()),
        platform: Platform::Windows,
        request_timeout_secs: 5,
    };
    let operator = Arc::new(SubscriptionOperator::new(&config, ActionConfig::default()).unwrap());
    let model = Arc::new(ScriptedModel::new(vec![vec![
        ParsedAction::new("type").with_input("content", "hello\\n"),
        ParsedAction::new("finished"),
    ]]));
    let (mut runner, _) = AgentRunner::new(operator, model, RetryPolicy::default());

    let report = runner.run("say hello").await;
    assert_eq!(report.status, RunStatus::End);
}
