// Path: crates/marionette-drivers/tests/remote_rpc.rs

use marionette_api::Operator;
use marionette_drivers::remote::auth::DeviceAuthHeaders;
use marionette_drivers::remote::session::{HttpSandboxAllocator, ResourceKind, SessionManager};
use marionette_drivers::{SandboxOperator, SubscriptionOperator};
use marionette_types::app::{ExecuteContext, ExecuteOutcome, ParsedAction, Platform};
use marionette_types::config::{ActionConfig, SandboxConfig, SubscriptionConfig};
use marionette_types::error::OperatorError;
use serde_json::json;
use std::sync::Arc;
use wiremock::matchers::{body_partial_json, header, header_exists, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn ok(result: serde_json::Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({ "ResponseMetadata": {}, "Result": result }))
}

fn sandbox_config(server: &MockServer) -> SandboxConfig {
    SandboxConfig {
        base_url: format!("{}/vm", server.uri()),
        allocation_url: format!("{}/alloc", server.uri()),
        device_id: "dev-1".into(),
        token: Some("secret".into()),
        platform: Platform::Windows,
        lease_secs: 600,
        request_timeout_secs: 5,
    }
}

fn subscription_config(server: &MockServer) -> SubscriptionConfig {
    SubscriptionConfig {
        instance_url: format!("{}/instance", server.uri()),
        token: Some("raw-token".into()),
        platform: Platform::Windows,
        request_timeout_secs: 5,
    }
}

async fn sandbox_operator(server: &MockServer) -> (SandboxOperator, Arc<SessionManager>) {
    let config = sandbox_config(server);
    let auth = Arc::new(DeviceAuthHeaders::from_config(&config).unwrap());
    let allocator = HttpSandboxAllocator::new(&config, auth.clone()).unwrap();
    let session = Arc::new(SessionManager::new(Arc::new(allocator)));
    let op = SandboxOperator::connect(&config, ActionConfig::default(), session.clone(), auth)
        .await
        .unwrap();
    (op, session)
}

async fn mount_allocation(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/alloc/AllocateResource"))
        .and(body_partial_json(json!({ "ResourceType": "computer" })))
        .respond_with(ok(json!({ "InstanceId": "i-42", "LeaseSeconds": 600 })))
        .expect(1)
        .mount(server)
        .await;
}

#[tokio::test]
async fn sandbox_click_posts_authenticated_verb() {
    let server = MockServer::start().await;
    mount_allocation(&server).await;
    Mock::given(method("POST"))
        .and(path("/vm/ClickMouse"))
        .and(header("X-Device-Id", "dev-1"))
        .and(header("Authorization", "Bearer secret"))
        .and(header_exists("X-Timestamp"))
        .and(body_partial_json(json!({
            "InstanceId": "i-42",
            "PositionX": 500,
            "PositionY": 400,
            "Button": "left",
            "Press": true,
            "Release": true
        })))
        .respond_with(ok(json!({})))
        .expect(1)
        .mount(&server)
        .await;

    let (op, _) = sandbox_operator(&server).await;
    assert_eq!(op.lease().instance_id, "i-42");

    let action = ParsedAction::new("click").with_input("start_box", "[0.4,0.4,0.6,0.6]");
    let outcome = op
        .execute(&action, &ExecuteContext::new(1000, 800, 1.0))
        .await
        .unwrap();
    assert_eq!(outcome, ExecuteOutcome::Completed);
}

#[tokio::test]
async fn sandbox_partial_drag_sends_nothing() {
    let server = MockServer::start().await;
    mount_allocation(&server).await;
    Mock::given(method("POST"))
        .and(path("/vm/DragMouse"))
        .respond_with(ok(json!({})))
        .expect(0)
        .mount(&server)
        .await;

    let (op, _) = sandbox_operator(&server).await;
    let action = ParsedAction::new("drag").with_input("start_box", "[0.1,0.1,0.2,0.2]");
    let outcome = op
        .execute(&action, &ExecuteContext::new(1000, 800, 1.0))
        .await
        .unwrap();
    assert!(matches!(outcome, ExecuteOutcome::Skipped { .. }));
}

#[tokio::test]
async fn sandbox_screenshot_strips_data_url() {
    let server = MockServer::start().await;
    mount_allocation(&server).await;
    Mock::given(method("POST"))
        .and(path("/vm/GetScreenSize"))
        .respond_with(ok(json!({ "Width": 1280, "Height": 720 })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/vm/TakeScreenshot"))
        .respond_with(ok(json!({ "Screenshot": "data:image/jpeg;base64,/9j/4AAQ" })))
        .mount(&server)
        .await;

    let (op, _) = sandbox_operator(&server).await;
    let shot = op.screenshot().await.unwrap();
    assert_eq!(shot.base64_image, "/9j/4AAQ");
    assert_eq!(shot.geometry.physical_size.width, 1280);
    assert_eq!(shot.geometry.logical_size, shot.geometry.physical_size);
    assert_eq!(shot.scale_factor, 1.0);
}

#[tokio::test]
async fn sandbox_rpc_error_envelope_propagates() {
    let server = MockServer::start().await;
    mount_allocation(&server).await;
    Mock::given(method("POST"))
        .and(path("/vm/PressKey"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "ResponseMetadata": { "Error": { "Code": "InstanceNotReady", "Message": "booting" } }
        })))
        .mount(&server)
        .await;

    let (op, _) = sandbox_operator(&server).await;
    let action = ParsedAction::new("hotkey").with_input("key", "ctrl c");
    let err = op
        .execute(&action, &ExecuteContext::new(1000, 800, 1.0))
        .await
        .unwrap_err();
    assert_eq!(
        err,
        OperatorError::Rpc {
            verb: "PressKey".into(),
            code: "InstanceNotReady".into(),
            message: "booting".into(),
        }
    );
}

#[tokio::test]
async fn sandbox_teardown_releases_lease() {
    let server = MockServer::start().await;
    mount_allocation(&server).await;
    Mock::given(method("POST"))
        .and(path("/alloc/ReleaseResource"))
        .and(body_partial_json(json!({ "InstanceId": "i-42" })))
        .respond_with(ok(json!({})))
        .expect(1)
        .mount(&server)
        .await;

    let (op, session) = sandbox_operator(&server).await;
    op.teardown().await.unwrap();
    assert!(session.current(ResourceKind::Computer).await.is_none());
}

#[tokio::test]
async fn subscription_envelope_carries_action_and_version() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/instance"))
        .and(header("Authorization", "raw-token"))
        .and(body_partial_json(json!({
            "Action": "Scroll",
            "Version": "2020-04-01",
            "PositionX": 500,
            "PositionY": 400,
            "Direction": "down"
        })))
        .respond_with(ok(json!({})))
        .expect(1)
        .mount(&server)
        .await;

    let op = SubscriptionOperator::new(&subscription_config(&server), ActionConfig::default())
        .unwrap();
    let action = ParsedAction::new("scroll")
        .with_input("start_box", "[0.5,0.5,0.5,0.5]")
        .with_input("direction", "down");
    let outcome = op
        .execute(&action, &ExecuteContext::new(1000, 800, 1.0))
        .await
        .unwrap();
    assert_eq!(outcome, ExecuteOutcome::Completed);
}

#[tokio::test]
async fn subscription_sentinel_makes_no_call() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ok(json!({})))
        .expect(0)
        .mount(&server)
        .await;

    let op = SubscriptionOperator::new(&subscription_config(&server), ActionConfig::default())
        .unwrap();
    for kind in ["finished", "call_user"] {
        let outcome = op
            .execute(&ParsedAction::new(kind), &ExecuteContext::new(1000, 800, 1.0))
            .await
            .unwrap();
        assert!(outcome.is_end());
    }
}

#[tokio::test]
async fn subscription_http_failure_is_rpc_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503).set_body_string("unavailable"))
        .mount(&server)
        .await;

    let op = SubscriptionOperator::new(&subscription_config(&server), ActionConfig::default())
        .unwrap();
    let action = ParsedAction::new("type").with_input("content", "hi");
    let err = op
        .execute(&action, &ExecuteContext::new(1000, 800, 1.0))
        .await
        .unwrap_err();
    assert!(matches!(err, OperatorError::Rpc { ref code, .. } if code == "503"));
}
