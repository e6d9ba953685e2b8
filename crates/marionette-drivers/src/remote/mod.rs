// Path: crates/marionette-drivers/src/remote/mod.rs

//! Remote VM backends reached over JSON RPC.
//!
//! Both remote variants share one verb set (`MoveMouse`, `ClickMouse`, ...)
//! and one response envelope. They differ only in how a verb is addressed and
//! authenticated, which is what `RpcTransport` abstracts.

pub mod auth;
pub mod sandbox;
pub mod session;
pub mod subscription;

use async_trait::async_trait;
use base64::Engine;
use marionette_api::{InputBackend, InputEvent, ScreenshotProvider};
use marionette_telemetry::{operator_metrics, time::Timer};
use marionette_types::app::{
    BackendKind, ExecuteContext, Platform, ScreenGeometry, ScreenshotOutput, Size,
};
use marionette_types::error::OperatorError;
use reqwest::{Client, RequestBuilder};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Prefix carried by remote screenshots.
pub const JPEG_DATA_URL_PREFIX: &str = "data:image/jpeg;base64,";

pub const VERB_MOVE_MOUSE: &str = "MoveMouse";
pub const VERB_CLICK_MOUSE: &str = "ClickMouse";
pub const VERB_DRAG_MOUSE: &str = "DragMouse";
pub const VERB_PRESS_KEY: &str = "PressKey";
pub const VERB_TYPE_TEXT: &str = "TypeText";
pub const VERB_SCROLL: &str = "Scroll";
pub const VERB_GET_SCREEN_SIZE: &str = "GetScreenSize";
pub const VERB_TAKE_SCREENSHOT: &str = "TakeScreenshot";

/// Sends one verb with its body fields and returns the envelope's `Result`.
#[async_trait]
pub trait RpcTransport: Send + Sync {
    fn name(&self) -> &str;

    async fn call(&self, verb: &str, fields: Map<String, Value>) -> Result<Value, OperatorError>;
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ResponseEnvelope {
    #[serde(default)]
    response_metadata: ResponseMetadata,
    #[serde(default)]
    result: Value,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ResponseMetadata {
    #[serde(default)]
    error: Option<RemoteError>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RemoteError {
    #[serde(default)]
    code: String,
    #[serde(default)]
    message: String,
}

pub(crate) fn build_client(timeout_secs: u64) -> Result<Client, OperatorError> {
    Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| OperatorError::Transport(format!("Failed to build HTTP client: {}", e)))
}

/// Sends a prepared request and unwraps the response envelope.
///
/// An `Error` in the metadata wins over the HTTP status; a non-success status
/// without an envelope error is reported with the status as the code.
pub(crate) async fn send_rpc(verb: &str, request: RequestBuilder) -> Result<Value, OperatorError> {
    let started = Instant::now();
    let response = request.send().await;
    operator_metrics().observe_rpc_duration(verb, started.elapsed().as_secs_f64());

    let response =
        response.map_err(|e| OperatorError::Transport(format!("{} request failed: {}", verb, e)))?;
    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| OperatorError::Transport(format!("{} response unreadable: {}", verb, e)))?;
    decode_envelope(verb, status.as_u16(), status.is_success(), &body)
}

fn decode_envelope(
    verb: &str,
    status: u16,
    success: bool,
    body: &str,
) -> Result<Value, OperatorError> {
    let envelope = serde_json::from_str::<ResponseEnvelope>(body);
    if let Ok(ResponseEnvelope {
        response_metadata: ResponseMetadata { error: Some(error) },
        ..
    }) = &envelope
    {
        return Err(OperatorError::Rpc {
            verb: verb.to_string(),
            code: error.code.clone(),
            message: error.message.clone(),
        });
    }
    if !success {
        return Err(OperatorError::Rpc {
            verb: verb.to_string(),
            code: status.to_string(),
            message: body.chars().take(512).collect(),
        });
    }
    envelope
        .map(|e| e.result)
        .map_err(|e| OperatorError::Transport(format!("{} returned invalid JSON: {}", verb, e)))
}

/// Removes the `data:image/jpeg;base64,` prefix when present.
pub fn strip_data_url(image: &str) -> &str {
    image.strip_prefix(JPEG_DATA_URL_PREFIX).unwrap_or(image)
}

fn into_fields(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

/// Maps one input primitive onto its verb and body fields.
pub fn encode_event(event: &InputEvent) -> (&'static str, Map<String, Value>) {
    let (verb, body) = match event {
        InputEvent::MouseMove { point } => (
            VERB_MOVE_MOUSE,
            json!({ "PositionX": point.x, "PositionY": point.y }),
        ),
        InputEvent::Click { button, point } => (
            VERB_CLICK_MOUSE,
            json!({
                "PositionX": point.x,
                "PositionY": point.y,
                "Button": button.as_str(),
                "Press": true,
                "Release": true,
            }),
        ),
        InputEvent::DoubleClick { point } => (
            VERB_CLICK_MOUSE,
            json!({
                "PositionX": point.x,
                "PositionY": point.y,
                "Button": "double_left",
                "Press": true,
                "Release": true,
            }),
        ),
        InputEvent::Drag { from, to } => (
            VERB_DRAG_MOUSE,
            json!({
                "SourceX": from.x,
                "SourceY": from.y,
                "TargetX": to.x,
                "TargetY": to.y,
            }),
        ),
        InputEvent::Type { text } => (VERB_TYPE_TEXT, json!({ "Text": text })),
        InputEvent::Hotkey { keys } => {
            let names: Vec<String> = keys.iter().map(|k| k.name()).collect();
            (VERB_PRESS_KEY, json!({ "Key": names.join("+") }))
        }
        InputEvent::Scroll {
            point,
            direction,
            amount,
        } => {
            let mut body = json!({ "Direction": direction.as_str(), "Amount": amount });
            if let (Some(p), Some(map)) = (point, body.as_object_mut()) {
                map.insert("PositionX".into(), json!(p.x));
                map.insert("PositionY".into(), json!(p.y));
            }
            (VERB_SCROLL, body)
        }
    };
    (verb, into_fields(body))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ScreenSizeResult {
    width: u32,
    height: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ScreenshotResult {
    screenshot: String,
}

/// Input and capture for one remote VM over an `RpcTransport`.
pub struct RemoteBackend<T> {
    transport: Arc<T>,
    platform: Platform,
    kind: BackendKind,
}

impl<T: RpcTransport> RemoteBackend<T> {
    pub fn new(transport: Arc<T>, platform: Platform, kind: BackendKind) -> Self {
        Self {
            transport,
            platform,
            kind,
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    async fn screen_size(&self) -> Result<Size, OperatorError> {
        let result = self.transport.call(VERB_GET_SCREEN_SIZE, Map::new()).await?;
        let size: ScreenSizeResult = serde_json::from_value(result).map_err(|e| {
            OperatorError::Transport(format!("{} result malformed: {}", VERB_GET_SCREEN_SIZE, e))
        })?;
        Ok(Size::new(size.width, size.height))
    }
}

#[async_trait]
impl<T: RpcTransport + 'static> InputBackend for RemoteBackend<T> {
    fn name(&self) -> &str {
        self.transport.name()
    }

    fn platform(&self) -> Platform {
        self.platform
    }

    async fn perform(&self, event: &InputEvent, _ctx: &ExecuteContext) -> Result<(), OperatorError> {
        let (verb, fields) = encode_event(event);
        self.transport.call(verb, fields).await?;
        Ok(())
    }
}

#[async_trait]
impl<T: RpcTransport + 'static> ScreenshotProvider for RemoteBackend<T> {
    async fn capture(&self) -> Result<ScreenshotOutput, OperatorError> {
        let _timer = Timer::new(operator_metrics(), self.kind.as_str());
        let size = self.screen_size().await?;
        let result = self
            .transport
            .call(VERB_TAKE_SCREENSHOT, Map::new())
            .await?;
        let shot: ScreenshotResult = serde_json::from_value(result).map_err(|e| {
            OperatorError::Transport(format!("{} result malformed: {}", VERB_TAKE_SCREENSHOT, e))
        })?;

        let base64_image = strip_data_url(&shot.screenshot).to_string();
        if base64::engine::general_purpose::STANDARD
            .decode(base64_image.as_bytes())
            .is_err()
        {
            return Err(OperatorError::Capture(format!(
                "{} returned an image that is not base64",
                VERB_TAKE_SCREENSHOT
            )));
        }

        // Remote displays report pixels only; points and pixels coincide.
        let geometry = ScreenGeometry::unscaled(size, self.transport.name().to_string());
        Ok(ScreenshotOutput {
            base64_image,
            scale_factor: geometry.scale_factor,
            geometry,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use marionette_types::app::{AbsolutePoint, PlatformKey, ScrollDirection};

    #[test]
    fn data_url_prefix_is_stripped() {
        assert_eq!(strip_data_url("data:image/jpeg;base64,QUJD"), "QUJD");
        assert_eq!(strip_data_url("QUJD"), "QUJD");
    }

    #[test]
    fn envelope_error_becomes_rpc_error() {
        let body = r#"{"ResponseMetadata":{"Error":{"Code":"InvalidInstance","Message":"gone"}}}"#;
        let err = decode_envelope("MoveMouse", 200, true, body).unwrap_err();
        assert_eq!(
            err,
            OperatorError::Rpc {
                verb: "MoveMouse".into(),
                code: "InvalidInstance".into(),
                message: "gone".into(),
            }
        );
    }

    #[test]
    fn http_status_without_envelope_is_rpc_error() {
        let err = decode_envelope("Scroll", 502, false, "bad gateway").unwrap_err();
        assert!(matches!(err, OperatorError::Rpc { ref code, .. } if code == "502"));
    }

    #[test]
    fn successful_envelope_yields_result() {
        let body = r#"{"ResponseMetadata":{},"Result":{"Width":1280,"Height":720}}"#;
        let value = decode_envelope("GetScreenSize", 200, true, body).unwrap();
        assert_eq!(value["Width"], 1280);
    }

    #[test]
    fn events_encode_to_verbs() {
        let (verb, fields) = encode_event(&InputEvent::DoubleClick {
            point: AbsolutePoint::new(10, 20),
        });
        assert_eq!(verb, "ClickMouse");
        assert_eq!(fields["Button"], "double_left");
        assert_eq!(fields["PositionX"], 10);

        let (verb, fields) = encode_event(&InputEvent::Hotkey {
            keys: vec![PlatformKey::Ctrl, PlatformKey::Char('c')],
        });
        assert_eq!(verb, "PressKey");
        assert_eq!(fields["Key"], "ctrl+c");

        let (verb, fields) = encode_event(&InputEvent::Scroll {
            point: None,
            direction: ScrollDirection::Up,
            amount: 5,
        });
        assert_eq!(verb, "Scroll");
        assert_eq!(fields["Direction"], "up");
        assert!(!fields.contains_key("PositionX"));
    }
}
