// Path: crates/marionette-drivers/src/dispatch.rs

//! The per-action state machine shared by every operator variant.
//!
//! `ActionDispatcher::plan` turns one `ParsedAction` into a `Plan` without
//! touching any backend. `execute_plan` then runs that plan on an
//! `InputBackend`. Malformed input never leaves this module as an error.

use crate::gui::geometry::resolve_point;
use crate::gui::keys::resolve_keys;
use marionette_api::{InputBackend, InputEvent};
use marionette_telemetry::operator_metrics;
use marionette_types::app::{
    ActionKind, BackendKind, ExecuteContext, ExecuteOutcome, MouseButton, ParsedAction, Platform,
    PlatformKey, ScrollDirection,
};
use marionette_types::config::ActionConfig;
use marionette_types::error::OperatorError;
use std::fmt;
use std::time::Duration;

/// What one action resolves to before any backend call is made.
#[derive(Debug, Clone, PartialEq)]
pub enum Plan {
    /// Input primitives to perform in order.
    Input(Vec<InputEvent>),
    /// Sleep, no input.
    Wait(Duration),
    /// A terminal sentinel.
    End(ActionKind),
    /// Dropped with a reason; the run continues.
    Skip(SkipReason),
}

/// Why an action was dropped without input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    MissingPoint,
    PartialDrag,
    EmptyContent,
    NoKeys,
    UnmappedDirection,
    /// The raw action type the model emitted.
    Unsupported(String),
}

impl SkipReason {
    /// Fixed code used as the metrics label. Never carries model text.
    pub fn code(&self) -> &'static str {
        match self {
            Self::MissingPoint => "missing_point",
            Self::PartialDrag => "partial_drag",
            Self::EmptyContent => "empty_content",
            Self::NoKeys => "no_keys",
            Self::UnmappedDirection => "unmapped_direction",
            Self::Unsupported(_) => "unsupported_action",
        }
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingPoint => f.write_str("missing start_box"),
            Self::PartialDrag => f.write_str("drag needs both start_box and end_box"),
            Self::EmptyContent => f.write_str("empty content"),
            Self::NoKeys => f.write_str("no resolvable keys"),
            Self::UnmappedDirection => f.write_str("unmapped scroll direction"),
            Self::Unsupported(raw) => write!(f, "unsupported action '{}'", raw),
        }
    }
}

/// Resolves actions for one target platform with one set of tunables.
#[derive(Debug, Clone)]
pub struct ActionDispatcher {
    platform: Platform,
    actions: ActionConfig,
}

impl ActionDispatcher {
    pub fn new(platform: Platform, actions: ActionConfig) -> Self {
        Self { platform, actions }
    }

    /// A dispatcher resolving keys for the OS `backend` injects into.
    pub fn for_backend(backend: &dyn InputBackend, actions: ActionConfig) -> Self {
        Self::new(backend.platform(), actions)
    }

    pub fn platform(&self) -> Platform {
        self.platform
    }

    pub fn plan(&self, action: &ParsedAction, ctx: &ExecuteContext) -> Plan {
        let kind = action.kind();
        let (w, h) = (ctx.screen_width, ctx.screen_height);
        let start = || resolve_point(action.start_box(), w, h);

        match &kind {
            k if k.is_terminal() => Plan::End(kind.clone()),
            ActionKind::Move | ActionKind::Hover => match start() {
                Some(point) => Plan::Input(vec![InputEvent::MouseMove { point }]),
                None => Plan::Skip(SkipReason::MissingPoint),
            },
            ActionKind::Click | ActionKind::RightClick | ActionKind::MiddleClick => {
                let button = match &kind {
                    ActionKind::RightClick => MouseButton::Right,
                    ActionKind::MiddleClick => MouseButton::Middle,
                    _ => MouseButton::Left,
                };
                match start() {
                    Some(point) => Plan::Input(vec![InputEvent::Click { button, point }]),
                    None => Plan::Skip(SkipReason::MissingPoint),
                }
            }
            ActionKind::DoubleClick => match start() {
                Some(point) => Plan::Input(vec![InputEvent::DoubleClick { point }]),
                None => Plan::Skip(SkipReason::MissingPoint),
            },
            ActionKind::Drag => {
                let end = resolve_point(action.end_box(), w, h);
                match (start(), end) {
                    (Some(from), Some(to)) => Plan::Input(vec![InputEvent::Drag { from, to }]),
                    _ => Plan::Skip(SkipReason::PartialDrag),
                }
            }
            ActionKind::Type => {
                let Some(content) = action.content() else {
                    return Plan::Skip(SkipReason::EmptyContent);
                };
                let (text, submit) = strip_submit_marker(content);
                let mut events = Vec::with_capacity(2);
                if !text.is_empty() {
                    events.push(InputEvent::Type {
                        text: text.to_string(),
                    });
                }
                if submit {
                    events.push(InputEvent::Hotkey {
                        keys: vec![PlatformKey::Enter],
                    });
                }
                Plan::Input(events)
            }
            ActionKind::Hotkey | ActionKind::Press => {
                let keys = resolve_keys(action.key().unwrap_or_default(), self.platform);
                if keys.is_empty() {
                    Plan::Skip(SkipReason::NoKeys)
                } else {
                    Plan::Input(vec![InputEvent::Hotkey { keys }])
                }
            }
            ActionKind::Scroll => {
                let Some(direction) = action.direction().and_then(ScrollDirection::parse) else {
                    return Plan::Skip(SkipReason::UnmappedDirection);
                };
                Plan::Input(vec![InputEvent::Scroll {
                    point: start(),
                    direction,
                    amount: self.actions.effective_scroll_amount(),
                }])
            }
            ActionKind::Wait => Plan::Wait(Duration::from_secs(self.actions.wait_secs)),
            ActionKind::Unknown(raw) => Plan::Skip(SkipReason::Unsupported(raw.clone())),
            // Terminal kinds are matched by the first arm.
            _ => Plan::End(kind.clone()),
        }
    }
}

/// Strips one trailing submit marker: the two-character escape `\n` or a real
/// newline. Returns the remaining text and whether a marker was removed.
pub fn strip_submit_marker(content: &str) -> (&str, bool) {
    if let Some(text) = content.strip_suffix("\\n") {
        (text, true)
    } else if let Some(text) = content.strip_suffix('\n') {
        (text.strip_suffix('\r').unwrap_or(text), true)
    } else {
        (content, false)
    }
}

/// Plans `action` and runs it on `backend`. Backend failures propagate
/// unchanged to the caller's retry wrapper.
pub async fn execute_plan(
    dispatcher: &ActionDispatcher,
    backend: &dyn InputBackend,
    kind: BackendKind,
    action: &ParsedAction,
    ctx: &ExecuteContext,
) -> Result<ExecuteOutcome, OperatorError> {
    let action_kind = action.kind();
    match dispatcher.plan(action, ctx) {
        Plan::End(sentinel) => {
            tracing::info!(target: "operator", backend = %kind, kind = %sentinel, "Terminal action");
            Ok(ExecuteOutcome::end(&sentinel))
        }
        Plan::Skip(reason) => {
            tracing::warn!(
                target: "operator",
                backend = %kind,
                action = %action.action_type,
                reason = %reason,
                "Skipping action"
            );
            operator_metrics().inc_actions_skipped(kind.as_str(), reason.code());
            Ok(ExecuteOutcome::Skipped {
                reason: reason.to_string(),
            })
        }
        Plan::Wait(duration) => {
            tracing::debug!(target: "operator", secs = duration.as_secs(), "Waiting");
            tokio::time::sleep(duration).await;
            operator_metrics().inc_actions_executed(kind.as_str(), action_kind.as_str());
            Ok(ExecuteOutcome::Completed)
        }
        Plan::Input(events) => {
            for event in &events {
                tracing::info!(
                    target: "operator",
                    backend = %kind,
                    driver = backend.name(),
                    event = %event,
                    "Injecting input"
                );
                backend.perform(event, ctx).await?;
            }
            operator_metrics().inc_actions_executed(kind.as_str(), action_kind.as_str());
            Ok(ExecuteOutcome::Completed)
        }
    }
}
