// Path: crates/marionette-types/src/app/outcome.rs

use super::action::ActionKind;
use super::geometry::ScreenGeometry;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Selects which concrete operator a run is bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    /// The host desktop, driven through OS automation calls.
    #[default]
    Local,
    /// A leased cloud VM reached through authenticated per-verb RPC.
    Sandbox,
    /// A pre-provisioned VM reached through a bearer-token instance URL.
    Subscription,
}

impl BackendKind {
    /// Stable lower-case label, used for logs and metric labels.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Local => "local",
            Self::Sandbox => "sandbox",
            Self::Subscription => "subscription",
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The frame handed back to the run loop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScreenshotOutput {
    /// Base64 JPEG without any `data:` URL prefix.
    pub base64_image: String,
    /// Scale factor of the captured display.
    pub scale_factor: f64,
    /// Full geometry of the captured display.
    pub geometry: ScreenGeometry,
}

/// What happened when an operator executed one action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ExecuteOutcome {
    /// The action produced its input events (or its wait elapsed).
    Completed,
    /// The action was malformed or unsupported and was dropped.
    Skipped {
        /// Why the action was dropped.
        reason: String,
    },
    /// A terminal sentinel: the run loop should stop.
    End {
        /// The sentinel that ended the run (`finished`, `call_user`, ...).
        kind: String,
    },
}

impl ExecuteOutcome {
    /// Builds the terminal result for a sentinel kind.
    pub fn end(kind: &ActionKind) -> Self {
        Self::End {
            kind: kind.as_str().to_string(),
        }
    }

    /// Returns true when the run loop must stop.
    pub fn is_end(&self) -> bool {
        matches!(self, Self::End { .. })
    }
}
