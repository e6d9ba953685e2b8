// Path: crates/marionette-api/src/input.rs

use marionette_types::app::{AbsolutePoint, MouseButton, PlatformKey, ScrollDirection};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Represents one physical input primitive to be injected into a backend.
///
/// Coordinates are absolute physical pixels of the target screen. Every
/// variant maps onto exactly one backend call; none of them is emulated by
/// a sequence of smaller calls at this layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InputEvent {
    /// Move the pointer to an absolute point.
    MouseMove { point: AbsolutePoint },
    /// Press and release a button at a point.
    Click {
        button: MouseButton,
        point: AbsolutePoint,
    },
    /// The backend's dedicated double-click verb.
    DoubleClick { point: AbsolutePoint },
    /// Press at `from`, move, release at `to`.
    Drag {
        from: AbsolutePoint,
        to: AbsolutePoint,
    },
    /// Submit a string of text.
    Type { text: String },
    /// Press a key combination (modifiers held, then released in reverse).
    Hotkey { keys: Vec<PlatformKey> },
    /// Scroll, optionally after moving the pointer to `point`.
    Scroll {
        point: Option<AbsolutePoint>,
        direction: ScrollDirection,
        amount: u32,
    },
}

impl InputEvent {
    /// Short verb name used in logs and metric labels.
    pub fn verb(&self) -> &'static str {
        match self {
            Self::MouseMove { .. } => "move",
            Self::Click { .. } => "click",
            Self::DoubleClick { .. } => "double_click",
            Self::Drag { .. } => "drag",
            Self::Type { .. } => "type",
            Self::Hotkey { .. } => "hotkey",
            Self::Scroll { .. } => "scroll",
        }
    }
}

impl fmt::Display for InputEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MouseMove { point } => write!(f, "move({}, {})", point.x, point.y),
            Self::Click { button, point } => {
                write!(f, "click({}, {}, {})", button.as_str(), point.x, point.y)
            }
            Self::DoubleClick { point } => write!(f, "double_click({}, {})", point.x, point.y),
            Self::Drag { from, to } => {
                write!(f, "drag({}, {} -> {}, {})", from.x, from.y, to.x, to.y)
            }
            Self::Type { text } => write!(f, "type({} chars)", text.chars().count()),
            Self::Hotkey { keys } => {
                let names: Vec<String> = keys.iter().map(|k| k.name()).collect();
                write!(f, "hotkey({})", names.join("+"))
            }
            Self::Scroll {
                direction, amount, ..
            } => write!(f, "scroll({}, {})", direction.as_str(), amount),
        }
    }
}
