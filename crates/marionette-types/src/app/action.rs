// Path: crates/marionette-types/src/app/action.rs

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Input key holding the primary box string (`"[x1,y1,x2,y2]"`).
pub const INPUT_START_BOX: &str = "start_box";
/// Input key holding the secondary box string of a drag.
pub const INPUT_END_BOX: &str = "end_box";
/// Input key holding the text of a `type` action.
pub const INPUT_CONTENT: &str = "content";
/// Input key holding a raw key string.
pub const INPUT_KEY: &str = "key";
/// Alternate input key holding a raw key string.
pub const INPUT_HOTKEY: &str = "hotkey";
/// Input key holding a scroll direction.
pub const INPUT_DIRECTION: &str = "direction";

/// The canonical kind of a model-proposed action.
///
/// Model output uses several spellings for the same primitive; `ActionKind::parse`
/// folds the aliases onto one variant. Anything else is kept verbatim in
/// `Unknown` so the operator can log it and carry on.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ActionKind {
    /// Move the pointer.
    Move,
    /// Move the pointer (hover alias kept distinct for logging).
    Hover,
    /// Single primary-button click.
    Click,
    /// Dedicated double-click.
    DoubleClick,
    /// Secondary-button click.
    RightClick,
    /// Middle-button click.
    MiddleClick,
    /// Press at `start_box`, release at `end_box`.
    Drag,
    /// Submit text.
    Type,
    /// Key combination.
    Hotkey,
    /// Single key press (shares the hotkey path).
    Press,
    /// Scroll at a point.
    Scroll,
    /// Sleep for a fixed duration.
    Wait,
    /// Terminal sentinel: the task is done.
    Finished,
    /// Terminal sentinel: the model asks for a human.
    CallUser,
    /// Terminal sentinel: the environment is broken.
    ErrorEnv,
    /// Terminal sentinel: the user stopped the run.
    UserStop,
    /// Any action type this runtime does not implement.
    Unknown(String),
}

impl ActionKind {
    /// Maps a raw `action_type` string onto its canonical kind.
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "move" | "mouse_move" => Self::Move,
            "hover" => Self::Hover,
            "click" | "left_click" | "left_single" => Self::Click,
            "double_click" | "left_double" => Self::DoubleClick,
            "right_click" | "right_single" => Self::RightClick,
            "middle_click" => Self::MiddleClick,
            "drag" | "left_click_drag" | "select" => Self::Drag,
            "type" => Self::Type,
            "hotkey" => Self::Hotkey,
            "press" => Self::Press,
            "scroll" => Self::Scroll,
            "wait" => Self::Wait,
            "finished" => Self::Finished,
            "call_user" => Self::CallUser,
            "error_env" => Self::ErrorEnv,
            "user_stop" => Self::UserStop,
            _ => Self::Unknown(raw.to_string()),
        }
    }

    /// The canonical snake_case name of the kind.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Move => "move",
            Self::Hover => "hover",
            Self::Click => "click",
            Self::DoubleClick => "double_click",
            Self::RightClick => "right_click",
            Self::MiddleClick => "middle_click",
            Self::Drag => "drag",
            Self::Type => "type",
            Self::Hotkey => "hotkey",
            Self::Press => "press",
            Self::Scroll => "scroll",
            Self::Wait => "wait",
            Self::Finished => "finished",
            Self::CallUser => "call_user",
            Self::ErrorEnv => "error_env",
            Self::UserStop => "user_stop",
            Self::Unknown(raw) => raw.as_str(),
        }
    }

    /// Returns true for the sentinels that end a run instead of producing input.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Finished | Self::CallUser | Self::ErrorEnv | Self::UserStop
        )
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One action proposed by the model for the current turn.
///
/// `action_inputs` holds raw, unresolved fields exactly as the external output
/// parser produced them. The core never mutates a `ParsedAction`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ParsedAction {
    /// The raw action type string (e.g. `"click"`, `"left_double"`).
    pub action_type: String,
    /// Raw inputs keyed by name (`start_box`, `end_box`, `content`, ...).
    #[serde(default)]
    pub action_inputs: BTreeMap<String, String>,
    /// The model's reasoning for this step, if the parser kept it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thought: Option<String>,
}

impl ParsedAction {
    /// Creates an action with no inputs.
    pub fn new(action_type: impl Into<String>) -> Self {
        Self {
            action_type: action_type.into(),
            ..Default::default()
        }
    }

    /// Builder helper adding one raw input.
    pub fn with_input(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.action_inputs.insert(name.into(), value.into());
        self
    }

    /// The canonical kind of this action.
    pub fn kind(&self) -> ActionKind {
        ActionKind::parse(&self.action_type)
    }

    /// Returns a raw input, treating blank strings as absent.
    pub fn input(&self, name: &str) -> Option<&str> {
        self.action_inputs
            .get(name)
            .map(String::as_str)
            .filter(|v| !v.trim().is_empty())
    }

    /// The `start_box` input.
    pub fn start_box(&self) -> Option<&str> {
        self.input(INPUT_START_BOX)
    }

    /// The `end_box` input.
    pub fn end_box(&self) -> Option<&str> {
        self.input(INPUT_END_BOX)
    }

    /// The `content` input. Unlike other inputs, whitespace-only text is kept.
    pub fn content(&self) -> Option<&str> {
        self.action_inputs
            .get(INPUT_CONTENT)
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }

    /// The raw key string, read from `key` and then `hotkey`.
    pub fn key(&self) -> Option<&str> {
        self.input(INPUT_KEY).or_else(|| self.input(INPUT_HOTKEY))
    }

    /// The `direction` input.
    pub fn direction(&self) -> Option<&str> {
        self.input(INPUT_DIRECTION)
    }
}

/// Scroll direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScrollDirection {
    /// Towards the top of the content.
    Up,
    /// Towards the bottom of the content.
    Down,
    /// Towards the left edge.
    Left,
    /// Towards the right edge.
    Right,
}

impl ScrollDirection {
    /// Lower-cases `raw` and maps it onto a direction; `None` when unmapped.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "up" => Some(Self::Up),
            "down" => Some(Self::Down),
            "left" => Some(Self::Left),
            "right" => Some(Self::Right),
            _ => None,
        }
    }

    /// The lower-case wire name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Up => "up",
            Self::Down => "down",
            Self::Left => "left",
            Self::Right => "right",
        }
    }
}

/// Represents the type of mouse button.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MouseButton {
    /// Primary button.
    Left,
    /// Secondary button.
    Right,
    /// Middle button / wheel click.
    Middle,
}

impl MouseButton {
    /// The lower-case wire name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Left => "left",
            Self::Right => "right",
            Self::Middle => "middle",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aliases_fold_onto_canonical_kinds() {
        assert_eq!(ActionKind::parse("left_single"), ActionKind::Click);
        assert_eq!(ActionKind::parse("LEFT_DOUBLE"), ActionKind::DoubleClick);
        assert_eq!(ActionKind::parse("right_single"), ActionKind::RightClick);
        assert_eq!(ActionKind::parse("select"), ActionKind::Drag);
        assert_eq!(ActionKind::parse("left_click_drag"), ActionKind::Drag);
        assert_eq!(
            ActionKind::parse("teleport"),
            ActionKind::Unknown("teleport".into())
        );
    }

    #[test]
    fn terminal_sentinels() {
        for raw in ["finished", "call_user", "error_env", "user_stop"] {
            assert!(ActionKind::parse(raw).is_terminal(), "{raw}");
        }
        assert!(!ActionKind::parse("click").is_terminal());
        assert!(!ActionKind::parse("wait").is_terminal());
    }

    #[test]
    fn blank_inputs_are_absent() {
        let action = ParsedAction::new("click")
            .with_input(INPUT_START_BOX, "  ")
            .with_input(INPUT_HOTKEY, "ctrl c");
        assert_eq!(action.start_box(), None);
        assert_eq!(action.key(), Some("ctrl c"));
    }

    #[test]
    fn deserializes_parser_output() {
        let json = r#"{"action_type":"scroll","action_inputs":{"start_box":"[0.5,0.5,0.5,0.5]","direction":"down"}}"#;
        let action: ParsedAction = serde_json::from_str(json).unwrap();
        assert_eq!(action.kind(), ActionKind::Scroll);
        assert_eq!(action.direction(), Some("down"));
        assert_eq!(action.thought, None);
    }

    #[test]
    fn scroll_direction_is_case_insensitive() {
        assert_eq!(ScrollDirection::parse("DOWN"), Some(ScrollDirection::Down));
        assert_eq!(ScrollDirection::parse("sideways"), None);
    }
}
