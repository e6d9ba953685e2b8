// Path: crates/marionette-types/src/app/keys.rs

use serde::{Deserialize, Serialize};
use std::fmt;

/// The operating system an operator's input ultimately lands on.
///
/// For the local desktop this is the host; for remote backends it is the
/// guest VM's OS, which decides how `ctrl` and `meta` resolve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Platform {
    /// Apple macOS.
    #[serde(alias = "darwin")]
    MacOs,
    /// Microsoft Windows.
    #[serde(alias = "win32")]
    Windows,
    /// Linux / X11 / Wayland.
    Linux,
}

impl Platform {
    /// The platform this binary was compiled for.
    pub fn current() -> Self {
        if cfg!(target_os = "macos") {
            Self::MacOs
        } else if cfg!(target_os = "windows") {
            Self::Windows
        } else {
            Self::Linux
        }
    }
}

/// A platform-neutral key identifier produced by hotkey resolution.
///
/// Backends translate these into their own key codes (`enigo::Key` locally,
/// lower-case key names over RPC).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlatformKey {
    /// The macOS Command key.
    Cmd,
    /// Control.
    Ctrl,
    /// Alt / Option.
    Alt,
    /// Shift.
    Shift,
    /// The platform "super" key (Windows key, Linux super).
    Super,
    /// Return / Enter.
    Enter,
    /// Tab.
    Tab,
    /// Escape.
    Escape,
    /// Backspace.
    Backspace,
    /// Forward delete.
    Delete,
    /// Space bar.
    Space,
    /// Arrow up.
    Up,
    /// Arrow down.
    Down,
    /// Arrow left.
    Left,
    /// Arrow right.
    Right,
    /// Home.
    Home,
    /// End.
    End,
    /// Page up.
    PageUp,
    /// Page down.
    PageDown,
    /// Caps lock.
    CapsLock,
    /// Function key `F1`..`F20`.
    F(u8),
    /// A printable character key, stored lower-case.
    Char(char),
}

impl PlatformKey {
    /// The lower-case key name used on the wire (`ctrl`, `enter`, `f5`, `c`).
    pub fn name(&self) -> String {
        match self {
            Self::Cmd => "cmd".into(),
            Self::Ctrl => "ctrl".into(),
            Self::Alt => "alt".into(),
            Self::Shift => "shift".into(),
            Self::Super => "win".into(),
            Self::Enter => "enter".into(),
            Self::Tab => "tab".into(),
            Self::Escape => "esc".into(),
            Self::Backspace => "backspace".into(),
            Self::Delete => "delete".into(),
            Self::Space => "space".into(),
            Self::Up => "up".into(),
            Self::Down => "down".into(),
            Self::Left => "left".into(),
            Self::Right => "right".into(),
            Self::Home => "home".into(),
            Self::End => "end".into(),
            Self::PageUp => "pageup".into(),
            Self::PageDown => "pagedown".into(),
            Self::CapsLock => "capslock".into(),
            Self::F(n) => format!("f{n}"),
            Self::Char(c) => c.to_string(),
        }
    }

    /// Returns true for keys that are held while the rest of a combo is pressed.
    pub fn is_modifier(&self) -> bool {
        matches!(
            self,
            Self::Cmd | Self::Ctrl | Self::Alt | Self::Shift | Self::Super
        )
    }
}

impl fmt::Display for PlatformKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}
