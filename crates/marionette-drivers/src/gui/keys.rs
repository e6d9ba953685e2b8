// Path: crates/marionette-drivers/src/gui/keys.rs

//! Hotkey resolution: model key strings to platform key identifiers.

use marionette_types::app::{Platform, PlatformKey};

/// Resolves one lower-cased token through the static table.
///
/// `ctrl` and the super-key aliases are the only platform-conditional entries.
fn lookup(token: &str, platform: Platform) -> Option<PlatformKey> {
    let key = match token {
        "ctrl" | "control" => match platform {
            Platform::MacOs => PlatformKey::Cmd,
            _ => PlatformKey::Ctrl,
        },
        "meta" | "win" | "windows" | "command" | "cmd" | "super" => match platform {
            Platform::MacOs => PlatformKey::Cmd,
            _ => PlatformKey::Super,
        },
        "alt" | "option" | "opt" => PlatformKey::Alt,
        "shift" => PlatformKey::Shift,
        "enter" | "return" => PlatformKey::Enter,
        "tab" => PlatformKey::Tab,
        "esc" | "escape" => PlatformKey::Escape,
        "backspace" => PlatformKey::Backspace,
        "delete" | "del" => PlatformKey::Delete,
        "space" => PlatformKey::Space,
        "up" | "arrowup" => PlatformKey::Up,
        "down" | "arrowdown" => PlatformKey::Down,
        "left" | "arrowleft" => PlatformKey::Left,
        "right" | "arrowright" => PlatformKey::Right,
        "home" => PlatformKey::Home,
        "end" => PlatformKey::End,
        "pageup" => PlatformKey::PageUp,
        "pagedown" => PlatformKey::PageDown,
        "capslock" => PlatformKey::CapsLock,
        _ => return None,
    };
    Some(key)
}

/// Fallback for tokens missing from the table: matches the upper-cased symbol
/// against the key enumeration (`F1`..`F20`, single characters).
fn lookup_symbol(token: &str) -> Option<PlatformKey> {
    let symbol = token.to_ascii_uppercase();
    let mut chars = symbol.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) if !c.is_whitespace() => {
            return Some(PlatformKey::Char(c.to_ascii_lowercase()));
        }
        _ => {}
    }
    let n: u8 = symbol.strip_prefix('F')?.parse().ok()?;
    (1..=20).contains(&n).then_some(PlatformKey::F(n))
}

/// Resolves a raw key string (`"ctrl c"`, `"Ctrl+Shift+T"`) into platform keys.
///
/// Unresolvable tokens are dropped. An empty result means "no-op": the caller
/// logs a warning and continues the run. No cap on the number of keys is
/// enforced here; keeping combos to three keys is a prompt-level convention.
pub fn resolve_keys(key_str: &str, platform: Platform) -> Vec<PlatformKey> {
    let lowered = key_str.to_lowercase();
    lowered
        .split(|c: char| c.is_whitespace() || c == '+')
        .filter(|t| !t.is_empty())
        .filter_map(|token| {
            let key = lookup(token, platform).or_else(|| lookup_symbol(token));
            if key.is_none() {
                tracing::debug!(target: "operator", token, "Dropping unresolvable key token");
            }
            key
        })
        .collect()
}
