// Path: crates/marionette-drivers/src/gui/operator.rs

use super::clipboard::ScopedClipboard;
use super::geometry::physical_to_logical;
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use enigo::{Axis, Button, Coordinate, Direction, Enigo, Key, Keyboard, Mouse, Settings};
use marionette_api::{InputBackend, InputEvent};
use marionette_types::app::{
    AbsolutePoint, ExecuteContext, MouseButton, Platform, PlatformKey, ScrollDirection,
};
use marionette_types::config::LocalConfig;
use marionette_types::error::OperatorError;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

/// Time given to the focused application to consume a paste before the
/// clipboard is restored.
const PASTE_SETTLE: Duration = Duration::from_millis(100);

/// Pause between the two halves of a double click. Well under the shortest
/// OS double-click interval (around 200 ms) so the pair registers as one
/// gesture.
pub(crate) const DOUBLE_CLICK_GAP: Duration = Duration::from_millis(30);

/// A native driver for controlling mouse and keyboard input.
pub struct EnigoBackend {
    enigo: Arc<Mutex<Enigo>>,
    platform: Platform,
    paste_typing: bool,
}

impl EnigoBackend {
    pub fn new(config: &LocalConfig) -> Result<Self, OperatorError> {
        let enigo = Enigo::new(&Settings::default())
            .map_err(|e| OperatorError::Input(format!("Failed to initialize Enigo: {:?}", e)))?;
        let platform = Platform::current();
        Ok(Self {
            enigo: Arc::new(Mutex::new(enigo)),
            platform,
            paste_typing: config
                .paste_typing
                .unwrap_or(platform == Platform::Windows),
        })
    }

    /// Executes one input event on the host. Blocking.
    fn inject(
        enigo: &Mutex<Enigo>,
        event: &InputEvent,
        ctx: &ExecuteContext,
        platform: Platform,
        paste_typing: bool,
    ) -> Result<()> {
        let mut enigo = enigo.lock().map_err(|_| anyhow!("Enigo lock poisoned"))?;
        let to_host = |p: AbsolutePoint| host_point(p, ctx, platform);

        match event {
            InputEvent::MouseMove { point } => move_to(&mut enigo, to_host(*point))?,
            InputEvent::Click { button, point } => {
                move_to(&mut enigo, to_host(*point))?;
                enigo
                    .button(map_button(*button), Direction::Click)
                    .map_err(|e| anyhow!("Click failed: {:?}", e))?;
            }
            InputEvent::DoubleClick { point } => {
                move_to(&mut enigo, to_host(*point))?;
                // enigo 0.2 has no double-click verb. Two clicks at the same
                // position inside the OS interval are read as one double click.
                click_twice(
                    || {
                        enigo
                            .button(Button::Left, Direction::Click)
                            .map_err(|e| anyhow!("Double click failed: {:?}", e))
                    },
                    DOUBLE_CLICK_GAP,
                )?;
            }
            InputEvent::Drag { from, to } => {
                move_to(&mut enigo, to_host(*from))?;
                enigo
                    .button(Button::Left, Direction::Press)
                    .map_err(|e| anyhow!("Drag press failed: {:?}", e))?;
                let moved = move_to(&mut enigo, to_host(*to));
                // Release even when the move failed so the button is not left held.
                enigo
                    .button(Button::Left, Direction::Release)
                    .map_err(|e| anyhow!("Drag release failed: {:?}", e))?;
                moved?;
            }
            InputEvent::Type { text } => {
                if paste_typing {
                    paste_text(&mut enigo, text, platform)?;
                } else {
                    enigo
                        .text(text)
                        .map_err(|e| anyhow!("Type failed: {:?}", e))?;
                }
            }
            InputEvent::Hotkey { keys } => press_combo(&mut enigo, keys)?,
            InputEvent::Scroll {
                point,
                direction,
                amount,
            } => {
                if let Some(point) = point {
                    move_to(&mut enigo, to_host(*point))?;
                }
                let (length, axis) = scroll_delta(*direction, *amount);
                enigo
                    .scroll(length, axis)
                    .map_err(|e| anyhow!("Scroll failed: {:?}", e))?;
            }
        }

        thread::sleep(Duration::from_millis(10));
        Ok(())
    }
}

/// enigo addresses the screen in logical points on macOS and in device
/// pixels elsewhere.
fn host_point(point: AbsolutePoint, ctx: &ExecuteContext, platform: Platform) -> AbsolutePoint {
    match platform {
        Platform::MacOs => physical_to_logical(point, ctx.scale_factor),
        _ => point,
    }
}

/// Clicks twice with a fixed gap; the second click is skipped if the first fails.
pub(crate) fn click_twice(mut click: impl FnMut() -> Result<()>, gap: Duration) -> Result<()> {
    click()?;
    thread::sleep(gap);
    click()
}

fn move_to(enigo: &mut Enigo, point: AbsolutePoint) -> Result<()> {
    enigo
        .move_mouse(point.x, point.y, Coordinate::Abs)
        .map_err(|e| anyhow!("Mouse move failed: {:?}", e))
}

fn map_button(button: MouseButton) -> Button {
    match button {
        MouseButton::Left => Button::Left,
        MouseButton::Right => Button::Right,
        MouseButton::Middle => Button::Middle,
    }
}

/// enigo scrolls down/right for positive lengths.
pub(crate) fn scroll_delta(direction: ScrollDirection, amount: u32) -> (i32, Axis) {
    let amount = i32::try_from(amount).unwrap_or(i32::MAX);
    match direction {
        ScrollDirection::Up => (-amount, Axis::Vertical),
        ScrollDirection::Down => (amount, Axis::Vertical),
        ScrollDirection::Left => (-amount, Axis::Horizontal),
        ScrollDirection::Right => (amount, Axis::Horizontal),
    }
}

pub(crate) fn map_key(key: PlatformKey) -> Key {
    match key {
        PlatformKey::Cmd | PlatformKey::Super => Key::Meta,
        PlatformKey::Ctrl => Key::Control,
        PlatformKey::Alt => Key::Alt,
        PlatformKey::Shift => Key::Shift,
        PlatformKey::Enter => Key::Return,
        PlatformKey::Tab => Key::Tab,
        PlatformKey::Escape => Key::Escape,
        PlatformKey::Backspace => Key::Backspace,
        PlatformKey::Delete => Key::Delete,
        PlatformKey::Space => Key::Space,
        PlatformKey::Up => Key::UpArrow,
        PlatformKey::Down => Key::DownArrow,
        PlatformKey::Left => Key::LeftArrow,
        PlatformKey::Right => Key::RightArrow,
        PlatformKey::Home => Key::Home,
        PlatformKey::End => Key::End,
        PlatformKey::PageUp => Key::PageUp,
        PlatformKey::PageDown => Key::PageDown,
        PlatformKey::CapsLock => Key::CapsLock,
        PlatformKey::F(n) => function_key(n),
        PlatformKey::Char(c) => Key::Unicode(c),
    }
}

fn function_key(n: u8) -> Key {
    match n {
        1 => Key::F1,
        2 => Key::F2,
        3 => Key::F3,
        4 => Key::F4,
        5 => Key::F5,
        6 => Key::F6,
        7 => Key::F7,
        8 => Key::F8,
        9 => Key::F9,
        10 => Key::F10,
        11 => Key::F11,
        12 => Key::F12,
        13 => Key::F13,
        14 => Key::F14,
        15 => Key::F15,
        16 => Key::F16,
        17 => Key::F17,
        18 => Key::F18,
        19 => Key::F19,
        _ => Key::F20,
    }
}

/// Holds every key but the last, clicks the last, then releases the held keys
/// in reverse order. Releases are attempted even when a press failed.
fn press_combo(enigo: &mut Enigo, keys: &[PlatformKey]) -> Result<()> {
    let Some((last, held)) = keys.split_last() else {
        return Ok(());
    };

    let mut pressed = Vec::with_capacity(held.len());
    let mut result = Ok(());
    for key in held {
        match enigo.key(map_key(*key), Direction::Press) {
            Ok(()) => pressed.push(*key),
            Err(e) => {
                result = Err(anyhow!("Key press failed: {:?}", e));
                break;
            }
        }
    }
    if result.is_ok() {
        result = enigo
            .key(map_key(*last), Direction::Click)
            .map_err(|e| anyhow!("Key press failed: {:?}", e));
    }
    for key in pressed.iter().rev() {
        if let Err(e) = enigo.key(map_key(*key), Direction::Release) {
            tracing::warn!(target: "operator", key = %key, error = ?e, "Key release failed");
        }
    }
    result
}

/// Types through the clipboard: write, paste, restore.
fn paste_text(enigo: &mut Enigo, text: &str, platform: Platform) -> Result<()> {
    let mut clipboard =
        arboard::Clipboard::new().map_err(|e| anyhow!("Clipboard unavailable: {}", e))?;
    let mut scope = ScopedClipboard::acquire(&mut clipboard);
    scope.write(text)?;

    let modifier = match platform {
        Platform::MacOs => PlatformKey::Cmd,
        _ => PlatformKey::Ctrl,
    };
    press_combo(enigo, &[modifier, PlatformKey::Char('v')])?;
    thread::sleep(PASTE_SETTLE);
    Ok(())
}

#[async_trait]
impl InputBackend for EnigoBackend {
    fn name(&self) -> &str {
        "enigo"
    }

    fn platform(&self) -> Platform {
        self.platform
    }

    async fn perform(&self, event: &InputEvent, ctx: &ExecuteContext) -> Result<(), OperatorError> {
        let enigo = Arc::clone(&self.enigo);
        let (event, ctx) = (event.clone(), *ctx);
        let (platform, paste_typing) = (self.platform, self.paste_typing);
        let op = move || {
            Self::inject(&enigo, &event, &ctx, platform, paste_typing)
                .map_err(|e| OperatorError::Input(e.to_string()))
        };

        // Offload input injection to a blocking thread (Enigo is synchronous).
        if let Ok(handle) = tokio::runtime::Handle::try_current() {
            return handle
                .spawn_blocking(op)
                .await
                .map_err(|e| OperatorError::Input(format!("Task join error: {}", e)))?;
        }
        op()
    }
}
