// Path: crates/marionette-drivers/src/gui/clipboard.rs

//! Scoped clipboard access for paste-based typing.
//!
//! The clipboard is a process-wide OS resource shared with the user. Any
//! mutation goes through `ScopedClipboard`, which snapshots the prior content
//! and puts it back when dropped, on success and failure alike. Content that
//! could not be read is never cleared.

use anyhow::{anyhow, Result};
use std::borrow::Cow;

/// An RGBA bitmap held on the clipboard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClipImage {
    pub width: usize,
    pub height: usize,
    pub bytes: Vec<u8>,
}

/// Clipboard surface used by `ScopedClipboard`, implemented for `arboard::Clipboard`.
///
/// Reads return `Ok(None)` only when the clipboard positively holds no content
/// of that format.
pub trait ClipboardStore {
    fn read_text(&mut self) -> Result<Option<String>>;
    fn read_image(&mut self) -> Result<Option<ClipImage>>;
    fn write_text(&mut self, text: &str) -> Result<()>;
    fn write_image(&mut self, image: &ClipImage) -> Result<()>;
    fn clear(&mut self) -> Result<()>;
}

impl ClipboardStore for arboard::Clipboard {
    fn read_text(&mut self) -> Result<Option<String>> {
        match self.get_text() {
            Ok(text) => Ok(Some(text)),
            Err(arboard::Error::ContentNotAvailable) => Ok(None),
            Err(e) => Err(anyhow!("Clipboard read failed: {}", e)),
        }
    }

    fn read_image(&mut self) -> Result<Option<ClipImage>> {
        match self.get_image() {
            Ok(image) => Ok(Some(ClipImage {
                width: image.width,
                height: image.height,
                bytes: image.bytes.into_owned(),
            })),
            Err(arboard::Error::ContentNotAvailable) => Ok(None),
            Err(e) => Err(anyhow!("Clipboard image read failed: {}", e)),
        }
    }

    fn write_text(&mut self, text: &str) -> Result<()> {
        self.set_text(text.to_owned())
            .map_err(|e| anyhow!("Clipboard write failed: {}", e))
    }

    fn write_image(&mut self, image: &ClipImage) -> Result<()> {
        self.set_image(arboard::ImageData {
            width: image.width,
            height: image.height,
            bytes: Cow::Borrowed(&image.bytes),
        })
        .map_err(|e| anyhow!("Clipboard image write failed: {}", e))
    }

    fn clear(&mut self) -> Result<()> {
        arboard::Clipboard::clear(self).map_err(|e| anyhow!("Clipboard clear failed: {}", e))
    }
}

/// What the clipboard held before the paste.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Snapshot {
    Text(String),
    Image(ClipImage),
    /// Confirmed to hold neither text nor an image.
    Empty,
    /// The read failed; the prior content is unknown.
    Unknown,
}

impl Snapshot {
    /// Reads text first, then an image.
    pub fn take<S: ClipboardStore>(store: &mut S) -> Self {
        match store.read_text() {
            Ok(Some(text)) => return Self::Text(text),
            Ok(None) => {}
            Err(e) => {
                tracing::warn!(target: "operator", error = %e, "Could not snapshot clipboard text");
                return Self::Unknown;
            }
        }
        match store.read_image() {
            Ok(Some(image)) => Self::Image(image),
            Ok(None) => Self::Empty,
            Err(e) => {
                tracing::warn!(target: "operator", error = %e, "Could not snapshot clipboard image");
                Self::Unknown
            }
        }
    }
}

/// Holds the clipboard for the duration of one paste and restores it on drop.
pub struct ScopedClipboard<'a, S: ClipboardStore> {
    store: &'a mut S,
    original: Snapshot,
}

impl<'a, S: ClipboardStore> ScopedClipboard<'a, S> {
    pub fn acquire(store: &'a mut S) -> Self {
        let original = Snapshot::take(store);
        Self { store, original }
    }

    pub fn original(&self) -> &Snapshot {
        &self.original
    }

    pub fn write(&mut self, text: &str) -> Result<()> {
        self.store.write_text(text)
    }
}

impl<S: ClipboardStore> Drop for ScopedClipboard<'_, S> {
    fn drop(&mut self) {
        let restored = match std::mem::replace(&mut self.original, Snapshot::Unknown) {
            Snapshot::Text(text) => self.store.write_text(&text),
            Snapshot::Image(image) => self.store.write_image(&image),
            Snapshot::Empty => self.store.clear(),
            Snapshot::Unknown => {
                tracing::warn!(
                    target: "operator",
                    "Prior clipboard content was unreadable; leaving pasted text in place"
                );
                Ok(())
            }
        };
        if let Err(e) = restored {
            tracing::warn!(target: "operator", error = %e, "Failed to restore clipboard");
        }
    }
}
