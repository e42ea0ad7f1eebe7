use clipboard_rs::{Clipboard, ClipboardContext};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClipboardError {
    #[error("clipboard unavailable: {0}")]
    Unavailable(String),
    #[error("failed to write clipboard: {0}")]
    Write(String),
}

/// Destination for copied text.
pub trait ClipboardSink {
    fn set_text(&mut self, text: &str) -> Result<(), ClipboardError>;
}

/// The OS clipboard. A context is opened per copy, since copies are rare.
#[derive(Default)]
pub struct SystemClipboard;

impl ClipboardSink for SystemClipboard {
    fn set_text(&mut self, text: &str) -> Result<(), ClipboardError> {
        let ctx = ClipboardContext::new().map_err(|e| ClipboardError::Unavailable(e.to_string()))?;
        ctx.set_text(text.to_string())
            .map_err(|e| ClipboardError::Write(e.to_string()))
    }
}
