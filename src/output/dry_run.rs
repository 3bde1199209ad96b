//! Dry-run keystroke output
//!
//! Echoes what would be typed to stdout instead of injecting keystrokes.
//! Backspace erases the previous character on the terminal, so super-human
//! corrections are visible in real time.

use super::clipboard::MemoryClipboard;
use super::{KeyCommand, KeystrokeSink};
use crate::error::OutputError;
use std::io::Write;
use std::sync::Arc;

/// Terminal echo sink
pub struct DryRunSink {
    clipboard: Arc<MemoryClipboard>,
}

impl DryRunSink {
    /// Create a dry-run sink that pastes from the given in-memory clipboard
    pub fn new(clipboard: Arc<MemoryClipboard>) -> Self {
        Self { clipboard }
    }

    fn render(&self, key: KeyCommand) -> String {
        match key {
            KeyCommand::Enter => "\n".to_string(),
            KeyCommand::Backspace => "\u{8} \u{8}".to_string(),
            KeyCommand::Paste => self.clipboard.contents(),
        }
    }

    fn emit(text: &str) -> Result<(), OutputError> {
        let mut stdout = std::io::stdout().lock();
        stdout
            .write_all(text.as_bytes())
            .and_then(|_| stdout.flush())
            .map_err(|e| OutputError::InjectionFailed(e.to_string()))
    }
}

#[async_trait::async_trait]
impl KeystrokeSink for DryRunSink {
    async fn write(&self, ch: char) -> Result<(), OutputError> {
        let mut buf = [0u8; 4];
        Self::emit(ch.encode_utf8(&mut buf))
    }

    async fn send(&self, key: KeyCommand) -> Result<(), OutputError> {
        Self::emit(&self.render(key))
    }

    fn is_available(&self) -> bool {
        true
    }

    fn name(&self) -> &'static str {
        "dry-run"
    }
}
