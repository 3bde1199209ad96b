//! Clipboard access
//!
//! [`WlClipboard`] uses wl-copy / wl-paste, which works on all Wayland
//! compositors. [`MemoryClipboard`] keeps the contents in-process and
//! backs dry runs.
//!
//! Requires: wl-clipboard package installed

use super::ClipboardService;
use crate::error::OutputError;
use std::process::Stdio;
use std::sync::Mutex;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

/// wl-clipboard based clipboard
#[derive(Debug, Default)]
pub struct WlClipboard;

impl WlClipboard {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait::async_trait]
impl ClipboardService for WlClipboard {
    async fn copy(&self, text: &str) -> Result<(), OutputError> {
        // wl-copy reads an empty stdin as "nothing to copy"; clear explicitly
        if text.is_empty() {
            let status = Command::new("wl-copy")
                .arg("--clear")
                .stdout(Stdio::null())
                .stderr(Stdio::null())
                .status()
                .await
                .map_err(|e| copy_spawn_error(&e))?;
            if !status.success() {
                return Err(OutputError::Clipboard("wl-copy --clear failed".to_string()));
            }
            return Ok(());
        }

        // Spawn wl-copy with stdin pipe
        let mut child = Command::new("wl-copy")
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| copy_spawn_error(&e))?;

        // Write text to stdin
        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(text.as_bytes())
                .await
                .map_err(|e| OutputError::Clipboard(e.to_string()))?;

            // Close stdin to signal EOF
            drop(stdin);
        }

        let status = child
            .wait()
            .await
            .map_err(|e| OutputError::Clipboard(e.to_string()))?;

        if !status.success() {
            return Err(OutputError::Clipboard(
                "wl-copy exited with error".to_string(),
            ));
        }

        tracing::trace!("Copied {} chars to clipboard", text.chars().count());
        Ok(())
    }

    async fn paste(&self) -> Result<String, OutputError> {
        let output = Command::new("wl-paste")
            .arg("--no-newline")
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    OutputError::WlPasteNotFound
                } else {
                    OutputError::Clipboard(e.to_string())
                }
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            // wl-paste exits non-zero when the clipboard is empty
            if stderr.contains("No selection") || stderr.contains("Nothing is copied") {
                return Ok(String::new());
            }
            return Err(OutputError::Clipboard(stderr.trim().to_string()));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    fn name(&self) -> &'static str {
        "clipboard (wl-copy)"
    }
}

fn copy_spawn_error(e: &std::io::Error) -> OutputError {
    if e.kind() == std::io::ErrorKind::NotFound {
        OutputError::WlCopyNotFound
    } else {
        OutputError::Clipboard(e.to_string())
    }
}

/// In-process clipboard
#[derive(Debug, Default)]
pub struct MemoryClipboard {
    contents: Mutex<String>,
}

impl MemoryClipboard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current contents, without going through the async trait
    pub fn contents(&self) -> String {
        self.contents
            .lock()
            .map(|c| c.clone())
            .unwrap_or_default()
    }
}

#[async_trait::async_trait]
impl ClipboardService for MemoryClipboard {
    async fn copy(&self, text: &str) -> Result<(), OutputError> {
        let mut contents = self
            .contents
            .lock()
            .map_err(|e| OutputError::Clipboard(e.to_string()))?;
        contents.clear();
        contents.push_str(text);
        Ok(())
    }

    async fn paste(&self) -> Result<String, OutputError> {
        self.contents
            .lock()
            .map(|c| c.clone())
            .map_err(|e| OutputError::Clipboard(e.to_string()))
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_clipboard_round_trip() {
        let clipboard = MemoryClipboard::new();
        assert_eq!(clipboard.paste().await.unwrap(), "");

        clipboard.copy("first").await.unwrap();
        clipboard.copy("second").await.unwrap();
        assert_eq!(clipboard.paste().await.unwrap(), "second");
        assert_eq!(clipboard.contents(), "second");
    }

    #[test]
    fn test_spawn_error_mapping() {
        let missing = std::io::Error::from(std::io::ErrorKind::NotFound);
        assert!(matches!(copy_spawn_error(&missing), OutputError::WlCopyNotFound));

        let denied = std::io::Error::from(std::io::ErrorKind::PermissionDenied);
        assert!(matches!(copy_spawn_error(&denied), OutputError::Clipboard(_)));
    }
}
