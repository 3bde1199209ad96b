//! Keystroke and clipboard backends
//!
//! The engine talks to the outside world through two narrow traits:
//! [`KeystrokeSink`] for typed characters and key commands, and
//! [`ClipboardService`] for the paste-based strategies.
//!
//! Backend selection for `backend = "auto"`:
//! 1. wtype - Wayland-native, no daemon needed (only when WAYLAND_DISPLAY is set)
//! 2. ydotool - Works on X11/Wayland/TTY, requires daemon
//!
//! Clipboard access always goes through wl-clipboard, except in dry-run
//! mode where an in-memory clipboard is used.

pub mod clipboard;
pub mod dry_run;
pub mod wtype;
pub mod ydotool;

use crate::config::{OutputBackend, OutputConfig};
use crate::error::OutputError;
use std::fmt;
use std::process::Stdio;
use std::sync::Arc;
use tokio::process::Command;

/// Named keys and key combinations the strategies need
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyCommand {
    Enter,
    Backspace,
    /// Ctrl+V
    Paste,
}

impl fmt::Display for KeyCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyCommand::Enter => write!(f, "Enter"),
            KeyCommand::Backspace => write!(f, "Backspace"),
            KeyCommand::Paste => write!(f, "Ctrl+V"),
        }
    }
}

/// Injects input into whatever window holds keyboard focus
#[async_trait::async_trait]
pub trait KeystrokeSink: Send + Sync {
    /// Type a single character
    async fn write(&self, ch: char) -> Result<(), OutputError>;

    /// Press a named key or key combination
    async fn send(&self, key: KeyCommand) -> Result<(), OutputError>;

    /// Check if this backend can be used on this system
    fn is_available(&self) -> bool;

    /// Human-readable name for logging
    fn name(&self) -> &'static str;
}

/// Shared system clipboard
#[async_trait::async_trait]
pub trait ClipboardService: Send + Sync {
    /// Replace the clipboard contents
    async fn copy(&self, text: &str) -> Result<(), OutputError>;

    /// Read the current clipboard contents
    async fn paste(&self) -> Result<String, OutputError>;

    /// Human-readable name for logging
    fn name(&self) -> &'static str;
}

/// The backends a session types through
#[derive(Clone)]
pub struct Backends {
    pub sink: Arc<dyn KeystrokeSink>,
    pub clipboard: Arc<dyn ClipboardService>,
}

/// Pick the keystroke and clipboard backends for the configured output
pub fn create_backends(config: &OutputConfig) -> Result<Backends, OutputError> {
    if config.backend == OutputBackend::DryRun {
        let clipboard = Arc::new(clipboard::MemoryClipboard::new());
        let sink = Arc::new(dry_run::DryRunSink::new(clipboard.clone()));
        return Ok(Backends { sink, clipboard });
    }

    let sink = select_sink(config.backend, wayland_session())?;
    tracing::debug!("Keystroke backend: {}", sink.name());

    Ok(Backends {
        sink,
        clipboard: Arc::new(clipboard::WlClipboard::new()),
    })
}

fn wayland_session() -> bool {
    std::env::var_os("WAYLAND_DISPLAY").is_some()
}

fn candidate_sinks(backend: OutputBackend, wayland: bool) -> Vec<Arc<dyn KeystrokeSink>> {
    match backend {
        OutputBackend::Wtype => vec![Arc::new(wtype::WtypeSink::new())],
        OutputBackend::Ydotool => vec![Arc::new(ydotool::YdotoolSink::new())],
        OutputBackend::Auto | OutputBackend::DryRun => {
            let mut chain: Vec<Arc<dyn KeystrokeSink>> = Vec::new();
            // wtype only works inside a Wayland session
            if wayland {
                chain.push(Arc::new(wtype::WtypeSink::new()));
            }
            chain.push(Arc::new(ydotool::YdotoolSink::new()));
            chain
        }
    }
}

/// Return the first available sink of the candidate chain
fn select_sink(
    backend: OutputBackend,
    wayland: bool,
) -> Result<Arc<dyn KeystrokeSink>, OutputError> {
    for sink in candidate_sinks(backend, wayland) {
        if sink.is_available() {
            return Ok(sink);
        }
        tracing::debug!("{} not available, trying next", sink.name());
    }
    Err(OutputError::NoBackendAvailable)
}

/// Check whether a helper binary is on PATH
pub(crate) fn tool_available(tool: &str) -> bool {
    which::which(tool).is_ok()
}

/// Run a helper command to completion, mapping spawn and exit failures
pub(crate) async fn run_tool(
    cmd: &mut Command,
    not_found: OutputError,
) -> Result<(), OutputError> {
    let output = cmd
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .output()
        .await
        .map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                not_found
            } else {
                OutputError::InjectionFailed(e.to_string())
            }
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(OutputError::InjectionFailed(stderr.trim().to_string()));
    }

    Ok(())
}
