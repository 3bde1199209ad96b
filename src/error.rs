//! Error types for autotyper
//!
//! Uses thiserror for ergonomic error definitions with clear messages
//! that guide users toward fixing common issues.

use thiserror::Error;

/// Top-level error type for the autotyper application
#[derive(Error, Debug)]
pub enum AutotyperError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid typing job: {0}")]
    Job(#[from] JobError),

    #[error("Hotkey error: {0}")]
    Hotkey(#[from] HotkeyError),

    #[error("Output error: {0}")]
    Output(#[from] OutputError),

    #[error("Typing engine could not start: {0}")]
    EngineUnavailable(String),
}

/// Errors raised while validating a typing job
#[derive(Error, Debug, Clone, PartialEq)]
pub enum JobError {
    #[error("Nothing to type: the text is empty")]
    EmptyText,

    #[error("Typing speed must be a positive number of characters per minute (got {0})")]
    InvalidSpeed(u32),

    #[error("Jitter must be between 0.0 and 1.0 (got {0})")]
    InvalidJitter(f64),

    #[error("Typo probability must be between 0.0 and 1.0 (got {0})")]
    InvalidTypoProbability(f64),

    #[error("Invalid timing profile: {0}")]
    InvalidTiming(String),
}

/// Errors related to hotkey detection
#[derive(Error, Debug)]
pub enum HotkeyError {
    #[error("Unknown key name: '{0}'. Examples: ESCAPE, PAUSE, SCROLLLOCK, F8")]
    UnknownKey(String),

    #[error("Global key listener failed: {0}\n  On Wayland, run under XWayland or disable the hotkey with --no-hotkey.")]
    Listen(String),
}

/// Errors related to keystroke and clipboard injection
#[derive(Error, Debug)]
pub enum OutputError {
    #[error("ydotool daemon not running.\n  Start with: systemctl --user start ydotool\n  Enable at boot: systemctl --user enable ydotool")]
    YdotoolNotRunning,

    #[error("ydotool not found in PATH. Install via your package manager.")]
    YdotoolNotFound,

    #[error("wtype not found in PATH. Install via your package manager.")]
    WtypeNotFound,

    #[error("wl-copy not found in PATH. Install wl-clipboard via your package manager.")]
    WlCopyNotFound,

    #[error("wl-paste not found in PATH. Install wl-clipboard via your package manager.")]
    WlPasteNotFound,

    #[error("Keystroke injection failed: {0}")]
    InjectionFailed(String),

    #[error("Key command {0} failed: {1}")]
    KeyFailed(String, String),

    #[error("Clipboard operation failed: {0}")]
    Clipboard(String),

    #[error("No keystroke backend available. Install wtype or ydotool, or use --dry-run.")]
    NoBackendAvailable,
}

/// Result type alias using AutotyperError
pub type Result<T> = std::result::Result<T, AutotyperError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_error_converts_to_top_level() {
        let err: AutotyperError = OutputError::NoBackendAvailable.into();
        assert!(matches!(err, AutotyperError::Output(_)));
        assert!(err.to_string().contains("--dry-run"));
    }

    #[test]
    fn test_engine_unavailable_message() {
        let err = AutotyperError::EngineUnavailable("a run is already active".to_string());
        assert_eq!(
            err.to_string(),
            "Typing engine could not start: a run is already active"
        );
    }
}
