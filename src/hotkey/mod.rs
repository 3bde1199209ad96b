//! Hotkey detection module
//!
//! A global keyboard hook (rdev) watches one designated key, Escape by
//! default. Each press is forwarded with its timestamp; the router decides
//! whether it was a single press (pause/resume) or a double press (stop).
//! Optional speed keys (Alt+Shift+= and Alt+Shift+-) adjust the typing
//! speed while a run is active.
//!
//! On Linux the hook uses X11 (XRecord), so it sees keys pressed in X11 and
//! XWayland windows.

pub mod rdev_listener;

use crate::config::HotkeyConfig;
use crate::error::HotkeyError;
use std::time::Instant;
use tokio::sync::mpsc;

/// Events emitted by the hotkey listener
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HotkeyEvent {
    /// The hotkey was pressed at `at`
    Pressed { at: Instant },
    /// Alt+Shift+= was pressed
    SpeedUp,
    /// Alt+Shift+- was pressed
    SpeedDown,
}

/// Trait for hotkey detection implementations
pub trait HotkeyListener: Send {
    /// Start listening for hotkey events
    /// Returns a channel receiver for events
    fn start(&mut self) -> Result<mpsc::Receiver<HotkeyEvent>, HotkeyError>;

    /// Stop listening
    fn stop(&mut self) -> Result<(), HotkeyError>;
}

/// Factory function to create the hotkey listener
pub fn create_listener(config: &HotkeyConfig) -> Result<Box<dyn HotkeyListener>, HotkeyError> {
    Ok(Box::new(rdev_listener::RdevListener::new(config)?))
}
