//! Global hotkey support using rdev
//!
//! rdev's `listen` blocks its thread forever, so it runs on a dedicated OS
//! thread and forwards events into a tokio channel with `blocking_send`.

use super::{HotkeyEvent, HotkeyListener};
use crate::config::HotkeyConfig;
use crate::error::HotkeyError;
use rdev::{listen, EventType, Key};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc;

/// rdev-based hotkey listener
pub struct RdevListener {
    target_key: Key,
    speed_keys: bool,
    running: Arc<AtomicBool>,
    thread_handle: Option<std::thread::JoinHandle<()>>,
}

impl RdevListener {
    /// Create a new rdev hotkey listener
    pub fn new(config: &HotkeyConfig) -> Result<Self, HotkeyError> {
        let target_key = parse_key_name(&config.key)
            .ok_or_else(|| HotkeyError::UnknownKey(config.key.clone()))?;

        Ok(Self {
            target_key,
            speed_keys: config.speed_keys,
            running: Arc::new(AtomicBool::new(false)),
            thread_handle: None,
        })
    }
}

impl HotkeyListener for RdevListener {
    fn start(&mut self) -> Result<mpsc::Receiver<HotkeyEvent>, HotkeyError> {
        if self.thread_handle.is_some() {
            return Err(HotkeyError::Listen("listener already started".to_string()));
        }

        let (tx, rx) = mpsc::channel(32);
        let mut tracker = KeyTracker::new(self.target_key, self.speed_keys);
        let running = self.running.clone();
        running.store(true, Ordering::SeqCst);

        let thread_handle = std::thread::Builder::new()
            .name("autotyper-hotkey".to_string())
            .spawn(move || {
                let running_clone = running.clone();
                let callback = move |event: rdev::Event| {
                    if !running_clone.load(Ordering::SeqCst) {
                        return;
                    }
                    if let Some(hotkey_event) = tracker.on_event(&event.event_type, Instant::now())
                    {
                        let _ = tx.blocking_send(hotkey_event);
                    }
                };

                // This blocks until an error occurs or the process is terminated
                if let Err(e) = listen(callback) {
                    tracing::error!("rdev listen error: {:?}", e);
                    tracing::warn!(
                        "Global hotkey capture failed. Is an X11 or XWayland display available?"
                    );
                    running.store(false, Ordering::SeqCst);
                }
            })
            .map_err(|e| HotkeyError::Listen(e.to_string()))?;

        self.thread_handle = Some(thread_handle);
        Ok(rx)
    }

    fn stop(&mut self) -> Result<(), HotkeyError> {
        self.running.store(false, Ordering::SeqCst);
        // rdev's listen() has no way to stop from another thread; the
        // callback goes quiet and the thread ends with the process
        Ok(())
    }
}

/// Turns raw key events into hotkey events
///
/// Held keys auto-repeat as a stream of presses; only the first press
/// after a release counts.
struct KeyTracker {
    target: Key,
    speed_keys: bool,
    target_down: bool,
    alt_down: bool,
    shift_down: bool,
}

impl KeyTracker {
    fn new(target: Key, speed_keys: bool) -> Self {
        Self {
            target,
            speed_keys,
            target_down: false,
            alt_down: false,
            shift_down: false,
        }
    }

    fn on_event(&mut self, event: &EventType, now: Instant) -> Option<HotkeyEvent> {
        match *event {
            EventType::KeyPress(key) => {
                self.set_modifier(key, true);
                if key == self.target {
                    if self.target_down {
                        return None;
                    }
                    self.target_down = true;
                    return Some(HotkeyEvent::Pressed { at: now });
                }
                if self.speed_keys && self.alt_down && self.shift_down {
                    return match key {
                        Key::Equal | Key::KpPlus => Some(HotkeyEvent::SpeedUp),
                        Key::Minus | Key::KpMinus => Some(HotkeyEvent::SpeedDown),
                        _ => None,
                    };
                }
                None
            }
            EventType::KeyRelease(key) => {
                self.set_modifier(key, false);
                if key == self.target {
                    self.target_down = false;
                }
                None
            }
            _ => None,
        }
    }

    fn set_modifier(&mut self, key: Key, down: bool) {
        match key {
            Key::Alt | Key::AltGr => self.alt_down = down,
            Key::ShiftLeft | Key::ShiftRight => self.shift_down = down,
            _ => {}
        }
    }
}

/// Parse a key name string to rdev Key
pub fn parse_key_name(name: &str) -> Option<Key> {
    match name.to_uppercase().as_str() {
        // Function keys
        "F1" => Some(Key::F1),
        "F2" => Some(Key::F2),
        "F3" => Some(Key::F3),
        "F4" => Some(Key::F4),
        "F5" => Some(Key::F5),
        "F6" => Some(Key::F6),
        "F7" => Some(Key::F7),
        "F8" => Some(Key::F8),
        "F9" => Some(Key::F9),
        "F10" => Some(Key::F10),
        "F11" => Some(Key::F11),
        "F12" => Some(Key::F12),

        // Modifier keys
        "LEFTALT" | "ALT" => Some(Key::Alt),
        "RIGHTALT" | "ALTGR" => Some(Key::AltGr),
        "LEFTCTRL" | "CTRL" | "CONTROL" => Some(Key::ControlLeft),
        "RIGHTCTRL" => Some(Key::ControlRight),
        "LEFTMETA" | "META" | "SUPER" => Some(Key::MetaLeft),
        "RIGHTMETA" => Some(Key::MetaRight),

        // Special keys
        "ESCAPE" | "ESC" => Some(Key::Escape),
        "TAB" => Some(Key::Tab),
        "CAPSLOCK" => Some(Key::CapsLock),

        // Navigation
        "HOME" => Some(Key::Home),
        "END" => Some(Key::End),
        "PAGEUP" => Some(Key::PageUp),
        "PAGEDOWN" => Some(Key::PageDown),

        // Other
        "DELETE" => Some(Key::Delete),
        "INSERT" => Some(Key::Insert),
        "PAUSE" => Some(Key::Pause),
        "SCROLLLOCK" => Some(Key::ScrollLock),
        "PRINTSCREEN" => Some(Key::PrintScreen),
        "NUMLOCK" => Some(Key::NumLock),

        _ => None,
    }
}
