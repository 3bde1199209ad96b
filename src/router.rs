//! Hotkey signal routing
//!
//! Maps raw hotkey presses onto engine control:
//!
//! - one press pauses or resumes (smart or immediate, depending on mode)
//! - two presses within the double-press threshold stop the run
//! - speed keys nudge the live typing speed
//!
//! Presses while nothing is typing are ignored entirely, so the press that
//! precedes a run never pairs up with the first press during it.

use crate::engine::{Engine, SmartPause};
use crate::hotkey::HotkeyEvent;
use crate::job::{PauseStyle, SpeedTier};
use std::time::{Duration, Instant};
use tokio::sync::mpsc;

/// What the router did with an event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouterAction {
    /// No run active
    Ignored,
    Stopped,
    Paused,
    Resumed,
    /// Smart pause requested; takes effect at the next word boundary
    PausePending,
    /// Live speed is now this many cpm
    SpeedChanged(u32),
    /// Speed decrease refused because it would reach zero
    SpeedUnchanged,
}

/// Translates hotkey events into engine calls
pub struct SignalRouter {
    engine: Engine,
    threshold: Duration,
    pause_style: PauseStyle,
    speed_step: u32,
    last_press: Option<Instant>,
}

impl SignalRouter {
    pub fn new(engine: Engine, threshold: Duration, pause_style: PauseStyle, speed_step: u32) -> Self {
        Self {
            engine,
            threshold,
            pause_style,
            speed_step,
            last_press: None,
        }
    }

    /// Handle one event
    pub fn handle(&mut self, event: HotkeyEvent) -> RouterAction {
        if !self.engine.is_running() {
            tracing::trace!("Hotkey {:?} ignored, not typing", event);
            return RouterAction::Ignored;
        }

        match event {
            HotkeyEvent::Pressed { at } => self.on_press(at),
            HotkeyEvent::SpeedUp => {
                let speed = self.engine.speed_up(self.speed_step);
                self.report_speed(speed);
                RouterAction::SpeedChanged(speed)
            }
            HotkeyEvent::SpeedDown => match self.engine.speed_down(self.speed_step) {
                Some(speed) => {
                    self.report_speed(speed);
                    RouterAction::SpeedChanged(speed)
                }
                None => RouterAction::SpeedUnchanged,
            },
        }
    }

    fn on_press(&mut self, at: Instant) -> RouterAction {
        let double = self
            .last_press
            .is_some_and(|prev| at.saturating_duration_since(prev) < self.threshold);
        self.last_press = Some(at);

        if double {
            tracing::info!("Double press, stopping");
            self.engine.stop();
            self.engine.report_status("STOPPED (double press)", false);
            return RouterAction::Stopped;
        }

        match self.pause_style {
            PauseStyle::Smart => match self.engine.toggle_smart_pause() {
                SmartPause::Resumed => {
                    self.engine.report_status("RESUMED", false);
                    RouterAction::Resumed
                }
                SmartPause::Pending => {
                    self.engine.report_status("Pausing at next space...", false);
                    RouterAction::PausePending
                }
            },
            PauseStyle::Immediate => {
                if self.engine.toggle_pause() {
                    self.engine.report_status("PAUSED", true);
                    RouterAction::Paused
                } else {
                    self.engine.report_status("RESUMED", false);
                    RouterAction::Resumed
                }
            }
        }
    }

    fn report_speed(&self, speed: u32) {
        self.engine.report_status(
            format!("Speed: {} cpm ({})", speed, SpeedTier::from_cpm(speed)),
            self.engine.is_paused(),
        );
    }

    /// Route events until the listener channel closes
    pub async fn run(mut self, mut rx: mpsc::Receiver<HotkeyEvent>) {
        while let Some(event) = rx.recv().await {
            let action = self.handle(event);
            tracing::debug!("Hotkey {:?} -> {:?}", event, action);
        }
        tracing::debug!("Hotkey channel closed");
    }
}
