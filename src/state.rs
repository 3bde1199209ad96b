//! Shared engine state
//!
//! The flags are written from outside the worker (hotkey router, CLI) and
//! read by the worker on every keystroke or poll tick. Each flag is an
//! atomic so the worker never sees a torn value; the worst case is one
//! extra poll interval of latency.
//!
//! Run lifecycle: Idle → Countdown → Emitting → {Paused} → Emitting → Finished

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Mutex;

/// Coarse run phase, shown by the terminal view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    /// No run has been started
    #[default]
    Idle,
    /// Waiting for the operator to focus the target window
    Countdown {
        /// Seconds left before the first keystroke
        remaining: u32,
    },
    /// Keystrokes are being sent
    Emitting,
    /// Held by a pause request
    Paused,
    /// The run ended
    Finished {
        /// Whether the whole text was emitted without a stop request
        success: bool,
    },
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Idle => write!(f, "Idle"),
            Phase::Countdown { remaining } => write!(f, "Starting in {}s", remaining),
            Phase::Emitting => write!(f, "Typing"),
            Phase::Paused => write!(f, "Paused"),
            Phase::Finished { success: true } => write!(f, "Done"),
            Phase::Finished { success: false } => write!(f, "Stopped"),
        }
    }
}

/// Flags shared between the engine handle and its worker
#[derive(Debug, Default)]
pub struct EngineState {
    running: AtomicBool,
    paused: AtomicBool,
    pause_pending: AtomicBool,
    stop_requested: AtomicBool,
    worker_active: AtomicBool,
    speed_cpm: AtomicU32,
    phase: Mutex<Phase>,
}

impl EngineState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim the worker slot and reset every flag for a new run.
    ///
    /// Returns false if a worker is still alive, in which case nothing changes.
    pub(crate) fn try_begin(&self, speed_cpm: u32) -> bool {
        if self
            .worker_active
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return false;
        }
        self.paused.store(false, Ordering::SeqCst);
        self.pause_pending.store(false, Ordering::SeqCst);
        self.stop_requested.store(false, Ordering::SeqCst);
        self.speed_cpm.store(speed_cpm, Ordering::SeqCst);
        self.running.store(true, Ordering::SeqCst);
        true
    }

    /// Release the worker slot once the run loop has terminated
    pub(crate) fn finish(&self, success: bool) {
        self.running.store(false, Ordering::SeqCst);
        self.paused.store(false, Ordering::SeqCst);
        self.pause_pending.store(false, Ordering::SeqCst);
        self.stop_requested.store(false, Ordering::SeqCst);
        self.set_phase(Phase::Finished { success });
        self.worker_active.store(false, Ordering::SeqCst);
    }

    pub(crate) fn request_stop(&self) {
        self.stop_requested.store(true, Ordering::SeqCst);
        self.paused.store(false, Ordering::SeqCst);
        self.pause_pending.store(false, Ordering::SeqCst);
        self.running.store(false, Ordering::SeqCst);
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    pub fn is_paused(&self) -> bool {
        self.paused.load(Ordering::SeqCst)
    }

    pub fn is_pause_pending(&self) -> bool {
        self.pause_pending.load(Ordering::SeqCst)
    }

    pub fn is_stop_requested(&self) -> bool {
        self.stop_requested.load(Ordering::SeqCst)
    }

    pub fn is_worker_active(&self) -> bool {
        self.worker_active.load(Ordering::SeqCst)
    }

    pub(crate) fn set_paused(&self, paused: bool) {
        self.paused.store(paused, Ordering::SeqCst);
    }

    pub(crate) fn set_pause_pending(&self, pending: bool) {
        self.pause_pending.store(pending, Ordering::SeqCst);
    }

    /// Turn a pending smart pause into a real one.
    ///
    /// Returns true if a pending pause was converted.
    pub(crate) fn promote_pending_pause(&self) -> bool {
        if self
            .pause_pending
            .compare_exchange(true, false, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
        {
            self.paused.store(true, Ordering::SeqCst);
            return true;
        }
        false
    }

    pub fn speed_cpm(&self) -> u32 {
        self.speed_cpm.load(Ordering::SeqCst)
    }

    pub(crate) fn set_speed_cpm(&self, cpm: u32) {
        self.speed_cpm.store(cpm, Ordering::SeqCst);
    }

    pub fn phase(&self) -> Phase {
        self.phase.lock().map(|p| *p).unwrap_or_default()
    }

    pub(crate) fn set_phase(&self, phase: Phase) {
        if let Ok(mut current) = self.phase.lock() {
            *current = phase;
        }
    }
}
