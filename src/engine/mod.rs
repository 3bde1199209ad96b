//! Emission engine
//!
//! Owns the typing state, runs one job at a time on a background task and
//! reports progress through [`EngineEvent`]s.
//!
//! ```text
//!   start(job) ──▶ Countdown ──▶ Emitting ──▶ Finished(success)
//!                     │             ▲  │
//!                     │      resume │  │ pause
//!                     │             │  ▼
//!                     │            Paused
//!                     └── stop ──────────────▶ Finished(false)
//! ```
//!
//! The handle is cheap to clone; the hotkey router and the CLI session each
//! hold one. All control methods only flip flags; the worker notices them
//! at the next keystroke or poll tick.

mod block;
mod humanize;
mod natural;
mod pacing;
mod pause;
mod turbo;

use crate::job::{TypingJob, TypingMode};
use crate::output::{ClipboardService, KeystrokeSink};
use crate::state::{EngineState, Phase};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

pub use pacing::Pacing;

/// Notifications pushed to whoever observes the engine
#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    /// Run progress (0-100) with a human-readable message
    Progress { percent: u8, message: String },
    /// State changed from outside the worker (hotkey) or by a smart pause
    Status { message: String, paused: bool },
    /// The run ended; sent exactly once per accepted `start`
    Finished { success: bool },
}

/// Result of a smart pause toggle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SmartPause {
    /// Was paused, typing resumes immediately
    Resumed,
    /// Typing continues until the next word boundary, then pauses
    Pending,
}

/// Sends engine events, ignoring a dropped receiver
#[derive(Clone)]
pub(crate) struct Reporter {
    tx: mpsc::UnboundedSender<EngineEvent>,
}

impl Reporter {
    pub(crate) fn progress(&self, percent: u8, message: impl Into<String>) {
        let _ = self.tx.send(EngineEvent::Progress {
            percent,
            message: message.into(),
        });
    }

    pub(crate) fn status(&self, message: impl Into<String>, paused: bool) {
        let _ = self.tx.send(EngineEvent::Status {
            message: message.into(),
            paused,
        });
    }

    fn finished(&self, success: bool) {
        let _ = self.tx.send(EngineEvent::Finished { success });
    }
}

/// Everything a strategy needs while it runs
#[derive(Clone)]
pub(crate) struct RunContext {
    pub(crate) state: Arc<EngineState>,
    pub(crate) sink: Arc<dyn KeystrokeSink>,
    pub(crate) clipboard: Arc<dyn ClipboardService>,
    pub(crate) reporter: Reporter,
}

impl RunContext {
    /// Sleep in poll-sized slices; true if a stop was requested meanwhile
    pub(crate) async fn sleep_or_stop(&self, duration: Duration, poll: Duration) -> bool {
        pause::sleep_unless_stopped(&self.state, duration, poll).await
    }
}

/// Integer percentage of `done` out of `total`, clamped to 100
pub(crate) fn percent(done: usize, total: usize) -> u8 {
    ((done * 100) / total.max(1)).min(100) as u8
}

/// Handle to the typing engine
#[derive(Clone)]
pub struct Engine {
    state: Arc<EngineState>,
    sink: Arc<dyn KeystrokeSink>,
    clipboard: Arc<dyn ClipboardService>,
    reporter: Reporter,
}

impl Engine {
    /// Create an engine and the receiver for its events
    pub fn new(
        sink: Arc<dyn KeystrokeSink>,
        clipboard: Arc<dyn ClipboardService>,
    ) -> (Self, mpsc::UnboundedReceiver<EngineEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let engine = Self {
            state: Arc::new(EngineState::new()),
            sink,
            clipboard,
            reporter: Reporter { tx },
        };
        (engine, rx)
    }

    /// Start typing `job` on a background task.
    ///
    /// Returns immediately. Returns false (and does nothing) if a run is
    /// still active or no Tokio runtime is available.
    pub fn start(&self, job: TypingJob) -> bool {
        let handle = match tokio::runtime::Handle::try_current() {
            Ok(handle) => handle,
            Err(e) => {
                tracing::error!("Cannot start typing outside a Tokio runtime: {}", e);
                return false;
            }
        };

        if !self.state.try_begin(job.speed_cpm()) {
            tracing::debug!("Start ignored, a typing run is already active");
            return false;
        }

        tracing::info!(
            "Typing started: {} chars, mode {}, {} cpm",
            job.text().chars().count(),
            job.mode(),
            job.speed_cpm()
        );
        self.state.set_phase(Phase::Countdown {
            remaining: job.timing().countdown_ticks,
        });

        let ctx = RunContext {
            state: self.state.clone(),
            sink: self.sink.clone(),
            clipboard: self.clipboard.clone(),
            reporter: self.reporter.clone(),
        };
        handle.spawn(run_job(ctx, job));
        true
    }

    /// Request the active run to stop. Idempotent.
    pub fn stop(&self) {
        if self.state.is_worker_active() && !self.state.is_stop_requested() {
            tracing::info!("Stop requested");
        }
        self.state.request_stop();
    }

    /// Flip the immediate pause flag; returns the new paused state
    pub fn toggle_pause(&self) -> bool {
        let paused = !self.state.is_paused();
        self.state.set_paused(paused);
        self.state.set_pause_pending(false);
        tracing::info!("Toggle pause: {}", paused);
        paused
    }

    /// Resume if paused, otherwise pause at the next word boundary
    pub fn toggle_smart_pause(&self) -> SmartPause {
        if self.state.is_paused() {
            self.state.set_paused(false);
            self.state.set_pause_pending(false);
            tracing::info!("Resumed");
            SmartPause::Resumed
        } else {
            self.state.set_pause_pending(true);
            tracing::info!("Pause pending (smart pause)");
            SmartPause::Pending
        }
    }

    /// Raise the live typing speed by `step` cpm; returns the new speed
    pub fn speed_up(&self, step: u32) -> u32 {
        let speed = self.state.speed_cpm().saturating_add(step);
        self.state.set_speed_cpm(speed);
        tracing::info!("Speed up: {} cpm", speed);
        speed
    }

    /// Lower the live typing speed by `step` cpm.
    ///
    /// Returns None (and keeps the speed) if the result would not be positive.
    pub fn speed_down(&self, step: u32) -> Option<u32> {
        let current = self.state.speed_cpm();
        if current <= step {
            return None;
        }
        let speed = current - step;
        self.state.set_speed_cpm(speed);
        tracing::info!("Speed down: {} cpm", speed);
        Some(speed)
    }

    /// Push a status message to the observer
    pub fn report_status(&self, message: impl Into<String>, paused: bool) {
        self.reporter.status(message, paused);
    }

    pub fn is_running(&self) -> bool {
        self.state.is_running()
    }

    pub fn is_paused(&self) -> bool {
        self.state.is_paused()
    }

    pub fn is_pause_pending(&self) -> bool {
        self.state.is_pause_pending()
    }

    pub fn speed_cpm(&self) -> u32 {
        self.state.speed_cpm()
    }

    pub fn phase(&self) -> Phase {
        self.state.phase()
    }
}

/// Worker body: countdown, strategy, completion
async fn run_job(ctx: RunContext, job: TypingJob) {
    let success = if countdown(&ctx, &job).await {
        ctx.reporter.progress(0, "Typing...");
        ctx.state.set_phase(Phase::Emitting);
        emit(ctx.clone(), job).await
    } else {
        tracing::info!("Stopped during countdown");
        false
    };

    tracing::info!(
        "Typing {}",
        if success { "finished" } else { "stopped" }
    );
    ctx.state.finish(success);
    ctx.reporter.finished(success);
}

/// Give the operator time to focus the target window.
///
/// Returns false if a stop was requested before the countdown ended.
async fn countdown(ctx: &RunContext, job: &TypingJob) -> bool {
    let timing = job.timing();
    for remaining in (1..=timing.countdown_ticks).rev() {
        if ctx.state.is_stop_requested() {
            return false;
        }
        ctx.state.set_phase(Phase::Countdown { remaining });
        ctx.reporter.progress(
            0,
            format!("Starting in {}s... SWITCH WINDOW!", remaining),
        );
        if ctx
            .sleep_or_stop(timing.countdown_tick, timing.poll_interval)
            .await
        {
            return false;
        }
    }
    !ctx.state.is_stop_requested()
}

/// Run the mode's strategy on its own task so a panic in a backend
/// becomes an unsuccessful finish instead of taking the worker down.
async fn emit(ctx: RunContext, job: TypingJob) -> bool {
    let state = ctx.state.clone();
    let mode = job.mode();
    let task = tokio::spawn(async move {
        match mode {
            TypingMode::Turbo => turbo::run(&ctx, &job).await,
            TypingMode::Block => block::run(&ctx, &job).await,
            TypingMode::Natural => natural::run(&ctx, &job).await,
            TypingMode::SuperHuman => humanize::run(&ctx, &job).await,
        }
    });

    match task.await {
        Ok(Ok(())) => !state.is_stop_requested(),
        Ok(Err(e)) => {
            tracing::error!("Typing failed: {}", e);
            false
        }
        Err(e) => {
            tracing::error!("Typing task aborted: {}", e);
            false
        }
    }
}
