//! Typing session
//!
//! Wires one run together: backends from the output config, the engine,
//! the global hotkey listener with its router, and a terminal view of the
//! engine's events. Ctrl+C stops the run the same way a double press does.

use crate::config::{Config, OutputBackend};
use crate::engine::{Engine, EngineEvent};
use crate::error::{AutotyperError, Result};
use crate::hotkey::{self, HotkeyListener};
use crate::job::{SpeedTier, TypingJob};
use crate::output;
use crate::router::SignalRouter;
use crate::state::Phase;

/// Renders engine events on stderr
struct ProgressView {
    quiet: bool,
    /// Per-character progress would interleave with dry-run output on stdout
    show_progress: bool,
    last_message: Option<String>,
}

impl ProgressView {
    fn render(&mut self, event: &EngineEvent, phase: Phase) {
        if let Some(line) = self.line(event, phase) {
            if !self.quiet {
                eprintln!("{}", line);
            }
        }
    }

    /// Terminal line for an event, if it should be shown
    fn line(&mut self, event: &EngineEvent, phase: Phase) -> Option<String> {
        match event {
            EngineEvent::Progress { percent, message } => {
                tracing::trace!("Progress {}%: {}", percent, message);
                (self.show_progress && self.is_new(message)).then(|| message.clone())
            }
            EngineEvent::Status { message, paused } => {
                tracing::info!("Status: {} (paused: {})", message, paused);
                self.is_new(message).then(|| message.clone())
            }
            // The engine records the final phase before it reports Finished
            EngineEvent::Finished { success } => match phase {
                Phase::Finished { .. } => Some(format!("{}.", phase)),
                _ => Some(format!("{}.", Phase::Finished { success: *success })),
            },
        }
    }

    fn is_new(&mut self, message: &str) -> bool {
        if self.last_message.as_deref() == Some(message) {
            return false;
        }
        self.last_message = Some(message.to_string());
        true
    }
}

/// One typing run driven from the command line
pub struct Session {
    config: Config,
    quiet: bool,
}

impl Session {
    pub fn new(config: Config, quiet: bool) -> Self {
        Self { config, quiet }
    }

    /// Type `text` and wait for the run to end.
    ///
    /// Returns whether the whole text was emitted.
    pub async fn run(&self, text: String) -> Result<bool> {
        let job = self.config.job(text)?;
        self.run_job(job).await
    }

    pub async fn run_job(&self, job: TypingJob) -> Result<bool> {
        let backends = output::create_backends(&self.config.output)?;
        tracing::info!(
            "Output: {} (clipboard: {})",
            backends.sink.name(),
            backends.clipboard.name()
        );
        tracing::info!(
            "Mode: {}, speed: {} cpm, {}",
            job.mode(),
            job.speed_cpm(),
            SpeedTier::from_cpm(job.speed_cpm())
        );

        let (engine, mut events) = Engine::new(backends.sink, backends.clipboard);

        // Initialize hotkey listener (if enabled)
        let mut listener = if self.config.hotkey.enabled {
            tracing::info!(
                "Hotkey: {} (press to pause/resume, double press to stop)",
                self.config.hotkey.key
            );
            Some(hotkey::create_listener(&self.config.hotkey)?)
        } else {
            tracing::info!("Built-in hotkey disabled, use Ctrl+C to stop");
            None
        };

        let router_task = match listener.as_mut().map(|l| l.start()) {
            Some(Ok(rx)) => {
                let router = SignalRouter::new(
                    engine.clone(),
                    self.config.hotkey.double_press_threshold(),
                    job.mode().pause_style(),
                    self.config.hotkey.speed_step,
                );
                Some(tokio::spawn(router.run(rx)))
            }
            Some(Err(e)) => {
                tracing::warn!("Hotkey unavailable, use Ctrl+C to stop: {}", e);
                None
            }
            None => None,
        };

        let mut view = ProgressView {
            quiet: self.quiet,
            show_progress: self.config.output.backend != OutputBackend::DryRun,
            last_message: None,
        };

        if !engine.start(job) {
            return Err(AutotyperError::EngineUnavailable(
                "a run is already active or no runtime is available".to_string(),
            ));
        }

        let ctrl_c = tokio::signal::ctrl_c();
        tokio::pin!(ctrl_c);
        let mut interrupted = false;

        let success = loop {
            tokio::select! {
                event = events.recv() => {
                    let Some(event) = event else {
                        tracing::warn!("Engine event channel closed");
                        break false;
                    };
                    view.render(&event, engine.phase());
                    if let EngineEvent::Finished { success } = event {
                        break success;
                    }
                }

                result = &mut ctrl_c, if !interrupted => {
                    interrupted = true;
                    match result {
                        Ok(()) => tracing::info!("Interrupted ({}), stopping", engine.phase()),
                        Err(e) => tracing::warn!("Ctrl+C handler failed: {}", e),
                    }
                    engine.stop();
                }
            }
        };

        if let Some(ref mut listener) = listener {
            if let Err(e) = listener.stop() {
                tracing::warn!("Failed to stop hotkey listener: {}", e);
            }
        }
        if let Some(task) = router_task {
            task.abort();
        }

        Ok(success)
    }
}
