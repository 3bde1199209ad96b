//! Natural mode: one keystroke per character with jittered delays
//!
//! Speed is re-read before every delay, so speed hotkeys take effect on
//! the next character.

use super::pacing::Pacing;
use super::{pause, percent, RunContext};
use crate::error::OutputError;
use crate::job::TypingJob;

/// Progress is reported every this many characters
pub(crate) const PROGRESS_EVERY: usize = 10;

pub(crate) async fn run(ctx: &RunContext, job: &TypingJob) -> Result<(), OutputError> {
    let timing = job.timing();
    let chars: Vec<char> = job.text().chars().collect();
    let total = chars.len();
    let mut pacing = Pacing::new(job.jitter(), job.seed());

    for (idx, &ch) in chars.iter().enumerate() {
        if pause::hold_while_paused(ctx, timing.poll_interval).await {
            break;
        }

        ctx.sink.write(ch).await?;
        pause::settle_smart_pause(ctx, ch);

        if idx % PROGRESS_EVERY == 0 {
            let pct = percent(idx + 1, total);
            ctx.reporter.progress(pct, format!("Typing... {}%", pct));
        }

        let delay = pacing.char_delay(ctx.state.speed_cpm());
        if ctx.sleep_or_stop(delay, timing.poll_interval).await {
            break;
        }
    }
    Ok(())
}
