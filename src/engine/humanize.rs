//! Super-human mode
//!
//! Natural typing plus two human traits:
//!
//! - a "thinking" pause after every newline
//! - occasional typos, picked from the keyboard neighbours of the intended
//!   key, which are noticed and fixed with a backspace a moment later
//!
//! The text that ends up in the target window is always the source text.

use super::natural::PROGRESS_EVERY;
use super::pacing::Pacing;
use super::{pause, percent, RunContext};
use crate::error::OutputError;
use crate::job::TypingJob;
use crate::output::KeyCommand;

pub(crate) async fn run(ctx: &RunContext, job: &TypingJob) -> Result<(), OutputError> {
    let timing = job.timing();
    let poll = timing.poll_interval;
    let chars: Vec<char> = job.text().chars().collect();
    let total = chars.len();
    let mut pacing = Pacing::new(job.jitter(), job.seed());

    for (idx, &ch) in chars.iter().enumerate() {
        if pause::hold_while_paused(ctx, poll).await {
            break;
        }

        if ch == '\n' {
            ctx.sink.write('\n').await?;
            pause::settle_smart_pause(ctx, '\n');
            ctx.reporter.progress(percent(idx + 1, total), "Thinking...");
            if ctx.sleep_or_stop(pacing.between(timing.think), poll).await {
                break;
            }
            continue;
        }

        match pick_typo(&mut pacing, job, ch) {
            Some(typo) => {
                ctx.sink.write(typo).await?;

                let delay = pacing.char_delay(ctx.state.speed_cpm());
                if ctx.sleep_or_stop(delay, poll).await {
                    break;
                }
                if ctx.sleep_or_stop(pacing.between(timing.reaction), poll).await {
                    break;
                }
                ctx.sink.send(KeyCommand::Backspace).await?;
                if ctx.sleep_or_stop(pacing.between(timing.correction), poll).await {
                    break;
                }
                ctx.sink.write(ch).await?;
                tracing::info!("Typo corrected: {}->{}", typo, ch);
            }
            None => ctx.sink.write(ch).await?,
        }
        pause::settle_smart_pause(ctx, ch);

        if idx % PROGRESS_EVERY == 0 {
            let pct = percent(idx + 1, total);
            ctx.reporter.progress(pct, format!("Human Mode... {}%", pct));
        }

        let delay = pacing.char_delay(ctx.state.speed_cpm());
        if ctx.sleep_or_stop(delay, poll).await {
            break;
        }
    }
    Ok(())
}

/// Decide whether `ch` gets a typo and which neighbour replaces it
fn pick_typo(pacing: &mut Pacing, job: &TypingJob, ch: char) -> Option<char> {
    if !pacing.chance(job.typo_probability()) {
        return None;
    }
    let neighbors = job.adjacency().neighbors(ch.to_ascii_lowercase())?;
    let typo = pacing.pick(neighbors)?;
    Some(if ch.is_uppercase() {
        typo.to_ascii_uppercase()
    } else {
        typo
    })
}
