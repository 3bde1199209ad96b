//! Block mode: paste the text one line at a time
//!
//! Every line is pasted, empty ones included, and Enter is pressed between
//! lines. No Enter follows the last line. Pauses take effect between lines;
//! a stop is honoured at every wait, so nothing is pasted or entered after it.

use super::{pause, percent, RunContext};
use crate::error::OutputError;
use crate::job::TypingJob;
use crate::output::KeyCommand;

pub(crate) async fn run(ctx: &RunContext, job: &TypingJob) -> Result<(), OutputError> {
    let timing = job.timing();
    let lines: Vec<&str> = job.text().split('\n').collect();
    let total = lines.len();

    for (idx, line) in lines.iter().enumerate() {
        if pause::hold_at_line(ctx, timing.poll_interval).await {
            break;
        }

        ctx.clipboard.copy(line).await?;
        if ctx.sleep_or_stop(timing.clipboard_settle, timing.poll_interval).await {
            break;
        }
        ctx.sink.send(KeyCommand::Paste).await?;

        if idx + 1 < total {
            if ctx.sleep_or_stop(timing.clipboard_settle, timing.poll_interval).await {
                break;
            }
            ctx.sink.send(KeyCommand::Enter).await?;
        }

        let pct = percent(idx + 1, total);
        ctx.reporter
            .progress(pct, format!("Line {}/{}", idx + 1, total));

        if ctx.sleep_or_stop(timing.line_delay, timing.poll_interval).await {
            break;
        }
    }
    Ok(())
}
