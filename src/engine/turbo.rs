//! Turbo mode: one clipboard copy, one paste

use super::RunContext;
use crate::error::OutputError;
use crate::job::TypingJob;
use crate::output::KeyCommand;

pub(crate) async fn run(ctx: &RunContext, job: &TypingJob) -> Result<(), OutputError> {
    ctx.reporter.progress(0, "Pasting...");

    ctx.clipboard.copy(job.text()).await?;
    tokio::time::sleep(job.timing().clipboard_settle).await;
    ctx.sink.send(KeyCommand::Paste).await?;

    tracing::debug!("Pasted {} chars via {}", job.text().len(), ctx.clipboard.name());
    ctx.reporter.progress(100, "Paste Complete.");
    Ok(())
}
