//! Pause and stop checkpoints
//!
//! Every wait inside a run goes through [`sleep_unless_stopped`], which
//! sleeps in poll-sized slices so a stop request is honoured within one
//! poll interval even in the middle of a long thinking pause.

use super::RunContext;
use crate::state::{EngineState, Phase};
use std::time::Duration;

/// Characters at which a pending smart pause takes effect
pub(crate) fn is_word_boundary(ch: char) -> bool {
    matches!(ch, ' ' | '\t' | '\n')
}

/// Sleep for `duration`; returns true if a stop was requested
pub(crate) async fn sleep_unless_stopped(
    state: &EngineState,
    duration: Duration,
    poll: Duration,
) -> bool {
    let mut remaining = duration;
    while !remaining.is_zero() {
        if state.is_stop_requested() {
            return true;
        }
        let slice = remaining.min(poll);
        tokio::time::sleep(slice).await;
        remaining -= slice;
    }
    state.is_stop_requested()
}

/// Hold while the pause flag is set; returns true if the run must stop.
///
/// Called before every keystroke (natural modes) and every line (block).
pub(crate) async fn hold_while_paused(ctx: &RunContext, poll: Duration) -> bool {
    if ctx.state.is_stop_requested() {
        return true;
    }
    if !ctx.state.is_paused() {
        return false;
    }

    tracing::debug!("Holding for pause");
    ctx.state.set_phase(Phase::Paused);
    while ctx.state.is_paused() {
        if ctx.state.is_stop_requested() {
            return true;
        }
        tokio::time::sleep(poll).await;
    }
    ctx.state.set_phase(Phase::Emitting);
    ctx.state.is_stop_requested()
}

/// Line-boundary checkpoint for block mode: any pending pause applies here
pub(crate) async fn hold_at_line(ctx: &RunContext, poll: Duration) -> bool {
    if ctx.state.promote_pending_pause() {
        ctx.reporter.status("PAUSED", true);
    }
    hold_while_paused(ctx, poll).await
}

/// After `emitted` was written, turn a pending smart pause into a real one
/// if the character ended a word.
pub(crate) fn settle_smart_pause(ctx: &RunContext, emitted: char) {
    if is_word_boundary(emitted) && ctx.state.promote_pending_pause() {
        tracing::info!("Paused at word boundary");
        ctx.reporter.status("PAUSED (Smart)", true);
    }
}
