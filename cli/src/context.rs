//! State context helpers shared by every subcommand.

use keeper_business::{Notifications, ToastLevel};
use keeper_states::StateCtx;
use tracing::instrument;

use crate::output::Output;

/// Flush commands and await all spawned tasks, timed under `--timing`.
#[instrument(skip_all, name = "flush", fields(queued = ctx.queued_count()))]
pub async fn flush_and_await(ctx: &mut StateCtx) {
    ctx.flush_and_await().await;
}

/// Print and clear queued notifications.
pub fn print_notifications(ctx: &mut StateCtx, out: &Output) {
    for toast in ctx.state_mut::<Notifications>().drain() {
        match toast.level {
            ToastLevel::Success => out.success(&toast.message),
            ToastLevel::Warning => out.warning(&toast.message),
            ToastLevel::Error => out.error(&toast.message),
        }
    }
}

/// Drop queued notifications whose message already travels in an error.
pub fn clear_notifications(ctx: &mut StateCtx) {
    drop(ctx.state_mut::<Notifications>().drain());
}
