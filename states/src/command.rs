use std::future::Future;
use std::pin::Pin;

use tokio_util::sync::CancellationToken;

use crate::{CommandSnapshot, LatestOnlyUpdater};

pub type CommandFuture = Pin<Box<dyn Future<Output = ()> + Send>>;

/// A manual-only action that may perform IO.
///
/// Commands never run implicitly. They are enqueued, then launched by
/// [`crate::StateCtx::flush_commands`] with a snapshot of the current state.
/// Launching a command cancels the previous run of the same command type.
pub trait Command: Send + Sync + 'static {
    fn run(
        &self,
        snap: CommandSnapshot,
        updater: LatestOnlyUpdater,
        cancel: CancellationToken,
    ) -> CommandFuture;
}
