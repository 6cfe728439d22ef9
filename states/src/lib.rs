//! Reactive state runtime shared by the business layer and its drivers.
//!
//! - `State`: plain values (inputs, UI-affine state)
//! - `Compute`: derived values or command-updated caches
//! - `Command`: manual-only async actions that may perform IO
//!
//! Commands never touch the context directly. They receive a snapshot, run on
//! the tokio runtime and send results back through a [`LatestOnlyUpdater`].

mod command;
mod compute;
mod ctx;
mod dep;
mod error;
mod graph;
mod snapshot;
mod state;
mod task;
mod updater;

pub use command::{Command, CommandFuture};
pub use compute::{Compute, ComputeDeps};
pub use ctx::StateCtx;
pub use dep::Dep;
pub use error::Error;
pub use graph::{DepRoute, Graph, TopologyError};
pub use snapshot::CommandSnapshot;
pub use state::{SnapshotClone, State, state_assign_impl};
pub use task::{TaskHandle, TaskId};
pub use updater::{LatestOnlyUpdater, Updater};
