//! Task bookkeeping for launched commands.
//!
//! - `TaskId`: command `TypeId` plus the generation of that run
//! - `TaskHandle`: a `TaskId` with the `CancellationToken` the run observes
//!
//! The context keeps one handle per command type. Launching a new run cancels
//! the handle of the previous one.

use std::any::TypeId;

use tokio_util::sync::CancellationToken;

/// Unique identifier for a launched command run.
///
/// Higher generations belong to more recently launched runs of the same
/// command type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskId {
    type_id: TypeId,
    generation: u64,
}

impl TaskId {
    pub fn new(type_id: TypeId, generation: u64) -> Self {
        Self {
            type_id,
            generation,
        }
    }

    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// Handle to a launched command run with cooperative cancellation.
///
/// Cancellation does not abort the run by itself; the context races every
/// run against its token, and long-running commands can also check
/// `is_cancelled()` or await `cancelled()`.
#[derive(Debug, Clone)]
pub struct TaskHandle {
    id: TaskId,
    cancel_token: CancellationToken,
}

impl TaskHandle {
    pub fn new(id: TaskId, cancel_token: CancellationToken) -> Self {
        Self { id, cancel_token }
    }

    pub fn id(&self) -> TaskId {
        self.id
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel_token.clone()
    }

    pub fn cancel(&self) {
        self.cancel_token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel_token.is_cancelled()
    }
}
