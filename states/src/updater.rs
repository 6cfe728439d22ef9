use std::any::{Any, TypeId, type_name};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use flume::Sender;
use log::{debug, warn};

use crate::State;

/// Generation stamp attached to updates sent by a command run.
#[derive(Debug, Clone)]
pub(crate) struct Stamp {
    pub(crate) latest: Arc<AtomicU64>,
    pub(crate) generation: u64,
}

impl Stamp {
    pub(crate) fn is_latest(&self) -> bool {
        self.latest.load(Ordering::Acquire) == self.generation
    }
}

pub(crate) struct Update {
    pub(crate) id: TypeId,
    pub(crate) name: &'static str,
    pub(crate) value: Box<dyn Any + Send>,
    pub(crate) stamp: Option<Stamp>,
}

/// Sends replacement values back to the owning [`crate::StateCtx`].
///
/// Values are applied on the next `sync_computes`.
#[derive(Debug, Clone)]
pub struct Updater {
    send: Sender<Update>,
}

impl Updater {
    pub(crate) fn new(send: Sender<Update>) -> Self {
        Self { send }
    }

    pub fn set<T: State>(&self, value: T) {
        self.send_stamped(value, None);
    }

    fn send_stamped<T: State>(&self, value: T, stamp: Option<Stamp>) {
        let update = Update {
            id: TypeId::of::<T>(),
            name: type_name::<T>(),
            value: Box::new(value),
            stamp,
        };
        if self.send.send(update).is_err() {
            warn!("update for {} dropped: state context is gone", type_name::<T>());
        }
    }
}

/// Updater handed to a command run.
///
/// Every run of a command type gets a higher generation than the previous
/// one. Updates from a run that is no longer the latest are dropped, both
/// here and again when the context applies them, so a slow superseded
/// response can never overwrite a newer one.
#[derive(Debug, Clone)]
pub struct LatestOnlyUpdater {
    inner: Updater,
    stamp: Stamp,
}

impl LatestOnlyUpdater {
    pub(crate) fn new(inner: Updater, latest: Arc<AtomicU64>, generation: u64) -> Self {
        Self {
            inner,
            stamp: Stamp { latest, generation },
        }
    }

    pub fn generation(&self) -> u64 {
        self.stamp.generation
    }

    pub fn is_latest(&self) -> bool {
        self.stamp.is_latest()
    }

    pub fn set<T: State>(&self, value: T) {
        if !self.is_latest() {
            debug!(
                "stale update for {} from generation {} ignored",
                type_name::<T>(),
                self.stamp.generation
            );
            return;
        }
        self.inner.send_stamped(value, Some(self.stamp.clone()));
    }
}
