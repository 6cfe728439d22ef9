use std::any::TypeId;

use crate::{Dep, State, Updater};

/// Types a compute reads from; a change to any of them re-runs the compute.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ComputeDeps {
    pub states: Vec<TypeId>,
    pub computes: Vec<TypeId>,
}

impl ComputeDeps {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn all(&self) -> impl Iterator<Item = TypeId> + '_ {
        self.states.iter().chain(self.computes.iter()).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty() && self.computes.is_empty()
    }
}

/// A derived value or a command-updated cache.
///
/// Computes with no dependencies are plain caches: commands write them through
/// an updater and `compute` is never called. Computes with dependencies are
/// re-derived during [`crate::StateCtx::sync_computes`] whenever a dependency
/// changed, in topological order.
///
/// `compute` must stay free of side effects; network IO belongs in commands.
pub trait Compute: State {
    fn deps(&self) -> ComputeDeps {
        ComputeDeps::none()
    }

    fn compute(&self, _deps: Dep<'_>, _updater: Updater) {}
}
