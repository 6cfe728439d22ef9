use std::any::{TypeId, type_name};
use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use flume::{Receiver, Sender};
use log::{debug, error, warn};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use crate::graph::Graph;
use crate::updater::Update;
use crate::{
    Command, CommandSnapshot, Compute, ComputeDeps, Dep, Error, LatestOnlyUpdater, State, TaskHandle,
    TaskId, Updater,
};

/// Owner of every state, compute and command of an application.
///
/// The driver (UI loop, CLI, tests) is the only thing holding `&mut StateCtx`.
/// Commands run on spawned tasks and report back through the update channel;
/// nothing they send is visible until the driver calls [`Self::sync_computes`].
pub struct StateCtx {
    states: BTreeMap<TypeId, Box<dyn State>>,
    computes: BTreeMap<TypeId, Box<dyn Compute>>,
    compute_deps: BTreeMap<TypeId, ComputeDeps>,
    compute_order: Vec<TypeId>,
    graph: Graph<TypeId>,
    dirty: BTreeSet<TypeId>,

    commands: BTreeMap<TypeId, (&'static str, Arc<dyn Command>)>,
    generations: BTreeMap<TypeId, Arc<AtomicU64>>,
    running: BTreeMap<TypeId, TaskHandle>,
    queue: VecDeque<TypeId>,
    tasks: JoinSet<()>,

    send: Sender<Update>,
    recv: Receiver<Update>,
}

impl fmt::Debug for StateCtx {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateCtx")
            .field("states", &self.states.len())
            .field("computes", &self.computes.len())
            .field("commands", &self.commands.len())
            .field("queued", &self.queue.len())
            .field("tasks", &self.tasks.len())
            .finish()
    }
}

impl Default for StateCtx {
    fn default() -> Self {
        Self::new()
    }
}

impl StateCtx {
    pub fn new() -> Self {
        let (send, recv) = flume::unbounded();
        Self {
            states: BTreeMap::new(),
            computes: BTreeMap::new(),
            compute_deps: BTreeMap::new(),
            compute_order: Vec::new(),
            graph: Graph::new(),
            dirty: BTreeSet::new(),
            commands: BTreeMap::new(),
            generations: BTreeMap::new(),
            running: BTreeMap::new(),
            queue: VecDeque::new(),
            tasks: JoinSet::new(),
            send,
            recv,
        }
    }

    // =====================
    // Registration
    // =====================

    pub fn add_state<T: State>(&mut self, state: T) {
        let id = TypeId::of::<T>();
        self.states.insert(id, Box::new(state));
        self.dirty.insert(id);
    }

    pub fn record_compute<T: Compute>(&mut self, compute: T) {
        let id = TypeId::of::<T>();
        let deps = compute.deps();
        for dep in deps.all() {
            self.graph.route_to(dep, id);
        }
        if !deps.is_empty() {
            self.compute_deps.insert(id, deps);
        }
        self.computes.insert(id, Box::new(compute));
        self.dirty.insert(id);
        self.rebuild_compute_order();
    }

    pub fn record_command<T: Command>(&mut self, command: T) {
        self.commands
            .insert(TypeId::of::<T>(), (type_name::<T>(), Arc::new(command)));
    }

    fn rebuild_compute_order(&mut self) {
        match self.graph.topology_sort() {
            Ok(order) => {
                self.compute_order = order
                    .into_iter()
                    .filter(|id| self.compute_deps.contains_key(id))
                    .collect();
            }
            Err(err) => error!("compute dependency graph rejected: {err}"),
        }
    }

    // =====================
    // Reads and writes
    // =====================

    pub fn try_state<T: State>(&self) -> Result<&T, Error> {
        self.states
            .get(&TypeId::of::<T>())
            .and_then(|boxed| boxed.as_any().downcast_ref::<T>())
            .ok_or_else(|| Error::state_not_found(type_name::<T>(), "StateCtx::state"))
    }

    /// # Panics
    /// Panics if `T` was never added with [`Self::add_state`].
    pub fn state<T: State>(&self) -> &T {
        self.try_state::<T>().unwrap_or_else(|err| panic!("{err}"))
    }

    /// Mutable access; marks `T` dirty so dependent computes re-run.
    ///
    /// # Panics
    /// Panics if `T` was never added with [`Self::add_state`].
    pub fn state_mut<T: State>(&mut self) -> &mut T {
        let id = TypeId::of::<T>();
        self.dirty.insert(id);
        self.states
            .get_mut(&id)
            .and_then(|boxed| boxed.as_any_mut().downcast_mut::<T>())
            .unwrap_or_else(|| panic!("State not found: {}", type_name::<T>()))
    }

    pub fn update<T: State>(&mut self, f: impl FnOnce(&mut T)) {
        f(self.state_mut::<T>());
    }

    pub fn try_compute<T: Compute>(&self) -> Result<&T, Error> {
        self.computes
            .get(&TypeId::of::<T>())
            .and_then(|boxed| boxed.as_any().downcast_ref::<T>())
            .ok_or_else(|| Error::compute_not_found(type_name::<T>(), "StateCtx::compute"))
    }

    /// Last synced value of a compute.
    ///
    /// # Panics
    /// Panics if `T` was never recorded with [`Self::record_compute`].
    pub fn compute<T: Compute>(&self) -> &T {
        self.try_compute::<T>().unwrap_or_else(|err| panic!("{err}"))
    }

    /// Overwrite a compute from the driver side.
    pub fn set_compute<T: Compute>(&mut self, value: T) {
        let id = TypeId::of::<T>();
        match self.computes.get_mut(&id) {
            Some(compute) => {
                compute.assign_box(Box::new(value));
                self.dirty.insert(id);
            }
            None => warn!("set_compute on unregistered {}", type_name::<T>()),
        }
    }

    pub fn updater(&self) -> Updater {
        Updater::new(self.send.clone())
    }

    // =====================
    // Sync
    // =====================

    /// Apply pending updates, then re-derive computes whose inputs changed.
    pub fn sync_computes(&mut self) {
        self.apply_updates();

        for idx in 0..self.compute_order.len() {
            let id = self.compute_order[idx];
            let Some(deps) = self.compute_deps.get(&id) else {
                continue;
            };
            if !deps.all().any(|dep| self.dirty.contains(&dep)) {
                continue;
            }
            if let Some(compute) = self.computes.get(&id) {
                compute.compute(Dep::new(&self.states, &self.computes), self.updater());
            }
            self.apply_updates();
        }

        self.dirty.clear();
    }

    fn apply_updates(&mut self) {
        while let Ok(update) = self.recv.try_recv() {
            if let Some(stamp) = &update.stamp {
                if !stamp.is_latest() {
                    debug!(
                        "discarding superseded update for {} (generation {})",
                        update.name, stamp.generation
                    );
                    continue;
                }
            }

            if let Some(compute) = self.computes.get_mut(&update.id) {
                compute.assign_box(update.value);
            } else if let Some(state) = self.states.get_mut(&update.id) {
                state.assign_box(update.value);
            } else {
                warn!("update for unregistered {} ignored", update.name);
                continue;
            }
            self.dirty.insert(update.id);
        }
    }

    // =====================
    // Commands
    // =====================

    pub fn enqueue_command<T: Command>(&mut self) {
        let id = TypeId::of::<T>();
        if !self.commands.contains_key(&id) {
            warn!("{}", Error::CommandNotFound {
                name: type_name::<T>()
            });
            return;
        }
        self.queue.push_back(id);
    }

    /// Enqueue and launch immediately.
    pub fn dispatch<T: Command>(&mut self) {
        self.enqueue_command::<T>();
        self.flush_commands();
    }

    /// Launch every queued command on the tokio runtime.
    ///
    /// A launch bumps the command's generation and cancels its previous run.
    pub fn flush_commands(&mut self) {
        while let Some(id) = self.queue.pop_front() {
            let Some((name, command)) = self
                .commands
                .get(&id)
                .map(|(name, command)| (*name, Arc::clone(command)))
            else {
                continue;
            };

            let latest = Arc::clone(self.generations.entry(id).or_default());
            let generation = latest.fetch_add(1, Ordering::AcqRel) + 1;

            if let Some(previous) = self.running.remove(&id) {
                debug!(
                    "cancelling {name} generation {}",
                    previous.id().generation()
                );
                previous.cancel();
            }

            let cancel = CancellationToken::new();
            let updater = LatestOnlyUpdater::new(self.updater(), latest, generation);
            let future = command.run(self.snapshot(), updater, cancel.clone());
            self.running.insert(
                id,
                TaskHandle::new(TaskId::new(id, generation), cancel.clone()),
            );

            debug!("launching {name} generation {generation}");
            self.tasks.spawn(async move {
                tokio::select! {
                    () = cancel.cancelled() => {}
                    () = future => {}
                }
            });
        }
    }

    fn snapshot(&self) -> CommandSnapshot {
        let mut snap = CommandSnapshot::new();
        for (id, state) in &self.states {
            if let Some(value) = state.clone_boxed() {
                snap.insert_state(*id, value);
            }
        }
        for (id, compute) in &self.computes {
            if let Some(value) = compute.clone_boxed() {
                snap.insert_compute(*id, value);
            }
        }
        snap
    }

    pub fn queued_count(&self) -> usize {
        self.queue.len()
    }

    pub fn task_count(&self) -> usize {
        self.tasks.len()
    }

    pub fn task_set_mut(&mut self) -> &mut JoinSet<()> {
        &mut self.tasks
    }

    /// Sync, launch queued commands, then await every task, syncing after each.
    pub async fn flush_and_await(&mut self) {
        self.sync_computes();
        self.flush_commands();

        while let Some(joined) = self.tasks.join_next().await {
            if let Err(err) = joined {
                warn!("command task ended abnormally: {err}");
            }
            self.sync_computes();
        }

        self.sync_computes();
    }

    /// Cancel and abort everything in flight.
    pub async fn shutdown(&mut self) {
        for handle in self.running.values() {
            handle.cancel();
        }
        self.running.clear();
        self.queue.clear();
        self.tasks.shutdown().await;
        self.sync_computes();
    }
}
