//! Plan picker: debounced search over the plan catalogue.
//!
//! Every keystroke relaunches [`SearchPlansCommand`]. A launch cancels the
//! previous run, and each run waits out the debounce window before sending,
//! so a burst of edits produces one request for the final term.

use std::any::Any;

use keeper_states::{
    Command, CommandFuture, CommandSnapshot, Compute, LatestOnlyUpdater, SnapshotClone, State,
    state_assign_impl,
};
use log::{debug, error};
use tokio_util::sync::CancellationToken;
use ustr::Ustr;

use super::api;
use super::model::Plan;
use crate::config::BusinessConfig;

#[derive(Debug, Clone, Default)]
pub struct PlanSearchInput {
    pub term: String,
    /// Plan the operator picked from the results.
    pub selected: Option<Ustr>,
}

impl SnapshotClone for PlanSearchInput {
    fn clone_boxed(&self) -> Option<Box<dyn Any + Send>> {
        Some(Box::new(self.clone()))
    }
}

impl State for PlanSearchInput {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn assign_box(&mut self, new_self: Box<dyn Any + Send>) {
        state_assign_impl(self, new_self);
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub enum PlanSearchStatus {
    #[default]
    Idle,
    Loading {
        term: String,
    },
    Loaded {
        term: String,
        plans: Vec<Plan>,
    },
    Error(String),
}

#[derive(Debug, Clone, Default)]
pub struct PlanSearchCompute {
    pub status: PlanSearchStatus,
}

impl PlanSearchCompute {
    pub fn plans(&self) -> &[Plan] {
        match &self.status {
            PlanSearchStatus::Loaded { plans, .. } => plans,
            _ => &[],
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self.status, PlanSearchStatus::Loading { .. })
    }
}

impl SnapshotClone for PlanSearchCompute {
    fn clone_boxed(&self) -> Option<Box<dyn Any + Send>> {
        Some(Box::new(self.clone()))
    }
}

impl State for PlanSearchCompute {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn assign_box(&mut self, new_self: Box<dyn Any + Send>) {
        state_assign_impl(self, new_self);
    }
}

impl Compute for PlanSearchCompute {}

#[derive(Default, Debug)]
pub struct SearchPlansCommand;

impl Command for SearchPlansCommand {
    fn run(
        &self,
        snap: CommandSnapshot,
        updater: LatestOnlyUpdater,
        cancel: CancellationToken,
    ) -> CommandFuture {
        let term = snap.state::<PlanSearchInput>().term.clone();
        let config = snap.state::<BusinessConfig>().clone();

        Box::pin(async move {
            tokio::select! {
                () = cancel.cancelled() => {
                    debug!("plan search for {term:?} superseded during debounce");
                    return;
                }
                () = tokio::time::sleep(config.search_debounce) => {}
            }

            updater.set(PlanSearchCompute {
                status: PlanSearchStatus::Loading { term: term.clone() },
            });

            let search = Some(term.as_str()).filter(|t| !t.trim().is_empty());
            let status = match api::list_plans(&config, search).await {
                Ok(plans) => {
                    debug!("plan search {term:?} returned {} plans", plans.len());
                    PlanSearchStatus::Loaded { term, plans }
                }
                Err(err) => {
                    error!("plan search failed: {err}");
                    PlanSearchStatus::Error(err.user_message())
                }
            };
            updater.set(PlanSearchCompute { status });
        })
    }
}
