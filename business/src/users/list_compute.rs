//! User list: query state, fetched page cache, refresh command and the
//! derived pagination view.
//!
//! - `UserListQuery` holds the page and filters the operator chose.
//! - `RefreshUsersCommand` fetches that page into `UserListCompute`.
//! - `PaginationCompute` is derived from the query, the config and the last
//!   known total, so the driver can clamp page moves.

use std::any::{Any, TypeId};

use keeper_states::{
    Command, CommandFuture, CommandSnapshot, Compute, ComputeDeps, Dep, LatestOnlyUpdater,
    SnapshotClone, State, Updater, state_assign_impl,
};
use log::{error, info};
use tokio_util::sync::CancellationToken;

use super::api;
use super::model::{FilterCriteria, PageState, UserPage, UserRecord};
use crate::config::BusinessConfig;

/// Page and filters the operator asked for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserListQuery {
    /// 1-based.
    pub page: u32,
    pub filters: FilterCriteria,
}

impl Default for UserListQuery {
    fn default() -> Self {
        Self {
            page: 1,
            filters: FilterCriteria::default(),
        }
    }
}

impl UserListQuery {
    /// New filters always start from the first page.
    pub fn set_filters(&mut self, filters: FilterCriteria) {
        self.filters = filters;
        self.page = 1;
    }
}

impl SnapshotClone for UserListQuery {
    fn clone_boxed(&self) -> Option<Box<dyn Any + Send>> {
        Some(Box::new(self.clone()))
    }
}

impl State for UserListQuery {
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
pub enum UserListStatus {
    #[default]
    Idle,

    Loading,

    /// Rows for `query`, which may lag behind the live query while a new
    /// fetch is on its way.
    Loaded { query: UserListQuery, page: UserPage },

    /// Operator-facing message.
    Error(String),
}

/// Cache of the last fetched page, written only by [`RefreshUsersCommand`].
#[derive(Debug, Clone, Default)]
pub struct UserListCompute {
    pub status: UserListStatus,
}

impl UserListCompute {
    pub fn is_loading(&self) -> bool {
        matches!(self.status, UserListStatus::Loading)
    }

    pub fn records(&self) -> &[UserRecord] {
        match &self.status {
            UserListStatus::Loaded { page, .. } => &page.records,
            _ => &[],
        }
    }

    /// Total matching users, or `None` while nothing settled yet.
    pub fn total(&self) -> Option<u64> {
        match &self.status {
            UserListStatus::Loaded { page, .. } => Some(page.total),
            UserListStatus::Error(_) => Some(0),
            UserListStatus::Idle | UserListStatus::Loading => None,
        }
    }

    pub fn error_message(&self) -> Option<&str> {
        match &self.status {
            UserListStatus::Error(message) => Some(message),
            _ => None,
        }
    }

    pub fn find(&self, id: &str) -> Option<&UserRecord> {
        self.records().iter().find(|r| r.id == id)
    }
}

impl SnapshotClone for UserListCompute {
    fn clone_boxed(&self) -> Option<Box<dyn Any + Send>> {
        Some(Box::new(self.clone()))
    }
}

impl State for UserListCompute {
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

// Updated by `RefreshUsersCommand` only.
impl Compute for UserListCompute {}

/// Fetch the page described by [`UserListQuery`].
///
/// Each launch supersedes the previous one, so a slow response for an older
/// query never overwrites a newer page.
#[derive(Default, Debug)]
pub struct RefreshUsersCommand;

impl Command for RefreshUsersCommand {
    fn run(
        &self,
        snap: CommandSnapshot,
        updater: LatestOnlyUpdater,
        _cancel: CancellationToken,
    ) -> CommandFuture {
        let query = snap.state::<UserListQuery>().clone();
        let config = snap.state::<BusinessConfig>().clone();

        Box::pin(async move {
            updater.set(UserListCompute {
                status: UserListStatus::Loading,
            });

            match api::list_users(&config, query.page, config.page_size, &query.filters).await {
                Ok(page) => {
                    info!(
                        "loaded {} of {} users (page {})",
                        page.records.len(),
                        page.total,
                        query.page
                    );
                    updater.set(UserListCompute {
                        status: UserListStatus::Loaded { query, page },
                    });
                }
                Err(err) => {
                    error!("failed to load users: {err}");
                    updater.set(UserListCompute {
                        status: UserListStatus::Error(err.user_message()),
                    });
                }
            }
        })
    }
}

/// Paging position derived from the query, the page size and the last
/// known total.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PaginationCompute {
    pub page: PageState,
}

impl SnapshotClone for PaginationCompute {
    fn clone_boxed(&self) -> Option<Box<dyn Any + Send>> {
        Some(Box::new(self.clone()))
    }
}

impl State for PaginationCompute {
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

impl Compute for PaginationCompute {
    fn deps(&self) -> ComputeDeps {
        ComputeDeps {
            states: vec![TypeId::of::<UserListQuery>(), TypeId::of::<BusinessConfig>()],
            computes: vec![TypeId::of::<UserListCompute>()],
        }
    }

    fn compute(&self, deps: Dep<'_>, updater: Updater) {
        let query = deps.state::<UserListQuery>();
        let config = deps.state::<BusinessConfig>();
        // Keep the previous total while a fetch is in flight.
        let total = deps
            .compute::<UserListCompute>()
            .total()
            .unwrap_or(self.page.total);

        updater.set(Self {
            page: PageState {
                page: query.page,
                page_size: config.page_size,
                total,
            },
        });
    }
}

#[cfg(test)]
mod tests {
    use keeper_states::StateCtx;

    use super::*;

    fn ctx_with(page_size: u32) -> StateCtx {
        let mut ctx = StateCtx::new();
        let mut config = BusinessConfig::new("http://localhost");
        config.page_size = page_size;
        ctx.add_state(config);
        ctx.add_state(UserListQuery::default());
        ctx.record_compute(UserListCompute::default());
        ctx.record_compute(PaginationCompute::default());
        ctx
    }

    fn loaded(total: u64) -> UserListCompute {
        UserListCompute {
            status: UserListStatus::Loaded {
                query: UserListQuery::default(),
                page: UserPage {
                    records: Vec::new(),
                    total,
                },
            },
        }
    }

    #[test]
    fn set_filters_resets_page() {
        let mut query = UserListQuery {
            page: 4,
            filters: FilterCriteria::default(),
        };
        query.set_filters(FilterCriteria {
            email: Some("a@b.c".into()),
            ..FilterCriteria::default()
        });
        assert_eq!(query.page, 1);
    }

    #[test]
    fn pagination_follows_total_and_page_size() {
        let mut ctx = ctx_with(10);
        ctx.set_compute(loaded(23));
        ctx.update::<UserListQuery>(|q| q.page = 2);
        ctx.sync_computes();

        let page = ctx.compute::<PaginationCompute>().page;
        assert_eq!(page.page, 2);
        assert_eq!(page.page_size, 10);
        assert_eq!(page.total, 23);
        assert_eq!(page.page_count(), 3);
    }

    #[test]
    fn pagination_keeps_total_while_loading() {
        let mut ctx = ctx_with(5);
        ctx.set_compute(loaded(12));
        ctx.sync_computes();

        ctx.set_compute(UserListCompute {
            status: UserListStatus::Loading,
        });
        ctx.sync_computes();

        assert_eq!(ctx.compute::<PaginationCompute>().page.total, 12);
    }

    #[test]
    fn error_status_exposes_message_and_zero_total() {
        let compute = UserListCompute {
            status: UserListStatus::Error("boom".into()),
        };
        assert_eq!(compute.error_message(), Some("boom"));
        assert_eq!(compute.total(), Some(0));
        assert!(compute.records().is_empty());
    }
}
