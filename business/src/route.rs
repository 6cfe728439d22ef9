//! Route state for page navigation.

use std::any::Any;

use keeper_states::{SnapshotClone, State, state_assign_impl};
use ustr::Ustr;

/// Which page the driver shows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Route {
    /// Paginated, filterable user table with per-row actions.
    #[default]
    UserList,
    /// Full-record edit form for one user.
    EditUser(Ustr),
}

impl SnapshotClone for Route {
    fn clone_boxed(&self) -> Option<Box<dyn Any + Send>> {
        Some(Box::new(*self))
    }
}

impl State for Route {
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
