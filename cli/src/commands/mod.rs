//! Command implementations for the keeper CLI.
//!
//! Each subcommand is implemented in its own module. Every `run_*` takes
//! the shared `StateCtx` so tests can drive it against a mock backend.

pub mod actions;
pub mod completions;
pub mod edit;
pub mod interactive;
pub mod list;
pub mod plan;
pub mod show;

pub use actions::{
    run_limits, run_mutation, run_password, run_request_update, run_status, run_wallet,
};
pub use completions::generate_completions;
pub use edit::run_edit;
pub use list::run_list;
pub use plan::{PlanChoice, run_plan_assign, run_plan_remove};
pub use show::run_show;
