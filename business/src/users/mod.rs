//! User administration domain.
//!
//! This module is the single home for:
//! - States stored in `StateCtx` for the users surface (query, dialog, inputs)
//! - Computes that cache command results or derive paging
//! - API helpers for the `/users` and `/plans` endpoints
//! - Driver operations in [`panel`]

pub mod api;
pub mod edit_form;
pub mod envelope;
pub mod error;
pub mod list_compute;
pub mod modal;
pub mod model;
pub mod mutations;
pub mod panel;
pub mod plans;

pub use edit_form::{
    EditLoadStatus, EditUserCompute, EditUserForm, EditUserInput, LoadUserCommand, SaveStatus,
    SaveUserCommand, SaveUserCompute,
};
pub use error::{GENERIC_FAILURE_MESSAGE, SubmitError, UsersApiError, ValidationError};
pub use list_compute::{
    PaginationCompute, RefreshUsersCommand, UserListCompute, UserListQuery, UserListStatus,
};
pub use modal::{ActiveModal, ModalState};
pub use model::{
    FilterCriteria, PageState, Plan, SessionLimit, UserPage, UserRecord, UserStatus, UserUpdate,
};
pub use mutations::{
    GENERATED_PASSWORD_LEN, MIN_PASSWORD_LEN, Mutation, MutationCompute, MutationInput,
    MutationKind, MutationStatus, SubmitMutationCommand, WalletDirection, generate_password,
};
pub use panel::{LoadOutcome, MutationOutcome, SaveOutcome};
pub use plans::{PlanSearchCompute, PlanSearchInput, PlanSearchStatus, SearchPlansCommand};
