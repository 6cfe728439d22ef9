//! Driver-side operations for the users admin surface.
//!
//! UI code and the CLI call these instead of poking states directly. They
//! only touch `StateCtx` and queue commands; the driver decides when to
//! flush and when to call the `settle_*` functions after a sync.

use keeper_states::StateCtx;
use log::debug;
use ustr::Ustr;

use super::edit_form::{
    EditLoadStatus, EditUserCompute, EditUserForm, EditUserInput, LoadUserCommand, SaveStatus,
    SaveUserCommand, SaveUserCompute,
};
use super::error::SubmitError;
use super::list_compute::{PaginationCompute, RefreshUsersCommand, UserListCompute, UserListQuery};
use super::modal::{ActiveModal, ModalState};
use super::model::FilterCriteria;
use super::mutations::{
    Mutation, MutationCompute, MutationInput, MutationKind, MutationStatus, SubmitMutationCommand,
};
use super::plans::{PlanSearchCompute, PlanSearchInput, SearchPlansCommand};
use crate::config::BusinessConfig;
use crate::notify::Notifications;
use crate::route::Route;

/// Register every state, compute and command of the users surface.
pub fn register(ctx: &mut StateCtx, config: BusinessConfig) {
    ctx.add_state(config);
    ctx.add_state(Route::default());
    ctx.add_state(Notifications::default());
    ctx.add_state(UserListQuery::default());
    ctx.add_state(ModalState::default());
    ctx.add_state(MutationInput::default());
    ctx.add_state(PlanSearchInput::default());
    ctx.add_state(EditUserInput::default());
    ctx.add_state(EditUserForm::default());

    ctx.record_compute(UserListCompute::default());
    ctx.record_compute(PaginationCompute::default());
    ctx.record_compute(MutationCompute::default());
    ctx.record_compute(PlanSearchCompute::default());
    ctx.record_compute(EditUserCompute::default());
    ctx.record_compute(SaveUserCompute::default());

    ctx.record_command(RefreshUsersCommand);
    ctx.record_command(SubmitMutationCommand);
    ctx.record_command(SearchPlansCommand);
    ctx.record_command(LoadUserCommand);
    ctx.record_command(SaveUserCommand);
}

pub fn build_state_ctx(config: BusinessConfig) -> StateCtx {
    let mut ctx = StateCtx::new();
    register(&mut ctx, config);
    ctx.sync_computes();
    ctx
}

// =====================
// List
// =====================

pub fn refresh_users(ctx: &mut StateCtx) {
    ctx.enqueue_command::<RefreshUsersCommand>();
}

/// Replace the filters, go back to page 1 and refetch.
pub fn apply_filters(ctx: &mut StateCtx, filters: FilterCriteria) {
    ctx.update::<UserListQuery>(|query| query.set_filters(filters));
    refresh_users(ctx);
}

/// Move to `page`, clamped to the known page range, and refetch.
/// Returns the page actually selected.
pub fn go_to_page(ctx: &mut StateCtx, page: u32) -> u32 {
    let target = ctx.compute::<PaginationCompute>().page.clamp_page(page);
    if target != page {
        debug!("page {page} out of range, using {target}");
    }
    ctx.update::<UserListQuery>(|query| query.page = target);
    refresh_users(ctx);
    target
}

pub fn next_page(ctx: &mut StateCtx) -> u32 {
    let current = ctx.state::<UserListQuery>().page;
    go_to_page(ctx, current.saturating_add(1))
}

pub fn prev_page(ctx: &mut StateCtx) -> u32 {
    let current = ctx.state::<UserListQuery>().page;
    go_to_page(ctx, current.saturating_sub(1))
}

// =====================
// Dialogs and mutations
// =====================

/// Open a dialog, replacing any open one, with fresh inputs.
///
/// Refused while a write is in flight so its outcome is still reported.
pub fn open_modal(ctx: &mut StateCtx, modal: ActiveModal) -> Result<(), SubmitError> {
    if ctx.compute::<MutationCompute>().is_in_flight() {
        return Err(SubmitError::Busy);
    }
    reset_inputs(ctx);
    ctx.update::<ModalState>(|state| state.open(modal));
    Ok(())
}

/// Close the open dialog. Refused while its write is in flight.
pub fn close_modal(ctx: &mut StateCtx) -> Result<(), SubmitError> {
    if ctx.compute::<MutationCompute>().is_in_flight() {
        return Err(SubmitError::Busy);
    }
    reset_inputs(ctx);
    ctx.update::<ModalState>(ModalState::close);
    Ok(())
}

fn reset_inputs(ctx: &mut StateCtx) {
    ctx.update::<MutationInput>(|input| input.mutation = None);
    ctx.update::<PlanSearchInput>(|input| *input = PlanSearchInput::default());
    ctx.set_compute(MutationCompute::default());
}

/// Validate and queue `mutation` for the open dialog.
///
/// Invalid input raises a warning notification and sends nothing.
pub fn submit_mutation(ctx: &mut StateCtx, mutation: Mutation) -> Result<(), SubmitError> {
    if ctx.compute::<MutationCompute>().is_in_flight() {
        return Err(SubmitError::Busy);
    }

    let kind = mutation.kind();
    let modal = ctx.state::<ModalState>().active();
    match modal.kind() {
        None => return Err(SubmitError::NoDialog),
        Some(open) if open != kind => return Err(SubmitError::DialogMismatch { requested: kind }),
        Some(_) => {}
    }
    let user = modal.target().map(|u| u.id);

    if let Err(err) = mutation.validate() {
        ctx.update::<Notifications>(|n| n.warning(err.to_string()));
        return Err(err.into());
    }

    ctx.update::<MutationInput>(|input| input.mutation = Some(mutation));
    // Flag in-flight now so a second submit is refused before the task starts.
    ctx.set_compute(MutationCompute {
        status: MutationStatus::InFlight { kind, user },
    });
    ctx.enqueue_command::<SubmitMutationCommand>();
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MutationOutcome {
    Succeeded(MutationKind),
    Failed { kind: MutationKind, message: String },
}

/// React to a finished mutation.
///
/// Success notifies, closes the dialog and queues exactly one list refresh.
/// Failure notifies and keeps the dialog open for a retry.
pub fn settle_mutation(ctx: &mut StateCtx) -> Option<MutationOutcome> {
    match ctx.compute::<MutationCompute>().status.clone() {
        MutationStatus::Success { kind, .. } => {
            ctx.update::<Notifications>(|n| n.success(kind.success_message()));
            reset_inputs(ctx);
            ctx.update::<ModalState>(ModalState::close);
            refresh_users(ctx);
            Some(MutationOutcome::Succeeded(kind))
        }
        MutationStatus::Error { kind, message, .. } => {
            ctx.update::<Notifications>(|n| n.error(message.clone()));
            ctx.set_compute(MutationCompute::default());
            Some(MutationOutcome::Failed { kind, message })
        }
        MutationStatus::Idle | MutationStatus::InFlight { .. } => None,
    }
}

// =====================
// Plan picker
// =====================

/// Record the search term and relaunch the debounced search.
pub fn search_plans(ctx: &mut StateCtx, term: impl Into<String>) {
    let term = term.into();
    ctx.update::<PlanSearchInput>(|input| input.term = term);
    ctx.dispatch::<SearchPlansCommand>();
}

pub fn select_plan(ctx: &mut StateCtx, plan: Option<Ustr>) {
    ctx.update::<PlanSearchInput>(|input| input.selected = plan);
}

/// The assign mutation for whatever plan is selected.
pub fn selected_plan_mutation(ctx: &StateCtx) -> Mutation {
    Mutation::AssignPlan(ctx.state::<PlanSearchInput>().selected)
}

// =====================
// Edit page
// =====================

/// Navigate to the edit page for `id` and start loading the record.
pub fn open_edit(ctx: &mut StateCtx, id: Ustr) {
    ctx.update::<Route>(|route| *route = Route::EditUser(id));
    ctx.update::<EditUserInput>(|input| input.user_id = Some(id));
    ctx.update::<EditUserForm>(|form| *form = EditUserForm::default());
    ctx.set_compute(EditUserCompute::default());
    ctx.set_compute(SaveUserCompute::default());
    ctx.enqueue_command::<LoadUserCommand>();
}

pub fn update_form(ctx: &mut StateCtx, f: impl FnOnce(&mut EditUserForm)) {
    ctx.update::<EditUserForm>(f);
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    Populated,
    Failed(String),
}

/// Fill the form once the record arrives; notify on failure.
pub fn settle_edit_load(ctx: &mut StateCtx) -> Option<LoadOutcome> {
    match ctx.compute::<EditUserCompute>().status.clone() {
        EditLoadStatus::Ready(record) => {
            if ctx.state::<EditUserForm>().source_id == Some(record.id) {
                return None;
            }
            ctx.update::<EditUserForm>(|form| *form = EditUserForm::from_record(&record));
            Some(LoadOutcome::Populated)
        }
        EditLoadStatus::Error(message) => {
            ctx.update::<Notifications>(|n| n.error(message.clone()));
            ctx.set_compute(EditUserCompute::default());
            Some(LoadOutcome::Failed(message))
        }
        EditLoadStatus::Idle | EditLoadStatus::Loading => None,
    }
}

pub fn submit_edit(ctx: &mut StateCtx) -> Result<(), SubmitError> {
    if ctx.compute::<SaveUserCompute>().is_saving() {
        return Err(SubmitError::Busy);
    }
    if ctx.state::<EditUserForm>().source_id.is_none() {
        return Err(SubmitError::NotLoaded);
    }

    ctx.set_compute(SaveUserCompute {
        status: SaveStatus::Saving,
    });
    ctx.enqueue_command::<SaveUserCommand>();
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    Saved,
    Failed(String),
}

/// Success notifies and navigates back to the list; failure notifies and
/// stays on the form.
pub fn settle_edit_save(ctx: &mut StateCtx) -> Option<SaveOutcome> {
    match ctx.compute::<SaveUserCompute>().status.clone() {
        SaveStatus::Saved => {
            ctx.update::<Notifications>(|n| n.success("User updated"));
            ctx.set_compute(SaveUserCompute::default());
            back_to_list(ctx);
            Some(SaveOutcome::Saved)
        }
        SaveStatus::Error(message) => {
            ctx.update::<Notifications>(|n| n.error(message.clone()));
            ctx.set_compute(SaveUserCompute::default());
            Some(SaveOutcome::Failed(message))
        }
        SaveStatus::Idle | SaveStatus::Saving => None,
    }
}

pub fn back_to_list(ctx: &mut StateCtx) {
    ctx.update::<Route>(|route| *route = Route::UserList);
    ctx.update::<EditUserInput>(|input| input.user_id = None);
    refresh_users(ctx);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::ToastLevel;
    use crate::users::error::ValidationError;
    use crate::users::model::UserRecord;
    use crate::users::mutations::WalletDirection;

    fn ctx() -> StateCtx {
        build_state_ctx(BusinessConfig::new("http://127.0.0.1:9"))
    }

    #[test]
    fn submit_without_dialog_is_refused() {
        let mut ctx = ctx();
        assert_eq!(
            submit_mutation(&mut ctx, Mutation::RequestDeviceUpdate),
            Err(SubmitError::NoDialog)
        );
        assert_eq!(ctx.queued_count(), 0);
    }

    #[test]
    fn submit_for_other_dialog_is_refused() {
        let mut ctx = ctx();
        open_modal(&mut ctx, ActiveModal::Wallet(UserRecord::with_id("u1"))).unwrap();
        assert_eq!(
            submit_mutation(&mut ctx, Mutation::UnassignPlan),
            Err(SubmitError::DialogMismatch {
                requested: MutationKind::UnassignPlan
            })
        );
    }

    #[test]
    fn invalid_amount_warns_and_queues_nothing() {
        let mut ctx = ctx();
        open_modal(&mut ctx, ActiveModal::Wallet(UserRecord::with_id("u1"))).unwrap();

        let result = submit_mutation(&mut ctx, Mutation::AdjustWallet {
            amount: 0,
            direction: WalletDirection::Debit,
        });

        assert_eq!(
            result,
            Err(SubmitError::Invalid(ValidationError::NonPositiveAmount))
        );
        assert_eq!(ctx.queued_count(), 0);
        let toasts = ctx.state_mut::<Notifications>().drain();
        assert_eq!(toasts.len(), 1);
        assert_eq!(toasts[0].level, ToastLevel::Warning);
    }

    #[test]
    fn second_submit_while_in_flight_is_refused() {
        let mut ctx = ctx();
        open_modal(&mut ctx, ActiveModal::Status(UserRecord::with_id("u1"))).unwrap();

        let first = submit_mutation(&mut ctx, Mutation::SetStatus(true.into()));
        let second = submit_mutation(&mut ctx, Mutation::SetStatus(true.into()));

        assert_eq!(first, Ok(()));
        assert_eq!(second, Err(SubmitError::Busy));
        assert_eq!(ctx.queued_count(), 1);
    }

    #[test]
    fn dialog_stays_open_while_write_in_flight() {
        let mut ctx = ctx();
        open_modal(&mut ctx, ActiveModal::Wallet(UserRecord::with_id("u1"))).unwrap();
        submit_mutation(&mut ctx, Mutation::AdjustWallet {
            amount: 5,
            direction: WalletDirection::Credit,
        })
        .unwrap();

        assert_eq!(close_modal(&mut ctx), Err(SubmitError::Busy));
        assert_eq!(
            open_modal(&mut ctx, ActiveModal::Status(UserRecord::with_id("u1"))),
            Err(SubmitError::Busy)
        );

        assert_eq!(
            ctx.state::<ModalState>().active().kind(),
            Some(MutationKind::Wallet)
        );
        assert!(ctx.compute::<MutationCompute>().is_in_flight());
        assert_eq!(ctx.queued_count(), 1);
    }

    #[test]
    fn closing_clears_plan_search() {
        let mut ctx = ctx();
        open_modal(&mut ctx, ActiveModal::AssignPlan(UserRecord::with_id("u1"))).unwrap();
        ctx.update::<PlanSearchInput>(|input| input.term = "gold".into());
        select_plan(&mut ctx, Some(Ustr::from("p1")));

        close_modal(&mut ctx).unwrap();

        assert!(ctx.state::<PlanSearchInput>().term.is_empty());
        assert_eq!(selected_plan_mutation(&ctx), Mutation::AssignPlan(None));
        assert!(!ctx.state::<ModalState>().active().is_open());
    }

    #[test]
    fn failure_keeps_dialog_open() {
        let mut ctx = ctx();
        open_modal(&mut ctx, ActiveModal::Limits(UserRecord::with_id("u1"))).unwrap();
        ctx.set_compute(MutationCompute {
            status: MutationStatus::Error {
                kind: MutationKind::Limits,
                user: Some(Ustr::from("u1")),
                message: "nope".into(),
            },
        });

        let outcome = settle_mutation(&mut ctx);

        assert_eq!(
            outcome,
            Some(MutationOutcome::Failed {
                kind: MutationKind::Limits,
                message: "nope".into()
            })
        );
        assert_eq!(
            ctx.state::<ModalState>().active().kind(),
            Some(MutationKind::Limits)
        );
        assert_eq!(ctx.queued_count(), 0);
    }

    #[test]
    fn success_closes_dialog_and_refreshes_once() {
        let mut ctx = ctx();
        open_modal(&mut ctx, ActiveModal::UnassignPlan(UserRecord::with_id("u1"))).unwrap();
        ctx.set_compute(MutationCompute {
            status: MutationStatus::Success {
                kind: MutationKind::UnassignPlan,
                user: Some(Ustr::from("u1")),
            },
        });

        assert_eq!(
            settle_mutation(&mut ctx),
            Some(MutationOutcome::Succeeded(MutationKind::UnassignPlan))
        );
        assert_eq!(settle_mutation(&mut ctx), None);

        assert!(!ctx.state::<ModalState>().active().is_open());
        assert_eq!(ctx.queued_count(), 1);
    }

    #[test]
    fn page_moves_are_clamped_to_known_range() {
        let mut ctx = ctx();
        ctx.set_compute(UserListCompute {
            status: crate::users::list_compute::UserListStatus::Loaded {
                query: UserListQuery::default(),
                page: crate::users::model::UserPage {
                    records: Vec::new(),
                    total: 25,
                },
            },
        });
        ctx.sync_computes();

        assert_eq!(go_to_page(&mut ctx, 7), 3);
        assert_eq!(ctx.state::<UserListQuery>().page, 3);
        ctx.sync_computes();
        assert_eq!(next_page(&mut ctx), 3);
        ctx.sync_computes();
        assert_eq!(prev_page(&mut ctx), 2);
    }

    #[test]
    fn apply_filters_resets_to_first_page() {
        let mut ctx = ctx();
        ctx.update::<UserListQuery>(|q| q.page = 3);

        apply_filters(&mut ctx, FilterCriteria {
            name: Some("ada".into()),
            ..FilterCriteria::default()
        });

        assert_eq!(ctx.state::<UserListQuery>().page, 1);
        assert_eq!(ctx.queued_count(), 1);
    }

    #[test]
    fn submit_edit_requires_loaded_record() {
        let mut ctx = ctx();
        open_edit(&mut ctx, Ustr::from("u1"));
        assert_eq!(submit_edit(&mut ctx), Err(SubmitError::NotLoaded));
        assert_eq!(*ctx.state::<Route>(), Route::EditUser(Ustr::from("u1")));
    }
}
