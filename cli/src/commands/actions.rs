//! Per-user account actions: status, password, wallet, limits, device updates.
//!
//! Every action goes through the same dialog flow the business layer
//! exposes: open the dialog, submit, flush, settle.

use anyhow::{Context as _, Result, anyhow, bail};
use keeper_business::users::panel::{self, MutationOutcome};
use keeper_business::users::{
    ActiveModal, Mutation, MutationKind, SessionLimit, UserRecord, UserStatus, WalletDirection,
    generate_password,
};
use keeper_states::StateCtx;
use tracing::instrument;

use crate::context::{clear_notifications, flush_and_await, print_notifications};
use crate::output::Output;

/// Open the dialog for `mutation` on `target` (or no target for broadcasts)
/// and submit it.
pub async fn run_mutation(
    ctx: &mut StateCtx,
    out: &Output,
    target: Option<UserRecord>,
    mutation: Mutation,
) -> Result<()> {
    let kind = mutation.kind();
    let modal = ActiveModal::for_kind(kind, target)
        .with_context(|| format!("Cannot {kind}"))?;
    panel::open_modal(ctx, modal).with_context(|| format!("Cannot {kind}"))?;
    submit_open_dialog(ctx, out, mutation).await
}

/// Submit `mutation` against whatever dialog is open and wait for it.
///
/// The dialog stays open on failure so the caller can retry.
#[instrument(skip_all, name = "mutation", fields(kind = %mutation.kind()))]
pub async fn submit_open_dialog(ctx: &mut StateCtx, out: &Output, mutation: Mutation) -> Result<()> {
    let kind = mutation.kind();
    let submitted = panel::submit_mutation(ctx, mutation);
    if submitted.is_err() {
        clear_notifications(ctx);
    }
    submitted.with_context(|| format!("Could not {kind}"))?;

    flush_and_await(ctx).await;

    match panel::settle_mutation(ctx) {
        Some(MutationOutcome::Succeeded(_)) => {
            print_notifications(ctx, out);
            Ok(())
        }
        Some(MutationOutcome::Failed { message, .. }) => {
            clear_notifications(ctx);
            Err(anyhow!(message).context(format!("Could not {kind}")))
        }
        None => bail!("Could not {kind}: the request did not complete"),
    }
}

pub async fn run_status(ctx: &mut StateCtx, out: &Output, id: &str, active: bool) -> Result<()> {
    run_mutation(
        ctx,
        out,
        Some(UserRecord::with_id(id)),
        Mutation::SetStatus(UserStatus::from(active)),
    )
    .await
}

/// Reset the password. A generated password is printed once on success.
pub async fn run_password(
    ctx: &mut StateCtx,
    out: &Output,
    id: &str,
    password: Option<String>,
) -> Result<()> {
    let generated = password.is_none();
    let password = password.unwrap_or_else(generate_password);

    run_mutation(
        ctx,
        out,
        Some(UserRecord::with_id(id)),
        Mutation::ResetPassword(password.clone()),
    )
    .await?;

    if generated {
        out.secret("New password", &password);
    }
    Ok(())
}

pub async fn run_wallet(
    ctx: &mut StateCtx,
    out: &Output,
    id: &str,
    amount: i64,
    direction: WalletDirection,
) -> Result<()> {
    run_mutation(
        ctx,
        out,
        Some(UserRecord::with_id(id)),
        Mutation::AdjustWallet { amount, direction },
    )
    .await
}

/// `sessions` is `unlimited`, `blocked`, or a positive count.
pub async fn run_limits(ctx: &mut StateCtx, out: &Output, id: &str, sessions: &str) -> Result<()> {
    let limit: SessionLimit = sessions
        .parse()
        .with_context(|| format!("Could not {}", MutationKind::Limits))?;
    run_mutation(
        ctx,
        out,
        Some(UserRecord::with_id(id)),
        Mutation::SetLimits(limit),
    )
    .await
}

/// Ask one user's device, or every device when `id` is `None`, to update.
pub async fn run_request_update(ctx: &mut StateCtx, out: &Output, id: Option<&str>) -> Result<()> {
    match id {
        Some(id) => {
            run_mutation(
                ctx,
                out,
                Some(UserRecord::with_id(id)),
                Mutation::RequestDeviceUpdate,
            )
            .await
        }
        None => run_mutation(ctx, out, None, Mutation::RequestAllDevicesUpdate).await,
    }
}
