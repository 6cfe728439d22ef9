//! Show one user's record.

use anyhow::{Result, bail};
use keeper_business::users::panel::{self, LoadOutcome};
use keeper_business::users::{EditUserCompute, UserRecord};
use keeper_states::StateCtx;
use tracing::instrument;

use crate::context::{clear_notifications, flush_and_await};
use crate::output::Output;

/// Fetch `id` through the edit page loader, leaving the form populated.
#[instrument(skip_all, name = "load_user", fields(user = id))]
pub async fn load_user(ctx: &mut StateCtx, id: &str) -> Result<UserRecord> {
    panel::open_edit(ctx, id.into());
    flush_and_await(ctx).await;

    match panel::settle_edit_load(ctx) {
        Some(LoadOutcome::Populated) => match ctx.compute::<EditUserCompute>().record() {
            Some(record) => Ok(record.clone()),
            None => bail!("User {id} was not loaded"),
        },
        Some(LoadOutcome::Failed(message)) => {
            clear_notifications(ctx);
            bail!("Could not load user {id}: {message}")
        }
        None => bail!("Loading user {id} did not complete"),
    }
}

pub async fn run_show(ctx: &mut StateCtx, out: &Output, id: &str) -> Result<()> {
    let record = load_user(ctx, id).await?;
    print_user(out, &record);
    Ok(())
}

pub fn print_user(out: &Output, user: &UserRecord) {
    let text = |value: &Option<String>| value.clone().unwrap_or_else(|| "-".to_owned());

    out.header(user.display_name());
    out.divider(40);
    out.labeled_indent("ID", user.id, 2);
    out.labeled_indent("First name", text(&user.first_name), 2);
    out.labeled_indent("Last name", text(&user.last_name), 2);
    out.labeled_indent("Username", text(&user.username), 2);
    out.labeled_indent("Email", text(&user.email), 2);
    out.labeled_indent("Mobile", text(&user.mobile), 2);
    out.labeled_indent("Status", user.status, 2);
    out.labeled_indent("Plan", plan_cell(user), 2);
    out.labeled_indent("Sessions", user.session_limit(), 2);
    out.labeled_indent("Wallet", wallet_cell(user), 2);
}

pub fn plan_cell(user: &UserRecord) -> String {
    if !user.has_plan() {
        return "-".to_owned();
    }
    match (&user.plan_name, user.plan_id) {
        (Some(name), _) if !name.trim().is_empty() => name.clone(),
        (_, Some(id)) => id.to_string(),
        _ => "-".to_owned(),
    }
}

pub fn wallet_cell(user: &UserRecord) -> String {
    user.wallet_balance
        .map_or_else(|| "-".to_owned(), |balance| format!("{balance:.2}"))
}
