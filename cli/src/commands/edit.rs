//! Edit a user's profile fields.

use anyhow::{Context as _, Result, anyhow, bail};
use inquire::Text;
use keeper_business::users::panel::{self, SaveOutcome};
use keeper_business::users::EditUserForm;
use keeper_states::StateCtx;
use tracing::instrument;

use crate::cli::EditArgs;
use crate::commands::show::load_user;
use crate::context::{clear_notifications, flush_and_await, print_notifications};
use crate::output::Output;

/// Load the user, apply `fields` (or prompt for every field when none
/// were given), then save the full record.
#[instrument(skip_all, name = "edit", fields(user = id))]
pub async fn run_edit(ctx: &mut StateCtx, out: &Output, id: &str, fields: EditArgs) -> Result<()> {
    load_user(ctx, id).await?;

    if fields.is_empty() {
        let form = prompt_form(ctx.state::<EditUserForm>())?;
        panel::update_form(ctx, |current| *current = form);
    } else {
        panel::update_form(ctx, |form| apply_fields(form, fields));
    }

    save(ctx, out).await
}

/// Submit the loaded form and wait for the result.
pub async fn save(ctx: &mut StateCtx, out: &Output) -> Result<()> {
    panel::submit_edit(ctx).context("Could not save user")?;
    flush_and_await(ctx).await;

    match panel::settle_edit_save(ctx) {
        Some(SaveOutcome::Saved) => {
            print_notifications(ctx, out);
            Ok(())
        }
        Some(SaveOutcome::Failed(message)) => {
            clear_notifications(ctx);
            Err(anyhow!(message).context("Could not save user"))
        }
        None => bail!("Saving user did not complete"),
    }
}

fn apply_fields(form: &mut EditUserForm, fields: EditArgs) {
    let EditArgs {
        first_name,
        last_name,
        username,
        email,
        mobile,
    } = fields;

    for (slot, value) in [
        (&mut form.first_name, first_name),
        (&mut form.last_name, last_name),
        (&mut form.username, username),
        (&mut form.email, email),
        (&mut form.mobile, mobile),
    ] {
        if let Some(value) = value {
            *slot = value;
        }
    }
}

/// Ask for each field, pre-filled with the loaded value.
pub fn prompt_form(current: &EditUserForm) -> Result<EditUserForm> {
    let ask = |label: &str, initial: &str| -> Result<String> {
        Text::new(label)
            .with_initial_value(initial)
            .prompt()
            .with_context(|| format!("Failed to read {label}"))
    };

    Ok(EditUserForm {
        source_id: current.source_id,
        first_name: ask("First name:", &current.first_name)?,
        last_name: ask("Last name:", &current.last_name)?,
        username: ask("Username:", &current.username)?,
        email: ask("Email:", &current.email)?,
        mobile: ask("Mobile:", &current.mobile)?,
    })
}
