//! Interactive mode for `keeper list -I`: pick a user, then an action.

use std::fmt;

use anyhow::{Context as _, Result};
use inquire::{Confirm, CustomType, Password, Select, Text};
use keeper_business::users::panel;
use keeper_business::users::{
    EditUserForm, Mutation, MutationKind, SessionLimit, UserRecord, WalletDirection,
};
use keeper_states::StateCtx;

use crate::commands::actions::{run_mutation, run_password};
use crate::commands::edit::{prompt_form, save};
use crate::commands::list::{ListedPage, current_page, render, step_page};
use crate::commands::plan::{PlanChoice, run_plan_assign};
use crate::commands::show::{load_user, print_user};
use crate::context::flush_and_await;
use crate::output::Output;

/// Entries in the user picker.
#[derive(Debug, Clone, PartialEq)]
enum ListChoice {
    User(UserRecord),
    NextPage,
    PrevPage,
    UpdateAllDevices,
    Quit,
}

impl fmt::Display for ListChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::User(user) => write!(f, "{} <{}> [{}]", user.display_name(), user.status, user.id),
            Self::NextPage => f.write_str("→ Next page"),
            Self::PrevPage => f.write_str("← Previous page"),
            Self::UpdateAllDevices => f.write_str("⟳ Request update on all devices"),
            Self::Quit => f.write_str("Quit"),
        }
    }
}

/// Entries in the per-user action menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum UserAction {
    Show,
    Edit,
    Mutate(MutationKind),
}

impl fmt::Display for UserAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Show => f.write_str("Show details"),
            Self::Edit => f.write_str("Edit profile"),
            Self::Mutate(kind) => {
                let label = kind.label();
                let mut chars = label.chars();
                match chars.next() {
                    Some(first) => write!(f, "{}{}", first.to_uppercase(), chars.as_str()),
                    None => Ok(()),
                }
            }
        }
    }
}

fn list_choices(listed: &ListedPage) -> Vec<ListChoice> {
    let mut choices: Vec<ListChoice> = listed.records.iter().cloned().map(ListChoice::User).collect();
    if listed.page.has_next() {
        choices.push(ListChoice::NextPage);
    }
    if listed.page.has_prev() {
        choices.push(ListChoice::PrevPage);
    }
    choices.push(ListChoice::UpdateAllDevices);
    choices.push(ListChoice::Quit);
    choices
}

fn user_actions(user: &UserRecord) -> Vec<UserAction> {
    let mut actions = vec![UserAction::Show, UserAction::Edit];
    actions.extend(
        MutationKind::ALL
            .into_iter()
            .filter(|kind| kind.needs_target())
            .filter(|kind| *kind != MutationKind::UnassignPlan || user.has_plan())
            .map(UserAction::Mutate),
    );
    actions
}

/// Loop until the operator quits. Action failures are reported and the
/// loop continues.
pub async fn run(ctx: &mut StateCtx, out: &Output, mut listed: ListedPage) -> Result<()> {
    loop {
        out.newline();
        render(out, &listed);

        let choice = Select::new("Select user:", list_choices(&listed))
            .with_help_message("Use arrow keys to navigate, Enter to select, Esc to quit")
            .prompt_skippable()
            .context("Failed to select user")?;

        let result = match choice {
            None | Some(ListChoice::Quit) => return Ok(()),
            Some(ListChoice::NextPage) => {
                listed = step_page(ctx, true).await?;
                continue;
            }
            Some(ListChoice::PrevPage) => {
                listed = step_page(ctx, false).await?;
                continue;
            }
            Some(ListChoice::UpdateAllDevices) => {
                if confirm("Ask every device to fetch an update?")? {
                    run_mutation(ctx, out, None, Mutation::RequestAllDevicesUpdate).await
                } else {
                    Ok(())
                }
            }
            Some(ListChoice::User(user)) => act_on_user(ctx, out, user).await,
        };

        if let Err(err) = result {
            out.error(format!("{err:#}"));
        }

        // A successful action queues a list refresh.
        flush_and_await(ctx).await;
        listed = current_page(ctx);
    }
}

async fn act_on_user(ctx: &mut StateCtx, out: &Output, user: UserRecord) -> Result<()> {
    let action = Select::new(
        &format!("Action for {}:", user.display_name()),
        user_actions(&user),
    )
    .prompt_skippable()
    .context("Failed to select action")?;

    let Some(action) = action else {
        return Ok(());
    };

    match action {
        UserAction::Show => {
            let record = load_user(ctx, &user.id).await?;
            print_user(out, &record);
            Ok(())
        }
        UserAction::Edit => {
            load_user(ctx, &user.id).await?;
            let form = prompt_form(ctx.state::<EditUserForm>())?;
            panel::update_form(ctx, |current| *current = form);
            save(ctx, out).await
        }
        UserAction::Mutate(MutationKind::AssignPlan) => {
            let term = Text::new("Search plans:")
                .prompt()
                .context("Failed to read search term")?;
            run_plan_assign(ctx, out, &user.id, PlanChoice::Search(term)).await
        }
        UserAction::Mutate(MutationKind::Password) => {
            let generate = Confirm::new("Generate a random password?")
                .with_default(true)
                .prompt()
                .context("Failed to read answer")?;
            let password = if generate {
                None
            } else {
                Some(
                    Password::new("New password:")
                        .without_confirmation()
                        .prompt()
                        .context("Failed to read password")?,
                )
            };
            run_password(ctx, out, &user.id, password).await
        }
        UserAction::Mutate(kind) => match prompt_mutation(kind, &user)? {
            Some(mutation) => run_mutation(ctx, out, Some(user), mutation).await,
            None => Ok(()),
        },
    }
}

/// Collect the dialog input for `kind`. `None` means the operator backed out.
///
/// Plan assignment and password reset have their own flows.
fn prompt_mutation(kind: MutationKind, user: &UserRecord) -> Result<Option<Mutation>> {
    let name = user.display_name();
    let mutation = match kind {
        MutationKind::Status => {
            let next = user.status.toggled();
            confirm(&format!("Set {name} to {next}?"))?.then_some(Mutation::SetStatus(next))
        }
        MutationKind::Wallet => {
            let direction = Select::new("Direction:", vec!["Credit", "Debit"])
                .prompt()
                .context("Failed to read direction")?;
            let direction = if direction == "Debit" {
                WalletDirection::Debit
            } else {
                WalletDirection::Credit
            };
            let amount = CustomType::<i64>::new("Amount:")
                .with_error_message("Enter a whole number")
                .prompt()
                .context("Failed to read amount")?;
            Some(Mutation::AdjustWallet { amount, direction })
        }
        MutationKind::UnassignPlan => {
            confirm(&format!("Remove the plan from {name}?"))?.then_some(Mutation::UnassignPlan)
        }
        MutationKind::Limits => {
            let current = user.session_limit().to_string();
            let answer = Text::new("Sessions (unlimited, blocked or a number):")
                .with_initial_value(&current)
                .prompt()
                .context("Failed to read session limit")?;
            let limit: SessionLimit = answer.parse()?;
            Some(Mutation::SetLimits(limit))
        }
        MutationKind::RequestDeviceUpdate => confirm(&format!("Ask {name}'s device to update?"))?
            .then_some(Mutation::RequestDeviceUpdate),
        MutationKind::RequestAllDevicesUpdate => Some(Mutation::RequestAllDevicesUpdate),
        MutationKind::AssignPlan | MutationKind::Password => None,
    };
    Ok(mutation)
}

fn confirm(message: &str) -> Result<bool> {
    Confirm::new(message)
        .with_default(false)
        .prompt()
        .context("Failed to read confirmation")
}
