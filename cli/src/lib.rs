//! Command-line front end for the user-administration console.
//!
//! The binary in `main.rs` only parses arguments and wires tracing; the
//! commands live here so integration tests can drive them directly.

pub mod cli;
pub mod commands;
pub mod config;
pub mod context;
pub mod output;
pub mod timing;

use anyhow::Result;
use keeper_business::users::WalletDirection;
use keeper_states::StateCtx;

use crate::cli::{Commands, PlanAction};
use crate::commands::PlanChoice;
use crate::output::Output;

/// Run one parsed subcommand against `ctx`.
///
/// `Completions` needs no backend and is handled by the caller.
pub async fn dispatch(ctx: &mut StateCtx, out: &Output, command: Commands) -> Result<()> {
    match command {
        Commands::List {
            page,
            filters,
            interactive,
        } => commands::run_list(ctx, out, page, filters, interactive).await,
        Commands::Show { id } => commands::run_show(ctx, out, &id).await,
        Commands::Edit { id, fields } => commands::run_edit(ctx, out, &id, fields).await,
        Commands::Status { id, active, .. } => commands::run_status(ctx, out, &id, active).await,
        Commands::Password { id, password, .. } => {
            commands::run_password(ctx, out, &id, password).await
        }
        Commands::Wallet {
            id, amount, debit, ..
        } => {
            let direction = if debit {
                WalletDirection::Debit
            } else {
                WalletDirection::Credit
            };
            commands::run_wallet(ctx, out, &id, amount, direction).await
        }
        Commands::Plan { action } => match action {
            PlanAction::Assign { id, plan, search } => {
                let choice = match (plan, search) {
                    (Some(plan), _) => PlanChoice::Id(plan),
                    (None, Some(term)) => PlanChoice::Search(term),
                    (None, None) => anyhow::bail!("Pass --plan or --search"),
                };
                commands::run_plan_assign(ctx, out, &id, choice).await
            }
            PlanAction::Remove { id } => commands::run_plan_remove(ctx, out, &id).await,
        },
        Commands::Limits { id, sessions } => commands::run_limits(ctx, out, &id, &sessions).await,
        Commands::RequestUpdate { id, .. } => {
            commands::run_request_update(ctx, out, id.as_deref()).await
        }
        Commands::Completions { shell } => {
            commands::generate_completions(shell);
            Ok(())
        }
    }
}
