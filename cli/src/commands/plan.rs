//! Plan assignment commands.

use anyhow::{Context as _, Result, bail};
use inquire::Select;
use keeper_business::users::panel;
use keeper_business::users::{
    ActiveModal, Mutation, MutationKind, Plan, PlanSearchCompute, PlanSearchStatus, UserRecord,
};
use keeper_states::StateCtx;
use tracing::instrument;
use ustr::Ustr;

use crate::commands::actions::{run_mutation, submit_open_dialog};
use crate::context::flush_and_await;
use crate::output::Output;

/// How the operator names the plan to assign.
#[derive(Debug, Clone)]
pub enum PlanChoice {
    Id(String),
    Search(String),
}

#[instrument(skip_all, name = "plan_assign", fields(user = id))]
pub async fn run_plan_assign(
    ctx: &mut StateCtx,
    out: &Output,
    id: &str,
    choice: PlanChoice,
) -> Result<()> {
    let modal = ActiveModal::for_kind(MutationKind::AssignPlan, Some(UserRecord::with_id(id)))?;
    panel::open_modal(ctx, modal).context("Cannot assign a plan")?;

    let plan = match choice {
        PlanChoice::Id(plan) => Ustr::from(plan.trim()),
        PlanChoice::Search(term) => {
            let plans = search(ctx, &term).await?;
            match pick_plan(out, plans)? {
                Some(plan) => plan.id,
                None => {
                    panel::close_modal(ctx)?;
                    out.dim("No plan selected.");
                    return Ok(());
                }
            }
        }
    };

    panel::select_plan(ctx, (!plan.is_empty()).then_some(plan));
    let mutation = panel::selected_plan_mutation(ctx);
    submit_open_dialog(ctx, out, mutation).await
}

pub async fn run_plan_remove(ctx: &mut StateCtx, out: &Output, id: &str) -> Result<()> {
    run_mutation(ctx, out, Some(UserRecord::with_id(id)), Mutation::UnassignPlan).await
}

/// Run the debounced catalogue search and return the matches.
pub async fn search(ctx: &mut StateCtx, term: &str) -> Result<Vec<Plan>> {
    panel::search_plans(ctx, term);
    flush_and_await(ctx).await;

    match &ctx.compute::<PlanSearchCompute>().status {
        PlanSearchStatus::Loaded { plans, .. } => Ok(plans.clone()),
        PlanSearchStatus::Error(message) => bail!("Could not search plans: {message}"),
        PlanSearchStatus::Idle | PlanSearchStatus::Loading { .. } => {
            bail!("Plan search did not complete")
        }
    }
}

/// A single match is taken as-is; several are offered in a picker.
fn pick_plan(out: &Output, plans: Vec<Plan>) -> Result<Option<Plan>> {
    match plans.len() {
        0 => bail!("No plans match the search"),
        1 => {
            let plan = plans.into_iter().next();
            if let Some(plan) = &plan {
                out.info(format!("Using plan {}", plan_label(plan)));
            }
            Ok(plan)
        }
        _ => {
            let labels: Vec<String> = plans.iter().map(plan_label).collect();
            let picked = Select::new("Select plan:", labels.clone())
                .with_help_message("Use arrow keys to navigate, Enter to select")
                .prompt_skippable()
                .context("Failed to select plan")?;
            Ok(picked.and_then(|label| {
                labels
                    .iter()
                    .position(|l| *l == label)
                    .and_then(|i| plans.get(i).cloned())
            }))
        }
    }
}

pub fn plan_label(plan: &Plan) -> String {
    match plan.price {
        Some(price) => format!("{} ({price:.2}) [{}]", plan.name, plan.id),
        None => format!("{} [{}]", plan.name, plan.id),
    }
}
