//! List users command.

use anyhow::{Result, bail};
use keeper_business::users::panel;
use keeper_business::users::{
    FilterCriteria, PageState, PaginationCompute, UserListCompute, UserListQuery, UserListStatus,
    UserRecord,
};
use keeper_states::StateCtx;
use tabled::settings::Style;
use tabled::{Table, Tabled};
use tracing::instrument;

use crate::cli::FilterArgs;
use crate::commands::interactive;
use crate::commands::show::{plan_cell, wallet_cell};
use crate::context::flush_and_await;
use crate::output::Output;

/// One fetched page as shown to the operator.
#[derive(Debug, Clone)]
pub struct ListedPage {
    pub records: Vec<UserRecord>,
    pub page: PageState,
}

impl From<FilterArgs> for FilterCriteria {
    fn from(args: FilterArgs) -> Self {
        Self {
            name: args.name,
            email: args.email,
            mobile: args.mobile,
        }
    }
}

#[instrument(skip_all, name = "list", fields(page = page, interactive = interactive))]
pub async fn run_list(
    ctx: &mut StateCtx,
    out: &Output,
    page: u32,
    filters: FilterArgs,
    interactive: bool,
) -> Result<()> {
    let listed = fetch_page(ctx, page, filters.into()).await?;

    if interactive {
        return interactive::run(ctx, out, listed).await;
    }

    render(out, &listed);
    Ok(())
}

/// Load `page` with `filters`. A page past the end is clamped to the last
/// page and fetched again.
pub async fn fetch_page(
    ctx: &mut StateCtx,
    page: u32,
    filters: FilterCriteria,
) -> Result<ListedPage> {
    panel::apply_filters(ctx, filters);
    ctx.update::<UserListQuery>(|query| query.page = page.max(1));
    flush_and_await(ctx).await;
    ensure_loaded(ctx)?;

    let state = ctx.compute::<PaginationCompute>().page;
    if state.clamp_page(state.page) != state.page {
        panel::go_to_page(ctx, state.page);
        flush_and_await(ctx).await;
        ensure_loaded(ctx)?;
    }

    Ok(current_page(ctx))
}

/// Step to a neighbouring page and reload.
pub async fn step_page(ctx: &mut StateCtx, forward: bool) -> Result<ListedPage> {
    if forward {
        panel::next_page(ctx);
    } else {
        panel::prev_page(ctx);
    }
    flush_and_await(ctx).await;
    ensure_loaded(ctx)?;
    Ok(current_page(ctx))
}

/// Whatever the list compute holds right now.
pub fn current_page(ctx: &StateCtx) -> ListedPage {
    ListedPage {
        records: ctx.compute::<UserListCompute>().records().to_vec(),
        page: ctx.compute::<PaginationCompute>().page,
    }
}

fn ensure_loaded(ctx: &StateCtx) -> Result<()> {
    match &ctx.compute::<UserListCompute>().status {
        UserListStatus::Loaded { .. } => Ok(()),
        UserListStatus::Error(message) => bail!("Could not list users: {message}"),
        UserListStatus::Idle | UserListStatus::Loading => bail!("List operation did not complete"),
    }
}

#[derive(Tabled)]
struct ListRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Email")]
    email: String,
    #[tabled(rename = "Mobile")]
    mobile: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Plan")]
    plan: String,
    #[tabled(rename = "Sessions")]
    sessions: String,
    #[tabled(rename = "Wallet")]
    wallet: String,
}

fn truncate_str(s: &str, max_len: usize) -> String {
    if s.chars().count() > max_len {
        let truncated: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{truncated}...")
    } else {
        s.to_owned()
    }
}

impl From<&UserRecord> for ListRow {
    fn from(user: &UserRecord) -> Self {
        let text = |value: &Option<String>| {
            value
                .as_deref()
                .map(|v| truncate_str(v, 28))
                .unwrap_or_default()
        };
        Self {
            id: user.id.to_string(),
            name: truncate_str(&user.display_name(), 24),
            email: text(&user.email),
            mobile: text(&user.mobile),
            status: user.status.to_string(),
            plan: truncate_str(&plan_cell(user), 16),
            sessions: user.session_limit().to_string(),
            wallet: wallet_cell(user),
        }
    }
}

pub fn render(out: &Output, listed: &ListedPage) {
    if listed.records.is_empty() {
        out.dim("No users found.");
        return;
    }

    let rows: Vec<ListRow> = listed.records.iter().map(ListRow::from).collect();
    let mut table = Table::new(rows);
    table.with(Style::rounded());
    out.print(table);
    out.page_footer(listed.page.page, listed.page.page_count(), listed.page.total);
}
