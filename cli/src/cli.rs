use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;

#[derive(Parser, Debug)]
#[command(name = "keeper")]
#[command(about = "Administer user accounts, plans and devices", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Base URL of the admin API (overrides config file and KEEPER_API_BASE_URL)
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    /// Bearer token (overrides config file and KEEPER_API_TOKEN)
    #[arg(long, global = true)]
    pub token: Option<String>,

    /// Show timing/latency information
    #[arg(long, global = true)]
    pub timing: bool,

    /// Enable verbose debug output
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List users, one page at a time
    List {
        /// Page number (1-based); clamped to the last page
        #[arg(long, short = 'p', default_value_t = 1)]
        page: u32,

        #[command(flatten)]
        filters: FilterArgs,

        /// Interactive mode (pick a user, then an action)
        #[arg(long, short = 'I')]
        interactive: bool,
    },
    /// Show one user's full record
    Show { id: String },
    /// Edit a user's name, username, email or mobile
    Edit {
        id: String,

        #[command(flatten)]
        fields: EditArgs,
    },
    /// Activate or deactivate a user
    Status {
        id: String,

        #[arg(long, conflicts_with = "inactive", required_unless_present = "inactive")]
        active: bool,

        #[arg(long)]
        inactive: bool,
    },
    /// Reset a user's password
    Password {
        id: String,

        /// New password (at least 8 characters)
        #[arg(long, conflicts_with = "generate", required_unless_present = "generate")]
        password: Option<String>,

        /// Generate a random 12-character password and print it
        #[arg(long)]
        generate: bool,
    },
    /// Credit or debit a user's wallet
    Wallet {
        id: String,

        /// Positive amount
        #[arg(long, allow_negative_numbers = true)]
        amount: i64,

        #[arg(long, conflicts_with = "debit", required_unless_present = "debit")]
        credit: bool,

        #[arg(long)]
        debit: bool,
    },
    /// Assign or remove a subscription plan
    Plan {
        #[command(subcommand)]
        action: PlanAction,
    },
    /// Set the concurrent-session limit
    Limits {
        id: String,

        /// `unlimited`, `blocked`, or a positive number
        #[arg(long)]
        sessions: String,
    },
    /// Ask devices to fetch an update
    RequestUpdate {
        /// Target user; omit with --all
        #[arg(required_unless_present = "all", conflicts_with = "all")]
        id: Option<String>,

        /// Broadcast to every device
        #[arg(long)]
        all: bool,
    },
    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Subcommand, Debug)]
pub enum PlanAction {
    /// Assign a plan by id or by searching the catalogue
    Assign {
        id: String,

        /// Plan id
        #[arg(long, conflicts_with = "search", required_unless_present = "search")]
        plan: Option<String>,

        /// Search term; pick from the matches interactively
        #[arg(long)]
        search: Option<String>,
    },
    /// Remove the user's current plan
    Remove { id: String },
}

#[derive(Args, Debug, Default, Clone)]
pub struct FilterArgs {
    /// Exact name match
    #[arg(long)]
    pub name: Option<String>,

    /// Exact email match
    #[arg(long)]
    pub email: Option<String>,

    /// Exact mobile match
    #[arg(long)]
    pub mobile: Option<String>,
}

#[derive(Args, Debug, Default, Clone)]
pub struct EditArgs {
    #[arg(long)]
    pub first_name: Option<String>,

    #[arg(long)]
    pub last_name: Option<String>,

    #[arg(long)]
    pub username: Option<String>,

    #[arg(long)]
    pub email: Option<String>,

    #[arg(long)]
    pub mobile: Option<String>,
}

impl EditArgs {
    pub fn is_empty(&self) -> bool {
        self.first_name.is_none()
            && self.last_name.is_none()
            && self.username.is_none()
            && self.email.is_none()
            && self.mobile.is_none()
    }
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory as _;

    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn wallet_requires_amount() {
        assert!(Cli::try_parse_from(["keeper", "wallet", "u1", "--debit"]).is_err());
        let cli = Cli::try_parse_from(["keeper", "wallet", "u1", "--amount", "500", "--debit"])
            .expect("valid wallet args");
        assert!(matches!(
            cli.command,
            Commands::Wallet {
                amount: 500,
                debit: true,
                ..
            }
        ));
    }

    #[test]
    fn status_needs_exactly_one_direction() {
        assert!(Cli::try_parse_from(["keeper", "status", "u1"]).is_err());
        assert!(
            Cli::try_parse_from(["keeper", "status", "u1", "--active", "--inactive"]).is_err()
        );
        assert!(Cli::try_parse_from(["keeper", "status", "u1", "--inactive"]).is_ok());
    }

    #[test]
    fn request_update_takes_id_or_all() {
        assert!(Cli::try_parse_from(["keeper", "request-update"]).is_err());
        assert!(Cli::try_parse_from(["keeper", "request-update", "--all"]).is_ok());
        assert!(Cli::try_parse_from(["keeper", "request-update", "u1"]).is_ok());
        assert!(Cli::try_parse_from(["keeper", "request-update", "u1", "--all"]).is_err());
    }

    #[test]
    fn global_flags_apply_to_subcommands() {
        let cli = Cli::try_parse_from([
            "keeper",
            "list",
            "--api-url",
            "http://localhost:1",
            "--name",
            "ada",
        ])
        .expect("valid list args");
        assert_eq!(cli.api_url.as_deref(), Some("http://localhost:1"));
        let Commands::List { filters, page, .. } = cli.command else {
            panic!("expected list");
        };
        assert_eq!(page, 1);
        assert_eq!(filters.name.as_deref(), Some("ada"));
    }
}
