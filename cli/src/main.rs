use std::process::ExitCode;

use clap::Parser as _;
use keeper_business::build_state_ctx;
use keeper_cli::cli::{Cli, Commands};
use keeper_cli::commands::generate_completions;
use keeper_cli::config::{Overrides, load_business_config};
use keeper_cli::output::Output;
use keeper_cli::timing::init_tracing;
use keeper_cli::dispatch;
use tracing::debug;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.timing);

    let out = Output::new();

    if let Commands::Completions { shell } = cli.command {
        generate_completions(shell);
        return ExitCode::SUCCESS;
    }

    let overrides = Overrides {
        api_url: cli.api_url,
        token: cli.token,
    };
    let config = match load_business_config(&overrides) {
        Ok(config) => config,
        Err(err) => {
            out.error(format!("{err:#}"));
            return ExitCode::FAILURE;
        }
    };
    debug!(api = %config.api_url(), "configuration resolved");

    let mut ctx = build_state_ctx(config);
    let result = dispatch(&mut ctx, &out, cli.command).await;
    ctx.shutdown().await;

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            out.error(format!("{err:#}"));
            ExitCode::FAILURE
        }
    }
}
