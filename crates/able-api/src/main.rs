//! Able Connect chat CLI entry point.
//!
//! Binary name: `able`
//!
//! Parses CLI arguments, initializes tracing, the database and services,
//! then dispatches to the appropriate command handler.

mod cli;
mod state;

use clap::Parser;
use clap_complete::generate;

use cli::{Cli, Commands};
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Set up tracing based on verbosity
    let filter = match cli.verbose {
        0 if cli.quiet => "error",
        0 => "warn",
        1 => "info,able_core=debug,able_infra=debug",
        _ => "trace",
    };

    able_observe::tracing_setup::init_tracing(filter, cli.otel)
        .map_err(|e| anyhow::anyhow!("failed to initialize tracing: {e}"))?;

    let result = run(cli).await;

    able_observe::tracing_setup::shutdown_tracing();
    result
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    // Shell completions don't need app state
    if let Commands::Completions { shell } = &cli.command {
        let mut cmd = <Cli as clap::CommandFactory>::command();
        generate(*shell, &mut cmd, "able", &mut std::io::stdout());
        return Ok(());
    }

    // Initialize application state (DB, services)
    let state = AppState::init().await?;

    let outcome = match cli.command {
        Commands::Account { action } => {
            cli::account::handle_account_command(action, &state, cli.json, cli.quiet).await
        }
        Commands::Chat { action } => {
            cli::chat::handle_chat_command(action, &state, cli.json, cli.quiet).await
        }
        Commands::Admin { action } => {
            cli::admin::handle_admin_command(action, &state, cli.json, cli.quiet).await
        }
        Commands::Status => cli::status::status(&state, cli.json).await,
        Commands::Completions { .. } => unreachable!("handled above"),
    };

    state.db_pool.close().await;
    outcome
}
