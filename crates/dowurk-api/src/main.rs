//! DowUrk command-line client entry point.
//!
//! Binary name: `dowurk`
//!
//! Parses CLI arguments, sets up tracing, loads the client configuration,
//! then dispatches to the appropriate command handler.

mod cli;
mod state;

use std::process::ExitCode;

use clap::Parser;
use clap_complete::generate;

use cli::{Cli, Commands};
use dowurk_observe::tracing_setup::{init_tracing, shutdown_tracing, verbosity_filter};
use state::AppState;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    init_tracing(verbosity_filter(cli.verbose, cli.quiet), cli.otel)
        .map_err(|e| anyhow::anyhow!("Failed to initialize tracing: {e}"))?;

    let result = run(cli).await;
    shutdown_tracing();
    result
}

async fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    // Shell completions don't need app state
    if let Commands::Completions { shell } = &cli.command {
        let mut cmd = <Cli as clap::CommandFactory>::command();
        generate(*shell, &mut cmd, "dowurk", &mut std::io::stdout());
        return Ok(ExitCode::SUCCESS);
    }

    let state = AppState::init(cli.backend_url).await?;

    match cli.command {
        Commands::Payment { action } => {
            let confirmed = cli::payment::handle_payment_command(action, &state, cli.json).await?;
            if !confirmed {
                return Ok(ExitCode::FAILURE);
            }
        }

        Commands::Assistant(args) => {
            cli::assistant::handle_assistant(args, &state, cli.json).await?;
        }

        Commands::Guide { context_type } => {
            cli::guide::handle_guide(&state, context_type).await?;
        }

        Commands::User { action } => {
            cli::user::handle_user_command(action, &state, cli.json).await?;
        }

        Commands::Completions { .. } => unreachable!("handled above"),
    }

    Ok(ExitCode::SUCCESS)
}
