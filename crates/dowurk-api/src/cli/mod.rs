//! CLI command definitions for the `dowurk` binary.
//!
//! Uses clap derive macros for argument parsing. Commands are grouped by
//! area (`dowurk payment confirm`, `dowurk assistant history`, ...).

pub mod assistant;
pub mod guide;
pub mod input;
pub mod payment;
pub mod user;

use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;

use dowurk_types::chat::ContextType;

/// DowUrk client: confirm payments and talk to the business assistant.
#[derive(Parser)]
#[command(name = "dowurk", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output machine-readable JSON instead of styled text.
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress all output except errors.
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Detailed output (-v for verbose, -vv for debug/trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Export tracing spans via OpenTelemetry (stdout exporter).
    #[arg(long, global = true)]
    pub otel: bool,

    /// Backend base URL, overriding `config.toml`.
    #[arg(long, global = true, env = "DOWURK_BACKEND_URL")]
    pub backend_url: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Payment confirmation after checkout.
    Payment {
        #[command(subcommand)]
        action: payment::PaymentCommand,
    },

    /// Chat with the business-planning assistant.
    Assistant(AssistantArgs),

    /// Chat with the general DowUrk guide.
    Guide {
        /// Topic hint sent with every message.
        #[arg(long, default_value = "general")]
        context_type: ContextType,
    },

    /// Inspect the locally stored user record.
    User {
        #[command(subcommand)]
        action: user::UserCommand,
    },

    /// Generate shell completions.
    Completions {
        /// Shell to generate completions for.
        shell: Shell,
    },
}

/// `dowurk assistant`: an interactive session unless a subcommand is given.
#[derive(Args)]
pub struct AssistantArgs {
    /// Business context sent with every message.
    #[arg(long)]
    pub context: Option<String>,

    /// Assistant session ID (required by `history` and `clear`).
    #[arg(long, global = true)]
    pub session: Option<String>,

    #[command(subcommand)]
    pub action: Option<assistant::AssistantCommand>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition_is_valid() {
        <Cli as clap::CommandFactory>::command().debug_assert();
    }

    #[test]
    fn test_parse_payment_confirm() {
        let cli = Cli::try_parse_from(["dowurk", "payment", "confirm", "cs_test_123"]).unwrap();
        match cli.command {
            Commands::Payment {
                action: payment::PaymentCommand::Confirm { session_id },
            } => assert_eq!(session_id, "cs_test_123"),
            _ => panic!("expected payment confirm"),
        }
    }

    #[test]
    fn test_parse_assistant_with_context_and_session() {
        let cli = Cli::try_parse_from([
            "dowurk",
            "assistant",
            "--context",
            "Food truck in Austin",
            "--session",
            "session-abc",
        ])
        .unwrap();
        match cli.command {
            Commands::Assistant(args) => {
                assert_eq!(args.context.as_deref(), Some("Food truck in Austin"));
                assert_eq!(args.session.as_deref(), Some("session-abc"));
                assert!(args.action.is_none());
            }
            _ => panic!("expected assistant"),
        }
    }

    #[test]
    fn test_parse_assistant_clear_with_session_after_subcommand() {
        let cli =
            Cli::try_parse_from(["dowurk", "assistant", "clear", "--session", "s-1", "--yes"])
                .unwrap();
        match cli.command {
            Commands::Assistant(AssistantArgs {
                session,
                action: Some(assistant::AssistantCommand::Clear { yes }),
                ..
            }) => {
                assert_eq!(session.as_deref(), Some("s-1"));
                assert!(yes);
            }
            _ => panic!("expected assistant clear"),
        }
    }

    #[test]
    fn test_parse_guide_context_type() {
        let cli =
            Cli::try_parse_from(["dowurk", "guide", "--context-type", "business-planning"]).unwrap();
        match cli.command {
            Commands::Guide { context_type } => {
                assert_eq!(context_type, ContextType::BusinessPlanning)
            }
            _ => panic!("expected guide"),
        }

        let cli = Cli::try_parse_from(["dowurk", "guide"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Guide {
                context_type: ContextType::General
            }
        ));
        assert!(Cli::try_parse_from(["dowurk", "guide", "--context-type", "astrology"]).is_err());
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["dowurk", "user", "show", "--json", "-vv"]).unwrap();
        assert!(cli.json);
        assert_eq!(cli.verbose, 2);
    }
}
