//! Business-assistant commands.
//!
//! `dowurk assistant` runs an interactive conversation; `history` and
//! `clear` act on an existing session without entering the loop.

use anyhow::{Context, Result};
use clap::Subcommand;
use console::style;
use dialoguer::Confirm;
use tracing::Instrument;

use dowurk_core::chat::assistant::CLEAR_PROMPT;
use dowurk_core::chat::{ClearOutcome, HistoryOutcome, SendOutcome};
use dowurk_observe::attributes::{
    OUTCOME_DEGRADED, OUTCOME_REJECTED, OUTCOME_REPLIED, SPAN_ASSISTANT_SESSION,
    SPAN_ASSISTANT_TURN,
};
use dowurk_types::chat::{ChatMessage, MessageRole};

use super::AssistantArgs;
use super::input::{ChatInput, InputEvent, SlashCommand, parse_command};
use crate::state::{AppState, ConcreteAssistant};

/// Non-interactive assistant subcommands.
#[derive(Subcommand)]
pub enum AssistantCommand {
    /// Print the stored history of a session.
    History,

    /// Clear a session's history.
    Clear {
        /// Skip confirmation prompt.
        #[arg(long)]
        yes: bool,
    },
}

/// Handle `dowurk assistant ...`.
pub async fn handle_assistant(args: AssistantArgs, state: &AppState, json: bool) -> Result<()> {
    match args.action {
        None => {
            let assistant = state.assistant(args.session);
            assistant.set_context(args.context);
            let span = tracing::info_span!(
                SPAN_ASSISTANT_SESSION,
                session_id = %assistant.session_id()
            );
            run_assistant_loop(&assistant).instrument(span).await
        }
        Some(AssistantCommand::History) => {
            let session = require_session(args.session, "history")?;
            show_history(state, session, json).await
        }
        Some(AssistantCommand::Clear { yes }) => {
            let session = require_session(args.session, "clear")?;
            clear_history(state, session, yes, json).await
        }
    }
}

fn require_session(session: Option<String>, command: &str) -> Result<String> {
    session.with_context(|| format!("`dowurk assistant {command}` needs --session <ID>"))
}

async fn show_history(state: &AppState, session: String, json: bool) -> Result<()> {
    let assistant = state.assistant(Some(session));
    if let HistoryOutcome::Failed { reason } = assistant.load_history().await {
        anyhow::bail!("Failed to load chat history: {reason}");
    }
    let messages = assistant.messages();

    if json {
        let result = serde_json::json!({
            "session_id": assistant.session_id(),
            "messages": messages,
        });
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    println!();
    if messages.is_empty() {
        println!("  {}", style("No messages in this session yet.").dim());
    } else {
        for message in &messages {
            print_message(message);
        }
    }
    println!();
    Ok(())
}

async fn clear_history(state: &AppState, session: String, yes: bool, json: bool) -> Result<()> {
    let assistant = state.assistant(Some(session));
    let outcome = assistant
        .clear(|prompt| {
            yes || Confirm::new()
                .with_prompt(prompt)
                .default(false)
                .interact()
                .unwrap_or(false)
        })
        .await;

    if json {
        let result = match outcome {
            ClearOutcome::Declined => serde_json::json!({ "cleared": false }),
            ClearOutcome::Cleared { remote_deleted } => {
                serde_json::json!({ "cleared": true, "remote_deleted": remote_deleted })
            }
        };
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    println!();
    match outcome {
        ClearOutcome::Declined => println!("  Cancelled."),
        ClearOutcome::Cleared { remote_deleted: true } => {
            println!("  {} Chat history cleared.", style("ok").green())
        }
        ClearOutcome::Cleared { remote_deleted: false } => println!(
            "  {} Cleared locally, but the server copy could not be deleted.",
            style("!").yellow().bold()
        ),
    }
    println!();
    Ok(())
}

async fn run_assistant_loop(assistant: &ConcreteAssistant) -> Result<()> {
    println!();
    println!(
        "  {} {}",
        style("DowUrk").magenta().bold(),
        style("Business Planning Assistant").bold()
    );
    println!(
        "  {}",
        style(format!("Session {}  -  /help for commands", assistant.session_id())).dim()
    );
    if let Some(context) = assistant.context() {
        println!("  {} {}", style("Context:").dim(), context);
    }
    println!();

    match assistant.load_history().await {
        HistoryOutcome::Loaded { count } if count > 0 => {
            for message in assistant.messages() {
                print_message(&message);
            }
            println!();
        }
        HistoryOutcome::Failed { reason } => {
            eprintln!("  {} Could not load history: {reason}", style("!").yellow().bold());
        }
        _ => {}
    }

    let prompt = format!("  {} ", style("You >").green().bold());
    let (mut input, _writer) =
        ChatInput::new(prompt).map_err(|e| anyhow::anyhow!("Failed to initialize input: {e}"))?;

    loop {
        let line = match input.read_line().await {
            InputEvent::Line(line) => line,
            InputEvent::Eof | InputEvent::Interrupted => break,
        };

        match parse_command(&line) {
            Some(SlashCommand::Quit) => break,
            Some(SlashCommand::Help) => print_help(),
            Some(SlashCommand::Context(context)) => {
                assistant.set_context(context);
                match assistant.context() {
                    Some(c) => println!("  {} {c}\n", style("Context set:").dim()),
                    None => println!("  {}\n", style("Context cleared.").dim()),
                }
            }
            Some(SlashCommand::History) => {
                for message in assistant.messages() {
                    print_message(&message);
                }
                println!();
            }
            Some(SlashCommand::Clear) => {
                let confirmed = input.confirm(CLEAR_PROMPT).await;
                match assistant.clear(|_| confirmed).await {
                    ClearOutcome::Declined => {}
                    ClearOutcome::Cleared { .. } => {
                        println!("  {}\n", style("Chat history cleared.").dim())
                    }
                }
            }
            Some(SlashCommand::Unknown(cmd)) => {
                println!("  {} Unknown command {cmd}. Try /help.\n", style("?").yellow());
            }
            None => {
                let span = tracing::info_span!(SPAN_ASSISTANT_TURN, outcome = tracing::field::Empty);
                let outcome = assistant.send(&line).instrument(span.clone()).await;
                match &outcome {
                    SendOutcome::Rejected(_) => {
                        span.record("outcome", OUTCOME_REJECTED);
                    }
                    SendOutcome::Replied(reply) => {
                        span.record("outcome", OUTCOME_REPLIED);
                        print_reply(&reply.content);
                    }
                    SendOutcome::Degraded { reply, .. } => {
                        span.record("outcome", OUTCOME_DEGRADED);
                        print_reply(&reply.content);
                    }
                    SendOutcome::Discarded { .. } => {
                        span.record("outcome", OUTCOME_REJECTED);
                    }
                }
            }
        }
    }

    input.flush();
    println!("\n  {}", style("Session ended.").dim());
    println!(
        "  {}",
        style(format!("Resume with: dowurk assistant --session {}", assistant.session_id())).dim()
    );
    Ok(())
}

pub(crate) fn print_reply(content: &str) {
    println!();
    for line in content.lines() {
        println!("  {line}");
    }
    println!();
}

fn print_message(message: &ChatMessage) {
    let who = match message.role {
        MessageRole::User => style("You").green().bold(),
        MessageRole::Assistant => style("Assistant").magenta().bold(),
    };
    println!("  {who} {}", style(&message.timestamp).dim());
    for line in message.content.lines() {
        println!("    {line}");
    }
}

fn print_help() {
    println!();
    println!("  {}", style("Commands").bold());
    println!("  /context <text>  set the business context (empty clears it)");
    println!("  /history         show the conversation so far");
    println!("  /clear           clear this session's history");
    println!("  /quit            leave the session");
    println!();
}
