//! `dowurk guide`: interactive chat with the general DowUrk guide.

use anyhow::Result;
use console::style;
use tracing::Instrument;

use dowurk_core::chat::SendOutcome;
use dowurk_core::chat::guide::quick_actions;
use dowurk_observe::attributes::{
    OUTCOME_DEGRADED, OUTCOME_REJECTED, OUTCOME_REPLIED, SPAN_GUIDE_SESSION, SPAN_GUIDE_TURN,
};
use dowurk_types::chat::ContextType;

use super::assistant::print_reply;
use super::input::{ChatInput, InputEvent, SlashCommand, parse_command};
use crate::state::{AppState, ConcreteGuide};

pub async fn handle_guide(state: &AppState, context_type: ContextType) -> Result<()> {
    let guide = state.guide(context_type);
    let span = tracing::info_span!(SPAN_GUIDE_SESSION, context_type = %context_type);
    run_guide_loop(&guide).instrument(span).await
}

async fn run_guide_loop(guide: &ConcreteGuide) -> Result<()> {
    println!();
    if let Some(greeting) = guide.messages().first() {
        println!("  {} {}", style("Guide").magenta().bold(), greeting.content);
    }
    println!(
        "  {} {}",
        style("Try:").dim(),
        quick_actions()
            .iter()
            .enumerate()
            .map(|(i, action)| format!("[{}] {action}", i + 1))
            .collect::<Vec<_>>()
            .join("  ")
    );
    println!("  {}", style(format!("Topic: {}  -  /quit to leave", guide.context_type())).dim());
    println!();

    let prompt = format!("  {} ", style("You >").green().bold());
    let (mut input, _writer) =
        ChatInput::new(prompt).map_err(|e| anyhow::anyhow!("Failed to initialize input: {e}"))?;

    loop {
        let line = match input.read_line().await {
            InputEvent::Line(line) => line,
            InputEvent::Eof | InputEvent::Interrupted => break,
        };

        let message = match parse_command(&line) {
            Some(SlashCommand::Quit) => break,
            Some(SlashCommand::Context(Some(topic))) => {
                match topic.parse::<ContextType>() {
                    Ok(context_type) => {
                        guide.set_context_type(context_type);
                        println!("  {} {context_type}\n", style("Topic set:").dim());
                    }
                    Err(e) => println!("  {} {e}\n", style("?").yellow()),
                }
                continue;
            }
            Some(SlashCommand::Help) | Some(SlashCommand::Context(None)) => {
                println!("  /context <general|business_planning|grants|legal|marketing>  change topic");
                println!("  /quit  leave the conversation\n");
                continue;
            }
            Some(other) => {
                println!("  {} {other:?} is not available in the guide.\n", style("?").yellow());
                continue;
            }
            None => resolve_quick_action(&line),
        };

        let span = tracing::info_span!(SPAN_GUIDE_TURN, outcome = tracing::field::Empty);
        match guide.send(&message).instrument(span.clone()).await {
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

    input.flush();
    println!("\n  {}", style("Goodbye!").dim());
    Ok(())
}

/// A bare number picks the matching quick action; anything else is sent as typed.
fn resolve_quick_action(line: &str) -> String {
    line.trim()
        .parse::<usize>()
        .ok()
        .and_then(|n| n.checked_sub(1))
        .and_then(|i| quick_actions().get(i))
        .map(|action| action.to_string())
        .unwrap_or_else(|| line.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_number_selects_quick_action() {
        assert_eq!(resolve_quick_action("1"), "Find businesses");
        assert_eq!(resolve_quick_action(" 3 "), "Find grants");
    }

    #[test]
    fn test_other_input_is_sent_verbatim() {
        assert_eq!(resolve_quick_action("0"), "0");
        assert_eq!(resolve_quick_action("4"), "4");
        assert_eq!(resolve_quick_action("How do grants work?"), "How do grants work?");
    }
}
