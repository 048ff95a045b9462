//! Line input and slash commands for the interactive chat loops.
//!
//! Wraps `rustyline_async::Readline` so the loops can await a line without
//! blocking the runtime, and parses `/`-prefixed lines into [`SlashCommand`]s.

use console::style;
use rustyline_async::{Readline, ReadlineError, ReadlineEvent, SharedWriter};

/// Events produced by the input handler.
#[derive(Debug, PartialEq)]
pub enum InputEvent {
    /// User submitted a line (untrimmed).
    Line(String),
    /// End of file (Ctrl+D).
    Eof,
    /// Interrupt signal (Ctrl+C).
    Interrupted,
}

/// Async line reader for the chat loops.
pub struct ChatInput {
    rl: Readline,
    prompt: String,
}

impl ChatInput {
    /// Returns the reader and a `SharedWriter` for printing without
    /// clobbering the prompt.
    pub fn new(prompt: String) -> Result<(Self, SharedWriter), ReadlineError> {
        let (rl, writer) = Readline::new(prompt.clone())?;
        Ok((Self { rl, prompt }, writer))
    }

    pub async fn read_line(&mut self) -> InputEvent {
        match self.rl.readline().await {
            Ok(ReadlineEvent::Line(line)) => {
                if !line.trim().is_empty() {
                    self.rl.add_history_entry(line.clone());
                }
                InputEvent::Line(line)
            }
            Ok(ReadlineEvent::Eof) => InputEvent::Eof,
            Ok(ReadlineEvent::Interrupted) => InputEvent::Interrupted,
            Err(_) => InputEvent::Eof,
        }
    }

    /// Ask a yes/no question on the input line. Anything but `y`/`yes`
    /// (including Ctrl+C) is a no.
    pub async fn confirm(&mut self, question: &str) -> bool {
        let _ = self
            .rl
            .update_prompt(&format!("  {} {} ", style(question).yellow(), style("[y/N]").dim()));
        let answer = match self.rl.readline().await {
            Ok(ReadlineEvent::Line(line)) => is_yes(&line),
            _ => false,
        };
        let _ = self.rl.update_prompt(&self.prompt);
        answer
    }

    /// Restore the terminal before the process prints its last lines.
    pub fn flush(&mut self) {
        let _ = self.rl.flush();
    }
}

fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_lowercase().as_str(), "y" | "yes")
}

/// In-chat controls.
#[derive(Debug, PartialEq)]
pub enum SlashCommand {
    Help,
    /// Replace the business context; `None` clears it.
    Context(Option<String>),
    /// Clear the conversation (asks first).
    Clear,
    /// Reprint the conversation so far.
    History,
    Quit,
    Unknown(String),
}

/// Parse `input` as a slash command. `None` means it is a chat message.
pub fn parse_command(input: &str) -> Option<SlashCommand> {
    let trimmed = input.trim();
    if !trimmed.starts_with('/') {
        return None;
    }

    let (cmd, arg) = match trimmed.split_once(char::is_whitespace) {
        Some((cmd, arg)) => (cmd, arg.trim()),
        None => (trimmed, ""),
    };

    Some(match cmd.to_lowercase().as_str() {
        "/help" | "/h" | "/?" => SlashCommand::Help,
        "/context" | "/ctx" => {
            SlashCommand::Context((!arg.is_empty()).then(|| arg.to_string()))
        }
        "/clear" => SlashCommand::Clear,
        "/history" => SlashCommand::History,
        "/quit" | "/exit" | "/q" => SlashCommand::Quit,
        other => SlashCommand::Unknown(other.to_string()),
    })
}
