//! `dowurk user`: the locally stored signed-in user record.

use anyhow::Result;
use clap::Subcommand;
use console::style;

use dowurk_core::store::load_user;

use crate::state::AppState;

/// User record subcommands.
#[derive(Subcommand)]
pub enum UserCommand {
    /// Show the stored user record (including the subscription role).
    Show,
}

pub async fn handle_user_command(cmd: UserCommand, state: &AppState, json: bool) -> Result<()> {
    match cmd {
        UserCommand::Show => show_user(state, json).await,
    }
}

async fn show_user(state: &AppState, json: bool) -> Result<()> {
    let user = load_user(state.store.as_ref()).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&user)?);
        return Ok(());
    }

    println!();
    let Some(user) = user else {
        println!("  {}", style("No user record stored.").dim());
        println!(
            "  {}",
            style(format!("Expected key \"user\" in {}", state.store.path().display())).dim()
        );
        println!();
        return Ok(());
    };

    let field = |label: &str, value: Option<&str>| {
        println!("  {} {}", style(format!("{label:<8}")).dim(), value.unwrap_or("-"));
    };
    field("Name", user.name.as_deref());
    field("Email", user.email.as_deref());
    field("Plan", user.role.as_deref());
    for (key, value) in &user.extra {
        println!("  {} {value}", style(format!("{key:<8}")).dim());
    }
    println!();
    Ok(())
}
