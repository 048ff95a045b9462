//! Payment confirmation command.
//!
//! `dowurk payment confirm <SESSION_ID>` is the terminal counterpart of the
//! post-checkout landing page: it polls the checkout status with a spinner
//! and prints the outcome.

use std::time::Duration;

use anyhow::Result;
use clap::Subcommand;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::Instrument;

use dowurk_core::payment::PaymentSession;
use dowurk_observe::attributes::SPAN_PAYMENT_CONFIRM;
use dowurk_types::payment::{PaymentStatus, Remedy};

use crate::state::AppState;

/// Payment subcommands.
#[derive(Subcommand)]
pub enum PaymentCommand {
    /// Confirm a checkout by polling its status until it settles.
    Confirm {
        /// Checkout session ID from the payment redirect.
        session_id: String,
    },
}

/// Handle a payment subcommand. Returns whether the payment was confirmed.
pub async fn handle_payment_command(cmd: PaymentCommand, state: &AppState, json: bool) -> Result<bool> {
    match cmd {
        PaymentCommand::Confirm { session_id } => {
            let span = tracing::info_span!(SPAN_PAYMENT_CONFIRM, session_id = %session_id);
            confirm(state, session_id, json).instrument(span).await
        }
    }
}

async fn confirm(state: &AppState, session_id: String, json: bool) -> Result<bool> {
    let spinner = ProgressBar::new_spinner();
    if json {
        spinner.set_draw_target(indicatif::ProgressDrawTarget::hidden());
    }
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.magenta} {msg}")
            .unwrap(),
    );
    spinner.set_message("Verifying payment...");
    spinner.enable_steady_tick(Duration::from_millis(80));

    let mut handle = state.poller().start(session_id);
    let interrupted = loop {
        tokio::select! {
            snapshot = handle.next_snapshot() => match snapshot {
                Some(snapshot) => spinner.set_message(progress_message(&snapshot)),
                None => break false,
            },
            _ = tokio::signal::ctrl_c() => {
                handle.abort();
                break true;
            }
        }
    };
    let result = handle.wait().await;
    spinner.finish_and_clear();

    let Some(session) = result else {
        if interrupted {
            eprintln!("\n  {}", style("Payment check cancelled.").dim());
        }
        return Ok(false);
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&session)?);
    } else {
        print_outcome(&session);
    }
    Ok(session.status == PaymentStatus::Success)
}

fn progress_message(session: &PaymentSession) -> String {
    match session.status {
        PaymentStatus::Checking => format!(
            "Verifying payment... (attempt {}/{})",
            session.attempt + 1,
            session.max_attempts
        ),
        status => format!("Payment {status}"),
    }
}

fn print_outcome(session: &PaymentSession) {
    println!();
    if session.status == PaymentStatus::Success {
        println!(
            "  {} {}",
            style("✓").green().bold(),
            style("Payment Successful!").bold()
        );
        println!("  Thank you for subscribing to DowUrk AI.");
        if let Some(plan) = session.package_name() {
            println!();
            println!("  {} {}", style("Subscription Plan:").dim(), style(plan).magenta().bold());
        }
    } else {
        println!("  {} {}", style("✗").red().bold(), style("Payment Issue").bold());
        if let Some(failure) = &session.failure {
            println!("  {}", failure.user_message());
            let hint = match failure.remedy() {
                Remedy::RetryCheckout => "Start a new checkout from the pricing page.",
                Remedy::CheckEmail => "Your payment may still complete; watch for a confirmation email.",
                Remedy::ContactSupport => "Contact support with your checkout session ID.",
            };
            println!("  {}", style(hint).dim());
        }
    }
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;
    use dowurk_types::config::PollConfig;

    #[test]
    fn test_progress_message_counts_from_one() {
        let session = PaymentSession::new("sess_1", &PollConfig::default());
        assert_eq!(progress_message(&session), "Verifying payment... (attempt 1/5)");
    }

    #[test]
    fn test_progress_message_for_terminal_status() {
        let session = PaymentSession::new("", &PollConfig::default());
        assert_eq!(progress_message(&session), "Payment error");
    }
}
