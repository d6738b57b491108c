use async_trait::async_trait;
use colored::Colorize;

use crate::pr::{BodyWriter, PrError};
use crate::preview::UpdateOutcome;
use crate::status::BuildVerdict;

/// Print the build status verdict to the terminal.
pub fn print_verdict(verdict: &BuildVerdict, context: &str) {
    match verdict.failure_message(context) {
        None => println!("{}", "✅ Build status is good...".green().bold()),
        Some(message) => {
            println!("{}", "❌ Build status has warnings or errors!".red().bold());
            println!("   {message}");
        }
    }
}

/// Print what the preview table update did.
pub fn print_outcome(outcome: &UpdateOutcome) {
    println!("{}", outcome_line(outcome));
}

fn outcome_line(outcome: &UpdateOutcome) -> colored::ColoredString {
    match outcome {
        UpdateOutcome::NoChangedFiles => "No files changed at all...".dimmed(),
        UpdateOutcome::NoMarkdownChanges => "No updated markdown files...".dimmed(),
        UpdateOutcome::Updated { rows, exceeds_max } => {
            let truncated = if *exceeds_max { " (truncated)" } else { "" };
            format!("Pull request updated with {rows} preview link(s){truncated}.").green()
        }
        UpdateOutcome::Failed(reason) => format!("Unable to update pull request: {reason}").yellow(),
    }
}

/// Prints the proposed body instead of writing it (`--dry-run`).
pub struct StdoutBody;

#[async_trait]
impl BodyWriter for StdoutBody {
    async fn update_body(&self, body: &str) -> Result<(), PrError> {
        println!("{}", "═══ Proposed PR body ═══".bold());
        println!("{body}");
        println!("{}", "═══════════════════════".bold());
        Ok(())
    }
}
