//! Ask command implementation.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::Orchestrator;
use anyhow::Result;

/// Run the ask command.
pub async fn run_ask(question: &str, model: Option<String>, mut settings: Settings) -> Result<()> {
    // Pre-flight checks
    if let Err(e) = preflight::check(Operation::Ask, &settings) {
        Output::error(&format!("{}", e));
        return Err(e.into());
    }

    if let Some(model) = model {
        settings.model.model = model;
    }

    let orchestrator = Orchestrator::new(settings)?;

    let spinner = Output::spinner("Thinking...");

    match orchestrator.query(question, None).await {
        Ok(result) => {
            spinner.finish_and_clear();
            println!("\n{}\n", result.answer);
            Output::sources(&result.sources);
        }
        Err(e) => {
            spinner.finish_and_clear();
            Output::error(&format!("Failed to generate answer: {}", e));
            return Err(e.into());
        }
    }

    Ok(())
}
