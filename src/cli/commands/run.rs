//! Run command implementation: one non-interactive research run.

use crate::agent::{ResearchRequest, ResearchService, RunOutcome};
use crate::cli::Output;
use crate::config::Settings;
use anyhow::Result;

/// Run the research command.
pub async fn run_research(
    query: &str,
    model: Option<String>,
    json: bool,
    raw: bool,
    mut settings: Settings,
) -> Result<()> {
    if let Some(model) = model {
        settings.model.name = model;
    }

    let request = ResearchRequest {
        model_api_key: settings.credentials.groq_api_key.clone(),
        search_api_key: settings.credentials.tavily_api_key.clone(),
        query: Some(query.to_string()),
    };

    let service = ResearchService::hosted(settings)?;

    let spinner = Output::spinner("Researching...");
    let outcome = service.research(request).await;
    spinner.finish_and_clear();

    if json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
        return Ok(());
    }

    match outcome {
        RunOutcome::Invalid { warning } => {
            Output::warning(&warning.to_string());
            Output::info("Set GROQ_API_KEY and TAVILY_API_KEY, or run 'delve doctor'.");
        }
        RunOutcome::Failed { error } => {
            Output::error(&error);
        }
        RunOutcome::Completed { transcript } => {
            for message in &transcript.messages {
                Output::message(message, raw);
            }
            println!();
            Output::success(&format!(
                "Research complete: {} message(s), {} tool round(s)",
                transcript.messages.len(),
                transcript.tool_rounds
            ));
            if transcript.step_cap_reached {
                Output::warning("Stopped at the tool round limit; the answer may be incomplete.");
            }
        }
    }

    Ok(())
}
