//! Doctor command - verify credentials and configuration.

use crate::cli::output::mask_secret;
use crate::cli::Output;
use crate::config::Settings;
use console::style;
use std::path::Path;

/// Check result for a single item.
#[derive(Debug)]
pub struct CheckResult {
    pub name: String,
    pub status: CheckStatus,
    pub message: String,
    pub hint: Option<String>,
}

#[derive(Debug, PartialEq)]
pub enum CheckStatus {
    Ok,
    Warning,
    Error,
}

impl CheckResult {
    fn ok(name: &str, message: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Ok,
            message: message.to_string(),
            hint: None,
        }
    }

    fn warning(name: &str, message: &str, hint: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Warning,
            message: message.to_string(),
            hint: Some(hint.to_string()),
        }
    }

    fn error(name: &str, message: &str, hint: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Error,
            message: message.to_string(),
            hint: Some(hint.to_string()),
        }
    }

    fn print(&self) {
        let icon = match self.status {
            CheckStatus::Ok => style("✓").green(),
            CheckStatus::Warning => style("!").yellow(),
            CheckStatus::Error => style("✗").red(),
        };

        println!("  {} {} - {}", icon, style(&self.name).bold(), self.message);

        if let Some(hint) = &self.hint {
            println!("    {} {}", style("→").dim(), style(hint).dim());
        }
    }
}

/// Run all diagnostic checks.
pub fn run_doctor(settings: &Settings, config_path: &Path) -> anyhow::Result<()> {
    Output::header("Delve Doctor");
    println!();
    println!("Checking credentials and configuration...\n");

    let mut checks = Vec::new();

    println!("{}", style("Credentials").bold());
    let key_checks = vec![
        check_key("GROQ_API_KEY", settings.credentials.groq_api_key.as_deref(), "gsk_"),
        check_key("TAVILY_API_KEY", settings.credentials.tavily_api_key.as_deref(), "tvly-"),
    ];
    for check in &key_checks {
        check.print();
    }
    checks.extend(key_checks);

    println!();

    println!("{}", style("Endpoints").bold());
    let endpoint_checks = vec![
        check_url("Model API", &settings.model.base_url),
        check_url("arXiv", &settings.tools.arxiv.endpoint),
        check_url("Wikipedia", &settings.tools.wikipedia.endpoint),
        check_url("Tavily", &settings.tools.tavily.endpoint),
    ];
    for check in &endpoint_checks {
        check.print();
    }
    checks.extend(endpoint_checks);

    println!();

    println!("{}", style("Configuration").bold());
    let config_checks = vec![
        check_config_file(config_path),
        check_prompts(settings),
        check_workflow(settings),
    ];
    for check in &config_checks {
        check.print();
    }
    checks.extend(config_checks);

    println!();

    let errors = checks.iter().filter(|c| c.status == CheckStatus::Error).count();
    let warnings = checks.iter().filter(|c| c.status == CheckStatus::Warning).count();

    if errors > 0 {
        Output::error(&format!(
            "{} error(s) found. Please fix them before using Delve.",
            errors
        ));
        std::process::exit(1);
    } else if warnings > 0 {
        Output::warning(&format!("All checks passed with {} warning(s).", warnings));
    } else {
        Output::success("All checks passed! Delve is ready to use.");
    }

    Ok(())
}

/// Check that an API key is present and looks plausible.
fn check_key(name: &str, value: Option<&str>, expected_prefix: &str) -> CheckResult {
    let hint = format!("Set with: export {}='{}...'", name, expected_prefix);
    match value.map(str::trim) {
        None | Some("") => CheckResult::error(name, "not set", &hint),
        Some(key) if key.starts_with(expected_prefix) => {
            CheckResult::ok(name, &format!("configured ({})", mask_secret(key)))
        }
        Some(_) => CheckResult::warning(
            name,
            "set but format looks unusual",
            &format!("Expected format: {}...", expected_prefix),
        ),
    }
}

/// Check that an endpoint URL parses.
fn check_url(name: &str, value: &str) -> CheckResult {
    match url::Url::parse(value) {
        Ok(url) if url.scheme() == "https" => CheckResult::ok(name, value),
        Ok(_) => CheckResult::warning(name, value, "Endpoint is not using https"),
        Err(e) => CheckResult::error(name, &format!("invalid URL: {}", e), "Fix the endpoint in the config file"),
    }
}

/// Check if config file exists.
fn check_config_file(config_path: &Path) -> CheckResult {
    if config_path.exists() {
        CheckResult::ok("Config file", &format!("{}", config_path.display()))
    } else {
        CheckResult::warning(
            "Config file",
            "using defaults",
            "Create with: delve config init",
        )
    }
}

/// Check that prompt overrides load.
fn check_prompts(settings: &Settings) -> CheckResult {
    match settings.prompts.resolved() {
        Ok(prompts) if prompts.answer.system.trim().is_empty() => CheckResult::warning(
            "Prompts",
            "final answer prompt is empty",
            "Set prompts.answer.system in the config file",
        ),
        Ok(_) => CheckResult::ok("Prompts", "loaded"),
        Err(e) => CheckResult::error("Prompts", &e.to_string(), "Check prompts.custom_dir"),
    }
}

fn check_workflow(settings: &Settings) -> CheckResult {
    let rounds = settings.workflow.max_tool_rounds;
    if rounds == 0 {
        CheckResult::warning(
            "Tool rounds",
            "0 (tools are never called)",
            "Set workflow.max_tool_rounds to at least 1",
        )
    } else {
        CheckResult::ok("Tool rounds", &format!("at most {}", rounds))
    }
}
