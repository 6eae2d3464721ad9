//! Per-run credentials, input validation and the shared research service.
//!
//! Both front ends hand a [`ResearchRequest`] to [`ResearchService`] and
//! render the [`RunOutcome`] it returns.

use super::runner::{ResearchAgent, Transcript};
use crate::config::{Prompts, Settings};
use crate::error::Result;
use crate::llm::ChatModel;
use crate::tools::Toolbox;
use serde::Serialize;
use std::sync::Arc;
use tracing::{error, warn};

/// Warning shown when any required input is missing.
pub const MISSING_INPUT_WARNING: &str =
    "Please provide both API keys and a search query before starting a search.";

/// API keys for one run.
#[derive(Clone)]
pub struct Credentials {
    /// Key for the hosted model provider.
    pub model_api_key: String,
    /// Key for the web search provider.
    pub search_api_key: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("model_api_key", &"<redacted>")
            .field("search_api_key", &"<redacted>")
            .finish()
    }
}

/// Raw user input for one run. Blank values count as missing.
#[derive(Debug, Clone, Default)]
pub struct ResearchRequest {
    pub model_api_key: Option<String>,
    pub search_api_key: Option<String>,
    pub query: Option<String>,
}

/// A request with every input present.
#[derive(Debug, Clone)]
pub struct ValidatedRequest {
    pub credentials: Credentials,
    pub query: String,
}

/// The single warning produced by a request with missing inputs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationWarning {
    pub message: String,
    /// Names of the missing inputs.
    pub missing: Vec<&'static str>,
}

impl std::fmt::Display for ValidationWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} (missing: {})", self.message, self.missing.join(", "))
    }
}

fn present(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

impl ResearchRequest {
    /// Use `settings` credentials for any key the request leaves blank.
    pub fn with_fallback_credentials(mut self, settings: &Settings) -> Self {
        self.model_api_key = present(self.model_api_key).or_else(|| settings.credentials.groq_api_key.clone());
        self.search_api_key =
            present(self.search_api_key).or_else(|| settings.credentials.tavily_api_key.clone());
        self
    }

    /// Check that every input is present.
    pub fn validate(self) -> std::result::Result<ValidatedRequest, ValidationWarning> {
        let model_api_key = present(self.model_api_key);
        let search_api_key = present(self.search_api_key);
        let query = present(self.query);

        match (model_api_key, search_api_key, query) {
            (Some(model_api_key), Some(search_api_key), Some(query)) => Ok(ValidatedRequest {
                credentials: Credentials {
                    model_api_key,
                    search_api_key,
                },
                query,
            }),
            (model_api_key, search_api_key, query) => {
                let mut missing = Vec::new();
                if model_api_key.is_none() {
                    missing.push("model API key");
                }
                if search_api_key.is_none() {
                    missing.push("search API key");
                }
                if query.is_none() {
                    missing.push("query");
                }
                Err(ValidationWarning {
                    message: MISSING_INPUT_WARNING.to_string(),
                    missing,
                })
            }
        }
    }
}

/// Builds the agent for one run from its credentials.
pub trait Connector: Send + Sync {
    fn connect(&self, credentials: &Credentials) -> Result<ResearchAgent>;
}

/// Connector for the hosted model and retrieval services.
pub struct HostedConnector {
    settings: Settings,
    prompts: Prompts,
}

impl HostedConnector {
    pub fn new(settings: Settings) -> Result<Self> {
        let prompts = settings.prompts.resolved()?;
        Ok(Self { settings, prompts })
    }
}

impl Connector for HostedConnector {
    fn connect(&self, credentials: &Credentials) -> Result<ResearchAgent> {
        let model = ChatModel::new(&self.settings.model, &credentials.model_api_key)?;
        let tools = Toolbox::new(&self.settings.tools, &credentials.search_api_key)?;

        Ok(ResearchAgent::new(Arc::new(model), tools).configured(&self.settings.workflow, &self.prompts))
    }
}

/// Result of one run as seen by a front end.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RunOutcome {
    /// Inputs were missing. Nothing was sent over the network.
    Invalid { warning: ValidationWarning },
    /// A model or tool call failed.
    Failed { error: String },
    Completed { transcript: Transcript },
}

/// Validates requests and runs the routing cycle. Runs share no state.
#[derive(Clone)]
pub struct ResearchService {
    connector: Arc<dyn Connector>,
}

impl ResearchService {
    pub fn new(connector: Arc<dyn Connector>) -> Self {
        Self { connector }
    }

    /// Service backed by the hosted providers.
    pub fn hosted(settings: Settings) -> Result<Self> {
        Ok(Self::new(Arc::new(HostedConnector::new(settings)?)))
    }

    /// Validate, connect and run. Never returns an error.
    pub async fn research(&self, request: ResearchRequest) -> RunOutcome {
        let request = match request.validate() {
            Ok(request) => request,
            Err(warning) => {
                warn!("Rejected research request: {}", warning);
                return RunOutcome::Invalid { warning };
            }
        };

        let result = match self.connector.connect(&request.credentials) {
            Ok(agent) => agent.run(&request.query).await,
            Err(e) => Err(e),
        };

        match result {
            Ok(transcript) => RunOutcome::Completed { transcript },
            Err(e) => {
                error!("Research run failed: {}", e);
                RunOutcome::Failed {
                    error: format!("An error occurred: {}", e),
                }
            }
        }
    }
}
