//! Configuration settings for Delve.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Settings {
    pub general: GeneralSettings,
    pub model: ModelSettings,
    pub tools: ToolSettings,
    pub workflow: WorkflowSettings,
    pub prompts: super::Prompts,
    pub server: ServerSettings,
    pub credentials: CredentialSettings,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Log level used when no -v flag is given (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            log_level: "warn".to_string(),
        }
    }
}

/// Hosted language model settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelSettings {
    /// Base URL of an OpenAI-compatible chat completions API.
    pub base_url: String,
    /// Model identifier.
    pub name: String,
    /// Sampling temperature. None leaves the provider default.
    pub temperature: Option<f32>,
    /// Request timeout in seconds.
    pub timeout_seconds: u64,
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            base_url: "https://api.groq.com/openai/v1".to_string(),
            name: "qwen-qwq-32b".to_string(),
            temperature: None,
            timeout_seconds: crate::openai::DEFAULT_TIMEOUT_SECS,
        }
    }
}

/// Settings for all retrieval tools.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolSettings {
    /// Request timeout in seconds shared by all tools.
    pub timeout_seconds: u64,
    pub arxiv: ArxivSettings,
    pub wikipedia: WikipediaSettings,
    pub tavily: TavilySettings,
}

impl Default for ToolSettings {
    fn default() -> Self {
        Self {
            timeout_seconds: 60,
            arxiv: ArxivSettings::default(),
            wikipedia: WikipediaSettings::default(),
            tavily: TavilySettings::default(),
        }
    }
}

/// arXiv paper search settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ArxivSettings {
    pub endpoint: String,
    /// Maximum number of papers returned.
    pub top_k_results: usize,
    /// Maximum characters per paper snippet.
    pub doc_content_chars_max: usize,
}

impl Default for ArxivSettings {
    fn default() -> Self {
        Self {
            endpoint: "https://export.arxiv.org/api/query".to_string(),
            top_k_results: 2,
            doc_content_chars_max: 500,
        }
    }
}

/// Wikipedia search settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WikipediaSettings {
    pub endpoint: String,
    /// Maximum number of pages returned.
    pub top_k_results: usize,
    /// Maximum characters per page snippet.
    pub doc_content_chars_max: usize,
}

impl Default for WikipediaSettings {
    fn default() -> Self {
        Self {
            endpoint: "https://en.wikipedia.org/w/api.php".to_string(),
            top_k_results: 1,
            doc_content_chars_max: 500,
        }
    }
}

/// Tavily web search settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TavilySettings {
    pub endpoint: String,
    pub max_results: usize,
    /// Search depth ("basic" or "advanced").
    pub search_depth: String,
}

impl Default for TavilySettings {
    fn default() -> Self {
        Self {
            endpoint: "https://api.tavily.com/search".to_string(),
            max_results: 5,
            search_depth: "advanced".to_string(),
        }
    }
}

/// Routing cycle settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkflowSettings {
    /// Maximum number of model turns that may request tools before the
    /// cycle is forced into the final answer.
    pub max_tool_rounds: usize,
    /// Run the tool calls of one model turn concurrently.
    pub parallel_tools: bool,
}

impl Default for WorkflowSettings {
    fn default() -> Self {
        Self {
            max_tool_rounds: crate::agent::DEFAULT_MAX_TOOL_ROUNDS,
            parallel_tools: false,
        }
    }
}

/// Web UI settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8501,
        }
    }
}

/// API keys stored in the config file. Environment variables win.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct CredentialSettings {
    pub groq_api_key: Option<String>,
    pub tavily_api_key: Option<String>,
}

impl Settings {
    /// Load settings from the default configuration file.
    pub fn load() -> crate::error::Result<Self> {
        Self::load_from(None)
    }

    /// Load settings from a specific path, or default location if None.
    pub fn load_from(path: Option<&Path>) -> crate::error::Result<Self> {
        let config_path = match path {
            Some(p) => p.to_path_buf(),
            None => Self::default_config_path(),
        };

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let settings: Settings = toml::from_str(&content)?;
            Ok(settings)
        } else {
            Ok(Settings::default())
        }
    }

    /// Save settings to a specific path.
    pub fn save_to(&self, path: &Path) -> crate::error::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| crate::error::DelveError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("delve")
            .join("config.toml")
    }

    /// Expand shell variables in paths (e.g., ~).
    pub fn expand_path(path: &str) -> PathBuf {
        PathBuf::from(shellexpand::tilde(path).to_string())
    }

    /// Overlay keys taken from the environment or command line.
    pub fn with_credentials(mut self, groq_api_key: Option<String>, tavily_api_key: Option<String>) -> Self {
        if groq_api_key.is_some() {
            self.credentials.groq_api_key = groq_api_key;
        }
        if tavily_api_key.is_some() {
            self.credentials.tavily_api_key = tavily_api_key;
        }
        self
    }
}
