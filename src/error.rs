//! Error types for Delve.

use thiserror::Error;

/// Library-level error type for Delve operations.
#[derive(Error, Debug)]
pub enum DelveError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Model error: {0}")]
    Model(String),

    #[error("Tool '{tool}' failed: {message}")]
    Tool { tool: String, message: String },

    #[error("Unknown tool requested: {0}")]
    UnknownTool(String),

    #[error("Invalid arguments for tool '{tool}': {message}")]
    InvalidToolArguments { tool: String, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),
}

impl DelveError {
    /// Build a tool failure from any displayable cause.
    pub fn tool(tool: &str, cause: impl std::fmt::Display) -> Self {
        DelveError::Tool {
            tool: tool.to_string(),
            message: cause.to_string(),
        }
    }
}

/// Result type alias for Delve operations.
pub type Result<T> = std::result::Result<T, DelveError>;
