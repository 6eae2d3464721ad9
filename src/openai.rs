//! HTTP and OpenAI-compatible client construction.

use crate::error::{DelveError, Result};
use async_openai::{config::OpenAIConfig, Client};
use std::time::Duration;

/// Default timeout for model requests (5 minutes).
pub const DEFAULT_TIMEOUT_SECS: u64 = 300;

const USER_AGENT: &str = concat!("delve/", env!("CARGO_PKG_VERSION"));

/// Build a plain HTTP client with a request timeout.
pub fn http_client(timeout: Duration) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(USER_AGENT)
        .build()
        .map_err(|e| DelveError::Config(format!("Failed to create HTTP client: {}", e)))
}

/// Create a chat completions client for an OpenAI-compatible endpoint.
///
/// The key is passed explicitly and never read from the environment.
pub fn create_client(api_key: &str, base_url: &str, timeout: Duration) -> Result<Client<OpenAIConfig>> {
    let config = OpenAIConfig::new()
        .with_api_key(api_key)
        .with_api_base(base_url);

    Ok(Client::with_config(config).with_http_client(http_client(timeout)?))
}
