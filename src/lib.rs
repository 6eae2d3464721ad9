//! Delve - a research assistant over paper, encyclopedia and web search
//!
//! A hosted language model decides which retrieval tools to call for a
//! query, the tool outputs are fed back into the conversation, and a final
//! turn drafts a concise answer.
//!
//! # Architecture
//!
//! - `conversation` - Messages and the append-only conversation
//! - `llm` - Model profiles and the chat completion client
//! - `tools` - arXiv, Wikipedia and Tavily search adapters
//! - `agent` - The routing cycle, input validation and the research service
//! - `render` - Reasoning trace removal for display
//! - `config` - Configuration management
//! - `cli` - Command line and web front ends
//!
//! # Example
//!
//! ```rust,no_run
//! use delve::agent::{ResearchRequest, ResearchService, RunOutcome};
//! use delve::config::Settings;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     let service = ResearchService::hosted(settings.clone())?;
//!
//!     let request = ResearchRequest {
//!         query: Some("Tell me about spacex".to_string()),
//!         ..Default::default()
//!     }
//!     .with_fallback_credentials(&settings);
//!
//!     if let RunOutcome::Completed { transcript } = service.research(request).await {
//!         println!("{}", transcript.answer());
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod agent;
pub mod cli;
pub mod config;
pub mod conversation;
pub mod error;
pub mod llm;
pub mod openai;
pub mod render;
pub mod tools;

pub use error::{DelveError, Result};
