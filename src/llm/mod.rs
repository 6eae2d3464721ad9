//! Language model access.
//!
//! The routing cycle talks to the model only through [`LanguageModel`], so
//! the hosted provider can be swapped for a scripted one in tests.

mod chat;

pub use chat::ChatModel;

use crate::conversation::Message;
use crate::error::Result;
use crate::tools::ToolDefinition;
use async_trait::async_trait;

/// Per-turn instructions sent alongside the conversation.
///
/// The profile is applied to the outgoing request only. It is never
/// appended to the conversation.
#[derive(Debug, Clone, Default)]
pub struct ModelProfile {
    /// System prompt prepended to the request.
    pub system_prompt: Option<String>,
    /// Tools the model may call on this turn.
    pub tools: Vec<ToolDefinition>,
    /// Completion token cap.
    pub max_tokens: Option<u32>,
}

impl ModelProfile {
    /// Profile for a turn that may request tools.
    pub fn routing(system_prompt: Option<String>, tools: Vec<ToolDefinition>) -> Self {
        Self {
            system_prompt,
            tools,
            max_tokens: None,
        }
    }

    /// Profile for the final answer turn. No tools are declared.
    pub fn answer(system_prompt: &str, max_tokens: Option<u32>) -> Self {
        Self {
            system_prompt: Some(system_prompt.to_string()),
            tools: Vec::new(),
            max_tokens,
        }
    }
}

/// A hosted chat model.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Model identifier for logging.
    fn name(&self) -> &str;

    /// Send the whole conversation and return the model's reply.
    ///
    /// The reply is an assistant message, possibly carrying tool calls.
    async fn invoke(&self, messages: &[Message], profile: &ModelProfile) -> Result<Message>;
}
