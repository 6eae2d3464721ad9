//! OpenAI-compatible chat model (Groq by default).

use super::{LanguageModel, ModelProfile};
use crate::config::ModelSettings;
use crate::conversation::{Message, Role, ToolInvocation};
use crate::error::{DelveError, Result};
use crate::openai::create_client;
use crate::tools::ToolDefinition;
use async_openai::types::{
    ChatCompletionMessageToolCall, ChatCompletionRequestAssistantMessageArgs,
    ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
    ChatCompletionRequestToolMessageArgs, ChatCompletionRequestUserMessageArgs,
    ChatCompletionTool, ChatCompletionToolType, CreateChatCompletionRequest,
    CreateChatCompletionRequestArgs, FunctionCall, FunctionObject,
};
use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, instrument};

/// Chat model reached through an OpenAI-compatible API.
pub struct ChatModel {
    client: async_openai::Client<async_openai::config::OpenAIConfig>,
    model: String,
    temperature: Option<f32>,
}

impl ChatModel {
    /// Create a model client from settings and an explicit API key.
    pub fn new(settings: &ModelSettings, api_key: &str) -> Result<Self> {
        let client = create_client(
            api_key,
            &settings.base_url,
            Duration::from_secs(settings.timeout_seconds),
        )?;

        Ok(Self {
            client,
            model: settings.name.clone(),
            temperature: settings.temperature,
        })
    }

    /// Build the provider request for one turn.
    fn build_request(&self, messages: &[Message], profile: &ModelProfile) -> Result<CreateChatCompletionRequest> {
        let mut request_messages = Vec::with_capacity(messages.len() + 1);

        if let Some(system) = &profile.system_prompt {
            request_messages.push(
                ChatCompletionRequestSystemMessageArgs::default()
                    .content(system.clone())
                    .build()
                    .map_err(|e| DelveError::Model(e.to_string()))?
                    .into(),
            );
        }

        for message in messages {
            request_messages.push(convert_message(message)?);
        }

        let mut args = CreateChatCompletionRequestArgs::default();
        args.model(&self.model).messages(request_messages);

        if !profile.tools.is_empty() {
            args.tools(profile.tools.iter().map(convert_tool).collect::<Vec<_>>());
        }
        if let Some(temperature) = self.temperature {
            args.temperature(temperature);
        }
        if let Some(max_tokens) = profile.max_tokens {
            args.max_completion_tokens(max_tokens);
        }

        args.build().map_err(|e| DelveError::Model(e.to_string()))
    }
}

#[async_trait]
impl LanguageModel for ChatModel {
    fn name(&self) -> &str {
        &self.model
    }

    #[instrument(skip(self, messages, profile), fields(model = %self.model, messages = messages.len(), tools = profile.tools.len()))]
    async fn invoke(&self, messages: &[Message], profile: &ModelProfile) -> Result<Message> {
        let request = self.build_request(messages, profile)?;

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e| DelveError::Model(format!("Chat completion failed: {}", e)))?;

        let choice = response
            .choices
            .first()
            .ok_or_else(|| DelveError::Model("No response from model".to_string()))?;

        let content = choice.message.content.clone().unwrap_or_default();
        let tool_calls: Vec<ToolInvocation> = choice
            .message
            .tool_calls
            .as_ref()
            .map(|calls| {
                calls
                    .iter()
                    .map(|call| ToolInvocation {
                        id: call.id.clone(),
                        name: call.function.name.clone(),
                        arguments: call.function.arguments.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default();

        debug!("Model replied with {} tool call(s)", tool_calls.len());

        Ok(Message::assistant_with_tools(content, tool_calls))
    }
}

/// Convert a conversation message to the provider's request type.
fn convert_message(message: &Message) -> Result<ChatCompletionRequestMessage> {
    let converted = match message.role {
        Role::User => ChatCompletionRequestUserMessageArgs::default()
            .content(message.content.clone())
            .build()
            .map_err(|e| DelveError::Model(e.to_string()))?
            .into(),
        Role::Assistant => {
            let mut args = ChatCompletionRequestAssistantMessageArgs::default();
            if !message.content.is_empty() {
                args.content(message.content.clone());
            }
            if message.requests_tools() {
                args.tool_calls(
                    message
                        .tool_calls
                        .iter()
                        .map(|call| ChatCompletionMessageToolCall {
                            id: call.id.clone(),
                            r#type: ChatCompletionToolType::Function,
                            function: FunctionCall {
                                name: call.name.clone(),
                                arguments: call.arguments.clone(),
                            },
                        })
                        .collect::<Vec<_>>(),
                );
            }
            args.build()
                .map_err(|e| DelveError::Model(e.to_string()))?
                .into()
        }
        Role::ToolResult => ChatCompletionRequestToolMessageArgs::default()
            .tool_call_id(message.tool_call_id.clone().unwrap_or_default())
            .content(message.content.clone())
            .build()
            .map_err(|e| DelveError::Model(e.to_string()))?
            .into(),
    };

    Ok(converted)
}

fn convert_tool(definition: &ToolDefinition) -> ChatCompletionTool {
    ChatCompletionTool {
        r#type: ChatCompletionToolType::Function,
        function: FunctionObject {
            name: definition.name.clone(),
            description: Some(definition.description.clone()),
            parameters: Some(definition.parameters.clone()),
            strict: None,
        },
    }
}
