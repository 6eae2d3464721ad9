//! Conversation state shared across one research run.
//!
//! A [`Conversation`] is the literal chat history sent to the model on every
//! turn. It only grows: messages are appended and never edited, removed or
//! reordered.

use serde::{Deserialize, Serialize};

/// Role of a message in the conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// The person asking the question.
    User,
    /// The language model.
    Assistant,
    /// Output of a tool the assistant asked for.
    ToolResult,
}

impl Role {
    /// Banner title used when pretty-printing a message.
    pub fn title(&self) -> &'static str {
        match self {
            Role::User => "Human Message",
            Role::Assistant => "Ai Message",
            Role::ToolResult => "Tool Message",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::User => write!(f, "user"),
            Role::Assistant => write!(f, "assistant"),
            Role::ToolResult => write!(f, "tool"),
        }
    }
}

/// A tool call requested by the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolInvocation {
    /// Identifier assigned by the model provider.
    pub id: String,
    /// Name of the requested tool.
    pub name: String,
    /// Raw JSON arguments as produced by the model.
    pub arguments: String,
}

impl std::fmt::Display for ToolInvocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}({})", self.name, self.arguments)
    }
}

/// One turn in a conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
    /// Tool calls requested by the assistant.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolInvocation>,
    /// Request this tool result answers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
    /// Name of the tool that produced this result.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl Message {
    /// Create a user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            tool_calls: Vec::new(),
            tool_call_id: None,
            name: None,
        }
    }

    /// Create a plain assistant message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            tool_calls: Vec::new(),
            tool_call_id: None,
            name: None,
        }
    }

    /// Create an assistant message that requests tool calls.
    pub fn assistant_with_tools(content: impl Into<String>, tool_calls: Vec<ToolInvocation>) -> Self {
        Self {
            tool_calls,
            ..Self::assistant(content)
        }
    }

    /// Create a tool result answering `invocation`.
    pub fn tool_result(invocation: &ToolInvocation, content: impl Into<String>) -> Self {
        Self {
            role: Role::ToolResult,
            content: content.into(),
            tool_calls: Vec::new(),
            tool_call_id: Some(invocation.id.clone()),
            name: Some(invocation.name.clone()),
        }
    }

    /// Whether this message asks for at least one tool call.
    pub fn requests_tools(&self) -> bool {
        !self.tool_calls.is_empty()
    }

    /// Multi-line text in the style of a chat transcript dump.
    pub fn pretty_repr(&self) -> String {
        let title = format!(" {} ", self.role.title());
        let mut out = format!("{:=^80}", title);

        if let Some(name) = &self.name {
            out.push_str(&format!("\nName: {}", name));
        }
        out.push_str("\n\n");
        out.push_str(&self.content);

        if self.requests_tools() {
            out.push_str("\nTool Calls:");
            for call in &self.tool_calls {
                out.push_str(&format!("\n  {} ({})", call.name, call.id));
                out.push_str(&format!("\n  Call ID: {}", call.id));
                out.push_str(&format!("\n  Args: {}", call.arguments));
            }
        }

        out
    }
}

/// Append-only message history for a single run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Conversation {
    messages: Vec<Message>,
}

impl Conversation {
    /// Start a conversation from a single user query.
    pub fn seeded(query: &str) -> Self {
        Self {
            messages: vec![Message::user(query)],
        }
    }

    /// Append a message to the end of the history.
    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    /// All messages in insertion order.
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Most recently appended message.
    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Message> {
        self.messages.iter()
    }
}

impl<'a> IntoIterator for &'a Conversation {
    type Item = &'a Message;
    type IntoIter = std::slice::Iter<'a, Message>;

    fn into_iter(self) -> Self::IntoIter {
        self.messages.iter()
    }
}
