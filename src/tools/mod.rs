//! Retrieval tools the model can call.
//!
//! The set of tools is closed: [`ToolKind`] is the dispatch table, and a
//! request naming anything else fails with [`DelveError::UnknownTool`].

mod arxiv;
mod tavily;
mod wikipedia;

pub use arxiv::ArxivSearch;
pub use tavily::TavilySearch;
pub use wikipedia::WikipediaSearch;

use crate::config::ToolSettings;
use crate::conversation::{Message, ToolInvocation};
use crate::error::{DelveError, Result};
use crate::openai::http_client;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Longest query forwarded to the paper and encyclopedia services.
pub(crate) const MAX_QUERY_CHARS: usize = 300;

/// Tools known to the routing cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ToolKind {
    /// Academic paper search on arXiv.
    Arxiv,
    /// Encyclopedia search on Wikipedia.
    Wikipedia,
    /// General web search through Tavily.
    TavilySearch,
}

impl ToolKind {
    /// Every tool, in declaration order.
    pub const ALL: [ToolKind; 3] = [ToolKind::Arxiv, ToolKind::Wikipedia, ToolKind::TavilySearch];

    /// Name the model uses to call this tool.
    pub fn name(&self) -> &'static str {
        match self {
            ToolKind::Arxiv => "arxiv",
            ToolKind::Wikipedia => "wikipedia",
            ToolKind::TavilySearch => "tavily_search_results_json",
        }
    }

    /// Look up a tool by the name the model used.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.name() == name)
    }

    fn description(&self) -> &'static str {
        match self {
            ToolKind::Arxiv => {
                "A wrapper around Arxiv.org. Useful for when you need to answer questions about \
                Physics, Mathematics, Computer Science, Quantitative Biology, Quantitative Finance, \
                Statistics, Electrical Engineering, and Economics from scientific articles on \
                arxiv.org. Input should be a search query."
            }
            ToolKind::Wikipedia => {
                "A wrapper around Wikipedia. Useful for when you need to answer general questions \
                about people, places, companies, facts, historical events, or other subjects. \
                Input should be a search query."
            }
            ToolKind::TavilySearch => {
                "A search engine optimized for comprehensive, accurate, and trusted results. \
                Useful for when you need to answer questions about current events. \
                Input should be a search query."
            }
        }
    }

    /// Function declaration sent to the model.
    pub fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: self.name().to_string(),
            description: self.description().to_string(),
            parameters: serde_json::json!({
                "type": "object",
                "properties": {
                    "query": {
                        "type": "string",
                        "description": "search query to look up"
                    }
                },
                "required": ["query"]
            }),
        }
    }

    /// Declarations for every tool.
    pub fn definitions() -> Vec<ToolDefinition> {
        Self::ALL.iter().map(ToolKind::definition).collect()
    }

    /// Render snippets as the text of a tool-result message.
    pub fn format_output(&self, snippets: &[String]) -> String {
        match self {
            ToolKind::Arxiv if snippets.is_empty() => "No good Arxiv Result was found".to_string(),
            ToolKind::Wikipedia if snippets.is_empty() => {
                "No good Wikipedia Search Result was found".to_string()
            }
            ToolKind::Arxiv | ToolKind::Wikipedia => snippets.join("\n\n"),
            ToolKind::TavilySearch => format!("[{}]", snippets.join(", ")),
        }
    }
}

impl std::fmt::Display for ToolKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// A function declaration the model may call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    /// JSON Schema of the arguments.
    pub parameters: serde_json::Value,
}

/// A validated tool call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolRequest {
    pub kind: ToolKind,
    pub query: String,
}

/// Parse a model tool call into a request for a known tool.
pub fn parse_tool_request(invocation: &ToolInvocation) -> Result<ToolRequest> {
    let kind = ToolKind::from_name(&invocation.name)
        .ok_or_else(|| DelveError::UnknownTool(invocation.name.clone()))?;

    let args: serde_json::Value = serde_json::from_str(&invocation.arguments).map_err(|e| {
        DelveError::InvalidToolArguments {
            tool: invocation.name.clone(),
            message: e.to_string(),
        }
    })?;

    let query = args["query"]
        .as_str()
        .ok_or_else(|| DelveError::InvalidToolArguments {
            tool: invocation.name.clone(),
            message: "Missing 'query' argument".to_string(),
        })?
        .to_string();

    Ok(ToolRequest { kind, query })
}

/// A retrieval service returning short text snippets.
#[async_trait]
pub trait SearchTool: Send + Sync {
    /// Search and return at most the configured number of snippets.
    async fn search(&self, query: &str) -> Result<Vec<String>>;
}

/// The three tool adapters of one run, keyed by [`ToolKind`].
#[derive(Clone)]
pub struct Toolbox {
    arxiv: Arc<dyn SearchTool>,
    wikipedia: Arc<dyn SearchTool>,
    tavily: Arc<dyn SearchTool>,
}

impl Toolbox {
    /// Build the hosted adapters. The web search key is scoped to this toolbox.
    pub fn new(settings: &ToolSettings, tavily_api_key: &str) -> Result<Self> {
        let client = http_client(Duration::from_secs(settings.timeout_seconds))?;

        Ok(Self::from_parts(
            Arc::new(ArxivSearch::new(client.clone(), &settings.arxiv)),
            Arc::new(WikipediaSearch::new(client.clone(), &settings.wikipedia)),
            Arc::new(TavilySearch::new(client, &settings.tavily, tavily_api_key)),
        ))
    }

    /// Assemble a toolbox from arbitrary adapters.
    pub fn from_parts(
        arxiv: Arc<dyn SearchTool>,
        wikipedia: Arc<dyn SearchTool>,
        tavily: Arc<dyn SearchTool>,
    ) -> Self {
        Self {
            arxiv,
            wikipedia,
            tavily,
        }
    }

    fn adapter(&self, kind: ToolKind) -> &dyn SearchTool {
        match kind {
            ToolKind::Arxiv => self.arxiv.as_ref(),
            ToolKind::Wikipedia => self.wikipedia.as_ref(),
            ToolKind::TavilySearch => self.tavily.as_ref(),
        }
    }

    /// Declarations for every tool in the box.
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        ToolKind::definitions()
    }

    /// Resolve one tool call into the tool-result message that answers it.
    pub async fn execute(&self, invocation: &ToolInvocation) -> Result<Message> {
        let request = parse_tool_request(invocation)?;

        info!("Calling tool {} with query: {}", request.kind, request.query);

        let snippets = self.adapter(request.kind).search(&request.query).await?;
        let content = request.kind.format_output(&snippets);

        Ok(Message::tool_result(invocation, content))
    }
}

/// Truncate to at most `max_chars` characters.
pub(crate) fn truncate_chars(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversation::Role;

    struct FixedSearch(Vec<String>);

    #[async_trait]
    impl SearchTool for FixedSearch {
        async fn search(&self, _query: &str) -> Result<Vec<String>> {
            Ok(self.0.clone())
        }
    }

    fn toolbox() -> Toolbox {
        Toolbox::from_parts(
            Arc::new(FixedSearch(vec!["Published: 2020-01-01".to_string()])),
            Arc::new(FixedSearch(Vec::new())),
            Arc::new(FixedSearch(vec![r#"{"url":"https://spacex.com","content":"SpaceX"}"#.to_string()])),
        )
    }

    fn invocation(name: &str, arguments: &str) -> ToolInvocation {
        ToolInvocation {
            id: "call_7".to_string(),
            name: name.to_string(),
            arguments: arguments.to_string(),
        }
    }

    #[test]
    fn test_parse_known_tool() {
        let request = parse_tool_request(&invocation("wikipedia", r#"{"query": "SpaceX"}"#)).unwrap();
        assert_eq!(request.kind, ToolKind::Wikipedia);
        assert_eq!(request.query, "SpaceX");
    }

    #[test]
    fn test_parse_unknown_tool() {
        let err = parse_tool_request(&invocation("calculator", r#"{"query": "1+1"}"#)).unwrap_err();
        assert!(matches!(err, DelveError::UnknownTool(name) if name == "calculator"));
    }

    #[test]
    fn test_parse_missing_query() {
        let err = parse_tool_request(&invocation("arxiv", r#"{"q": "x"}"#)).unwrap_err();
        assert!(matches!(err, DelveError::InvalidToolArguments { .. }));

        let err = parse_tool_request(&invocation("arxiv", "not json")).unwrap_err();
        assert!(matches!(err, DelveError::InvalidToolArguments { .. }));
    }

    #[test]
    fn test_names_roundtrip() {
        for kind in ToolKind::ALL {
            assert_eq!(ToolKind::from_name(kind.name()), Some(kind));
        }
        assert_eq!(ToolKind::definitions().len(), 3);
    }

    #[test]
    fn test_format_output() {
        assert_eq!(ToolKind::Arxiv.format_output(&[]), "No good Arxiv Result was found");
        assert_eq!(
            ToolKind::Wikipedia.format_output(&["a".to_string(), "b".to_string()]),
            "a\n\nb"
        );
        assert_eq!(ToolKind::TavilySearch.format_output(&[]), "[]");
    }

    #[test]
    fn test_truncate_chars_respects_char_boundaries() {
        assert_eq!(truncate_chars("héllo", 2), "hé");
        assert_eq!(truncate_chars("abc", 10), "abc");
    }

    #[tokio::test]
    async fn test_execute_links_result_to_request() {
        let msg = toolbox()
            .execute(&invocation("tavily_search_results_json", r#"{"query": "SpaceX"}"#))
            .await
            .unwrap();

        assert_eq!(msg.role, Role::ToolResult);
        assert_eq!(msg.tool_call_id.as_deref(), Some("call_7"));
        assert_eq!(msg.name.as_deref(), Some("tavily_search_results_json"));
        assert!(msg.content.starts_with("[{"));
    }

    #[tokio::test]
    async fn test_execute_empty_wikipedia_result() {
        let msg = toolbox()
            .execute(&invocation("wikipedia", r#"{"query": "zzzz"}"#))
            .await
            .unwrap();
        assert_eq!(msg.content, "No good Wikipedia Search Result was found");
    }
}
