//! The routing cycle: model, tools, model again, final answer.

use crate::config::{Prompts, WorkflowSettings};
use crate::conversation::{Conversation, Message, ToolInvocation};
use crate::error::Result;
use crate::llm::{LanguageModel, ModelProfile};
use crate::tools::Toolbox;
use chrono::{DateTime, Utc};
use futures::future::try_join_all;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, info_span, warn, Instrument};
use uuid::Uuid;

/// Default cap on tool-requesting model turns.
pub const DEFAULT_MAX_TOOL_ROUNDS: usize = 8;

/// States of the routing cycle.
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    /// Next action is a routing turn with tools declared.
    AwaitingModel,
    /// A routing reply arrived and has not been routed yet.
    ModelResponded(Message),
    /// Tool calls to resolve before the next routing turn.
    ExecutingTools(Vec<ToolInvocation>),
    /// Next action is the final answer turn.
    DraftingAnswer,
    /// Terminal.
    Done,
}

/// Agent that runs the routing cycle for one query at a time.
pub struct ResearchAgent {
    model: Arc<dyn LanguageModel>,
    tools: Toolbox,
    routing: ModelProfile,
    answer: ModelProfile,
    max_tool_rounds: usize,
    parallel_tools: bool,
}

impl ResearchAgent {
    /// Create an agent with the default prompt profiles.
    pub fn new(model: Arc<dyn LanguageModel>, tools: Toolbox) -> Self {
        let prompts = Prompts::default();
        let definitions = tools.definitions();

        Self {
            model,
            tools,
            routing: ModelProfile::routing(prompts.routing.system, definitions),
            answer: ModelProfile::answer(&prompts.answer.system, prompts.answer.max_tokens),
            max_tool_rounds: DEFAULT_MAX_TOOL_ROUNDS,
            parallel_tools: false,
        }
    }

    /// Apply workflow settings and prompt profiles.
    pub fn configured(self, workflow: &WorkflowSettings, prompts: &Prompts) -> Self {
        self.with_routing_prompt(prompts.routing.system.clone())
            .with_answer_profile(&prompts.answer.system, prompts.answer.max_tokens)
            .with_max_tool_rounds(workflow.max_tool_rounds)
            .with_parallel_tools(workflow.parallel_tools)
    }

    /// Set the system prompt of routing turns.
    pub fn with_routing_prompt(mut self, prompt: Option<String>) -> Self {
        self.routing.system_prompt = prompt;
        self
    }

    /// Set the final answer profile.
    pub fn with_answer_profile(mut self, prompt: &str, max_tokens: Option<u32>) -> Self {
        self.answer = ModelProfile::answer(prompt, max_tokens);
        self
    }

    /// Set the maximum number of tool-requesting turns honoured per run.
    pub fn with_max_tool_rounds(mut self, max: usize) -> Self {
        self.max_tool_rounds = max;
        self
    }

    /// Run the tool calls of one turn concurrently.
    pub fn with_parallel_tools(mut self, parallel: bool) -> Self {
        self.parallel_tools = parallel;
        self
    }

    /// Run the cycle for a query and return the finished conversation.
    pub async fn run(&self, query: &str) -> Result<Transcript> {
        let run_id = Uuid::new_v4();
        let span = info_span!("research", %run_id, model = self.model.name());
        self.run_cycle(run_id, query).instrument(span).await
    }

    async fn run_cycle(&self, run_id: Uuid, query: &str) -> Result<Transcript> {
        let started_at = Utc::now();
        let mut conversation = Conversation::seeded(query);
        let mut step = Step::AwaitingModel;
        let mut model_turns = 0;
        let mut tool_rounds = 0;
        let mut step_cap_reached = false;

        info!("Researching: {}", query);

        loop {
            step = match step {
                Step::AwaitingModel => {
                    let reply = self.model.invoke(conversation.messages(), &self.routing).await?;
                    model_turns += 1;
                    Step::ModelResponded(reply)
                }

                Step::ModelResponded(reply) if !reply.requests_tools() => {
                    // Superseded by the final answer turn.
                    debug!("Routing turn requested no tools");
                    Step::DraftingAnswer
                }

                Step::ModelResponded(_) if tool_rounds >= self.max_tool_rounds => {
                    warn!(
                        "Tool round limit ({}) reached, drafting answer with pending tool calls dropped",
                        self.max_tool_rounds
                    );
                    step_cap_reached = true;
                    Step::DraftingAnswer
                }

                Step::ModelResponded(reply) => {
                    let calls = reply.tool_calls.clone();
                    conversation.push(reply);
                    Step::ExecutingTools(calls)
                }

                Step::ExecutingTools(calls) => {
                    tool_rounds += 1;
                    debug!("Tool round {}: {} call(s)", tool_rounds, calls.len());

                    for result in self.execute_tools(&calls).await? {
                        conversation.push(result);
                    }
                    Step::AwaitingModel
                }

                Step::DraftingAnswer => {
                    let reply = self.model.invoke(conversation.messages(), &self.answer).await?;
                    model_turns += 1;
                    conversation.push(Message::assistant(reply.content));
                    Step::Done
                }

                Step::Done => break,
            };
        }

        info!(
            "Research finished after {} model turn(s) and {} tool round(s)",
            model_turns, tool_rounds
        );

        Ok(Transcript {
            run_id,
            query: query.to_string(),
            messages: conversation,
            model_turns,
            tool_rounds,
            step_cap_reached,
            started_at,
            finished_at: Utc::now(),
        })
    }

    /// Resolve every call of one turn; results keep request order.
    async fn execute_tools(&self, calls: &[ToolInvocation]) -> Result<Vec<Message>> {
        if self.parallel_tools {
            return try_join_all(calls.iter().map(|call| self.tools.execute(call))).await;
        }

        let mut results = Vec::with_capacity(calls.len());
        for call in calls {
            results.push(self.tools.execute(call).await?);
        }
        Ok(results)
    }
}

/// A finished research run.
#[derive(Debug, Clone, Serialize)]
pub struct Transcript {
    pub run_id: Uuid,
    pub query: String,
    pub messages: Conversation,
    /// Number of model invocations, including the final answer.
    pub model_turns: usize,
    /// Number of tool-requesting turns that were resolved.
    pub tool_rounds: usize,
    /// Whether the round limit cut the cycle short.
    pub step_cap_reached: bool,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl Transcript {
    /// Text of the final answer.
    pub fn answer(&self) -> &str {
        self.messages.last().map(|m| m.content.as_str()).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversation::Role;
    use crate::error::DelveError;
    use crate::tools::SearchTool;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Model that requests tools on the first `tool_turns` routing turns.
    struct ScriptedModel {
        calls: AtomicUsize,
        tool_turns: usize,
        tools_per_turn: Vec<&'static str>,
        seen_profiles: Mutex<Vec<ModelProfile>>,
    }

    impl ScriptedModel {
        fn new(tool_turns: usize, tools_per_turn: Vec<&'static str>) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                tool_turns,
                tools_per_turn,
                seen_profiles: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl LanguageModel for ScriptedModel {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn invoke(&self, _messages: &[Message], profile: &ModelProfile) -> Result<Message> {
            let count = self.calls.fetch_add(1, Ordering::SeqCst);
            self.seen_profiles.lock().unwrap().push(profile.clone());

            if profile.tools.is_empty() {
                return Ok(Message::assistant("<think>summing up</think>SpaceX builds rockets."));
            }

            if count < self.tool_turns {
                let calls = self
                    .tools_per_turn
                    .iter()
                    .enumerate()
                    .map(|(i, name)| ToolInvocation {
                        id: format!("call_{}_{}", count, i),
                        name: name.to_string(),
                        arguments: r#"{"query": "SpaceX"}"#.to_string(),
                    })
                    .collect();
                Ok(Message::assistant_with_tools("", calls))
            } else {
                Ok(Message::assistant("I have enough information."))
            }
        }
    }

    struct EchoSearch(&'static str);

    #[async_trait]
    impl SearchTool for EchoSearch {
        async fn search(&self, query: &str) -> Result<Vec<String>> {
            Ok(vec![format!("{} result for {}", self.0, query)])
        }
    }

    /// Answers after a delay, so concurrent calls finish out of order.
    struct DelayedSearch {
        label: &'static str,
        delay_ms: u64,
    }

    #[async_trait]
    impl SearchTool for DelayedSearch {
        async fn search(&self, query: &str) -> Result<Vec<String>> {
            tokio::time::sleep(std::time::Duration::from_millis(self.delay_ms)).await;
            Ok(vec![format!("{} result for {}", self.label, query)])
        }
    }

    struct FailingSearch;

    #[async_trait]
    impl SearchTool for FailingSearch {
        async fn search(&self, _query: &str) -> Result<Vec<String>> {
            Err(DelveError::tool("wikipedia", "connection refused"))
        }
    }

    fn toolbox() -> Toolbox {
        Toolbox::from_parts(
            Arc::new(EchoSearch("arxiv")),
            Arc::new(EchoSearch("wikipedia")),
            Arc::new(EchoSearch("web")),
        )
    }

    #[tokio::test]
    async fn test_single_web_search_yields_four_messages() {
        let model = Arc::new(ScriptedModel::new(1, vec!["tavily_search_results_json"]));
        let agent = ResearchAgent::new(model.clone(), toolbox());

        let transcript = agent.run("Tell me about spacex").await.unwrap();
        let messages = transcript.messages.messages();

        assert_eq!(messages.len(), 4);
        assert_eq!(messages[0], Message::user("Tell me about spacex"));
        assert!(messages[1].requests_tools());
        assert_eq!(messages[2].role, Role::ToolResult);
        assert_eq!(messages[2].tool_call_id.as_deref(), Some("call_0_0"));
        assert_eq!(messages[3].role, Role::Assistant);
        assert!(!messages[3].requests_tools());
        assert_eq!(transcript.model_turns, 3);
        assert_eq!(transcript.tool_rounds, 1);
        assert!(!transcript.step_cap_reached);
    }

    #[tokio::test]
    async fn test_no_tool_request_goes_straight_to_answer() {
        let model = Arc::new(ScriptedModel::new(0, vec![]));
        let agent = ResearchAgent::new(model.clone(), toolbox());

        let transcript = agent.run("What is 2 + 2?").await.unwrap();

        assert_eq!(transcript.messages.len(), 2);
        assert_eq!(transcript.messages.messages()[0].role, Role::User);
        assert_eq!(transcript.answer(), "<think>summing up</think>SpaceX builds rockets.");

        let profiles = model.seen_profiles.lock().unwrap();
        assert_eq!(profiles.len(), 2);
        assert_eq!(profiles[0].tools.len(), 3);
        assert!(profiles[1].tools.is_empty());
        assert!(profiles[1].system_prompt.is_some());
        assert_eq!(profiles[1].max_tokens, Some(1000));
    }

    #[tokio::test]
    async fn test_tool_results_follow_request_order() {
        let model = Arc::new(ScriptedModel::new(1, vec!["arxiv", "wikipedia", "tavily_search_results_json"]));
        let agent = ResearchAgent::new(model, toolbox());

        let transcript = agent.run("Tell me about spacex").await.unwrap();
        let messages = transcript.messages.messages();

        assert_eq!(messages.len(), 6);
        let ids: Vec<_> = messages[2..5].iter().map(|m| m.tool_call_id.clone().unwrap()).collect();
        assert_eq!(ids, vec!["call_0_0", "call_0_1", "call_0_2"]);
        assert!(messages[2].content.starts_with("arxiv result"));
        assert!(messages[3].content.starts_with("wikipedia result"));
        assert_eq!(messages[4].content, "[web result for SpaceX]");
    }

    #[tokio::test]
    async fn test_parallel_tools_keep_request_order() {
        let model = Arc::new(ScriptedModel::new(1, vec!["tavily_search_results_json", "arxiv"]));
        let tools = Toolbox::from_parts(
            Arc::new(DelayedSearch { label: "arxiv", delay_ms: 0 }),
            Arc::new(EchoSearch("wikipedia")),
            Arc::new(DelayedSearch { label: "web", delay_ms: 200 }),
        );
        let agent = ResearchAgent::new(model, tools).with_parallel_tools(true);

        let transcript = agent.run("Tell me about spacex").await.unwrap();
        let messages = transcript.messages.messages();

        // The web search is requested first but finishes last.
        assert_eq!(messages[2].name.as_deref(), Some("tavily_search_results_json"));
        assert_eq!(messages[2].content, "[web result for SpaceX]");
        assert_eq!(messages[3].name.as_deref(), Some("arxiv"));
        assert_eq!(messages[3].content, "arxiv result for SpaceX");
    }

    #[tokio::test]
    async fn test_model_may_request_tools_again() {
        let model = Arc::new(ScriptedModel::new(2, vec!["wikipedia"]));
        let agent = ResearchAgent::new(model, toolbox());

        let transcript = agent.run("Tell me about spacex").await.unwrap();
        let roles: Vec<_> = transcript.messages.iter().map(|m| m.role).collect();

        assert_eq!(
            roles,
            vec![
                Role::User,
                Role::Assistant,
                Role::ToolResult,
                Role::Assistant,
                Role::ToolResult,
                Role::Assistant,
            ]
        );
        assert_eq!(transcript.tool_rounds, 2);
    }

    #[tokio::test]
    async fn test_round_limit_forces_final_answer() {
        let model = Arc::new(ScriptedModel::new(usize::MAX, vec!["arxiv"]));
        let agent = ResearchAgent::new(model, toolbox()).with_max_tool_rounds(2);

        let transcript = agent.run("loop forever").await.unwrap();

        assert!(transcript.step_cap_reached);
        assert_eq!(transcript.tool_rounds, 2);
        // user + 2 * (request + result) + answer
        assert_eq!(transcript.messages.len(), 6);
        let last = transcript.messages.last().unwrap();
        assert_eq!(last.role, Role::Assistant);
        assert!(!last.requests_tools());
    }

    #[tokio::test]
    async fn test_tool_failure_fails_the_run() {
        let model = Arc::new(ScriptedModel::new(1, vec!["wikipedia"]));
        let tools = Toolbox::from_parts(
            Arc::new(EchoSearch("arxiv")),
            Arc::new(FailingSearch),
            Arc::new(EchoSearch("web")),
        );
        let agent = ResearchAgent::new(model, tools);

        let err = agent.run("Tell me about spacex").await.unwrap_err();
        assert!(err.to_string().contains("connection refused"));
    }

    #[tokio::test]
    async fn test_unknown_tool_fails_the_run() {
        let model = Arc::new(ScriptedModel::new(1, vec!["brave_search"]));
        let agent = ResearchAgent::new(model, toolbox());

        let err = agent.run("Tell me about spacex").await.unwrap_err();
        assert!(matches!(err, DelveError::UnknownTool(name) if name == "brave_search"));
    }
}
