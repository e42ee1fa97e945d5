//! Reasoning Loop
//!
//! Drives one directory-analysis run: the model is called repeatedly with the
//! growing transcript, requested tools are executed in order, and near the end
//! of the iteration budget tools are withdrawn so the model has to answer.

use std::path::PathBuf;
use std::sync::Arc;

use serde_json::Map;
use tracing::{debug, info, warn};

use crate::error::{AgentError, Result};
use crate::extract::parse_tool_calls;
use crate::message::{Message, MessageContent, Role};
use crate::provider::{ChatRequest, LlmProvider};
use crate::tool::{ToolCall, ToolContext, ToolMetadata, ToolRegistry, ToolResult};

/// Default iteration budget
pub const DEFAULT_MAX_ITERATIONS: usize = 10;

/// Characters of the last transcript message quoted when the budget runs out
const LAST_MESSAGE_PREVIEW: usize = 400;

/// Injected two iterations before the budget ends
pub const FINAL_ANSWER_INSTRUCTION: &str = "Based on the information you have already viewed, \
give the final summary of the project structure. Do not call any more tools.";

fn initial_directive(cwd: &str) -> String {
    format!(
        "Analyze directory: {cwd}. List the root directory first, then read key files as needed, \
         and finally give a summary."
    )
}

fn prior_report_message(report: &str) -> String {
    format!("This is the previously generated report (reference for an incremental update):\n\n{report}")
}

/// Agent configuration, immutable for one run
#[derive(Clone)]
pub struct AgentConfig {
    /// Directory under analysis; also the tool sandbox root
    pub cwd: PathBuf,

    /// Base system prompt
    pub system_prompt: String,

    /// Extra prompt lines appended after the system prompt
    pub extensions: Vec<String>,

    /// Provider adapter
    pub client: Arc<dyn LlmProvider>,

    /// Model identifier passed through to the provider
    pub model: String,

    /// Tools offered to the model
    pub tools: Arc<ToolRegistry>,

    /// Maximum reasoning iterations before giving up
    pub max_iterations: usize,

    /// Previous report for incremental runs
    pub prior_report: Option<String>,
}

impl AgentConfig {
    /// System prompt followed by the extensions, blank entries dropped
    pub fn combined_prompt(&self) -> String {
        std::iter::once(self.system_prompt.trim())
            .chain(self.extensions.iter().map(String::as_str))
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Run the agent once and return its final answer
pub async fn run_agent(config: AgentConfig) -> Result<String> {
    Agent::new(config).run().await
}

/// The main Agent struct
pub struct Agent {
    config: AgentConfig,
}

impl Agent {
    /// Create a new agent
    pub fn new(config: AgentConfig) -> Self {
        Self { config }
    }

    /// Start building an agent
    pub fn builder() -> AgentBuilder {
        AgentBuilder::new()
    }

    /// Get configuration
    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    /// Transcript a run starts from
    fn initial_transcript(&self) -> Vec<Message> {
        let cfg = &self.config;
        let mut messages = vec![
            Message::system(cfg.combined_prompt()),
            Message::user(initial_directive(&cfg.cwd.display().to_string())),
        ];

        if let Some(report) = cfg.prior_report.as_deref().filter(|r| !r.trim().is_empty()) {
            messages.push(Message::user(prior_report_message(report)));
        }

        messages
    }

    /// Run the reasoning loop to a final answer
    pub async fn run(&self) -> Result<String> {
        let cfg = &self.config;
        let mut messages = self.initial_transcript();
        let offered = cfg.tools.metadata();
        let converge_at = cfg.max_iterations.checked_sub(2);

        info!(
            provider = cfg.client.name(),
            model = %cfg.model,
            cwd = %cfg.cwd.display(),
            max_iterations = cfg.max_iterations,
            "starting agent run"
        );

        for iteration in 0..cfg.max_iterations {
            if converge_at == Some(iteration) {
                debug!(iteration, "forcing convergence");
                messages.push(Message::user(FINAL_ANSWER_INSTRUCTION));
            }

            let allow_tools = converge_at.is_some_and(|at| iteration < at);
            let tools: &[ToolMetadata] = if allow_tools { &offered } else { &[] };

            debug!(iteration, tools = tools.len(), transcript = messages.len(), "calling provider");
            let response = cfg
                .client
                .chat(ChatRequest {
                    model: &cfg.model,
                    messages: &messages,
                    tools,
                })
                .await?;

            let msg = response.first_message().ok_or(AgentError::EmptyResponse)?;

            let (calls, native) = match msg.native_tool_calls() {
                Some(calls) => (calls.to_vec(), true),
                None => (parse_tool_calls(msg.reasoning_text.as_deref()), false),
            };

            if calls.is_empty() {
                let text = msg.text();
                if text.is_empty() {
                    return Err(AgentError::NoFinalAnswer {
                        raw: serde_json::to_string(&response)?,
                    });
                }
                info!(iteration, "agent produced final answer");
                return Ok(text);
            }

            debug!(iteration, calls = calls.len(), native, "dispatching tool calls");

            let turn_start = messages.len();
            let mut tool_results: Vec<ToolResult> = Vec::new();
            for call in &calls {
                self.dispatch(call, &mut tool_results, &mut messages).await?;
            }
            debug!(iteration, results = tool_results.len(), "tool calls finished");

            // Fallback-parsed calls have no provider-native shape to echo back.
            if native {
                let turn = Message {
                    role: Role::Assistant,
                    content: Some(msg.content.clone().unwrap_or_else(|| MessageContent::from(""))),
                    tool_calls: Some(calls),
                    ..Message::assistant("")
                };
                messages.insert(turn_start, turn);
            }
        }

        Err(AgentError::MaxIterations {
            max: cfg.max_iterations,
            last: last_message_preview(&messages),
        })
    }

    /// Execute one call, turning model mistakes into inline tool output
    async fn dispatch(
        &self,
        call: &ToolCall,
        tool_results: &mut Vec<ToolResult>,
        messages: &mut Vec<Message>,
    ) -> Result<()> {
        let Some(name) = call.tool_name() else {
            warn!("tool call without a name");
            respond_inline(call, "unknown", "unknown tool: (empty)", tool_results, messages);
            return Ok(());
        };

        let args = match call.parse_args() {
            Ok(args) => args,
            Err(e) => {
                warn!(tool = name, error = %e, "tool arguments are not valid JSON");
                respond_inline(call, name, &format!("args parse error: {e}"), tool_results, messages);
                return Ok(());
            }
        };

        if self.config.tools.get(name).is_none() {
            warn!(tool = name, "model requested an unknown tool");
            respond_inline(call, name, &format!("unknown tool: {name}"), tool_results, messages);
            return Ok(());
        }

        debug!(tool = name, "executing tool");
        let ctx = ToolContext {
            tool_results,
            args,
            messages,
            cwd: &self.config.cwd,
            call,
        };
        self.config.tools.execute(name, ctx).await
    }
}

fn respond_inline(
    call: &ToolCall,
    tool: &str,
    text: &str,
    tool_results: &mut Vec<ToolResult>,
    messages: &mut Vec<Message>,
) {
    let mut ctx = ToolContext {
        tool_results,
        args: Map::new(),
        messages,
        cwd: std::path::Path::new(""),
        call,
    };
    ctx.respond_text(tool, text);
}

fn last_message_preview(messages: &[Message]) -> String {
    match messages.last().and_then(|m| m.content.as_ref()) {
        Some(MessageContent::Text(text)) => text.chars().take(LAST_MESSAGE_PREVIEW).collect(),
        _ => String::new(),
    }
}

/// Builder for Agent configuration
pub struct AgentBuilder {
    provider: Option<Arc<dyn LlmProvider>>,
    tools: ToolRegistry,
    cwd: Option<PathBuf>,
    system_prompt: String,
    extensions: Vec<String>,
    model: Option<String>,
    max_iterations: usize,
    prior_report: Option<String>,
}

impl Default for AgentBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl AgentBuilder {
    pub fn new() -> Self {
        Self {
            provider: None,
            tools: ToolRegistry::new(),
            cwd: None,
            system_prompt: String::new(),
            extensions: Vec::new(),
            model: None,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            prior_report: None,
        }
    }

    pub fn provider(mut self, provider: Arc<dyn LlmProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    pub fn tool<T: crate::tool::Tool + 'static>(mut self, tool: T) -> Self {
        self.tools.register(tool);
        self
    }

    pub fn tools(mut self, tools: ToolRegistry) -> Self {
        self.tools = tools;
        self
    }

    pub fn cwd(mut self, cwd: impl Into<PathBuf>) -> Self {
        self.cwd = Some(cwd.into());
        self
    }

    pub fn system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = prompt.into();
        self
    }

    pub fn extension(mut self, line: impl Into<String>) -> Self {
        self.extensions.push(line.into());
        self
    }

    pub fn extensions<I, S>(mut self, lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.extensions.extend(lines.into_iter().map(Into::into));
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn max_iterations(mut self, max: usize) -> Self {
        self.max_iterations = max;
        self
    }

    pub fn prior_report(mut self, report: impl Into<String>) -> Self {
        self.prior_report = Some(report.into());
        self
    }

    pub fn build(self) -> Result<Agent> {
        let client = self
            .provider
            .ok_or_else(|| AgentError::Config("Provider is required".into()))?;
        let cwd = self
            .cwd
            .ok_or_else(|| AgentError::Config("Working directory is required".into()))?;
        let model = self
            .model
            .filter(|m| !m.trim().is_empty())
            .ok_or_else(|| AgentError::Config("Model is required".into()))?;

        Ok(Agent::new(AgentConfig {
            cwd,
            system_prompt: self.system_prompt,
            extensions: self.extensions,
            client,
            model,
            tools: Arc::new(self.tools),
            max_iterations: self.max_iterations,
            prior_report: self.prior_report,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::ChatResponse;
    use crate::tool::Tool;
    use async_trait::async_trait;
    use serde_json::json;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// What the provider saw on one call
    struct Seen {
        messages: Vec<Message>,
        tools: Vec<ToolMetadata>,
    }

    /// Replays scripted responses, then repeats `fallback` forever
    struct ScriptedProvider {
        script: Mutex<VecDeque<ChatResponse>>,
        fallback: Option<ChatResponse>,
        seen: Mutex<Vec<Seen>>,
    }

    impl ScriptedProvider {
        fn new(script: Vec<ChatResponse>) -> Arc<Self> {
            Arc::new(Self {
                script: Mutex::new(script.into()),
                fallback: None,
                seen: Mutex::new(Vec::new()),
            })
        }

        fn repeating(response: ChatResponse) -> Arc<Self> {
            Arc::new(Self {
                script: Mutex::new(VecDeque::new()),
                fallback: Some(response),
                seen: Mutex::new(Vec::new()),
            })
        }

        fn calls(&self) -> usize {
            self.seen.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl LlmProvider for ScriptedProvider {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn chat(&self, request: ChatRequest<'_>) -> Result<ChatResponse> {
            self.seen.lock().unwrap().push(Seen {
                messages: request.messages.to_vec(),
                tools: request.tools.to_vec(),
            });
            let next = self.script.lock().unwrap().pop_front();
            next.or_else(|| self.fallback.clone())
                .ok_or_else(|| AgentError::Other("script exhausted".into()))
        }
    }

    struct FailingProvider;

    #[async_trait]
    impl LlmProvider for FailingProvider {
        fn name(&self) -> &str {
            "failing"
        }

        async fn chat(&self, _request: ChatRequest<'_>) -> Result<ChatResponse> {
            Err(AgentError::Http {
                provider: "failing".into(),
                status: 500,
                body: "boom".into(),
            })
        }
    }

    /// Stand-in for the real readFile tool
    struct StubReadFile;

    #[async_trait]
    impl Tool for StubReadFile {
        fn metadata(&self) -> ToolMetadata {
            ToolMetadata::function(
                "readFile",
                "Read a file",
                json!({"type": "object", "properties": {"relativeFilePath": {"type": "string"}}}),
            )
        }

        async fn handle(&self, mut ctx: ToolContext<'_>) -> Result<()> {
            let path = ctx
                .args
                .get("relativeFilePath")
                .and_then(|v| v.as_str())
                .unwrap_or_default()
                .to_string();
            ctx.respond_text("readFile", format!("contents of {path}"));
            Ok(())
        }
    }

    fn tool_call_response(id: &str, name: &str, arguments: &str) -> ChatResponse {
        ChatResponse::from_message(
            Message::assistant("").with_tool_calls(vec![ToolCall::function(Some(id.into()), name, arguments)]),
        )
    }

    fn text_response(text: &str) -> ChatResponse {
        ChatResponse::from_message(Message::assistant(text))
    }

    fn agent(provider: Arc<dyn LlmProvider>, max_iterations: usize) -> Agent {
        Agent::builder()
            .provider(provider)
            .tool(StubReadFile)
            .cwd("/tmp/project")
            .system_prompt("  You analyze projects.  ")
            .extensions(["Be concise.", ""])
            .model("test-model")
            .max_iterations(max_iterations)
            .build()
            .unwrap()
    }

    fn count_instruction(messages: &[Message]) -> usize {
        messages
            .iter()
            .filter(|m| m.role == Role::User && m.text() == FINAL_ANSWER_INSTRUCTION)
            .count()
    }

    #[tokio::test]
    async fn test_two_call_scenario_returns_summary() {
        let provider = ScriptedProvider::new(vec![
            tool_call_response("call_1", "readFile", r#"{"relativeFilePath":"README.md"}"#),
            text_response("Summary: ..."),
        ]);

        let answer = agent(provider.clone(), 10).run().await.unwrap();

        assert_eq!(answer, "Summary: ...");
        assert_eq!(provider.calls(), 2);

        let seen = provider.seen.lock().unwrap();
        let second = &seen[1].messages;
        assert_eq!(second.len(), 4);
        assert_eq!(second[2].role, Role::Assistant);
        assert_eq!(second[2].native_tool_calls().unwrap()[0].id.as_deref(), Some("call_1"));
        assert_eq!(second[3].role, Role::Tool);
        assert_eq!(second[3].tool_call_id.as_deref(), Some("call_1"));
        assert_eq!(second[3].text(), "contents of README.md");
    }

    #[tokio::test]
    async fn test_forced_convergence_with_three_iterations() {
        let provider = ScriptedProvider::repeating(tool_call_response(
            "call_x",
            "readFile",
            r#"{"relativeFilePath":"a.txt"}"#,
        ));

        let err = agent(provider.clone(), 3).run().await.unwrap_err();
        assert!(matches!(err, AgentError::MaxIterations { max: 3, .. }));

        let seen = provider.seen.lock().unwrap();
        assert_eq!(seen.len(), 3);
        assert_eq!(seen[0].tools.len(), 1);
        assert!(seen[1].tools.is_empty());
        assert!(seen[2].tools.is_empty());

        assert_eq!(count_instruction(&seen[0].messages), 0);
        assert_eq!(count_instruction(&seen[1].messages), 1);
        assert_eq!(count_instruction(&seen[2].messages), 1);
    }

    #[tokio::test]
    async fn test_single_iteration_offers_no_tools() {
        let provider = ScriptedProvider::new(vec![text_response("Short summary.")]);

        assert_eq!(agent(provider.clone(), 1).run().await.unwrap(), "Short summary.");

        let seen = provider.seen.lock().unwrap();
        assert!(seen[0].tools.is_empty());
        assert_eq!(count_instruction(&seen[0].messages), 0);
    }

    #[tokio::test]
    async fn test_budget_exhaustion_quotes_last_message() {
        let provider = ScriptedProvider::repeating(tool_call_response("c", "readFile", r#"{"relativeFilePath":"x"}"#));

        let err = agent(provider, 2).run().await.unwrap_err();
        match err {
            AgentError::MaxIterations { max, last } => {
                assert_eq!(max, 2);
                assert_eq!(last, "contents of x");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_fallback_calls_are_not_echoed() {
        let reasoning = Message::assistant("")
            .with_reasoning("<tool_call>readFile<arg_key>relativeFilePath</arg_key><arg_value>main.rs</arg_value></tool_call>");
        let provider = ScriptedProvider::new(vec![
            ChatResponse::from_message(reasoning),
            text_response("done"),
        ]);

        assert_eq!(agent(provider.clone(), 10).run().await.unwrap(), "done");

        let seen = provider.seen.lock().unwrap();
        let second = &seen[1].messages;
        assert_eq!(second.len(), 3);
        assert_eq!(second[2].role, Role::Tool);
        assert_eq!(second[2].tool_call_id.as_deref(), Some(""));
        assert_eq!(second[2].text(), "contents of main.rs");
        assert!(second.iter().all(|m| m.role != Role::Assistant));
    }

    #[tokio::test]
    async fn test_model_mistakes_stay_inline() {
        let mistakes = Message::assistant("").with_tool_calls(vec![
            ToolCall::function(Some("a".into()), "deleteEverything", "{}"),
            ToolCall::function(Some("b".into()), "readFile", "{broken"),
            ToolCall::function(Some("c".into()), "", "{}"),
        ]);
        let provider = ScriptedProvider::new(vec![ChatResponse::from_message(mistakes), text_response("ok")]);

        assert_eq!(agent(provider.clone(), 10).run().await.unwrap(), "ok");

        let seen = provider.seen.lock().unwrap();
        let tool_texts: Vec<String> = seen[1]
            .messages
            .iter()
            .filter(|m| m.role == Role::Tool)
            .map(Message::text)
            .collect();
        assert_eq!(tool_texts.len(), 3);
        assert_eq!(tool_texts[0], "unknown tool: deleteEverything");
        assert!(tool_texts[1].starts_with("args parse error:"));
        assert_eq!(tool_texts[2], "unknown tool: (empty)");
    }

    #[tokio::test]
    async fn test_empty_response_fails() {
        let provider = ScriptedProvider::new(vec![ChatResponse::default()]);
        let err = agent(provider, 10).run().await.unwrap_err();
        assert!(matches!(err, AgentError::EmptyResponse));
    }

    #[tokio::test]
    async fn test_no_text_and_no_calls_embeds_raw_response() {
        let provider = ScriptedProvider::new(vec![text_response("")]);
        let err = agent(provider, 10).run().await.unwrap_err();
        match err {
            AgentError::NoFinalAnswer { raw } => assert!(raw.contains("choices")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_provider_failure_aborts_run() {
        let err = agent(Arc::new(FailingProvider), 10).run().await.unwrap_err();
        assert!(err.to_string().contains("500"));
    }

    #[tokio::test]
    async fn test_initial_transcript() {
        let provider = ScriptedProvider::new(vec![text_response("fine")]);
        let agent = Agent::builder()
            .provider(provider.clone())
            .cwd("/tmp/project")
            .system_prompt("  Analyze.  ")
            .extension("Style: terse.")
            .model("m")
            .prior_report("# Old report")
            .build()
            .unwrap();

        agent.run().await.unwrap();

        let seen = provider.seen.lock().unwrap();
        let first = &seen[0].messages;
        assert_eq!(first.len(), 3);
        assert_eq!(first[0].text(), "Analyze.\nStyle: terse.");
        assert!(first[1].text().contains("/tmp/project"));
        assert!(first[2].text().ends_with("# Old report"));
    }

    #[tokio::test]
    async fn test_blank_prior_report_is_skipped() {
        let provider = ScriptedProvider::new(vec![text_response("fine")]);
        let agent = Agent::builder()
            .provider(provider.clone())
            .cwd("/tmp/project")
            .model("m")
            .prior_report("   \n")
            .build()
            .unwrap();

        agent.run().await.unwrap();
        assert_eq!(provider.seen.lock().unwrap()[0].messages.len(), 2);
    }

    #[test]
    fn test_builder_requires_provider_and_model() {
        assert!(matches!(
            Agent::builder().cwd("/tmp").model("m").build(),
            Err(AgentError::Config(_))
        ));
        let provider = ScriptedProvider::new(Vec::new());
        assert!(matches!(
            Agent::builder().provider(provider).cwd("/tmp").build(),
            Err(AgentError::Config(_))
        ));
    }
}
