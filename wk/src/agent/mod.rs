//! Chat agent over the Wikipedia index
//!
//! A plain tool-calling loop: the conversation and tool definitions go to the
//! model, requested tools run through the [`ToolExecutor`], their results go
//! back, and the loop ends when the model answers in text. Only completed
//! user/assistant text turns are remembered between messages.

use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::AgentConfig;
use crate::embed::Embedder;
use crate::index::WikiIndex;
use crate::llm::{CompletionRequest, ContentBlock, LlmClient, LlmError, Message};
use crate::prompts::{PromptError, Prompts};
use crate::query::{QueryError, QueryOptions};
use crate::tools::{QueryEngineTool, ToolExecutor};

/// Prompt sent to a model before an agent is built on it
pub const TEST_PROMPT: &str = "Hello, this is a test.";

const TEST_MAX_TOKENS: u32 = 64;

#[derive(Debug, Error)]
pub enum AgentError {
    #[error("Model test failed: {0}")]
    ModelCheck(#[source] LlmError),

    #[error("Model call failed: {0}")]
    Llm(#[from] LlmError),

    #[error("Reached max iterations ({0}) without a final answer")]
    MaxIterations(u32),

    #[error("Model returned an empty response")]
    EmptyResponse,

    #[error("Failed to build query engine: {0}")]
    Query(#[from] QueryError),

    #[error("Prompt error: {0}")]
    Prompt(#[from] PromptError),
}

/// Agent loop limits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AgentOptions {
    /// Maximum model calls per message
    pub max_iterations: u32,
    /// Completed turns kept in memory
    pub memory_turns: usize,
    pub max_tokens: u32,
}

impl Default for AgentOptions {
    fn default() -> Self {
        Self::from(&AgentConfig::default())
    }
}

impl From<&AgentConfig> for AgentOptions {
    fn from(config: &AgentConfig) -> Self {
        Self {
            max_iterations: config.max_iterations,
            memory_turns: config.memory_turns,
            max_tokens: config.max_tokens,
        }
    }
}

/// One tool invocation made while answering
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolOutput {
    pub tool_name: String,
    pub input: serde_json::Value,
    pub content: String,
    pub is_error: bool,
}

/// The agent's answer to one message
#[derive(Debug, Clone, PartialEq)]
pub struct AgentResponse {
    pub response: String,
    pub sources: Vec<ToolOutput>,
}

#[derive(Serialize)]
struct ToolSummary<'a> {
    name: &'a str,
    description: &'a str,
}

pub struct Agent {
    llm: Arc<dyn LlmClient>,
    tools: ToolExecutor,
    system_prompt: String,
    memory: Vec<Message>,
    options: AgentOptions,
}

impl Agent {
    /// Create an agent over `tools`
    pub fn new(llm: Arc<dyn LlmClient>, tools: ToolExecutor, options: AgentOptions) -> Result<Self, AgentError> {
        debug!(model = %llm.model(), tools = ?tools.tool_names(), ?options, "Agent::new: called");
        let definitions = tools.definitions();
        let summaries: Vec<ToolSummary<'_>> = definitions
            .iter()
            .map(|d| ToolSummary {
                name: &d.name,
                description: &d.description,
            })
            .collect();
        let system_prompt = Prompts::new()?.render("agent", &serde_json::json!({ "tools": summaries }))?;

        Ok(Self {
            llm,
            tools,
            system_prompt,
            memory: Vec::new(),
            options,
        })
    }

    pub fn model(&self) -> &str {
        self.llm.model()
    }

    pub fn memory(&self) -> &[Message] {
        &self.memory
    }

    /// Forget the conversation
    pub fn reset(&mut self) {
        debug!(message_count = self.memory.len(), "Agent::reset: called");
        self.memory.clear();
    }

    /// Answer one user message
    ///
    /// Memory is only updated when the loop produces an answer.
    pub async fn chat(&mut self, message: &str) -> Result<AgentResponse, AgentError> {
        debug!(model = %self.llm.model(), message_len = message.len(), "Agent::chat: called");
        let mut conversation = self.memory.clone();
        conversation.push(Message::user(message));
        let mut sources = Vec::new();

        for iteration in 0..self.options.max_iterations {
            let request = CompletionRequest {
                system_prompt: self.system_prompt.clone(),
                messages: conversation.clone(),
                tools: self.tools.definitions(),
                max_tokens: self.options.max_tokens,
            };
            let response = self.llm.complete(request).await?;
            debug!(iteration, stop_reason = ?response.stop_reason, tool_calls = response.tool_calls.len(), "chat: model replied");

            if response.tool_calls.is_empty() {
                let answer = response.content.unwrap_or_default();
                if answer.trim().is_empty() {
                    return Err(AgentError::EmptyResponse);
                }
                self.remember(message, &answer);
                info!(iterations = iteration + 1, tool_calls = sources.len(), "Agent answered");
                return Ok(AgentResponse {
                    response: answer,
                    sources,
                });
            }

            let mut blocks = Vec::new();
            if let Some(content) = &response.content {
                blocks.push(ContentBlock::text(content));
            }
            for tc in &response.tool_calls {
                blocks.push(ContentBlock::ToolUse {
                    id: tc.id.clone(),
                    name: tc.name.clone(),
                    input: tc.input.clone(),
                });
            }
            conversation.push(Message::assistant_blocks(blocks));

            let results = self.tools.execute_all(&response.tool_calls).await;
            let mut result_blocks = Vec::with_capacity(results.len());
            for (tc, (id, result)) in response.tool_calls.iter().zip(results) {
                if result.is_error {
                    warn!(tool = %tc.name, error = %result.content, "Tool call failed");
                }
                result_blocks.push(ContentBlock::tool_result(id, &result.content, result.is_error));
                sources.push(ToolOutput {
                    tool_name: tc.name.clone(),
                    input: tc.input.clone(),
                    content: result.content,
                    is_error: result.is_error,
                });
            }
            conversation.push(Message::user_blocks(result_blocks));
        }

        warn!(max_iterations = self.options.max_iterations, "Agent hit max iterations");
        Err(AgentError::MaxIterations(self.options.max_iterations))
    }

    fn remember(&mut self, user: &str, assistant: &str) {
        self.memory.push(Message::user(user));
        self.memory.push(Message::assistant(assistant));

        let keep = self.options.memory_turns * 2;
        if self.memory.len() > keep {
            let excess = self.memory.len() - keep;
            self.memory.drain(..excess);
        }
    }
}

/// Check that `llm` answers before building on it
pub async fn check_model(llm: &dyn LlmClient) -> Result<(), AgentError> {
    debug!(model = %llm.model(), "check_model: called");
    let reply = llm
        .complete_text(TEST_PROMPT, TEST_MAX_TOKENS)
        .await
        .map_err(AgentError::ModelCheck)?;
    let preview: String = reply.chars().take(100).collect();
    info!(model = %llm.model(), reply = %preview, "Model test successful");
    Ok(())
}

/// Build the Wikipedia agent for `index`
///
/// `agent_llm` drives the conversation; `query_llm` synthesizes answers
/// inside the `Wikipedia` tool. The agent model is checked first.
pub async fn create_agent(
    index: Arc<WikiIndex>,
    agent_llm: Arc<dyn LlmClient>,
    query_llm: Arc<dyn LlmClient>,
    embedder: Arc<dyn Embedder>,
    query_options: QueryOptions,
    options: AgentOptions,
) -> Result<Agent, AgentError> {
    info!(
        model = %agent_llm.model(),
        node_count = index.document_count(),
        "Creating agent with model {}",
        agent_llm.model()
    );
    check_model(agent_llm.as_ref()).await?;

    let engine = index.as_query_engine(query_llm, embedder, query_options)?;
    let tools = ToolExecutor::with_tools(vec![Box::new(QueryEngineTool::wikipedia(Arc::new(engine)))]);
    Agent::new(agent_llm, tools, options)
}
