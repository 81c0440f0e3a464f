//! ToolExecutor - dispatches model tool calls to registered tools

use std::collections::BTreeMap;
use tracing::debug;

use super::{Tool, ToolError, ToolResult};
use crate::llm::{ToolCall, ToolDefinition};

/// Registered tools, keyed by name
pub struct ToolExecutor {
    tools: BTreeMap<String, Box<dyn Tool>>,
}

impl ToolExecutor {
    /// Create an empty executor
    pub fn empty() -> Self {
        debug!("ToolExecutor::empty: called");
        Self { tools: BTreeMap::new() }
    }

    /// Create an executor holding `tools`
    pub fn with_tools(tools: Vec<Box<dyn Tool>>) -> Self {
        let mut executor = Self::empty();
        for tool in tools {
            executor.add_tool(tool);
        }
        executor
    }

    /// Add a tool, replacing any tool with the same name
    pub fn add_tool(&mut self, tool: Box<dyn Tool>) {
        debug!(tool_name = %tool.name(), "ToolExecutor::add_tool: called");
        self.tools.insert(tool.name().to_string(), tool);
    }

    /// Get tool definitions for the LLM, sorted by name
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        debug!("ToolExecutor::definitions: called");
        self.tools
            .values()
            .map(|t| ToolDefinition::new(t.name(), t.description(), t.input_schema()))
            .collect()
    }

    /// Execute a tool call
    pub async fn execute(&self, tool_call: &ToolCall) -> ToolResult {
        debug!(tool_name = %tool_call.name, tool_id = %tool_call.id, "ToolExecutor::execute: called");
        match self.tools.get(&tool_call.name) {
            Some(tool) => tool.execute(tool_call.input.clone()).await,
            None => {
                debug!("ToolExecutor::execute: unknown tool");
                let err = ToolError::UnknownTool {
                    name: tool_call.name.clone(),
                };
                ToolResult::error(err.to_string())
            }
        }
    }

    /// Execute multiple tool calls in order
    pub async fn execute_all(&self, tool_calls: &[ToolCall]) -> Vec<(String, ToolResult)> {
        debug!(count = %tool_calls.len(), "ToolExecutor::execute_all: called");
        let mut results = Vec::with_capacity(tool_calls.len());

        for call in tool_calls {
            let result = self.execute(call).await;
            results.push((call.id.clone(), result));
        }

        results
    }

    /// Get tool names, sorted
    pub fn tool_names(&self) -> Vec<String> {
        self.tools.keys().cloned().collect()
    }
}

impl Default for ToolExecutor {
    fn default() -> Self {
        Self::empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::{Value, json};

    struct EchoTool;

    #[async_trait]
    impl Tool for EchoTool {
        fn name(&self) -> &str {
            "echo"
        }

        fn description(&self) -> &str {
            "Echo the input back"
        }

        fn input_schema(&self) -> Value {
            json!({"type": "object", "properties": {"text": {"type": "string"}}, "required": ["text"]})
        }

        async fn execute(&self, input: Value) -> ToolResult {
            match input["text"].as_str() {
                Some(t) => ToolResult::success(t),
                None => ToolResult::error("text is required"),
            }
        }
    }

    fn call(id: &str, name: &str, input: Value) -> ToolCall {
        ToolCall {
            id: id.to_string(),
            name: name.to_string(),
            input,
        }
    }

    #[test]
    fn test_empty_executor() {
        let executor = ToolExecutor::empty();
        assert!(executor.tool_names().is_empty());
        assert!(executor.definitions().is_empty());
    }

    #[test]
    fn test_definitions() {
        let executor = ToolExecutor::with_tools(vec![Box::new(EchoTool)]);
        let defs = executor.definitions();
        assert_eq!(defs.len(), 1);
        assert_eq!(defs[0].name, "echo");
        assert_eq!(defs[0].description, "Echo the input back");
        assert_eq!(executor.tool_names(), vec!["echo"]);
    }

    #[tokio::test]
    async fn test_execute_known_tool() {
        let executor = ToolExecutor::with_tools(vec![Box::new(EchoTool)]);
        let result = executor.execute(&call("1", "echo", json!({"text": "hi"}))).await;
        assert_eq!(result, ToolResult::success("hi"));
    }

    #[tokio::test]
    async fn test_execute_unknown_tool() {
        let executor = ToolExecutor::empty();
        let result = executor.execute(&call("1", "nonexistent", json!({}))).await;
        assert!(result.is_error);
        assert!(result.content.contains("nonexistent"));
    }

    #[tokio::test]
    async fn test_execute_all_keeps_order_and_ids() {
        let executor = ToolExecutor::with_tools(vec![Box::new(EchoTool)]);
        let results = executor
            .execute_all(&[call("a", "echo", json!({"text": "one"})), call("b", "echo", json!({}))])
            .await;

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].0, "a");
        assert!(!results[0].1.is_error);
        assert_eq!(results[1].0, "b");
        assert!(results[1].1.is_error);
    }
}
