//! Wikipedia tool - exposes a query engine to the agent

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use super::{Tool, ToolError, ToolResult};
use crate::query::QueryEngine;

pub const WIKIPEDIA_TOOL_NAME: &str = "Wikipedia";
pub const WIKIPEDIA_TOOL_DESCRIPTION: &str = "Useful for performing searches on the wikipedia knowledge base";

/// Answers a natural-language question from the indexed pages
pub struct QueryEngineTool {
    engine: Arc<QueryEngine>,
    name: String,
    description: String,
}

impl QueryEngineTool {
    pub fn new(engine: Arc<QueryEngine>, name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            engine,
            name: name.into(),
            description: description.into(),
        }
    }

    /// The `Wikipedia` tool over `engine`
    pub fn wikipedia(engine: Arc<QueryEngine>) -> Self {
        Self::new(engine, WIKIPEDIA_TOOL_NAME, WIKIPEDIA_TOOL_DESCRIPTION)
    }

    async fn run(&self, input: &Value) -> Result<String, ToolError> {
        let question = input["input"]
            .as_str()
            .map(str::trim)
            .filter(|q| !q.is_empty())
            .ok_or_else(|| ToolError::InvalidArgument("input is required".to_string()))?;

        let response = self.engine.query(question).await?;
        debug!(source_count = response.source_nodes.len(), "QueryEngineTool::run: answered");
        Ok(response.response)
    }
}

#[async_trait]
impl Tool for QueryEngineTool {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn input_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "input": {
                    "type": "string",
                    "description": "A full question to answer from the indexed pages"
                }
            },
            "required": ["input"]
        })
    }

    async fn execute(&self, input: Value) -> ToolResult {
        debug!(?input, tool = %self.name, "QueryEngineTool::execute: called");
        match self.run(&input).await {
            Ok(answer) => ToolResult::success(answer),
            Err(e) => ToolResult::error(e.to_string()),
        }
    }
}
