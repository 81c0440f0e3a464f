//! Tool error types

use thiserror::Error;

use crate::query::QueryError;

/// Errors that can occur during tool execution
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("Tool not found: {name}")]
    UnknownTool { name: String },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Query failed: {0}")]
    Query(#[from] QueryError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_tool_message() {
        let err = ToolError::UnknownTool {
            name: "calculator".to_string(),
        };
        assert_eq!(err.to_string(), "Tool not found: calculator");
    }

    #[test]
    fn test_invalid_argument_message() {
        let err = ToolError::InvalidArgument("input must be a string".to_string());
        assert!(err.to_string().contains("input must be a string"));
    }
}
