//! Tool system for the chat agent
//!
//! Tools are what the agent's model can call. The only built-in tool wraps a
//! query engine over the current index.

mod error;
mod executor;
mod query_engine;
mod traits;

pub use error::ToolError;
pub use executor::ToolExecutor;
pub use query_engine::{QueryEngineTool, WIKIPEDIA_TOOL_DESCRIPTION, WIKIPEDIA_TOOL_NAME};
pub use traits::{Tool, ToolResult};
