//! Tool set seam used by the orchestrator

use async_trait::async_trait;
use serde_json::Value;

use netops_core::OperationResult;
use netops_llm::ToolDefinition;

/// A named group of tools offered to the model in one conversation loop.
///
/// `call` never fails: unknown names and backend errors come back as
/// `OperationResult::Failure`.
#[async_trait]
pub trait ToolSet: Send + Sync {
    /// Short name for logs and prompts
    fn name(&self) -> &str;

    fn definitions(&self) -> Vec<ToolDefinition>;

    async fn call(&self, tool_name: &str, input: Value) -> OperationResult;

    fn has_tool(&self, tool_name: &str) -> bool {
        self.definitions().iter().any(|d| d.name == tool_name)
    }
}

/// Failure returned for a tool name the set does not know
pub fn unknown_tool(set: &str, tool_name: &str) -> OperationResult {
    OperationResult::Failure {
        error_message: format!("Unknown tool '{}' for {}", tool_name, set),
        kind: Some("unsupported".to_string()),
        detail: None,
    }
}
