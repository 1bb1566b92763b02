//! Master router
//!
//! Exposes one delegate tool per backend. Calling a delegate runs that
//! backend's agent on the forwarded request with a fresh history and
//! returns its answer as the observation.

use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::info;

use netops_core::{Backend, OperationResult};
use netops_llm::ToolDefinition;
use netops_tools::toolset::unknown_tool;
use netops_tools::ToolSet;

use crate::agent::Agent;

struct Delegate {
    tool_name: String,
    backend: Backend,
    agent: Arc<Agent>,
}

pub struct MasterRouter {
    delegates: Vec<Delegate>,
}

impl MasterRouter {
    pub fn new() -> Self {
        Self {
            delegates: Vec::new(),
        }
    }

    /// Register `agent` as the delegate for `backend`, replacing any
    /// earlier one
    pub fn with_agent(mut self, backend: Backend, agent: Agent) -> Self {
        self.delegates.retain(|d| d.backend != backend);
        self.delegates.push(Delegate {
            tool_name: delegate_name(backend),
            backend,
            agent: Arc::new(agent),
        });
        self
    }

    pub fn backends(&self) -> Vec<Backend> {
        self.delegates.iter().map(|d| d.backend).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.delegates.is_empty()
    }
}

impl Default for MasterRouter {
    fn default() -> Self {
        Self::new()
    }
}

/// Tool name of the delegate for `backend`, e.g. `ios_xe_agent`
pub fn delegate_name(backend: Backend) -> String {
    format!("{}_agent", backend)
}

fn delegate_description(backend: Backend) -> &'static str {
    match backend {
        Backend::IosXe => "Use for interacting with Cisco IOS XE devices: show commands, \
                           running configuration, logs and configuration changes.",
        Backend::Aci => "Use for interacting with Cisco ACI controllers: reading, creating \
                         and deleting fabric and tenant objects.",
        Backend::Ise => "Use for interacting with Cisco ISE: read-only queries about \
                         endpoints, network devices, identity groups and policy.",
    }
}

fn request_text(input: &Value) -> Option<String> {
    let text = match input {
        Value::String(s) => s.as_str(),
        Value::Object(map) => map
            .get("input")
            .or_else(|| map.get("request"))
            .and_then(Value::as_str)?,
        _ => return None,
    };
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_string())
}

#[async_trait]
impl ToolSet for MasterRouter {
    fn name(&self) -> &str {
        "master_router"
    }

    fn definitions(&self) -> Vec<ToolDefinition> {
        self.delegates
            .iter()
            .map(|d| {
                ToolDefinition::new(
                    d.tool_name.clone(),
                    delegate_description(d.backend),
                    json!({
                        "type": "object",
                        "properties": {
                            "input": {
                                "type": "string",
                                "description": "The request for this agent, in plain words"
                            }
                        },
                        "required": ["input"]
                    }),
                )
            })
            .collect()
    }

    async fn call(&self, tool_name: &str, input: Value) -> OperationResult {
        let Some(delegate) = self.delegates.iter().find(|d| d.tool_name == tool_name.trim())
        else {
            return unknown_tool(self.name(), tool_name);
        };
        let Some(request) = request_text(&input) else {
            return OperationResult::from(netops_core::Error::validation(
                "Input must provide 'input' with the request for the agent.",
            ));
        };

        info!(delegate = %delegate.tool_name, "Delegating: {}", request);
        let outcome = delegate.agent.run(&[], &request).await;

        OperationResult::success(json!({
            "agent": delegate.tool_name,
            "answer": outcome.answer,
            "tools_executed": outcome.tools_executed,
            "completed": outcome.completed,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delegate_names() {
        assert_eq!(delegate_name(Backend::IosXe), "ios_xe_agent");
        assert_eq!(delegate_name(Backend::Aci), "aci_agent");
        assert_eq!(delegate_name(Backend::Ise), "ise_agent");
    }

    #[test]
    fn test_request_text() {
        assert_eq!(request_text(&json!("  list tenants ")), Some("list tenants".into()));
        assert_eq!(
            request_text(&json!({"input": "show version"})),
            Some("show version".into())
        );
        assert_eq!(request_text(&json!({"input": "  "})), None);
        assert_eq!(request_text(&json!(3)), None);
    }
}
