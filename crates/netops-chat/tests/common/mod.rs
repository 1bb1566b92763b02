//! Scripted completion model and a recording tool set

#![allow(dead_code)]

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::sync::Mutex;

use netops_core::OperationResult;
use netops_llm::{
    ChatRequest, ChatResponse, LlmProvider, ToolCallInfo, ToolDefinition,
};
use netops_tools::ToolSet;

/// Replays canned responses and records every request.
/// Fails once the script runs out.
#[derive(Default)]
pub struct ScriptedModel {
    responses: Mutex<VecDeque<ChatResponse>>,
    requests: Mutex<Vec<ChatRequest>>,
}

impl ScriptedModel {
    pub fn new(responses: Vec<ChatResponse>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<ChatRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl LlmProvider for ScriptedModel {
    fn name(&self) -> &str {
        "scripted"
    }

    fn model(&self) -> &str {
        "scripted-model"
    }

    async fn chat_with_request(&self, request: ChatRequest) -> Result<ChatResponse> {
        self.requests.lock().unwrap().push(request);
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| anyhow!("model unavailable"))
    }
}

pub fn text(content: &str) -> ChatResponse {
    ChatResponse::text("scripted-model", content)
}

pub fn tool_calls(calls: &[(&str, &str, Value)]) -> ChatResponse {
    let calls: Vec<ToolCallInfo> = calls
        .iter()
        .map(|(id, name, arguments)| ToolCallInfo {
            id: id.to_string(),
            name: name.to_string(),
            arguments: arguments.clone(),
        })
        .collect();
    let mut response = ChatResponse::text("scripted-model", "");
    response.finish_reason = Some("tool_calls".to_string());
    response.tool_calls = Some(calls);
    response
}

/// Tool set offering `lookup`; every call succeeds and echoes its input
#[derive(Default)]
pub struct EchoTools {
    calls: Mutex<Vec<(String, Value)>>,
}

impl EchoTools {
    pub fn calls(&self) -> Vec<(String, Value)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn result_for(tool: &str, input: &Value) -> OperationResult {
        OperationResult::success(json!({"tool": tool, "input": input}))
    }
}

#[async_trait]
impl ToolSet for EchoTools {
    fn name(&self) -> &str {
        "echo"
    }

    fn definitions(&self) -> Vec<ToolDefinition> {
        vec![ToolDefinition::new(
            "lookup",
            "Look something up",
            json!({"type": "object", "properties": {"q": {"type": "string"}}}),
        )]
    }

    async fn call(&self, tool_name: &str, input: Value) -> OperationResult {
        self.calls
            .lock()
            .unwrap()
            .push((tool_name.to_string(), input.clone()));
        Self::result_for(tool_name, &input)
    }
}
