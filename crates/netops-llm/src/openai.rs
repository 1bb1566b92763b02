//! OpenAI-compatible chat completions client with tool support

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use tracing::{debug, info};

use netops_core::config::LlmSettings;

use crate::provider::{
    ChatMessage, ChatRequest, ChatResponse, LlmProvider, TokenUsage, ToolCallInfo,
};

pub struct OpenAiClient {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl OpenAiClient {
    pub fn new(settings: &LlmSettings, api_key: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(settings.timeout)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            api_key: api_key.into(),
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            model: settings.model.clone(),
        })
    }

    pub fn from_env(settings: &LlmSettings) -> Result<Self> {
        let api_key = std::env::var("OPENAI_API_KEY")
            .or_else(|_| std::env::var("LLM_API_KEY"))
            .context("OPENAI_API_KEY or LLM_API_KEY must be set")?;
        Self::new(settings, api_key)
    }

    fn message_to_api(m: &ChatMessage) -> Value {
        let mut msg = json!({
            "role": m.role,
            "content": m.content
        });

        if let Some(ref id) = m.tool_call_id {
            msg["tool_call_id"] = json!(id);
        }

        if let Some(ref calls) = m.tool_calls {
            msg["tool_calls"] = json!(calls
                .iter()
                .map(|tc| {
                    json!({
                        "id": tc.id,
                        "type": "function",
                        "function": {
                            "name": tc.name,
                            "arguments": serde_json::to_string(&tc.arguments).unwrap_or_default()
                        }
                    })
                })
                .collect::<Vec<_>>());
        }

        msg
    }
}

/// Parse `tool_calls` out of a response message.
///
/// Arguments that are not valid JSON are passed through as a string so
/// the tool can still report a useful validation error.
fn parse_tool_calls(message: &Value) -> Option<Vec<ToolCallInfo>> {
    let calls = message.get("tool_calls")?.as_array()?;
    let parsed: Vec<ToolCallInfo> = calls
        .iter()
        .filter_map(|call| {
            let id = call.get("id")?.as_str()?.to_string();
            let function = call.get("function")?;
            let name = function.get("name")?.as_str()?.to_string();
            let arguments = match function.get("arguments") {
                Some(Value::String(raw)) => {
                    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.clone()))
                }
                Some(other) => other.clone(),
                None => Value::Null,
            };
            Some(ToolCallInfo {
                id,
                name,
                arguments,
            })
        })
        .collect();

    if parsed.is_empty() {
        None
    } else {
        Some(parsed)
    }
}

#[async_trait]
impl LlmProvider for OpenAiClient {
    fn name(&self) -> &str {
        "openai"
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn chat_with_request(&self, request: ChatRequest) -> Result<ChatResponse> {
        let url = format!("{}/chat/completions", self.base_url);

        let messages: Vec<Value> = request.messages.iter().map(Self::message_to_api).collect();
        let tools: Vec<Value> = request.tools.iter().map(|t| t.to_openai_format()).collect();

        let mut body = json!({
            "model": self.model,
            "messages": messages,
            "stream": false
        });

        if !tools.is_empty() {
            body["tools"] = json!(tools);
            body["tool_choice"] = request.tool_choice.to_api_format();
            debug!(
                "Sending request with {} tools, tool_choice={:?}",
                tools.len(),
                request.tool_choice
            );
        }

        if let Some(max_tokens) = request.max_tokens {
            body["max_tokens"] = json!(max_tokens);
        }
        if let Some(temp) = request.temperature {
            body["temperature"] = json!(temp);
        }

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .context("Failed to send request to completion endpoint")?;

        let status = response.status();
        let response_text = response.text().await?;

        debug!(
            "Completion response ({}): {}",
            status,
            response_text.chars().take(500).collect::<String>()
        );

        if !status.is_success() {
            return Err(anyhow::anyhow!(
                "Completion API error ({}): {}",
                status,
                response_text
            ));
        }

        let response_json: Value =
            serde_json::from_str(&response_text).context("Failed to parse completion response")?;

        let choice = response_json
            .get("choices")
            .and_then(|c| c.get(0))
            .ok_or_else(|| anyhow::anyhow!("No choices in response"))?;

        let message = choice
            .get("message")
            .ok_or_else(|| anyhow::anyhow!("No message in response"))?;

        let content = message
            .get("content")
            .and_then(|c| c.as_str())
            .unwrap_or("")
            .to_string();

        let tool_calls = parse_tool_calls(message);
        if let Some(ref calls) = tool_calls {
            info!("Model requested {} tool call(s)", calls.len());
        }

        let finish_reason = choice
            .get("finish_reason")
            .and_then(|f| f.as_str())
            .map(|s| s.to_string());

        let usage = response_json.get("usage").map(|u| TokenUsage {
            prompt_tokens: u.get("prompt_tokens").and_then(|v| v.as_u64()).unwrap_or(0) as u32,
            completion_tokens: u.get("completion_tokens").and_then(|v| v.as_u64()).unwrap_or(0)
                as u32,
            total_tokens: u.get("total_tokens").and_then(|v| v.as_u64()).unwrap_or(0) as u32,
        });

        Ok(ChatResponse {
            message: ChatMessage {
                role: "assistant".to_string(),
                content,
                tool_calls: tool_calls.clone(),
                tool_call_id: None,
            },
            model: self.model.clone(),
            finish_reason,
            usage,
            tool_calls,
        })
    }
}
