//! The per-turn decision loop
//!
//! ```text
//! AwaitingDecision ──model──▶ Executing(tool) ──dispatch──▶ Observing
//!        ▲                                                     │
//!        └─────────────── observation appended ◀───────────────┘
//! AwaitingDecision ──final answer──▶ Done
//! ```
//!
//! Every executed tool call costs one hop. When the budget is spent the
//! turn ends with an apology instead of another model call.

use serde_json::Value;
use std::collections::VecDeque;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use netops_core::{ConversationTurn, OperationResult, Role};
use netops_llm::{ChatMessage, ChatRequest, ChatResponse, LlmProvider, ToolCallInfo};
use netops_tools::ToolSet;

use crate::react;

/// Hop budget per user turn
pub const DEFAULT_MAX_HOPS: usize = 10;

/// What the model decided to do next
#[derive(Debug, Clone, PartialEq)]
pub enum Decision {
    /// Invoke a tool. `id` is set for native tool calls.
    Call {
        id: Option<String>,
        tool: String,
        input: Value,
    },
    Answer(String),
}

impl Decision {
    /// Read the decisions out of a model response.
    ///
    /// Native tool calls take precedence over the text protocol; text that
    /// follows neither is taken as the answer.
    pub fn from_response(response: &ChatResponse) -> Vec<Decision> {
        let calls = response.requested_tools();
        if !calls.is_empty() {
            return calls
                .iter()
                .map(|call| Decision::Call {
                    id: Some(call.id.clone()),
                    tool: call.name.clone(),
                    input: call.arguments.clone(),
                })
                .collect();
        }

        let content = response.message.content.trim();
        vec![react::parse(content).unwrap_or_else(|| Decision::Answer(content.to_string()))]
    }
}

/// Result of one user turn
#[derive(Debug, Clone)]
pub struct TurnOutcome {
    pub answer: String,
    /// Tool names in execution order
    pub tools_executed: Vec<String>,
    pub hops: usize,
    /// False when the hop budget ran out or the model failed
    pub completed: bool,
    pub error: Option<String>,
}

#[derive(Debug)]
struct PendingCall {
    id: Option<String>,
    tool: String,
    input: Value,
}

#[derive(Debug)]
enum LoopState {
    AwaitingDecision,
    Executing(PendingCall),
    Observing(PendingCall, OperationResult),
    Done(String),
}

/// A model bound to one tool set and system prompt
pub struct Agent {
    name: String,
    system_prompt: String,
    tools: Arc<dyn ToolSet>,
    provider: Arc<dyn LlmProvider>,
    max_hops: usize,
}

impl Agent {
    pub fn new(
        name: impl Into<String>,
        system_prompt: impl Into<String>,
        tools: Arc<dyn ToolSet>,
        provider: Arc<dyn LlmProvider>,
    ) -> Self {
        Self {
            name: name.into(),
            system_prompt: system_prompt.into(),
            tools,
            provider,
            max_hops: DEFAULT_MAX_HOPS,
        }
    }

    pub fn with_max_hops(mut self, max_hops: usize) -> Self {
        self.max_hops = max_hops.max(1);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn tools(&self) -> &Arc<dyn ToolSet> {
        &self.tools
    }

    fn initial_messages(&self, history: &[ConversationTurn], input: &str) -> Vec<ChatMessage> {
        let mut messages = Vec::with_capacity(history.len() + 2);
        messages.push(ChatMessage::system(&self.system_prompt));
        for turn in history {
            messages.push(match turn.role {
                Role::User => ChatMessage::user(&turn.content),
                Role::Assistant => ChatMessage::assistant(&turn.content),
            });
        }
        messages.push(ChatMessage::user(input));
        messages
    }

    fn budget_exhausted(&self) -> String {
        warn!(agent = %self.name, "Hop budget of {} exhausted", self.max_hops);
        format!(
            "I'm sorry, I could not complete this request within {} tool calls.",
            self.max_hops
        )
    }

    /// Run one user turn to completion.
    ///
    /// No completion request is made once `max_hops` tool calls have run.
    pub async fn run(&self, history: &[ConversationTurn], input: &str) -> TurnOutcome {
        info!(agent = %self.name, "Processing turn: {}", input);

        let definitions = self.tools.definitions();
        let mut messages = self.initial_messages(history, input);
        let mut pending: VecDeque<PendingCall> = VecDeque::new();
        let mut tools_executed = Vec::new();
        let mut hops = 0;
        let mut completed = true;
        let mut failure = None;
        let mut state = LoopState::AwaitingDecision;

        loop {
            state = match state {
                LoopState::AwaitingDecision if hops >= self.max_hops => {
                    completed = false;
                    LoopState::Done(self.budget_exhausted())
                }

                LoopState::AwaitingDecision => {
                    let request =
                        ChatRequest::new(messages.clone()).with_tools(definitions.clone());
                    match self.provider.chat_with_request(request).await {
                        Err(e) => {
                            error!(agent = %self.name, "Completion request failed: {:#}", e);
                            let message = format!("An error occurred: {:#}", e);
                            completed = false;
                            failure = Some(message.clone());
                            LoopState::Done(message)
                        }
                        Ok(response) => {
                            let mut answer = None;
                            for decision in Decision::from_response(&response) {
                                match decision {
                                    Decision::Call { id, tool, input } => {
                                        pending.push_back(PendingCall { id, tool, input })
                                    }
                                    Decision::Answer(text) => {
                                        answer.get_or_insert(text);
                                    }
                                }
                            }
                            record_assistant(&mut messages, &response);

                            match pending.pop_front() {
                                Some(call) => LoopState::Executing(call),
                                None => LoopState::Done(answer.unwrap_or_default()),
                            }
                        }
                    }
                }

                LoopState::Executing(call) => {
                    if hops >= self.max_hops {
                        completed = false;
                        LoopState::Done(self.budget_exhausted())
                    } else {
                        hops += 1;
                        debug!(agent = %self.name, tool = %call.tool, hop = hops, "Executing tool");
                        let result = self.tools.call(&call.tool, call.input.clone()).await;
                        tools_executed.push(call.tool.clone());
                        LoopState::Observing(call, result)
                    }
                }

                LoopState::Observing(call, result) => {
                    let observation = result.to_observation();
                    messages.push(match call.id {
                        Some(id) => ChatMessage::tool_result(id, observation),
                        None => ChatMessage::user(format!("Observation: {}", observation)),
                    });
                    match pending.pop_front() {
                        Some(next) => LoopState::Executing(next),
                        None => LoopState::AwaitingDecision,
                    }
                }

                LoopState::Done(answer) => {
                    info!(
                        agent = %self.name,
                        hops,
                        completed,
                        "Turn finished after {} tool call(s)",
                        tools_executed.len()
                    );
                    return TurnOutcome {
                        answer,
                        tools_executed,
                        hops,
                        completed,
                        error: failure,
                    };
                }
            };
        }
    }
}

/// Append the model's reply to the transcript so tool results can refer
/// back to it
fn record_assistant(messages: &mut Vec<ChatMessage>, response: &ChatResponse) {
    let calls: Vec<ToolCallInfo> = response.requested_tools().to_vec();
    if calls.is_empty() {
        messages.push(ChatMessage::assistant(&response.message.content));
    } else {
        messages.push(ChatMessage::assistant_tool_calls(
            &response.message.content,
            calls,
        ));
    }
}
