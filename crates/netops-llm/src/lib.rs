//! netops-llm: Completion model integration
//!
//! ## Endpoints
//!
//! | Provider | Base URL | Auth Method |
//! |----------|----------|-------------|
//! | OpenAI (or compatible) | `https://api.openai.com/v1` | `Bearer {OPENAI_API_KEY}` |
//!
//! Any server that speaks the `/chat/completions` dialect with function
//! calling works; point `LLM_BASE_URL` at it.

pub mod openai;
pub mod provider;

pub use openai::OpenAiClient;
pub use provider::{
    ChatMessage, ChatRequest, ChatResponse, LlmProvider, TokenUsage, ToolCallInfo, ToolChoice,
    ToolDefinition,
};

/// Prelude for convenient imports
pub mod prelude {
    pub use super::openai::OpenAiClient;
    pub use super::provider::{ChatMessage, ChatRequest, ChatResponse, LlmProvider, ToolDefinition};
}
