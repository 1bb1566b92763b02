//! netops-chat: Conversations over the backend tool sets
//!
//! - `agent`: the per-turn decision loop (model → tool → observation)
//! - `react`: parser for the Thought/Action/Final Answer text protocol
//! - `router`: master router delegating to one agent per backend
//! - `prompts`: system prompts
//! - `factory`: builds per-session agents and backend clients
//! - `session`: append-only session history and the session manager
//! - `service`: entry point used by the web layer

pub mod agent;
pub mod factory;
pub mod prompts;
pub mod react;
pub mod router;
pub mod service;
pub mod session;

pub use agent::{Agent, Decision, TurnOutcome, DEFAULT_MAX_HOPS};
pub use factory::{AgentFactory, AgentMode};
pub use router::MasterRouter;
pub use service::{ChatReply, ChatService, PendingTurn};
pub use session::{ChatSession, SessionInfo, SessionManager};
