//! Entry point for chat front-ends

use serde::Serialize;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::info;

use netops_core::{ConversationTurn, Error, Result};

use crate::agent::TurnOutcome;
use crate::factory::{AgentFactory, AgentMode};
use crate::session::{ChatSession, SessionInfo, SessionManager};

/// Reply to one user message
#[derive(Debug, Clone, Serialize)]
pub struct ChatReply {
    pub session_id: String,
    pub message: String,
    pub tools_executed: Vec<String>,
    pub completed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// A turn running on its own task.
///
/// Dropping it stops waiting but not the turn, which still records its
/// history entry when it finishes.
pub struct PendingTurn {
    pub session_id: String,
    handle: JoinHandle<TurnOutcome>,
}

impl PendingTurn {
    pub async fn reply(self) -> Result<ChatReply> {
        let outcome = self
            .handle
            .await
            .map_err(|e| Error::llm(format!("Chat turn aborted: {}", e)))?;
        Ok(ChatReply {
            session_id: self.session_id,
            message: outcome.answer,
            tools_executed: outcome.tools_executed,
            completed: outcome.completed,
            error: outcome.error,
        })
    }
}

pub struct ChatService {
    sessions: SessionManager,
    factory: AgentFactory,
}

impl ChatService {
    pub fn new(factory: AgentFactory) -> Self {
        Self::with_sessions(factory, SessionManager::new())
    }

    pub fn with_sessions(factory: AgentFactory, sessions: SessionManager) -> Self {
        Self { sessions, factory }
    }

    pub fn sessions(&self) -> &SessionManager {
        &self.sessions
    }

    /// Send `message` on an existing session, or start a new one when
    /// `session_id` is absent, and wait for the answer.
    ///
    /// `mode` only applies to new sessions; asking for a different mode on
    /// an existing session is an error.
    pub async fn send(
        &self,
        session_id: Option<&str>,
        mode: Option<AgentMode>,
        message: &str,
    ) -> Result<ChatReply> {
        self.submit(session_id, mode, message).await?.reply().await
    }

    /// Like [`send`](Self::send), but returns as soon as the turn has
    /// started, so callers can stop waiting without cancelling it.
    pub async fn submit(
        &self,
        session_id: Option<&str>,
        mode: Option<AgentMode>,
        message: &str,
    ) -> Result<PendingTurn> {
        let message = message.trim().to_string();
        if message.is_empty() {
            return Err(Error::validation("Message must not be empty"));
        }

        let session = match session_id {
            Some(id) => {
                let session = self
                    .sessions
                    .get(id)
                    .await
                    .ok_or_else(|| Error::validation(format!("Unknown session: {}", id)))?;
                if let Some(mode) = mode {
                    if mode != session.mode {
                        return Err(Error::validation(format!(
                            "Session {} uses the {} agent, not {}",
                            id, session.mode, mode
                        )));
                    }
                }
                session
            }
            None => self.start(mode.unwrap_or_default()).await?,
        };

        let session_id = session.id.clone();
        let handle = tokio::spawn(async move { session.handle_turn(&message).await });
        Ok(PendingTurn { session_id, handle })
    }

    async fn start(&self, mode: AgentMode) -> Result<Arc<ChatSession>> {
        let agent = self.factory.build(mode)?;
        let session = self.sessions.insert(ChatSession::new(mode, agent)).await;
        info!(session = %session.id, mode = %mode, "Started session");
        Ok(session)
    }

    pub async fn history(&self, session_id: &str) -> Option<Vec<ConversationTurn>> {
        let session = self.sessions.get(session_id).await?;
        Some(session.history().await)
    }

    /// End a session. Returns false when it did not exist.
    pub async fn end(&self, session_id: &str) -> bool {
        let removed = self.sessions.remove(session_id).await;
        if removed {
            info!(session = %session_id, "Ended session");
        }
        removed
    }

    pub async fn list(&self) -> Vec<SessionInfo> {
        self.sessions.list().await
    }
}
