//! Chat sessions and the session manager
//!
//! A session owns its agent (and through it, its backend clients) and an
//! append-only history. Turns on one session are serialized by the
//! history lock; different sessions run independently.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info};
use uuid::Uuid;

use netops_core::ConversationTurn;

use crate::agent::{Agent, TurnOutcome};
use crate::factory::AgentMode;

/// Default cap on live sessions
pub const DEFAULT_MAX_SESSIONS: usize = 100;

pub struct ChatSession {
    pub id: String,
    pub mode: AgentMode,
    pub created_at: DateTime<Utc>,
    agent: Agent,
    history: Mutex<Vec<ConversationTurn>>,
    last_used: AtomicU64,
}

/// Summary of a session for listings
#[derive(Debug, Clone, Serialize)]
pub struct SessionInfo {
    pub id: String,
    pub mode: AgentMode,
    pub created_at: DateTime<Utc>,
    pub turns: usize,
}

impl ChatSession {
    pub fn new(mode: AgentMode, agent: Agent) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            mode,
            created_at: Utc::now(),
            agent,
            history: Mutex::new(Vec::new()),
            last_used: AtomicU64::new(0),
        }
    }

    /// Run one user turn.
    ///
    /// The history lock is held for the whole turn, so a second message
    /// on the same session waits for the first to finish.
    pub async fn handle_turn(&self, message: &str) -> TurnOutcome {
        let mut history = self.history.lock().await;
        debug!(session = %self.id, turns = history.len(), "Starting turn");

        let outcome = self.agent.run(&history, message).await;

        history.push(ConversationTurn::user(message));
        history.push(ConversationTurn::assistant(&outcome.answer));
        outcome
    }

    /// Snapshot of the history
    pub async fn history(&self) -> Vec<ConversationTurn> {
        self.history.lock().await.clone()
    }

    pub async fn info(&self) -> SessionInfo {
        SessionInfo {
            id: self.id.clone(),
            mode: self.mode,
            created_at: self.created_at,
            turns: self.history.lock().await.len(),
        }
    }
}

pub struct SessionManager {
    sessions: RwLock<HashMap<String, Arc<ChatSession>>>,
    max_sessions: usize,
    clock: AtomicU64,
}

impl SessionManager {
    pub fn new() -> Self {
        Self::with_max_sessions(DEFAULT_MAX_SESSIONS)
    }

    pub fn with_max_sessions(max_sessions: usize) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            max_sessions: max_sessions.max(1),
            clock: AtomicU64::new(0),
        }
    }

    fn touch(&self, session: &ChatSession) {
        let tick = self.clock.fetch_add(1, Ordering::Relaxed) + 1;
        session.last_used.store(tick, Ordering::Relaxed);
    }

    /// Register a session, evicting the least recently used one at capacity
    pub async fn insert(&self, session: ChatSession) -> Arc<ChatSession> {
        let session = Arc::new(session);
        self.touch(&session);

        let mut sessions = self.sessions.write().await;
        if sessions.len() >= self.max_sessions {
            if let Some(oldest) = sessions
                .values()
                .min_by_key(|s| s.last_used.load(Ordering::Relaxed))
                .map(|s| s.id.clone())
            {
                info!(session = %oldest, "Evicting session at capacity");
                sessions.remove(&oldest);
            }
        }
        sessions.insert(session.id.clone(), Arc::clone(&session));
        session
    }

    pub async fn get(&self, id: &str) -> Option<Arc<ChatSession>> {
        let session = self.sessions.read().await.get(id).cloned()?;
        self.touch(&session);
        Some(session)
    }

    /// End a session, discarding its history
    pub async fn remove(&self, id: &str) -> bool {
        self.sessions.write().await.remove(id).is_some()
    }

    pub async fn count(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn list(&self) -> Vec<SessionInfo> {
        let sessions: Vec<Arc<ChatSession>> = self.sessions.read().await.values().cloned().collect();
        let mut infos = Vec::with_capacity(sessions.len());
        for session in sessions {
            infos.push(session.info().await);
        }
        infos.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        infos
    }
}

impl Default for SessionManager {
    fn default() -> Self {
        Self::new()
    }
}
