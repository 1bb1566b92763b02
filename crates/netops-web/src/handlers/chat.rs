//! Chat API Handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, warn};

use netops_chat::AgentMode;
use netops_core::ConversationTurn;

use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    #[serde(default)]
    pub session_id: Option<String>,
    /// `aci`, `ise`, `ios_xe` or `router`; only used for new sessions
    #[serde(default)]
    pub backend: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub success: bool,
    pub message: Option<String>,
    pub session_id: Option<String>,
    pub tools_executed: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ChatResponse {
    fn failed(session_id: Option<String>, error: String) -> Self {
        Self {
            success: false,
            message: None,
            session_id,
            tools_executed: vec![],
            error: Some(error),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct HistoryResponse {
    pub session_id: String,
    pub history: Vec<ConversationTurn>,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

fn not_found(session_id: &str) -> (StatusCode, Json<ErrorResponse>) {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorResponse {
            error: format!("Session not found: {}", session_id),
        }),
    )
}

/// POST /api/chat - Send one message and wait for the answer
pub async fn chat_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ChatRequest>,
) -> Json<ChatResponse> {
    info!("Chat request: {} chars", request.message.len());

    let mode = match request.backend.as_deref().map(str::parse::<AgentMode>) {
        None => None,
        Some(Ok(mode)) => Some(mode),
        Some(Err(e)) => {
            warn!("Rejected chat request: {}", e);
            return Json(ChatResponse::failed(request.session_id, e.to_string()));
        }
    };

    let turn = match state
        .chat
        .submit(request.session_id.as_deref(), mode, &request.message)
        .await
    {
        Ok(turn) => turn,
        Err(e) => {
            error!("Chat processing failed: {}", e);
            return Json(ChatResponse::failed(request.session_id, e.to_string()));
        }
    };
    let session_id = turn.session_id.clone();

    // on timeout the turn keeps running and still lands in the history
    match tokio::time::timeout(state.chat_timeout, turn.reply()).await {
        Ok(Ok(reply)) => Json(ChatResponse {
            success: reply.completed,
            message: Some(reply.message),
            session_id: Some(reply.session_id),
            tools_executed: reply.tools_executed,
            error: reply.error,
        }),
        Ok(Err(e)) => {
            error!("Chat processing failed: {}", e);
            Json(ChatResponse::failed(Some(session_id), e.to_string()))
        }
        Err(_) => {
            warn!(
                session = %session_id,
                "Stopped waiting for chat turn after {:?}",
                state.chat_timeout
            );
            Json(ChatResponse::failed(
                Some(session_id),
                format!(
                    "Request timed out after {} seconds. The request is still being \
                     processed; check the session history for the result.",
                    state.chat_timeout.as_secs()
                ),
            ))
        }
    }
}

/// GET /api/chat/:session_id/history
pub async fn history_handler(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
) -> Result<Json<HistoryResponse>, (StatusCode, Json<ErrorResponse>)> {
    match state.chat.history(&session_id).await {
        Some(history) => Ok(Json(HistoryResponse {
            session_id,
            history,
        })),
        None => Err(not_found(&session_id)),
    }
}

/// DELETE /api/chat/:session_id - End a session and discard its history
pub async fn end_session_handler(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
) -> Result<StatusCode, (StatusCode, Json<ErrorResponse>)> {
    if state.chat.end(&session_id).await {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(not_found(&session_id))
    }
}
