//! netops-web: HTTP chat surface
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                   netops-web Server (:8080)                  │
//! ├──────────────────────────────────────────────────────────────┤
//! │  POST   /api/chat                      - Send a message      │
//! │  GET    /api/chat/:session_id/history  - Session history     │
//! │  DELETE /api/chat/:session_id          - End a session       │
//! │  GET    /api/health                    - Health check        │
//! └──────────────────────────────────────────────────────────────┘
//! ```

pub mod handlers;
pub mod routes;
pub mod state;

pub use routes::create_router;
pub use state::{AppState, DEFAULT_CHAT_TIMEOUT};
