//! Application state shared across handlers

use std::time::{Duration, Instant};

use netops_chat::ChatService;

/// Upper bound on one chat request before the handler gives up waiting
pub const DEFAULT_CHAT_TIMEOUT: Duration = Duration::from_secs(290);

pub struct AppState {
    pub chat: ChatService,
    pub provider_name: String,
    pub model: String,
    pub chat_timeout: Duration,
    pub start_time: Instant,
}

impl AppState {
    pub fn new(chat: ChatService, provider_name: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            chat,
            provider_name: provider_name.into(),
            model: model.into(),
            chat_timeout: DEFAULT_CHAT_TIMEOUT,
            start_time: Instant::now(),
        }
    }

    pub fn with_chat_timeout(mut self, timeout: Duration) -> Self {
        self.chat_timeout = timeout;
        self
    }

    pub fn uptime_secs(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}
