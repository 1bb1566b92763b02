//! Error taxonomy for netops-agent
//!
//! Every variant is recovered at the tool dispatcher boundary and turned
//! into an `OperationResult::Failure`; none of them should reach the chat
//! surface as a fault.

use thiserror::Error;

/// Main error type for netops operations
#[derive(Error, Debug)]
pub enum Error {
    /// Catalog file missing, unreadable or malformed
    #[error("Catalog load error: {0}")]
    Load(String),

    /// Backend login / session failure
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// Malformed payload or disallowed input, raised before any I/O
    #[error("Validation error: {0}")]
    Validation(String),

    /// Non-2xx response or transport failure
    #[error("Network error{}: {message}", .status.map(|s| format!(" ({})", s)).unwrap_or_default())]
    Network {
        status: Option<u16>,
        message: String,
    },

    /// No catalog entry close enough to the input
    #[error("Unsupported: {0}")]
    Unsupported(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("LLM error: {0}")]
    Llm(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create a catalog load error
    pub fn load(msg: impl Into<String>) -> Self {
        Error::Load(msg.into())
    }

    /// Create an authentication error
    pub fn auth(msg: impl Into<String>) -> Self {
        Error::Auth(msg.into())
    }

    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Error::Validation(msg.into())
    }

    /// Create a network error carrying an HTTP/protocol status
    pub fn network(status: Option<u16>, msg: impl Into<String>) -> Self {
        Error::Network {
            status,
            message: msg.into(),
        }
    }

    /// Create a transport error with no status
    pub fn transport(msg: impl Into<String>) -> Self {
        Error::network(None, msg)
    }

    pub fn unsupported(msg: impl Into<String>) -> Self {
        Error::Unsupported(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Error::Config(msg.into())
    }

    pub fn llm(msg: impl Into<String>) -> Self {
        Error::Llm(msg.into())
    }

    /// Short machine-readable kind, echoed into tool observations
    pub fn kind(&self) -> &'static str {
        match self {
            Error::Load(_) => "load_error",
            Error::Auth(_) => "auth_error",
            Error::Validation(_) => "validation_error",
            Error::Network { .. } => "network_error",
            Error::Unsupported(_) => "unsupported",
            Error::Config(_) => "config_error",
            Error::Llm(_) => "llm_error",
            Error::Serialization(_) => "serialization_error",
            Error::Io(_) => "io_error",
        }
    }

    /// Whether this error was raised before any network I/O was attempted
    pub fn is_preflight(&self) -> bool {
        matches!(self, Error::Validation(_) | Error::Load(_) | Error::Unsupported(_))
    }
}

impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Error::transport(format!("{:#}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_network_display_includes_status() {
        let err = Error::network(Some(404), "Not Found");
        assert_eq!(err.to_string(), "Network error (404): Not Found");

        let err = Error::transport("connection refused");
        assert_eq!(err.to_string(), "Network error: connection refused");
    }

    #[test]
    fn test_kind() {
        assert_eq!(Error::validation("x").kind(), "validation_error");
        assert_eq!(Error::auth("x").kind(), "auth_error");
        assert!(Error::validation("x").is_preflight());
        assert!(!Error::auth("x").is_preflight());
    }
}
