//! Common types used across netops-agent

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

use crate::Error;

/// Managed backend systems
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Backend {
    /// Cisco ACI (APIC controller)
    Aci,
    /// Cisco Identity Services Engine
    Ise,
    /// IOS XE device reached over the CLI
    IosXe,
}

impl Backend {
    pub const ALL: [Backend; 3] = [Backend::IosXe, Backend::Aci, Backend::Ise];

    /// Human label used in prompts and logs
    pub fn label(&self) -> &'static str {
        match self {
            Backend::Aci => "Cisco ACI",
            Backend::Ise => "Cisco ISE",
            Backend::IosXe => "Cisco IOS XE",
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Backend::Aci => write!(f, "aci"),
            Backend::Ise => write!(f, "ise"),
            Backend::IosXe => write!(f, "ios_xe"),
        }
    }
}

impl FromStr for Backend {
    type Err = Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "aci" | "apic" => Ok(Backend::Aci),
            "ise" => Ok(Backend::Ise),
            "ios_xe" | "iosxe" | "ios-xe" => Ok(Backend::IosXe),
            other => Err(Error::config(format!("Unknown backend: {}", other))),
        }
    }
}

/// One known API endpoint or device command
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    /// Canonical API path or device command
    pub identifier: String,
    /// Human-friendly label, empty when the catalog omits it
    pub display_name: String,
}

impl CatalogEntry {
    pub fn new(identifier: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            display_name: display_name.into(),
        }
    }
}

/// Outcome of matching free text against a catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ResolutionResult {
    Supported {
        identifier: String,
        display_name: String,
    },
    Unsupported {
        attempted_input: String,
        reason: String,
    },
    LoadError {
        reason: String,
    },
}

impl ResolutionResult {
    pub fn is_supported(&self) -> bool {
        matches!(self, ResolutionResult::Supported { .. })
    }

    /// Render for a tool observation
    pub fn message(&self) -> String {
        match self {
            ResolutionResult::Supported {
                identifier,
                display_name,
            } if display_name.is_empty() => {
                format!("The closest supported entry is '{}'.", identifier)
            }
            ResolutionResult::Supported {
                identifier,
                display_name,
            } => format!(
                "The closest supported entry is '{}' ({}).",
                identifier, display_name
            ),
            ResolutionResult::Unsupported { reason, .. } => reason.clone(),
            ResolutionResult::LoadError { reason } => reason.clone(),
        }
    }
}

/// Result of a backend operation, as seen by the orchestrator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum OperationResult {
    Success {
        payload: Value,
    },
    Failure {
        error_message: String,
        /// Machine-readable error kind (`validation_error`, `unsupported`, ...)
        #[serde(default, skip_serializing_if = "Option::is_none")]
        kind: Option<String>,
        /// Extra structured detail, e.g. the untouched resolution
        #[serde(default, skip_serializing_if = "Option::is_none")]
        detail: Option<Value>,
    },
}

impl OperationResult {
    pub fn success(payload: Value) -> Self {
        OperationResult::Success { payload }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        OperationResult::Failure {
            error_message: message.into(),
            kind: None,
            detail: None,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, OperationResult::Success { .. })
    }

    pub fn kind(&self) -> Option<&str> {
        match self {
            OperationResult::Failure { kind, .. } => kind.as_deref(),
            OperationResult::Success { .. } => None,
        }
    }

    /// Verbatim JSON form fed back to the model as an observation
    pub fn to_observation(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|e| {
            format!(r#"{{"status":"failure","error_message":"unserializable result: {}"}}"#, e)
        })
    }
}

impl From<Error> for OperationResult {
    fn from(err: Error) -> Self {
        OperationResult::Failure {
            error_message: err.to_string(),
            kind: Some(err.kind().to_string()),
            detail: None,
        }
    }
}

impl From<crate::Result<Value>> for OperationResult {
    fn from(result: crate::Result<Value>) -> Self {
        match result {
            Ok(payload) => OperationResult::success(payload),
            Err(err) => err.into(),
        }
    }
}

impl From<ResolutionResult> for OperationResult {
    /// An unresolved lookup travels untouched inside the failure detail.
    fn from(resolution: ResolutionResult) -> Self {
        let detail = serde_json::to_value(&resolution).ok();
        match resolution {
            ResolutionResult::Supported { .. } => OperationResult::Success {
                payload: detail.unwrap_or(Value::Null),
            },
            ResolutionResult::Unsupported { ref reason, .. } => OperationResult::Failure {
                error_message: reason.clone(),
                kind: Some("unsupported".to_string()),
                detail,
            },
            ResolutionResult::LoadError { ref reason } => OperationResult::Failure {
                error_message: reason.clone(),
                kind: Some("load_error".to_string()),
                detail,
            },
        }
    }
}

/// Speaker of a conversation turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::User => write!(f, "User"),
            Role::Assistant => write!(f, "Assistant"),
        }
    }
}

/// One entry of a session's history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub role: Role,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

impl ConversationTurn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }
}

/// Paging parameters for read operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Paging {
    #[serde(default)]
    pub page: u32,
    #[serde(default = "default_page_size")]
    pub page_size: u32,
}

fn default_page_size() -> u32 {
    100
}

impl Paging {
    pub fn new(page: u32, page_size: u32) -> Self {
        Self { page, page_size }
    }
}

impl Default for Paging {
    fn default() -> Self {
        Self {
            page: 0,
            page_size: default_page_size(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_backend_round_trip() {
        for backend in Backend::ALL {
            let parsed: Backend = backend.to_string().parse().unwrap();
            assert_eq!(parsed, backend);
        }
        assert!("nxos".parse::<Backend>().is_err());
    }

    #[test]
    fn test_unsupported_resolution_becomes_failure_with_detail() {
        let resolution = ResolutionResult::Unsupported {
            attempted_input: "bogus".to_string(),
            reason: "The input 'bogus' is not supported.".to_string(),
        };
        let result: OperationResult = resolution.clone().into();

        assert_eq!(result.kind(), Some("unsupported"));
        match result {
            OperationResult::Failure { detail, .. } => {
                let back: ResolutionResult = serde_json::from_value(detail.unwrap()).unwrap();
                assert_eq!(back, resolution);
            }
            other => panic!("expected failure, got {:?}", other),
        }
    }

    #[test]
    fn test_observation_is_tagged_json() {
        let obs = OperationResult::success(json!({"totalCount": "1"})).to_observation();
        let value: Value = serde_json::from_str(&obs).unwrap();
        assert_eq!(value["status"], "success");
        assert_eq!(value["payload"]["totalCount"], "1");
    }

    #[test]
    fn test_error_into_failure_keeps_kind() {
        let result: OperationResult = Error::validation("Payload must be an object").into();
        assert_eq!(result.kind(), Some("validation_error"));
        assert!(!result.is_success());
    }
}
