//! Common interface of the REST controller clients

use async_trait::async_trait;
use serde_json::Value;

use netops_core::{Backend, Error, Paging, Result};

/// A REST controller backend (ACI, ISE).
///
/// Not every backend supports every capability; the defaults reject the
/// call before any I/O.
#[async_trait]
pub trait ControllerClient: Send + Sync {
    fn backend(&self) -> Backend;

    /// Establish (or re-establish) the session
    async fn authenticate(&self) -> Result<()>;

    /// Retrieve `identifier` with paging
    async fn read(&self, identifier: &str, paging: Paging) -> Result<Value>;

    /// Create data at `identifier`. The payload must be a JSON object.
    async fn write(&self, identifier: &str, payload: Option<&Value>) -> Result<Value> {
        let _ = (identifier, payload);
        Err(Error::validation(format!(
            "{} does not support create operations",
            self.backend().label()
        )))
    }

    /// Delete the object at `identifier`
    async fn delete(&self, identifier: &str) -> Result<Value> {
        let _ = identifier;
        Err(Error::validation(format!(
            "{} does not support delete operations",
            self.backend().label()
        )))
    }
}

/// Check a create payload is present and a JSON object
pub fn validate_payload(payload: Option<&Value>) -> Result<&serde_json::Map<String, Value>> {
    match payload {
        None | Some(Value::Null) => Err(Error::validation("A payload must be provided.")),
        Some(Value::Object(map)) if map.is_empty() => {
            Err(Error::validation("Payload must not be empty."))
        }
        Some(Value::Object(map)) => Ok(map),
        Some(other) => Err(Error::validation(format!(
            "Payload must be a JSON object, got {}",
            json_type(other)
        ))),
    }
}

/// Check an identifier is a usable API path
pub fn validate_identifier(identifier: &str) -> Result<&str> {
    let trimmed = identifier.trim();
    if trimmed.is_empty() {
        return Err(Error::validation("An API URL must be provided."));
    }
    if trimmed.contains("://") {
        return Err(Error::validation(format!(
            "Expected an API path relative to the controller, got '{}'",
            trimmed
        )));
    }
    Ok(trimmed)
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
