//! Capability dispatch for one backend
//!
//! The dispatcher is the error boundary: whatever goes wrong in catalog
//! loading, validation or the backend call comes back as an
//! `OperationResult::Failure` carrying the error kind.

use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, info, warn};

use netops_backends::{ControllerClient, IosXeClient};
use netops_catalog::{resolve_scored, CatalogSource};
use netops_core::{Backend, Error, OperationResult, Paging, ResolutionResult, Result};
use netops_llm::ToolDefinition;

use crate::capability::{identifier_key, Capability};
use crate::toolset::{unknown_tool, ToolSet};

/// The client a dispatcher drives
#[derive(Clone)]
pub enum BackendClient {
    /// REST controller (ACI, ISE)
    Controller(Arc<dyn ControllerClient>),
    /// IOS XE device
    Device(Arc<IosXeClient>),
}

impl BackendClient {
    fn backend(&self) -> Backend {
        match self {
            BackendClient::Controller(client) => client.backend(),
            BackendClient::Device(_) => Backend::IosXe,
        }
    }
}

/// What a resolve call is for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Intent {
    Fetch,
    Create,
}

pub struct Dispatcher {
    backend: Backend,
    catalog: CatalogSource,
    client: BackendClient,
}

impl Dispatcher {
    pub fn new(catalog: CatalogSource, client: BackendClient) -> Self {
        Self {
            backend: client.backend(),
            catalog,
            client,
        }
    }

    pub fn backend(&self) -> Backend {
        self.backend
    }

    /// Run `capability` with `input`
    pub async fn dispatch(&self, capability: Capability, input: Value) -> OperationResult {
        let Some(tool) = capability.tool_name(self.backend) else {
            return Error::unsupported(format!(
                "{} does not support the {} capability",
                self.backend.label(),
                capability
            ))
            .into();
        };
        info!(backend = %self.backend, tool, "Dispatching {}", capability);

        let result = match capability {
            Capability::Resolve => self.resolve_tool(input).await,
            Capability::Fetch => self.fetch(input).await,
            Capability::Create => self.create(input).await,
            Capability::Delete => self.delete(input).await,
            Capability::Configure => self.configure(input).await,
            Capability::LearnConfig | Capability::LearnLogging => self.learn(capability).await,
        };

        let result = match result {
            Ok(op) => op,
            Err(err) => err.into(),
        };
        if let OperationResult::Failure {
            error_message,
            kind,
            ..
        } = &result
        {
            warn!(
                backend = %self.backend,
                tool,
                kind = kind.as_deref().unwrap_or("failure"),
                "Tool failed: {}",
                error_message
            );
        }
        result
    }

    /// Match `query` against the catalog, reloading it first
    pub fn resolve(&self, query: &str) -> ResolutionResult {
        let outcome = self.catalog.load();
        let scored = resolve_scored(query.trim(), &outcome);
        debug!(
            backend = %self.backend,
            "Resolution of '{}': {:?} (score {:?})",
            query,
            scored.result,
            scored.score
        );
        scored.result
    }

    /// Resolve `query` and, on a match, fetch the resolved identifier.
    ///
    /// Unresolved input comes back as the resolution itself; nothing else
    /// is chained.
    pub async fn resolve_and_chain(&self, query: &str) -> OperationResult {
        match self.resolve(query) {
            ResolutionResult::Supported {
                identifier,
                display_name,
            } => {
                info!(
                    backend = %self.backend,
                    "'{}' resolved to '{}' ({}), fetching",
                    query,
                    identifier,
                    display_name
                );
                self.read(&identifier, Paging::default()).await.into()
            }
            unresolved => unresolved.into(),
        }
    }

    async fn resolve_tool(&self, input: Value) -> Result<OperationResult> {
        let query = string_arg(&input, &[identifier_key(self.backend), "query"])?;
        let intent = match input.get("intent").and_then(Value::as_str) {
            Some("create") if Capability::Create.is_supported_by(self.backend) => Intent::Create,
            Some("create") => {
                return Err(Error::validation(format!(
                    "{} does not support create operations",
                    self.backend.label()
                )))
            }
            _ => Intent::Fetch,
        };

        if intent == Intent::Fetch {
            return Ok(self.resolve_and_chain(&query).await);
        }

        // resolved for a create: hand the identifier back, the model must
        // supply the payload itself
        Ok(match self.resolve(&query) {
            ResolutionResult::Supported {
                identifier,
                display_name,
            } => OperationResult::success(json!({
                "status": "supported",
                "identifier": identifier,
                "display_name": display_name,
                "message": format!(
                    "The closest supported API URL is '{}'. Supply a payload to create data there.",
                    identifier
                ),
                "next_tool": Capability::Create.tool_name(self.backend),
            })),
            unresolved => unresolved.into(),
        })
    }

    async fn read(&self, identifier: &str, paging: Paging) -> Result<Value> {
        match &self.client {
            BackendClient::Controller(client) => client.read(identifier, paging).await,
            BackendClient::Device(device) => device.read(identifier).await,
        }
    }

    async fn fetch(&self, input: Value) -> Result<OperationResult> {
        let identifier = string_arg(&input, &[identifier_key(self.backend)])?;
        let defaults = Paging::default();
        let paging = Paging::new(
            u32_arg(&input, "page")?.unwrap_or(defaults.page),
            u32_arg(&input, "page_size")?.unwrap_or(defaults.page_size),
        );
        Ok(self.read(&identifier, paging).await.into())
    }

    async fn create(&self, input: Value) -> Result<OperationResult> {
        let input = match input {
            Value::String(raw) => serde_json::from_str(&raw).map_err(|e| {
                Error::validation(format!("Create input is not valid JSON: {}", e))
            })?,
            other => other,
        };

        let api_url = input
            .get("api_url")
            .and_then(Value::as_str)
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| Error::validation("Both 'api_url' and 'payload' must be provided."))?;

        let client = self.controller()?;
        Ok(client.write(api_url, input.get("payload")).await.into())
    }

    async fn delete(&self, input: Value) -> Result<OperationResult> {
        let api_url = string_arg(&input, &["api_url"])?;
        Ok(self.controller()?.delete(&api_url).await.into())
    }

    async fn configure(&self, input: Value) -> Result<OperationResult> {
        let config = string_arg(&input, &["config_commands", "config"])?;
        let device = self.device()?;
        Ok(device.configure(&config).await.into())
    }

    async fn learn(&self, capability: Capability) -> Result<OperationResult> {
        let device = self.device()?;
        let result = match capability {
            Capability::LearnLogging => device.learn_logging().await,
            _ => device.learn_config().await,
        };
        Ok(result.into())
    }

    fn controller(&self) -> Result<&Arc<dyn ControllerClient>> {
        match &self.client {
            BackendClient::Controller(client) => Ok(client),
            BackendClient::Device(_) => Err(Error::unsupported(
                "Operation requires a REST controller backend",
            )),
        }
    }

    fn device(&self) -> Result<&IosXeClient> {
        match &self.client {
            BackendClient::Device(device) => Ok(device.as_ref()),
            BackendClient::Controller(_) => {
                Err(Error::unsupported("Operation requires an IOS XE device"))
            }
        }
    }
}

#[async_trait]
impl ToolSet for Dispatcher {
    fn name(&self) -> &str {
        self.backend.label()
    }

    fn definitions(&self) -> Vec<ToolDefinition> {
        Capability::supported(self.backend)
            .into_iter()
            .filter_map(|c| c.definition(self.backend))
            .collect()
    }

    async fn call(&self, tool_name: &str, input: Value) -> OperationResult {
        match Capability::from_tool_name(self.backend, tool_name) {
            Some(capability) => self.dispatch(capability, input).await,
            None => unknown_tool(self.backend.label(), tool_name),
        }
    }
}

/// Pull a string argument out of a tool input.
///
/// A bare JSON string is accepted as the value itself, which is what
/// text-protocol models usually send.
fn string_arg(input: &Value, keys: &[&str]) -> Result<String> {
    let value = match input {
        Value::String(s) => Some(s.as_str()),
        Value::Object(map) => keys.iter().find_map(|k| map.get(*k).and_then(Value::as_str)),
        _ => None,
    };

    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .ok_or_else(|| Error::validation(format!("Input must provide '{}'.", keys[0])))
}

fn u32_arg(input: &Value, key: &str) -> Result<Option<u32>> {
    match input.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => value
            .as_u64()
            .and_then(|n| u32::try_from(n).ok())
            .map(Some)
            .ok_or_else(|| Error::validation(format!("'{}' must be a non-negative integer", key))),
    }
}
