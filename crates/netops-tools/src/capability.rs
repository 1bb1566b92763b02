//! The closed set of operations exposed to the completion model

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::fmt;

use netops_core::Backend;
use netops_llm::ToolDefinition;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    /// Fuzzy-match free text against the catalog, then fetch
    Resolve,
    Fetch,
    Create,
    Delete,
    Configure,
    LearnConfig,
    LearnLogging,
}

impl Capability {
    pub const ALL: [Capability; 7] = [
        Capability::Resolve,
        Capability::Fetch,
        Capability::Create,
        Capability::Delete,
        Capability::Configure,
        Capability::LearnConfig,
        Capability::LearnLogging,
    ];

    /// Tool name the model sees for this capability on `backend`, or
    /// `None` when the backend does not offer it.
    pub fn tool_name(&self, backend: Backend) -> Option<&'static str> {
        use Backend::*;
        use Capability::*;

        match (backend, self) {
            (Aci | Ise, Resolve) => Some("check_supported_url_tool"),
            (Aci, Fetch) => Some("get_aci_data_tool"),
            (Aci, Create) => Some("create_aci_data_tool"),
            (Aci, Delete) => Some("delete_aci_data_tool"),
            (Ise, Fetch) => Some("get_ise_data_tool"),
            (IosXe, Resolve) => Some("check_supported_command_tool"),
            (IosXe, Fetch) => Some("run_show_command_tool"),
            (IosXe, Configure) => Some("apply_configuration_tool"),
            (IosXe, LearnConfig) => Some("learn_config_tool"),
            (IosXe, LearnLogging) => Some("learn_logging_tool"),
            _ => None,
        }
    }

    pub fn is_supported_by(&self, backend: Backend) -> bool {
        self.tool_name(backend).is_some()
    }

    /// Capabilities offered by `backend`, in presentation order
    pub fn supported(backend: Backend) -> Vec<Capability> {
        Self::ALL
            .into_iter()
            .filter(|c| c.is_supported_by(backend))
            .collect()
    }

    /// Parse a tool name back into a capability for `backend`
    pub fn from_tool_name(backend: Backend, name: &str) -> Option<Capability> {
        let name = name.trim();
        Self::ALL
            .into_iter()
            .find(|c| c.tool_name(backend) == Some(name))
    }

    pub fn description(&self, backend: Backend) -> String {
        let system = match backend {
            Backend::Aci => "the ACI controller",
            Backend::Ise => "the ISE controller",
            Backend::IosXe => "the router",
        };

        match self {
            Capability::Resolve if backend == Backend::IosXe => format!(
                "Check if a show command is supported on {} and, if it is, run the closest \
                 supported command and return its output.",
                system
            ),
            Capability::Resolve => format!(
                "Check if an API URL or Name is supported by {} and, if it is, fetch the \
                 closest supported URL and return its data.",
                system
            ),
            Capability::Fetch if backend == Backend::IosXe => format!(
                "Execute a 'show' command on {} and return its output. Modifiers such as \
                 '|', include, exclude, begin or redirect are rejected.",
                system
            ),
            Capability::Fetch => format!("Fetch data from {}.", system),
            Capability::Create => format!(
                "Create new data in {}. Input is an object with 'api_url' and a JSON object \
                 'payload'.",
                system
            ),
            Capability::Delete => format!("Delete data from {}.", system),
            Capability::Configure => format!(
                "Apply configuration commands on {}. Input is the configuration text, one \
                 command per line.",
                system
            ),
            Capability::LearnConfig => format!(
                "Execute 'show run brief' on {} to return the running configuration.",
                system
            ),
            Capability::LearnLogging => format!(
                "Execute 'show logging last 250' on {} and return it as raw text.",
                system
            ),
        }
    }

    /// JSON schema of the tool input
    pub fn input_schema(&self, backend: Backend) -> Value {
        let identifier = identifier_key(backend);
        match self {
            Capability::Resolve => {
                let hint = if backend == Backend::IosXe {
                    "Show command, possibly abbreviated or approximate"
                } else {
                    "API URL or friendly name, possibly approximate"
                };
                let mut schema = json!({
                    "type": "object",
                    "properties": {
                        identifier: {"type": "string", "description": hint}
                    },
                    "required": [identifier]
                });
                if Capability::Create.is_supported_by(backend) {
                    schema["properties"]["intent"] = json!({
                        "type": "string",
                        "enum": ["fetch", "create"],
                        "description": "Use 'create' to resolve a URL for a later create call instead of fetching it"
                    });
                }
                schema
            }
            Capability::Fetch if backend == Backend::IosXe => json!({
                "type": "object",
                "properties": {
                    "command": {"type": "string", "description": "Full show command"}
                },
                "required": ["command"]
            }),
            Capability::Fetch => json!({
                "type": "object",
                "properties": {
                    "api_url": {"type": "string", "description": "API path on the controller"},
                    "page": {"type": "integer", "minimum": 0, "default": 0},
                    "page_size": {"type": "integer", "minimum": 1, "default": 100}
                },
                "required": ["api_url"]
            }),
            Capability::Create => json!({
                "type": "object",
                "properties": {
                    "api_url": {"type": "string", "description": "API path to post to"},
                    "payload": {"type": "object", "description": "Object body, e.g. {\"fvTenant\": {\"attributes\": {...}}}"}
                },
                "required": ["api_url", "payload"]
            }),
            Capability::Delete => json!({
                "type": "object",
                "properties": {
                    "api_url": {"type": "string", "description": "API path of the object to delete"}
                },
                "required": ["api_url"]
            }),
            Capability::Configure => json!({
                "type": "object",
                "properties": {
                    "config_commands": {"type": "string", "description": "Configuration lines"}
                },
                "required": ["config_commands"]
            }),
            Capability::LearnConfig | Capability::LearnLogging => json!({
                "type": "object",
                "properties": {}
            }),
        }
    }

    /// Tool definition for the model, if `backend` offers this capability
    pub fn definition(&self, backend: Backend) -> Option<ToolDefinition> {
        let name = self.tool_name(backend)?;
        Some(ToolDefinition::new(
            name,
            self.description(backend),
            self.input_schema(backend),
        ))
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Capability::Resolve => "resolve",
            Capability::Fetch => "fetch",
            Capability::Create => "create",
            Capability::Delete => "delete",
            Capability::Configure => "configure",
            Capability::LearnConfig => "learn_config",
            Capability::LearnLogging => "learn_logging",
        };
        write!(f, "{}", name)
    }
}

/// Input key naming the identifier on `backend`
pub(crate) fn identifier_key(backend: Backend) -> &'static str {
    match backend {
        Backend::IosXe => "command",
        Backend::Aci | Backend::Ise => "api_url",
    }
}
