//! Builds the agents behind a session
//!
//! Every session gets freshly built backend clients with its own
//! credential handles; nothing is shared between sessions except the
//! completion model client.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, warn};

use netops_backends::{AciClient, IosXeClient, IseClient, SshTransportFactory, TransportFactory};
use netops_catalog::CatalogSource;
use netops_core::{Backend, CredentialProvider, Error, Result, Settings};
use netops_llm::LlmProvider;
use netops_tools::{BackendClient, Dispatcher, ToolSet};

use crate::agent::Agent;
use crate::prompts;
use crate::router::{delegate_name, MasterRouter};

/// Which agent a session talks to
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentMode {
    /// Master router over every configured backend
    #[default]
    Router,
    /// Pinned to one backend
    Backend(Backend),
}

impl FromStr for AgentMode {
    type Err = Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "" | "router" | "master" | "all" => Ok(AgentMode::Router),
            other => Ok(AgentMode::Backend(other.parse()?)),
        }
    }
}

impl fmt::Display for AgentMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AgentMode::Router => write!(f, "router"),
            AgentMode::Backend(backend) => write!(f, "{}", backend),
        }
    }
}

pub struct AgentFactory {
    settings: Settings,
    credentials: Arc<dyn CredentialProvider>,
    provider: Arc<dyn LlmProvider>,
    transport: Arc<dyn TransportFactory>,
}

impl AgentFactory {
    pub fn new(
        settings: Settings,
        credentials: Arc<dyn CredentialProvider>,
        provider: Arc<dyn LlmProvider>,
    ) -> Self {
        let transport = Arc::new(SshTransportFactory::new(settings.ios_xe.connect_timeout));
        Self {
            settings,
            credentials,
            provider,
            transport,
        }
    }

    /// Use `transport` instead of SSH for IOS XE devices
    pub fn with_transport(mut self, transport: Arc<dyn TransportFactory>) -> Self {
        self.transport = transport;
        self
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    fn catalog(&self, backend: Backend) -> CatalogSource {
        let paths = &self.settings.catalogs;
        match backend {
            Backend::Aci => CatalogSource::urls(&paths.aci),
            Backend::Ise => CatalogSource::urls(&paths.ise),
            Backend::IosXe => CatalogSource::commands(&paths.ios_xe),
        }
    }

    /// Build a dispatcher with a new client for `backend`
    pub fn dispatcher(&self, backend: Backend) -> Result<Dispatcher> {
        let client = match backend {
            Backend::Aci => {
                let credentials = self.credentials.credentials(Backend::Aci)?;
                BackendClient::Controller(Arc::new(AciClient::new(&self.settings.aci, credentials)?))
            }
            Backend::Ise => {
                let credentials = self.credentials.credentials(Backend::Ise)?;
                BackendClient::Controller(Arc::new(IseClient::new(&self.settings.ise, credentials)?))
            }
            Backend::IosXe => {
                // the testbed may carry the device credentials itself
                let credentials = self.credentials.credentials(Backend::IosXe).ok();
                BackendClient::Device(Arc::new(IosXeClient::with_factory(
                    &self.settings.ios_xe,
                    credentials,
                    Arc::clone(&self.transport),
                )))
            }
        };
        debug!(backend = %backend, "Built backend client");
        Ok(Dispatcher::new(self.catalog(backend), client))
    }

    /// Agent pinned to `backend`
    pub fn backend_agent(&self, backend: Backend) -> Result<Agent> {
        let dispatcher = self.dispatcher(backend)?;
        let prompt = prompts::backend_prompt(backend, &dispatcher.definitions());
        Ok(Agent::new(
            delegate_name(backend),
            prompt,
            Arc::new(dispatcher),
            Arc::clone(&self.provider),
        )
        .with_max_hops(self.settings.max_hops))
    }

    /// Master router over every backend that can be built.
    ///
    /// Backends without credentials are left out; it is an error when
    /// none remain.
    pub fn router_agent(&self) -> Result<Agent> {
        let mut router = MasterRouter::new();
        for backend in Backend::ALL {
            match self.backend_agent(backend) {
                Ok(agent) => router = router.with_agent(backend, agent),
                Err(e) => warn!(backend = %backend, "Leaving backend out of the router: {}", e),
            }
        }
        if router.is_empty() {
            return Err(Error::config("No backend could be configured for the router"));
        }

        let prompt = prompts::router_prompt(&router.definitions());
        Ok(Agent::new(
            "master_router",
            prompt,
            Arc::new(router),
            Arc::clone(&self.provider),
        )
        .with_max_hops(self.settings.max_hops))
    }

    pub fn build(&self, mode: AgentMode) -> Result<Agent> {
        match mode {
            AgentMode::Router => self.router_agent(),
            AgentMode::Backend(backend) => self.backend_agent(backend),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_agent_mode_from_str() {
        assert_eq!("router".parse::<AgentMode>().unwrap(), AgentMode::Router);
        assert_eq!("Master".parse::<AgentMode>().unwrap(), AgentMode::Router);
        assert_eq!(
            "ios-xe".parse::<AgentMode>().unwrap(),
            AgentMode::Backend(Backend::IosXe)
        );
        assert_eq!("ise".parse::<AgentMode>().unwrap(), AgentMode::Backend(Backend::Ise));
        assert!("nxos".parse::<AgentMode>().is_err());
    }

    #[test]
    fn test_agent_mode_display() {
        assert_eq!(AgentMode::Router.to_string(), "router");
        assert_eq!(AgentMode::Backend(Backend::Aci).to_string(), "aci");
    }
}
