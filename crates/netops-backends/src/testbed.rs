//! pyATS-style testbed descriptors
//!
//! Only the subset needed to reach one device over SSH is read:
//!
//! ```yaml
//! testbed:
//!   name: devnet
//!   credentials:
//!     default:
//!       username: "%ENV{IOSXE_USERNAME}"
//!       password: "%ENV{IOSXE_PASSWORD}"
//! devices:
//!   Cat8000V:
//!     os: iosxe
//!     connections:
//!       cli:
//!         protocol: ssh
//!         ip: 10.10.20.48
//!         port: 22
//! ```
//!
//! `%ENV{NAME}` placeholders are expanded from the environment.

use lazy_static::lazy_static;
use regex::Regex;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use tracing::debug;

use netops_core::{Credentials, Error, Result};

lazy_static! {
    static ref ENV_PLACEHOLDER: Regex = Regex::new(r"%ENV\{([A-Za-z_][A-Za-z0-9_]*)\}").unwrap();
}

#[derive(Debug, Clone, Default, Deserialize)]
struct CredentialSpec {
    #[serde(default)]
    username: Option<String>,
    #[serde(default)]
    password: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct TestbedHeader {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    credentials: HashMap<String, CredentialSpec>,
}

#[derive(Debug, Clone, Deserialize)]
struct ConnectionSpec {
    #[serde(default)]
    protocol: Option<String>,
    ip: String,
    #[serde(default)]
    port: Option<u16>,
}

#[derive(Debug, Clone, Deserialize)]
struct DeviceSpec {
    #[serde(default)]
    os: Option<String>,
    #[serde(default)]
    credentials: HashMap<String, CredentialSpec>,
    #[serde(default)]
    connections: HashMap<String, ConnectionSpec>,
}

/// A parsed testbed file
#[derive(Debug, Clone, Deserialize)]
pub struct Testbed {
    #[serde(default)]
    testbed: TestbedHeader,
    #[serde(default)]
    devices: HashMap<String, DeviceSpec>,
}

/// Everything needed to open a CLI session to one device
#[derive(Debug, Clone)]
pub struct DeviceConnection {
    pub name: String,
    pub host: String,
    pub port: u16,
    pub os: Option<String>,
    pub credentials: Credentials,
}

impl DeviceConnection {
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Testbed {
    /// Load a testbed YAML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::config(format!("Failed to read testbed {}: {}", path.display(), e))
        })?;
        let testbed = Self::from_yaml(&content).map_err(|e| {
            Error::config(format!("Failed to parse testbed {}: {}", path.display(), e))
        })?;
        debug!(
            "Loaded testbed {} with {} device(s)",
            testbed.name().unwrap_or("<unnamed>"),
            testbed.devices.len()
        );
        Ok(testbed)
    }

    pub fn from_yaml(content: &str) -> std::result::Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(content)
    }

    pub fn name(&self) -> Option<&str> {
        self.testbed.name.as_deref()
    }

    pub fn device_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.devices.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Resolve connection parameters for `device`.
    ///
    /// Credentials are taken from `override_credentials`, then the device's
    /// `default` credentials, then the testbed-wide `default`.
    pub fn connection(
        &self,
        device: &str,
        override_credentials: Option<&Credentials>,
    ) -> Result<DeviceConnection> {
        let spec = self.devices.get(device).ok_or_else(|| {
            Error::config(format!(
                "Device '{}' not found in testbed (available: {})",
                device,
                self.device_names().join(", ")
            ))
        })?;

        let cli = spec
            .connections
            .get("cli")
            .or_else(|| spec.connections.values().find(|c| c.protocol.as_deref() == Some("ssh")))
            .ok_or_else(|| Error::config(format!("Device '{}' has no cli connection", device)))?;

        if let Some(protocol) = cli.protocol.as_deref() {
            if protocol != "ssh" {
                return Err(Error::config(format!(
                    "Device '{}' uses unsupported protocol '{}'",
                    device, protocol
                )));
            }
        }

        let credentials = match override_credentials {
            Some(creds) => creds.clone(),
            None => {
                let spec_creds = spec
                    .credentials
                    .get("default")
                    .or_else(|| self.testbed.credentials.get("default"))
                    .ok_or_else(|| {
                        Error::config(format!("No credentials for device '{}'", device))
                    })?;
                Credentials::new(
                    expand_env(spec_creds.username.as_deref().unwrap_or_default())?,
                    expand_env(spec_creds.password.as_deref().unwrap_or_default())?,
                )
            }
        };

        Ok(DeviceConnection {
            name: device.to_string(),
            host: expand_env(&cli.ip)?,
            port: cli.port.unwrap_or(22),
            os: spec.os.clone(),
            credentials,
        })
    }
}

/// Expand `%ENV{NAME}` placeholders
fn expand_env(value: &str) -> Result<String> {
    let mut missing = None;
    let expanded = ENV_PLACEHOLDER.replace_all(value, |caps: &regex::Captures| {
        let name = &caps[1];
        std::env::var(name).unwrap_or_else(|_| {
            missing.get_or_insert_with(|| name.to_string());
            String::new()
        })
    });

    match missing {
        Some(name) => Err(Error::config(format!(
            "Testbed references unset environment variable {}",
            name
        ))),
        None => Ok(expanded.into_owned()),
    }
}
