//! Credential providers
//!
//! Backend clients never embed credentials. Each session asks a
//! [`CredentialProvider`] for its own [`Credentials`] handle when the
//! client is built, and drops it together with the client.

use std::collections::HashMap;
use std::fmt;

use crate::{Backend, Error, Result};

/// Username / password pair for one backend
#[derive(Clone)]
pub struct Credentials {
    pub username: String,
    password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    pub fn password(&self) -> &str {
        &self.password
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

/// Source of per-session credentials
pub trait CredentialProvider: Send + Sync {
    fn credentials(&self, backend: Backend) -> Result<Credentials>;
}

/// Reads `<PREFIX>_USERNAME` / `<PREFIX>_PASSWORD` from the environment
#[derive(Debug, Default, Clone, Copy)]
pub struct EnvCredentialProvider;

impl EnvCredentialProvider {
    fn prefix(backend: Backend) -> &'static str {
        match backend {
            Backend::Aci => "ACI",
            Backend::Ise => "ISE",
            Backend::IosXe => "IOSXE",
        }
    }
}

impl CredentialProvider for EnvCredentialProvider {
    fn credentials(&self, backend: Backend) -> Result<Credentials> {
        let prefix = Self::prefix(backend);
        let username = std::env::var(format!("{}_USERNAME", prefix))
            .map_err(|_| Error::config(format!("{}_USERNAME is not set", prefix)))?;
        let password = std::env::var(format!("{}_PASSWORD", prefix))
            .map_err(|_| Error::config(format!("{}_PASSWORD is not set", prefix)))?;
        Ok(Credentials::new(username, password))
    }
}

/// Fixed in-memory credentials, mainly for tests and embedding
#[derive(Debug, Default, Clone)]
pub struct StaticCredentials {
    entries: HashMap<Backend, Credentials>,
}

impl StaticCredentials {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, backend: Backend, credentials: Credentials) -> Self {
        self.entries.insert(backend, credentials);
        self
    }
}

impl CredentialProvider for StaticCredentials {
    fn credentials(&self, backend: Backend) -> Result<Credentials> {
        self.entries
            .get(&backend)
            .cloned()
            .ok_or_else(|| Error::config(format!("No credentials configured for {}", backend)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_masks_password() {
        let creds = Credentials::new("admin", "hunter2");
        let rendered = format!("{:?}", creds);
        assert!(rendered.contains("admin"));
        assert!(!rendered.contains("hunter2"));
    }

    #[test]
    fn test_static_provider() {
        let provider =
            StaticCredentials::new().with(Backend::Aci, Credentials::new("admin", "secret"));
        assert_eq!(provider.credentials(Backend::Aci).unwrap().password(), "secret");
        assert!(provider.credentials(Backend::Ise).is_err());
    }
}
