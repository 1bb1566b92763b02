//! Core types and utilities for netops-agent
//!
//! # Modules
//!
//! - `config`: Environment file loading and typed settings
//! - `credentials`: Per-session credential providers
//! - `error`: Error taxonomy and Result alias
//! - `types`: Catalog, resolution, operation and conversation types

pub mod config;
pub mod credentials;
pub mod error;
pub mod types;

// Re-exports
pub use config::Settings;
pub use credentials::{CredentialProvider, Credentials, EnvCredentialProvider, StaticCredentials};
pub use error::{Error, Result};
pub use types::*;
