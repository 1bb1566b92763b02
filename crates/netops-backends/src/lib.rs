//! netops-backends: Clients for the managed Cisco systems
//!
//! This crate provides:
//! - ACI (APIC) REST client with cookie login and read/create/delete
//! - ISE ERS/OpenAPI REST client with basic auth, read only
//! - IOS XE device client over SSH with scoped connect/disconnect
//! - pyATS-style testbed loader for device connection parameters
//!
//! Every client instance owns its credentials and session material; build
//! one per chat session and never share it.
//!
//! | backend | authenticate | read | write | delete | configure |
//! |---------|--------------|------|-------|--------|-----------|
//! | ACI     | cookie       | yes  | yes   | yes    | -         |
//! | ISE     | basic auth   | yes  | -     | -      | -         |
//! | IOS XE  | SSH          | yes  | -     | -      | yes       |

pub mod aci;
pub mod controller;
pub mod http;
pub mod ios_xe;
pub mod ise;
pub mod ssh;
pub mod testbed;

pub use aci::AciClient;
pub use controller::ControllerClient;
pub use ios_xe::{
    check_config_modifiers, check_disallowed_modifiers, DeviceTransport, IosXeClient,
    TransportFactory, DISALLOWED_MODIFIERS,
};
pub use ise::IseClient;
pub use ssh::SshTransportFactory;
pub use testbed::{DeviceConnection, Testbed};

/// Prelude for convenient imports
pub mod prelude {
    pub use super::aci::AciClient;
    pub use super::controller::ControllerClient;
    pub use super::ios_xe::{DeviceTransport, IosXeClient, TransportFactory};
    pub use super::ise::IseClient;
    pub use super::testbed::{DeviceConnection, Testbed};
}
