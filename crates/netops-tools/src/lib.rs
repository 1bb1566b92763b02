//! netops-tools: Capability dispatch
//!
//! Every backend operation the model can ask for is a [`Capability`]
//! variant. A [`Dispatcher`] binds one backend client to its catalog and
//! turns every call into an [`OperationResult`](netops_core::OperationResult);
//! errors never escape it.

pub mod capability;
pub mod dispatcher;
pub mod toolset;

pub use capability::Capability;
pub use dispatcher::{BackendClient, Dispatcher};
pub use toolset::ToolSet;
