//! netops-catalog: Catalog loading and fuzzy resolution
//!
//! A catalog is a static JSON list of known ACI/ISE API URLs or IOS XE
//! show commands. Free text from the model is matched against it with a
//! sequence-matching ratio; the winner is what the tools act on.
//!
//! ```text
//! [
//!   {"URL": "/api/node/class/topSystem.json", "Name": "Leaf Nodes"},
//!   {"URL": "/api/node/class/fvTenant.json"}
//! ]
//! ```

pub mod loader;
pub mod matcher;
pub mod resolver;

pub use loader::{load, Catalog, CatalogKind, CatalogOutcome, CatalogSource};
pub use matcher::similarity;
pub use resolver::{resolve, resolve_scored, ScoredResolution, MATCH_THRESHOLD};
