//! Catalog file loading
//!
//! Catalogs are JSON arrays of records. ACI and ISE records carry a
//! required `URL` field, IOS XE records a required `command` field; both
//! may carry an optional `Name`. Any failure to produce a catalog is a
//! load error, never an empty catalog.

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use netops_core::{CatalogEntry, Error, Result};

/// Which record key holds the identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogKind {
    /// API endpoints keyed `URL`
    Url,
    /// Device commands keyed `command`
    Command,
}

impl CatalogKind {
    pub fn key(&self) -> &'static str {
        match self {
            CatalogKind::Url => "URL",
            CatalogKind::Command => "command",
        }
    }
}

/// Location and shape of a catalog file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogSource {
    pub path: PathBuf,
    pub kind: CatalogKind,
}

impl CatalogSource {
    pub fn new(path: impl Into<PathBuf>, kind: CatalogKind) -> Self {
        Self {
            path: path.into(),
            kind,
        }
    }

    pub fn urls(path: impl Into<PathBuf>) -> Self {
        Self::new(path, CatalogKind::Url)
    }

    pub fn commands(path: impl Into<PathBuf>) -> Self {
        Self::new(path, CatalogKind::Command)
    }

    /// Read the catalog from disk. Re-read on every call so edits are
    /// picked up without a restart.
    pub fn load(&self) -> CatalogOutcome {
        load(&self.path, self.kind)
    }
}

/// A loaded catalog, in file order
#[derive(Debug, Clone, PartialEq)]
pub struct Catalog {
    pub kind: CatalogKind,
    pub source: PathBuf,
    entries: Vec<CatalogEntry>,
}

impl Catalog {
    pub fn new(kind: CatalogKind, entries: Vec<CatalogEntry>) -> Self {
        Self {
            kind,
            source: PathBuf::new(),
            entries,
        }
    }

    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    pub fn iter(&self) -> impl Iterator<Item = &CatalogEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, identifier: &str) -> bool {
        self.entries.iter().any(|e| e.identifier == identifier)
    }
}

/// Result of a load attempt, consumed as-is by the resolver
pub type CatalogOutcome = Result<Catalog>;

#[derive(Debug, Deserialize)]
struct RawRecord {
    #[serde(rename = "URL", default)]
    url: Option<String>,
    #[serde(default)]
    command: Option<String>,
    #[serde(rename = "Name", default)]
    name: Option<String>,
}

/// Load a catalog file of the given kind
pub fn load(path: impl AsRef<Path>, kind: CatalogKind) -> CatalogOutcome {
    let path = path.as_ref();

    if !path.exists() {
        return Err(Error::load(format!(
            "Catalog file '{}' not found.",
            path.display()
        )));
    }

    let content = fs::read_to_string(path).map_err(|e| {
        Error::load(format!("Error reading catalog '{}': {}", path.display(), e))
    })?;

    let records: Vec<RawRecord> = serde_json::from_str(&content).map_err(|e| {
        Error::load(format!("Error parsing catalog '{}': {}", path.display(), e))
    })?;

    let mut entries = Vec::with_capacity(records.len());
    for (index, record) in records.into_iter().enumerate() {
        let identifier = match kind {
            CatalogKind::Url => record.url,
            CatalogKind::Command => record.command,
        }
        .filter(|id| !id.trim().is_empty())
        .ok_or_else(|| {
            Error::load(format!(
                "Catalog '{}' record {} has no '{}' value",
                path.display(),
                index,
                kind.key()
            ))
        })?;

        entries.push(CatalogEntry::new(identifier, record.name.unwrap_or_default()));
    }

    debug!("Loaded {} catalog entries from {}", entries.len(), path.display());

    Ok(Catalog {
        kind,
        source: path.to_path_buf(),
        entries,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_catalog(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_load_url_catalog_defaults_missing_name() {
        let file = write_catalog(
            r#"[
                {"URL": "/api/node/class/topSystem.json", "Name": "Leaf Nodes"},
                {"URL": "/api/node/class/fvTenant.json"}
            ]"#,
        );

        let catalog = load(file.path(), CatalogKind::Url).unwrap();
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.entries()[0].display_name, "Leaf Nodes");
        assert_eq!(catalog.entries()[1].display_name, "");
        assert!(catalog.contains("/api/node/class/fvTenant.json"));
    }

    #[test]
    fn test_load_command_catalog() {
        let file = write_catalog(r#"[{"command": "show ip interface brief"}, {"command": "show version"}]"#);

        let catalog = CatalogSource::commands(file.path()).load().unwrap();
        assert_eq!(catalog.kind, CatalogKind::Command);
        assert_eq!(catalog.entries()[1].identifier, "show version");
    }

    #[test]
    fn test_missing_file_is_load_error() {
        let err = load("/nonexistent/aci_urls.json", CatalogKind::Url).unwrap_err();
        assert!(matches!(err, Error::Load(_)));
        assert!(err.to_string().contains("not found"));
    }

    #[test]
    fn test_malformed_json_is_load_error() {
        let file = write_catalog("[{\"URL\": ");
        let err = load(file.path(), CatalogKind::Url).unwrap_err();
        assert!(matches!(err, Error::Load(_)));
    }

    #[test]
    fn test_record_without_identifier_is_load_error() {
        // a command catalog read as a URL catalog has no URL keys
        let file = write_catalog(r#"[{"command": "show version"}]"#);
        let err = load(file.path(), CatalogKind::Url).unwrap_err();
        assert!(err.to_string().contains("'URL'"));

        let file = write_catalog(r#"[{"URL": "  ", "Name": "blank"}]"#);
        assert!(load(file.path(), CatalogKind::Url).is_err());
    }

    #[test]
    fn test_empty_array_is_an_empty_catalog() {
        let file = write_catalog("[]");
        let catalog = load(file.path(), CatalogKind::Url).unwrap();
        assert!(catalog.is_empty());
    }
}
