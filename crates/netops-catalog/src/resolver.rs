//! Fuzzy resolution of free text against a catalog

use tracing::debug;

use netops_core::{CatalogEntry, ResolutionResult};

use crate::loader::CatalogOutcome;
use crate::matcher::similarity;

/// Minimum similarity (inclusive) for a candidate to count as a match
pub const MATCH_THRESHOLD: f64 = 0.6;

/// A resolution together with the winning similarity score
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredResolution {
    pub result: ResolutionResult,
    /// Score of the winning candidate; `None` unless supported
    pub score: Option<f64>,
}

/// Resolve `query` to the closest catalog entry
pub fn resolve(query: &str, catalog: &CatalogOutcome) -> ResolutionResult {
    resolve_scored(query, catalog).result
}

/// Like [`resolve`], also reporting the winning score.
///
/// Identifiers and display names are scored independently. A passing
/// identifier always beats a passing display name; within each, the
/// first entry at the highest score wins.
pub fn resolve_scored(query: &str, catalog: &CatalogOutcome) -> ScoredResolution {
    let catalog = match catalog {
        Ok(catalog) => catalog,
        Err(err) => {
            return ScoredResolution {
                result: ResolutionResult::LoadError {
                    reason: err.to_string(),
                },
                score: None,
            }
        }
    };

    let by_identifier = best_match(catalog.iter(), query, |e| Some(e.identifier.as_str()));
    let by_name = best_match(catalog.iter(), query, |e| {
        Some(e.display_name.as_str()).filter(|name| !name.is_empty())
    });

    match by_identifier.or(by_name) {
        Some((entry, score)) => {
            debug!(
                "Resolved '{}' to '{}' (score {:.3})",
                query, entry.identifier, score
            );
            ScoredResolution {
                result: ResolutionResult::Supported {
                    identifier: entry.identifier.clone(),
                    display_name: entry.display_name.clone(),
                },
                score: Some(score),
            }
        }
        None => ScoredResolution {
            result: ResolutionResult::Unsupported {
                attempted_input: query.to_string(),
                reason: format!(
                    "The input '{}' is not supported. Please check the available entries.",
                    query
                ),
            },
            score: None,
        },
    }
}

fn best_match<'a, F>(
    entries: impl Iterator<Item = &'a CatalogEntry>,
    query: &str,
    field: F,
) -> Option<(&'a CatalogEntry, f64)>
where
    F: Fn(&CatalogEntry) -> Option<&str>,
{
    let mut best: Option<(&CatalogEntry, f64)> = None;

    for entry in entries {
        let Some(candidate) = field(entry) else {
            continue;
        };
        let score = similarity(candidate, query);
        if score < MATCH_THRESHOLD {
            continue;
        }
        // strict comparison keeps the earliest entry on ties
        if best.map_or(true, |(_, best_score)| score > best_score) {
            best = Some((entry, score));
        }
    }

    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::{load, Catalog, CatalogKind};

    fn aci_catalog() -> CatalogOutcome {
        Ok(Catalog::new(
            CatalogKind::Url,
            vec![
                CatalogEntry::new("/api/node/class/topSystem.json", "Leaf Nodes"),
                CatalogEntry::new("/api/node/class/fvTenant.json", "Tenants"),
                CatalogEntry::new("/api/node/class/fvBD.json", "Bridge Domains"),
                CatalogEntry::new("/api/node/class/fvAEPg.json", ""),
            ],
        ))
    }

    #[test]
    fn test_exact_identifier_scores_one() {
        let catalog = aci_catalog();
        for entry in catalog.as_ref().unwrap().iter() {
            let scored = resolve_scored(&entry.identifier, &catalog);
            assert_eq!(
                scored.result,
                ResolutionResult::Supported {
                    identifier: entry.identifier.clone(),
                    display_name: entry.display_name.clone(),
                }
            );
            assert!((scored.score.unwrap() - 1.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_display_name_match() {
        let catalog = Ok(Catalog::new(
            CatalogKind::Url,
            vec![CatalogEntry::new("/api/node/class/topSystem.json", "Leaf Nodes")],
        ));

        assert_eq!(
            resolve("Leaf Node", &catalog),
            ResolutionResult::Supported {
                identifier: "/api/node/class/topSystem.json".to_string(),
                display_name: "Leaf Nodes".to_string(),
            }
        );
    }

    #[test]
    fn test_distant_query_is_unsupported() {
        let result = resolve("reboot the coffee machine", &aci_catalog());
        match result {
            ResolutionResult::Unsupported { attempted_input, .. } => {
                assert_eq!(attempted_input, "reboot the coffee machine");
            }
            other => panic!("expected unsupported, got {:?}", other),
        }
    }

    #[test]
    fn test_identifier_match_preferred_over_name() {
        // the query is an exact display name of the second entry but also
        // clears the threshold against the first entry's identifier
        let catalog = Ok(Catalog::new(
            CatalogKind::Command,
            vec![
                CatalogEntry::new("show version", ""),
                CatalogEntry::new("show inventory", "show versions"),
            ],
        ));

        match resolve("show versions", &catalog) {
            ResolutionResult::Supported { identifier, .. } => {
                assert_eq!(identifier, "show version")
            }
            other => panic!("expected supported, got {:?}", other),
        }
    }

    #[test]
    fn test_tie_goes_to_first_entry() {
        // both candidates differ from the query by one trailing char
        let catalog = Ok(Catalog::new(
            CatalogKind::Command,
            vec![
                CatalogEntry::new("show clock1", ""),
                CatalogEntry::new("show clock2", ""),
            ],
        ));

        for _ in 0..3 {
            match resolve("show clock", &catalog) {
                ResolutionResult::Supported { identifier, .. } => {
                    assert_eq!(identifier, "show clock1")
                }
                other => panic!("expected supported, got {:?}", other),
            }
        }
    }

    #[test]
    fn test_empty_display_names_never_match() {
        let catalog = Ok(Catalog::new(
            CatalogKind::Url,
            vec![CatalogEntry::new("/api/x.json", "")],
        ));
        assert!(!resolve("", &catalog).is_supported());
    }

    #[test]
    fn test_threshold_is_inclusive() {
        // 3 matched chars over 7 + 3: exactly 0.6
        let catalog = Ok(Catalog::new(
            CatalogKind::Command,
            vec![CatalogEntry::new("abcxyzw", "")],
        ));
        let scored = resolve_scored("abc", &catalog);
        assert!((scored.score.unwrap() - 0.6).abs() < 1e-9);
        assert!(scored.result.is_supported());
    }

    #[test]
    fn test_load_error_short_circuits() {
        let outcome = load("/nonexistent/ise_urls.json", CatalogKind::Url);
        assert!(outcome.is_err());

        match resolve("/ers/config/networkdevice", &outcome) {
            ResolutionResult::LoadError { reason } => assert!(reason.contains("not found")),
            other => panic!("expected load error, got {:?}", other),
        }
    }
}
