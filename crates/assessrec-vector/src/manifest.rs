//! Sidecar describing how an index directory was built.
//!
//! The manifest ties the LanceDB table to the catalog snapshot (by fingerprint
//! and row count) and to the embedder that produced its vectors. An index
//! that disagrees with the loaded catalog or embedder cannot be served.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use assessrec_core::catalog::Catalog;
use assessrec_core::error::{Error, Result};

pub const MANIFEST_FILE: &str = "manifest.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexManifest {
    pub table: String,
    pub dim: usize,
    pub rows: usize,
    pub embedder_id: String,
    pub catalog_fingerprint: String,
    pub built_at: DateTime<Utc>,
}

impl IndexManifest {
    pub fn read(dir: &Path) -> Result<Self> {
        let path = dir.join(MANIFEST_FILE);
        let raw = match fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(Error::ServiceUnavailable(format!(
                    "no index at {}; build it with `assessrec index`",
                    dir.display()
                )))
            }
            Err(e) => return Err(Error::ServiceUnavailable(format!("{}: {e}", path.display()))),
        };
        serde_json::from_str(&raw).map_err(|e| Error::ServiceUnavailable(format!("corrupt manifest {}: {e}", path.display())))
    }

    pub fn write(&self, dir: &Path) -> anyhow::Result<()> {
        fs::write(dir.join(MANIFEST_FILE), serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    /// Refuse to serve vectors that do not line up with `catalog` or were
    /// produced by a different embedder than the one answering queries.
    pub fn check_compatible(&self, catalog: &Catalog, embedder_id: &str) -> Result<()> {
        if self.catalog_fingerprint != catalog.fingerprint() || self.rows != catalog.len() {
            return Err(Error::ServiceUnavailable(format!(
                "index was built from a different catalog snapshot ({} rows, fingerprint {}); rebuild it",
                self.rows,
                self.catalog_fingerprint.chars().take(12).collect::<String>()
            )));
        }
        if self.embedder_id != embedder_id {
            return Err(Error::ServiceUnavailable(format!(
                "index vectors come from `{}` but queries are embedded with `{}`; rebuild it",
                self.embedder_id, embedder_id
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assessrec_core::types::CatalogItem;

    fn catalog() -> Catalog {
        Catalog::from_items(vec![CatalogItem {
            url: "u".into(),
            name: "n".into(),
            description: String::new(),
            duration: None,
            remote_support: false,
            adaptive_support: false,
            test_types: vec![],
        }])
        .unwrap()
    }

    fn manifest(c: &Catalog) -> IndexManifest {
        IndexManifest {
            table: "assessments".into(),
            dim: 8,
            rows: c.len(),
            embedder_id: "hash:xxh64:d8".into(),
            catalog_fingerprint: c.fingerprint().to_string(),
            built_at: Utc::now(),
        }
    }

    #[test]
    fn round_trips_through_disk() {
        let tmp = tempfile::tempdir().unwrap();
        let c = catalog();
        let m = manifest(&c);
        m.write(tmp.path()).unwrap();
        assert_eq!(IndexManifest::read(tmp.path()).unwrap(), m);
    }

    #[test]
    fn missing_manifest_is_service_unavailable() {
        let tmp = tempfile::tempdir().unwrap();
        assert!(matches!(IndexManifest::read(tmp.path()), Err(Error::ServiceUnavailable(_))));
    }

    #[test]
    fn stale_fingerprint_or_embedder_is_rejected() {
        let c = catalog();
        let mut m = manifest(&c);
        assert!(m.check_compatible(&c, "hash:xxh64:d8").is_ok());
        assert!(m.check_compatible(&c, "bert:all-MiniLM-L6-v2:d384").is_err());
        m.catalog_fingerprint = "0".repeat(64);
        assert!(matches!(m.check_compatible(&c, "hash:xxh64:d8"), Err(Error::ServiceUnavailable(_))));
    }

    #[test]
    fn hand_edited_fingerprint_is_reported_not_panicked_on() {
        let c = catalog();
        let mut m = manifest(&c);
        m.catalog_fingerprint = "é".repeat(13);
        let Err(Error::ServiceUnavailable(msg)) = m.check_compatible(&c, "hash:xxh64:d8") else {
            panic!("expected a stale-catalog error");
        };
        assert!(msg.contains(&"é".repeat(12)), "{msg}");
        assert!(!msg.contains(&"é".repeat(13)), "{msg}");
    }
}
