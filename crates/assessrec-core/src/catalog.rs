//! Catalog Store: the immutable, positionally ordered list of assessments.
//!
//! Row `i` of any vector index built for a catalog refers to `items()[i]`.
use std::collections::HashSet;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use tracing::info;

use crate::error::{Error, Result};
use crate::types::CatalogItem;

const DESCRIPTION_CHARS: usize = 500;

#[derive(Debug, Clone)]
pub struct Catalog {
    items: Vec<CatalogItem>,
    fingerprint: String,
}

impl Catalog {
    /// Load a JSON snapshot (an array of catalog items).
    pub fn load(path: &Path) -> Result<Self> {
        let bytes = match fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(Error::ServiceUnavailable(format!(
                    "catalog snapshot not found at {}",
                    path.display()
                )))
            }
            Err(e) => return Err(Error::InvalidCatalog(format!("{}: {e}", path.display()))),
        };
        let catalog = Self::from_json(&bytes)?;
        info!(path = %path.display(), items = catalog.len(), "loaded catalog snapshot");
        Ok(catalog)
    }

    pub fn from_json(bytes: &[u8]) -> Result<Self> {
        let items: Vec<CatalogItem> =
            serde_json::from_slice(bytes).map_err(|e| Error::InvalidCatalog(e.to_string()))?;
        Self::from_items(items)
    }

    /// Build from records, rejecting blank or duplicate urls.
    pub fn from_items(items: Vec<CatalogItem>) -> Result<Self> {
        let mut seen = HashSet::with_capacity(items.len());
        for (row, item) in items.iter().enumerate() {
            if item.url.trim().is_empty() {
                return Err(Error::InvalidCatalog(format!("row {row} has an empty url")));
            }
            if !seen.insert(item.url.as_str()) {
                return Err(Error::InvalidCatalog(format!("duplicate url at row {row}: {}", item.url)));
            }
        }
        let canonical = serde_json::to_vec(&items).map_err(|e| Error::InvalidCatalog(e.to_string()))?;
        let fingerprint = blake3::hash(&canonical).to_hex().to_string();
        Ok(Self { items, fingerprint })
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, row: usize) -> Option<&CatalogItem> {
        self.items.get(row)
    }

    pub fn items(&self) -> &[CatalogItem] {
        &self.items
    }

    /// blake3 of the canonical JSON encoding; ties an index build to this snapshot.
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }
}

/// Text embedded for an item at index-build time.
///
/// The name is repeated to weight it above the description, which is cut to
/// its first 500 characters.
pub fn search_document(item: &CatalogItem) -> String {
    let mut parts = Vec::with_capacity(5);
    let name = item.name.trim();
    if !name.is_empty() {
        parts.push(name.to_string());
        parts.push(name.to_string());
    }
    if !item.test_types.is_empty() {
        parts.push(format!("Test type: {}", item.test_types.join(", ")));
    }
    let description = item.description.trim();
    if !description.is_empty() {
        parts.push(description.chars().take(DESCRIPTION_CHARS).collect());
    }
    if let Some(minutes) = item.duration.filter(|m| *m > 0) {
        parts.push(format!("Duration: {minutes} minutes"));
    }
    parts.join(" | ")
}
