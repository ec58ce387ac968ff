use std::collections::HashSet;
use tracing::debug;

use assessrec_core::catalog::Catalog;
use assessrec_core::types::{Candidate, SearchHit};

/// How many neighbours to ask the index for.
pub fn pool_size(requested: usize, multiplier: usize, catalog_len: usize) -> usize {
    requested.saturating_mul(multiplier).min(catalog_len)
}

/// Join index hits with catalog rows, keeping the index's order.
///
/// Rows outside the catalog, repeated rows and non-finite scores are dropped.
pub fn assemble<'a>(catalog: &'a Catalog, hits: &[SearchHit]) -> Vec<Candidate<'a>> {
    let mut seen = HashSet::with_capacity(hits.len());
    let mut out = Vec::with_capacity(hits.len());
    for hit in hits {
        let Some(item) = catalog.get(hit.row) else {
            debug!(row = hit.row, catalog = catalog.len(), "index row outside catalog; skipped");
            continue;
        };
        if !hit.score.is_finite() {
            debug!(row = hit.row, "non-finite score; skipped");
            continue;
        }
        if !seen.insert(hit.row) { continue; }
        out.push(Candidate { item, score: hit.score });
    }
    out
}
