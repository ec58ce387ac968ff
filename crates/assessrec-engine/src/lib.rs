//! Assessment recommendation pipeline:
//! analyze -> retrieve -> duration filter -> domain balance -> finalize.
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

use assessrec_core::catalog::Catalog;
use assessrec_core::config::EngineSettings;
use assessrec_core::error::{Error, Result};
use assessrec_core::traits::{Embedder, VectorIndex};
use assessrec_core::types::{Candidate, QueryContext, Recommendation};

pub mod analyzer;
pub mod assembler;
pub mod balancer;
pub mod filter;
pub mod finalizer;

pub use analyzer::analyze;
pub use filter::{FilterOutcome, Relaxation};

pub const DEFAULT_TOP_N: usize = 10;

/// Answer to one `recommend` call.
#[derive(Debug, Clone, Serialize)]
pub struct Recommendations {
    pub items: Vec<Recommendation>,
    pub context: QueryContext,
    pub relaxation: Option<Relaxation>,
}

/// Holds the loaded catalog and retrieval services; every request only reads them.
pub struct RecommendationEngine {
    catalog: Arc<Catalog>,
    embedder: Arc<dyn Embedder>,
    index: Arc<dyn VectorIndex>,
    settings: EngineSettings,
}

impl RecommendationEngine {
    pub fn new(catalog: Arc<Catalog>, embedder: Arc<dyn Embedder>, index: Arc<dyn VectorIndex>, settings: EngineSettings) -> Result<Self> {
        settings.validate()?;
        if index.len() != catalog.len() {
            warn!(index_rows = index.len(), catalog_items = catalog.len(), "index and catalog sizes differ; unmatched rows will be skipped");
        }
        info!(items = catalog.len(), embedder = embedder.id(), min = settings.min_results, max = settings.max_results, "recommendation engine ready");
        Ok(Self { catalog, embedder, index, settings })
    }

    pub fn catalog(&self) -> &Catalog { &self.catalog }

    pub fn settings(&self) -> &EngineSettings { &self.settings }

    /// Recommend between `min_results` and `max_results` assessments for a
    /// free-text query (`top_n` is clamped into that range).
    pub fn recommend(&self, query: &str, top_n: usize) -> Result<Recommendations> {
        if query.trim().is_empty() {
            return Err(Error::InvalidQuery("query must not be empty".into()));
        }
        let start = Instant::now();
        let requested = finalizer::clamp_requested(top_n, self.settings.min_results, self.settings.max_results);
        let context = analyze(query);
        debug!(domains = ?context.detected_domains, constraint = ?context.duration_constraint, requested, "query analyzed");

        let pool = self.retrieve(&context.text, requested)?;
        let FilterOutcome { candidates, relaxation } =
            filter::apply_duration(pool, context.duration_constraint, self.settings.min_results);
        let balanced = balancer::balance(&candidates, &context.detected_domains, requested);
        let items = finalizer::finalize(balanced, &candidates, self.settings.min_results, requested);

        info!(
            results = items.len(),
            domains = context.detected_domains.len(),
            constraint = ?context.duration_constraint,
            relaxed = relaxation.is_some(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "recommendation served"
        );
        Ok(Recommendations { items, context, relaxation })
    }

    fn retrieve(&self, text: &str, requested: usize) -> Result<Vec<Candidate<'_>>> {
        let k = assembler::pool_size(requested, self.settings.retrieval_multiplier, self.catalog.len());
        if k == 0 || self.index.is_empty() {
            return Ok(Vec::new());
        }
        let query_vec = self.embedder.embed(text).map_err(|e| Error::retrieval(&e))?;
        let hits = self.index.search(&query_vec, k).map_err(|e| Error::retrieval(&e))?;
        let candidates = assembler::assemble(&self.catalog, &hits);
        debug!(k, hits = hits.len(), candidates = candidates.len(), "candidates assembled");
        Ok(candidates)
    }
}
