//! Exact inner-product index held in memory.
//!
//! With L2-normalized vectors the inner product equals cosine similarity, so
//! this ranks the same way as [`crate::LanceIndex`]. Handy for small catalogs
//! and tests.
use anyhow::{ensure, Result};

use assessrec_core::catalog::Catalog;
use assessrec_core::traits::{Embedder, VectorIndex};
use assessrec_core::types::SearchHit;

use crate::writer::embed_catalog;

#[derive(Debug, Clone)]
pub struct FlatIndex {
    dim: usize,
    vectors: Vec<Vec<f32>>,
}

impl FlatIndex {
    pub fn from_vectors(dim: usize, vectors: Vec<Vec<f32>>) -> Result<Self> {
        for (row, v) in vectors.iter().enumerate() {
            ensure!(v.len() == dim, "row {row} has {} dims, expected {dim}", v.len());
        }
        Ok(Self { dim, vectors })
    }

    /// Embed every catalog item in order.
    pub fn build(catalog: &Catalog, embedder: &dyn Embedder) -> Result<Self> {
        Self::from_vectors(embedder.dim(), embed_catalog(catalog, embedder)?)
    }
}

impl VectorIndex for FlatIndex {
    fn len(&self) -> usize {
        self.vectors.len()
    }

    fn search(&self, query_vec: &[f32], k: usize) -> Result<Vec<SearchHit>> {
        ensure!(query_vec.len() == self.dim, "query has {} dims, index has {}", query_vec.len(), self.dim);
        let mut hits: Vec<SearchHit> = self
            .vectors
            .iter()
            .enumerate()
            .map(|(row, v)| SearchHit { row, score: v.iter().zip(query_vec).map(|(a, b)| a * b).sum() })
            .collect();
        // Stable sort: equal scores keep row order.
        hits.sort_by(|a, b| b.score.total_cmp(&a.score));
        hits.truncate(k);
        Ok(hits)
    }
}
