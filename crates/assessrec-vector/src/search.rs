use anyhow::anyhow;
use arrow_array::cast::AsArray;
use arrow_array::types::{Float32Type, UInt32Type};
use futures::TryStreamExt;
use lancedb::query::{ExecutableQuery, QueryBase};
use lancedb::{DistanceType, Table};
use std::path::Path;
use tokio::runtime::Runtime;
use tracing::{debug, info};

use assessrec_core::catalog::Catalog;
use assessrec_core::error::{Error, Result};
use assessrec_core::traits::VectorIndex;
use assessrec_core::types::SearchHit;

use crate::manifest::IndexManifest;
use crate::table::{open_db, table_exists};

/// Persisted cosine-similarity index served from a LanceDB table.
///
/// LanceDB is async; the index owns a small runtime and blocks on it per
/// search, so call it from synchronous code only.
pub struct LanceIndex {
	runtime: Runtime,
	table: Table,
	manifest: IndexManifest,
}

impl LanceIndex {
	/// Open the index under `dir`, checking that it was built for `catalog`
	/// with the embedder identified by `embedder_id`.
	pub fn open(dir: &Path, catalog: &Catalog, embedder_id: &str) -> Result<Self> {
		let manifest = IndexManifest::read(dir)?;
		manifest.check_compatible(catalog, embedder_id)?;

		let runtime = tokio::runtime::Builder::new_multi_thread()
			.worker_threads(2)
			.enable_all()
			.build()
			.map_err(|e| Error::ServiceUnavailable(format!("starting index runtime: {e}")))?;
		let table = runtime
			.block_on(async {
				let db = open_db(&dir.to_string_lossy()).await?;
				if !table_exists(&db, &manifest.table).await? {
					return Err(anyhow!("table `{}` missing from {}", manifest.table, dir.display()));
				}
				let table = db.open_table(&manifest.table).execute().await?;
				let rows = table.count_rows(None).await?;
				if rows != manifest.rows {
					return Err(anyhow!("table has {rows} rows but the manifest records {}", manifest.rows));
				}
				Ok::<_, anyhow::Error>(table)
			})
			.map_err(|e| Error::ServiceUnavailable(format!("{e:#}")))?;

		info!(dir = %dir.display(), table = %manifest.table, rows = manifest.rows, embedder = %manifest.embedder_id, "opened vector index");
		Ok(Self { runtime, table, manifest })
	}

	pub fn manifest(&self) -> &IndexManifest { &self.manifest }

	async fn search_async(&self, query_vec: &[f32], k: usize) -> anyhow::Result<Vec<SearchHit>> {
		let mut stream = self.table.vector_search(query_vec.to_vec())?.distance_type(DistanceType::Cosine).limit(k).execute().await?;
		let mut hits = Vec::with_capacity(k);
		while let Some(batch) = TryStreamExt::try_next(&mut stream).await? {
			let rows = batch.column_by_name("row").and_then(|c| c.as_primitive_opt::<UInt32Type>()).ok_or_else(|| anyhow!("result batch has no `row` column"))?;
			let distances = batch.column_by_name("_distance").and_then(|c| c.as_primitive_opt::<Float32Type>()).ok_or_else(|| anyhow!("result batch has no `_distance` column"))?;
			for i in 0..batch.num_rows() {
				// cosine distance = 1 - cosine similarity
				hits.push(SearchHit { row: rows.value(i) as usize, score: 1.0 - distances.value(i) });
			}
		}
		hits.sort_by(|a, b| b.score.total_cmp(&a.score));
		hits.truncate(k);
		Ok(hits)
	}
}

impl VectorIndex for LanceIndex {
	fn len(&self) -> usize { self.manifest.rows }

	fn search(&self, query_vec: &[f32], k: usize) -> anyhow::Result<Vec<SearchHit>> {
		if k == 0 || self.manifest.rows == 0 { return Ok(Vec::new()); }
		anyhow::ensure!(query_vec.len() == self.manifest.dim, "query has {} dims, index has {}", query_vec.len(), self.manifest.dim);
		let hits = self.runtime.block_on(self.search_async(query_vec, k))?;
		debug!(k, returned = hits.len(), "lance search");
		Ok(hits)
	}
}
