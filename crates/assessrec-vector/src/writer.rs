use anyhow::{Context, Result};
use arrow_array::{FixedSizeListArray, RecordBatch, RecordBatchIterator, StringArray, UInt32Array};
use chrono::Utc;
use indicatif::{ProgressBar, ProgressStyle};
use lancedb::Connection;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

use assessrec_core::catalog::{search_document, Catalog};
use assessrec_core::traits::Embedder;

use crate::manifest::IndexManifest;
use crate::schema::build_index_schema;
use crate::table::{ensure_table, open_db};

const EMBED_BATCH: usize = 64;
const INSERT_BATCH: usize = 1000;

/// Embeds every catalog item and writes a fresh LanceDB index directory.
pub struct IndexWriter { dir: PathBuf, table: String }

impl IndexWriter {
	pub fn new(dir: &Path, table: &str) -> Self {
		Self { dir: dir.to_path_buf(), table: table.to_string() }
	}

	/// Rebuild the index from scratch. Rows are written in catalog order so
	/// that row `i` is item `i`.
	pub async fn build(&self, catalog: &Catalog, embedder: &dyn Embedder) -> Result<IndexManifest> {
		let embeddings = embed_catalog(catalog, embedder)?;
		let dim = embedder.dim();

		if self.dir.exists() { fs::remove_dir_all(&self.dir).with_context(|| format!("clearing {}", self.dir.display()))?; }
		fs::create_dir_all(&self.dir)?;
		let db = open_db(&self.dir.to_string_lossy()).await?;

		if catalog.is_empty() {
			ensure_table(&db, &self.table, build_index_schema(i32::try_from(dim)?)).await?;
		} else {
			let rows: Vec<(usize, &str, &Vec<f32>)> = catalog.items().iter().zip(&embeddings).enumerate().map(|(row, (item, v))| (row, item.url.as_str(), v)).collect();
			for batch in rows.chunks(INSERT_BATCH) { self.insert_batch(&db, batch, dim).await?; }
		}

		let manifest = IndexManifest {
			table: self.table.clone(),
			dim,
			rows: catalog.len(),
			embedder_id: embedder.id().to_string(),
			catalog_fingerprint: catalog.fingerprint().to_string(),
			built_at: Utc::now(),
		};
		manifest.write(&self.dir)?;
		info!(dir = %self.dir.display(), table = %self.table, rows = manifest.rows, dim, "index built");
		Ok(manifest)
	}

	async fn insert_batch(&self, db: &Connection, rows: &[(usize, &str, &Vec<f32>)], dim: usize) -> Result<()> {
		if rows.is_empty() { return Ok(()); }
		let record_batch = to_record_batch(rows, dim)?; let schema = record_batch.schema();
		let reader = Box::new(RecordBatchIterator::new(vec![Ok(record_batch)].into_iter(), schema));
		if db.table_names().execute().await?.contains(&self.table) {
			db.open_table(&self.table).execute().await?.add(reader).execute().await?;
		} else {
			db.create_table(&self.table, reader).execute().await?;
		}
		Ok(())
	}
}

/// Embed the search document of every item, in catalog order.
pub fn embed_catalog(catalog: &Catalog, embedder: &dyn Embedder) -> Result<Vec<Vec<f32>>> {
	let documents: Vec<String> = catalog.items().iter().map(search_document).collect();
	let pb = ProgressBar::new(documents.len() as u64);
	pb.set_style(ProgressStyle::default_bar().template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} assessments ({percent}%)")?.progress_chars("#>-"));
	let mut embeddings = Vec::with_capacity(documents.len());
	for chunk in documents.chunks(EMBED_BATCH) {
		let vectors = embedder.embed_batch(chunk)?;
		anyhow::ensure!(vectors.len() == chunk.len(), "embedder returned {} vectors for {} texts", vectors.len(), chunk.len());
		for v in &vectors { anyhow::ensure!(v.len() == embedder.dim(), "embedding has {} dims, expected {}", v.len(), embedder.dim()); }
		embeddings.extend(vectors);
		pb.set_position(embeddings.len() as u64);
	}
	pb.finish_and_clear();
	Ok(embeddings)
}

fn to_record_batch(rows: &[(usize, &str, &Vec<f32>)], dim: usize) -> Result<RecordBatch> {
	let dim = i32::try_from(dim)?;
	let schema = build_index_schema(dim);
	let mut row_ids = Vec::with_capacity(rows.len()); let mut urls = Vec::with_capacity(rows.len()); let mut vectors: Vec<Option<Vec<Option<f32>>>> = Vec::with_capacity(rows.len());
	for (row, url, vector) in rows { row_ids.push(u32::try_from(*row)?); urls.push(url.to_string()); vectors.push(Some(vector.iter().map(|&x| Some(x)).collect())); }
	let record_batch = RecordBatch::try_new(schema, vec![
		Arc::new(UInt32Array::from(row_ids)),
		Arc::new(StringArray::from(urls)),
		Arc::new(FixedSizeListArray::from_iter_primitive::<arrow_array::types::Float32Type, _, _>(vectors.into_iter(), dim)),
	])?;
	Ok(record_batch)
}
