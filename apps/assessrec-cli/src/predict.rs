use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::{error, info};

use assessrec_engine::RecommendationEngine;

#[derive(Debug, Deserialize)]
struct QueryRow {
    #[serde(alias = "Query")]
    query: String,
}

#[derive(Debug, Serialize)]
struct PredictionRow<'a> {
    #[serde(rename = "Query")]
    query: &'a str,
    #[serde(rename = "Assessment_url")]
    assessment_url: &'a str,
}

/// Non-blank values of the `Query` column.
pub fn load_queries(path: &Path) -> Result<Vec<String>> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .with_context(|| format!("opening {}", path.display()))?;
    let mut queries = Vec::new();
    for row in reader.deserialize::<QueryRow>() {
        let row = row.with_context(|| format!("reading {}", path.display()))?;
        if !row.query.is_empty() { queries.push(row.query); }
    }
    info!(path = %path.display(), queries = queries.len(), "loaded queries");
    Ok(queries)
}

/// Write one row per recommendation. Failing queries are logged and skipped.
/// Returns the number of rows written.
pub fn write_predictions(engine: &RecommendationEngine, queries: &[String], top_n: usize, output: &Path) -> Result<usize> {
    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).with_context(|| format!("creating {}", parent.display()))?;
    }
    let mut writer = csv::Writer::from_path(output).with_context(|| format!("creating {}", output.display()))?;
    let mut rows = 0;
    for (i, query) in queries.iter().enumerate() {
        let out = match engine.recommend(query, top_n) {
            Ok(out) => out,
            Err(e) => {
                error!(n = i + 1, error = %e, "prediction failed");
                continue;
            }
        };
        for item in &out.items {
            writer.serialize(PredictionRow { query, assessment_url: &item.url })?;
            rows += 1;
        }
    }
    writer.flush()?;
    info!(path = %output.display(), rows, "predictions saved");
    Ok(rows)
}
