//! Offline recall@k against a labelled query set.
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::Path;
use tracing::{error, info};

use assessrec_engine::RecommendationEngine;

#[derive(Debug, Deserialize)]
struct LabelRow {
    #[serde(alias = "Query")]
    query: String,
    #[serde(alias = "Assessment_url")]
    assessment_url: String,
}

/// One query with every url judged relevant for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelledQuery {
    pub query: String,
    pub relevant: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct QueryRecall {
    pub query: String,
    pub relevant: usize,
    pub predicted: usize,
    pub recall: f64,
}

#[derive(Debug, Serialize)]
pub struct EvalReport {
    pub k: usize,
    pub mean_recall_at_k: f64,
    pub per_query: Vec<QueryRecall>,
}

impl EvalReport {
    pub fn print(&self) {
        println!("\nMean Recall@{} over {} queries", self.k, self.per_query.len());
        for q in &self.per_query {
            let head: String = q.query.chars().take(80).collect();
            println!("  [{:.4}] {head}", q.recall);
        }
        println!("  Mean Recall@{}: {:.4}", self.k, self.mean_recall_at_k);
    }
}

fn normalize(url: &str) -> &str {
    url.trim().trim_end_matches('/')
}

/// Read `Query,Assessment_url` rows, grouping urls per query in first-seen order.
pub fn load_labels(path: &Path) -> Result<Vec<LabelledQuery>> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .with_context(|| format!("opening {}", path.display()))?;
    let mut order: Vec<LabelledQuery> = Vec::new();
    let mut by_query: HashMap<String, usize> = HashMap::new();
    for row in reader.deserialize::<LabelRow>() {
        let row = row.with_context(|| format!("reading {}", path.display()))?;
        let url = normalize(&row.assessment_url);
        if row.query.is_empty() || url.is_empty() { continue; }
        let slot = *by_query.entry(row.query.clone()).or_insert_with(|| {
            order.push(LabelledQuery { query: row.query.clone(), relevant: Vec::new() });
            order.len() - 1
        });
        order[slot].relevant.push(url.to_string());
    }
    info!(path = %path.display(), queries = order.len(), "loaded labelled queries");
    Ok(order)
}

/// Share of `relevant` found in the first `k` predictions; trailing slashes are ignored.
pub fn recall_at_k(predicted: &[String], relevant: &[String], k: usize) -> f64 {
    let relevant: HashSet<&str> = relevant.iter().map(|u| normalize(u)).collect();
    if relevant.is_empty() { return 0.0; }
    let top: HashSet<&str> = predicted.iter().take(k).map(|u| normalize(u)).collect();
    top.intersection(&relevant).count() as f64 / relevant.len() as f64
}

/// A query that fails to produce recommendations scores zero.
pub fn evaluate(engine: &RecommendationEngine, labels: &[LabelledQuery], k: usize) -> EvalReport {
    let per_query: Vec<QueryRecall> = labels
        .iter()
        .map(|l| {
            let predicted: Vec<String> = match engine.recommend(&l.query, k) {
                Ok(out) => out.items.into_iter().map(|r| r.url).collect(),
                Err(e) => {
                    error!(query = %l.query, error = %e, "recommendation failed");
                    Vec::new()
                }
            };
            let recall = recall_at_k(&predicted, &l.relevant, k);
            info!(relevant = l.relevant.len(), predicted = predicted.len(), k, recall, "scored query");
            QueryRecall { query: l.query.clone(), relevant: l.relevant.len(), predicted: predicted.len(), recall }
        })
        .collect();
    let mean_recall_at_k =
        if per_query.is_empty() { 0.0 } else { per_query.iter().map(|q| q.recall).sum::<f64>() / per_query.len() as f64 };
    EvalReport { k, mean_recall_at_k, per_query }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn urls(xs: &[&str]) -> Vec<String> {
        xs.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn recall_ignores_trailing_slash() {
        let predicted = urls(&["https://x/a/", "https://x/b", "https://x/c"]);
        let relevant = urls(&["https://x/a", "https://x/c/", "https://x/d"]);
        assert!((recall_at_k(&predicted, &relevant, 10) - 2.0 / 3.0).abs() < 1e-9);
        assert!((recall_at_k(&predicted, &relevant, 1) - 1.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn recall_with_no_relevant_is_zero() {
        assert_eq!(recall_at_k(&urls(&["https://x/a"]), &[], 10), 0.0);
    }

    #[test]
    fn labels_grouped_by_query() {
        let mut f = NamedTempFile::new().unwrap();
        writeln!(f, "Query,Assessment_url").unwrap();
        writeln!(f, "java developer,https://x/java/").unwrap();
        writeln!(f, "sales role,https://x/sales").unwrap();
        writeln!(f, "java developer,https://x/sql").unwrap();
        writeln!(f, "empty url,").unwrap();
        let labels = load_labels(f.path()).unwrap();
        assert_eq!(
            labels,
            vec![
                LabelledQuery { query: "java developer".into(), relevant: urls(&["https://x/java", "https://x/sql"]) },
                LabelledQuery { query: "sales role".into(), relevant: urls(&["https://x/sales"]) },
            ]
        );
    }

    #[test]
    fn lowercase_headers_accepted() {
        let mut f = NamedTempFile::new().unwrap();
        writeln!(f, "query,assessment_url").unwrap();
        writeln!(f, "\"numerical, verbal\",https://x/verify").unwrap();
        let labels = load_labels(f.path()).unwrap();
        assert_eq!(labels[0].query, "numerical, verbal");
    }
}
