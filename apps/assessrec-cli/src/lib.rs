//! `assessrec` command line: build the index, ask for recommendations,
//! score a labelled set and write batch predictions.
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use assessrec_core::catalog::Catalog;
use assessrec_core::config::{Config, Settings};
use assessrec_core::types::Recommendation;
use assessrec_embed::build_embedder;
use assessrec_engine::{RecommendationEngine, Recommendations, DEFAULT_TOP_N};
use assessrec_vector::{IndexWriter, LanceIndex};

pub mod eval;
pub mod fetch;
pub mod predict;

#[derive(Debug, Parser)]
#[command(name = "assessrec", version, about = "Assessment recommendations from a job description or free-text query")]
pub struct Args {
    /// Directory holding config.toml (defaults to the working directory).
    #[arg(long, short = 'c', value_name = "DIR", global = true)]
    pub config_dir: Option<PathBuf>,
    /// Catalog JSON to use instead of `data.catalog_path`. An index built
    /// with an override must be queried with the same file.
    #[arg(long, value_name = "FILE", global = true)]
    pub catalog: Option<PathBuf>,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Embed the catalog snapshot and (re)build the vector index.
    Index,
    /// Recommend assessments; without a query or URL, read queries from stdin.
    Query {
        query: Option<String>,
        /// Fetch the job description from a web page.
        #[arg(long, value_name = "URL", conflicts_with = "query")]
        url: Option<String>,
        #[arg(long, short = 'n', default_value_t = DEFAULT_TOP_N)]
        top_n: usize,
        /// Print the full response as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Mean recall@k over a labelled CSV (`Query,Assessment_url`).
    Eval {
        #[arg(long, short = 'd', value_name = "FILE")]
        dataset: PathBuf,
        #[arg(long, short = 'k', default_value_t = 10)]
        k: usize,
        /// Also write the report as JSON.
        #[arg(long, value_name = "FILE")]
        out: Option<PathBuf>,
    },
    /// Recommend for every query in a CSV and write `Query,Assessment_url` rows.
    Predict {
        #[arg(long, short = 'i', value_name = "FILE")]
        input: PathBuf,
        #[arg(long, short = 'o', value_name = "FILE")]
        output: PathBuf,
        #[arg(long, short = 'n', default_value_t = DEFAULT_TOP_N)]
        top_n: usize,
    },
}

/// Log to stderr, `RUST_LOG` overriding the `info` default.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(io::stderr).init();
}

pub fn run(args: Args) -> Result<()> {
    let config = match &args.config_dir {
        Some(dir) => Config::load_from(dir),
        None => Config::load(),
    }
    .context("loading configuration")?;
    let settings = config.settings()?;
    info!(env = config.env_name(), backend = ?settings.embedding.backend, "configuration loaded");

    let catalog = args.catalog.as_deref();

    match args.command {
        Command::Index => build_index(&config, &settings, catalog),
        Command::Query { query, url, top_n, json } => {
            let engine = open_engine(&config, &settings, catalog)?;
            if let Some(url) = url {
                let text = fetch::fetch_job_description(&url)?;
                println!("Fetched job description ({} chars)", text.chars().count());
                return answer(&engine, &text, top_n, json);
            }
            match query {
                Some(q) => answer(&engine, &q, top_n, json),
                None => interactive(&engine, top_n, json),
            }
        }
        Command::Eval { dataset, k, out } => {
            let engine = open_engine(&config, &settings, catalog)?;
            let labels = eval::load_labels(&dataset)?;
            let report = eval::evaluate(&engine, &labels, k);
            report.print();
            if let Some(path) = out {
                std::fs::write(&path, serde_json::to_string_pretty(&report)?)
                    .with_context(|| format!("writing {}", path.display()))?;
                info!(path = %path.display(), "evaluation report saved");
            }
            Ok(())
        }
        Command::Predict { input, output, top_n } => {
            let engine = open_engine(&config, &settings, catalog)?;
            let queries = predict::load_queries(&input)?;
            let rows = predict::write_predictions(&engine, &queries, top_n, &output)?;
            println!("Predictions written to {} ({rows} rows, {} queries)", output.display(), queries.len());
            Ok(())
        }
    }
}

fn model_dir(config: &Config, settings: &Settings) -> Option<PathBuf> {
    settings.embedding.model_dir.as_deref().map(|p| config.resolve(p))
}

fn catalog_path(config: &Config, settings: &Settings, catalog_override: Option<&Path>) -> PathBuf {
    catalog_override.map_or_else(|| config.resolve(&settings.data.catalog_path), Path::to_path_buf)
}

fn build_index(config: &Config, settings: &Settings, catalog_override: Option<&Path>) -> Result<()> {
    let catalog = Catalog::load(&catalog_path(config, settings, catalog_override))?;
    let embedder = build_embedder(&settings.embedding, model_dir(config, settings))?;
    let index_dir = config.resolve(&settings.data.index_dir);

    let writer = IndexWriter::new(&index_dir, &settings.data.table);
    let manifest = tokio::runtime::Runtime::new()?.block_on(writer.build(&catalog, embedder.as_ref()))?;
    println!(
        "Indexed {} assessments into {} (table `{}`, {} dims, {})",
        manifest.rows,
        index_dir.display(),
        manifest.table,
        manifest.dim,
        manifest.embedder_id
    );
    Ok(())
}

/// Load catalog, embedder and index and wire them into an engine.
/// `catalog_override` replaces `data.catalog_path`.
pub fn open_engine(config: &Config, settings: &Settings, catalog_override: Option<&Path>) -> Result<RecommendationEngine> {
    let catalog = Arc::new(Catalog::load(&catalog_path(config, settings, catalog_override))?);
    let embedder = build_embedder(&settings.embedding, model_dir(config, settings))?;
    let index = LanceIndex::open(&config.resolve(&settings.data.index_dir), &catalog, embedder.id())?;
    Ok(RecommendationEngine::new(catalog, embedder, Arc::new(index), settings.engine)?)
}

fn answer(engine: &RecommendationEngine, query: &str, top_n: usize, json: bool) -> Result<()> {
    let out = engine.recommend(query, top_n)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        print_results(&out);
    }
    Ok(())
}

fn interactive(engine: &RecommendationEngine, top_n: usize, json: bool) -> Result<()> {
    println!("Assessment recommender (type 'quit' to exit)");
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        print!("\nquery> ");
        io::stdout().flush()?;
        let Some(line) = lines.next() else { break };
        let query = line?;
        let query = query.trim();
        if matches!(query.to_lowercase().as_str(), "quit" | "exit" | "q") { break; }
        if query.is_empty() { continue; }
        // a failed query should not end the session
        if let Err(e) = answer(engine, query, top_n, json) {
            eprintln!("error: {e:#}");
        }
    }
    Ok(())
}

fn print_results(out: &Recommendations) {
    let domains: Vec<&str> = out.context.detected_domains.iter().map(|d| d.label()).collect();
    println!("\n{} recommendations", out.items.len());
    if !domains.is_empty() { println!("Domains: {}", domains.join(", ")); }
    if let Some(r) = &out.relaxation {
        println!("Note: only {} assessments fit {} minutes; duration limit ignored", r.kept, r.constraint);
    } else if let Some(m) = out.context.duration_constraint {
        println!("Max duration: {m} min");
    }
    for (i, r) in out.items.iter().enumerate() {
        print_item(i + 1, r);
    }
}

fn print_item(rank: usize, r: &Recommendation) {
    let types = if r.test_types.is_empty() { "N/A".to_string() } else { r.test_types.join(", ") };
    let duration = r.duration.map_or_else(|| "N/A".to_string(), |d| format!("{d} min"));
    println!("\n  {rank}. {}  (score {:.4})", r.name, r.score);
    println!("     Type:     {types}");
    println!("     Duration: {duration}");
    println!("     URL:      {}", r.url);
    if !r.description.is_empty() {
        let desc: String = r.description.chars().take(120).collect();
        let ellipsis = if r.description.chars().count() > 120 { "..." } else { "" };
        println!("     Desc:     {desc}{ellipsis}");
    }
}
