//! Job-description intake from a web page.
use anyhow::{Context, Result};
use scraper::{Html, Node};
use std::time::Duration;
use tracing::info;

/// Longest description passed on to the engine, in characters.
pub const MAX_JD_CHARS: usize = 5000;

const TIMEOUT: Duration = Duration::from_secs(20);
const USER_AGENT: &str = "Mozilla/5.0 (compatible; assessrec/0.1)";

/// Page chrome whose text is never part of the description.
const SKIPPED: [&str; 5] = ["script", "style", "nav", "footer", "header"];

/// Download `url` and reduce it to plain description text.
pub fn fetch_job_description(url: &str) -> Result<String> {
    let client = reqwest::blocking::Client::builder()
        .timeout(TIMEOUT)
        .user_agent(USER_AGENT)
        .build()
        .context("building http client")?;
    let body = client
        .get(url)
        .send()
        .and_then(|resp| resp.error_for_status())
        .and_then(|resp| resp.text())
        .with_context(|| format!("fetching {url}"))?;
    let text = html_to_text(&body);
    info!(url, bytes = body.len(), chars = text.chars().count(), "job description fetched");
    Ok(text)
}

/// Visible text of an HTML document: chrome elements dropped, whitespace
/// collapsed to single spaces, cut at [`MAX_JD_CHARS`].
pub fn html_to_text(html: &str) -> String {
    let document = Html::parse_document(html);
    let mut words = Vec::new();
    for node in document.tree.root().descendants() {
        let Some(text) = node.value().as_text() else { continue };
        let skipped = node.ancestors().any(|a| matches!(a.value(), Node::Element(e) if SKIPPED.contains(&e.name())));
        if !skipped {
            words.extend(text.split_whitespace());
        }
    }
    words.join(" ").chars().take(MAX_JD_CHARS).collect()
}
