//! Heuristic query understanding: topic domains and an optional time bound.
use regex::Regex;
use std::sync::LazyLock;

use assessrec_core::types::{Domain, QueryContext};

/// Trigger phrases per domain, matched as lowercase substrings of the query.
/// Phrases with a trailing space only match when followed by a literal space.
pub fn lexicon(domain: Domain) -> &'static [&'static str] {
    match domain {
        Domain::KnowledgeSkills => &[
            "java", "python", "sql", "javascript", "coding", "programming", "developer",
            "software", "technical", "c++", "c#", ".net", "react", "angular", "node",
            "data", "analyst", "excel", "ms office", "word", "powerpoint", "accounting",
            "finance", "financial", "database", "cloud", "aws", "azure",
            "machine learning", "ml", "ai", "engineer", "engineering",
            "html", "css", "typescript", "r ", "rust", "golang", "go ",
            "testing", "qa", "devops", "kubernetes", "docker",
        ],
        Domain::PersonalityBehaviour => &[
            "personality", "behaviour", "behavior", "collaboration", "collaborate",
            "teamwork", "communication", "leadership", "interpersonal", "stakeholder",
            "culture", "values", "motivation", "soft skill", "emotional", "resilience",
            "attitude", "work style", "competency", "competencies",
        ],
        Domain::AbilityAptitude => &[
            "cognitive", "aptitude", "reasoning", "verbal", "numerical", "logical",
            "critical thinking", "problem solving", "abstract", "spatial", "mental",
            "iq", "intelligence", "thinking", "analytical", "analysis",
        ],
        Domain::Competencies => &[
            "competency", "competencies", "360", "management", "leadership",
            "strategic", "executive",
        ],
        Domain::Simulations => &["simulation", "situational", "scenario", "sjt", "in-tray", "inbox"],
        Domain::BiodataSituationalJudgement => &[
            "situational judgement", "sjt", "biodata", "background", "experience",
        ],
    }
}

/// Explicit bound: "under 30 minutes", "max 20 mins", "completed in 45 min".
static BOUNDED_DURATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:within|less than|under|max(?:imum)?|no more than|completed? in)\s*(\d+)\s*(?:minutes?|mins?)")
        .expect("valid regex")
});

/// Any "N minutes" mention.
static BARE_DURATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(\d+)\s*(?:minutes?|mins?)\b").expect("valid regex"));

/// Every domain whose lexicon hits the query, in canonical order.
pub fn detect_domains(query: &str) -> Vec<Domain> {
    let lowered = query.to_lowercase();
    Domain::ALL
        .into_iter()
        .filter(|d| lexicon(*d).iter().any(|kw| lowered.contains(kw)))
        .collect()
}

/// Maximum duration in minutes requested by the query, if any.
///
/// The bounded phrasing wins over a bare "N minutes" anywhere in the text;
/// within a tier the first usable occurrence wins. Zero and numbers that do
/// not fit a `u32` are skipped.
pub fn extract_duration_constraint(query: &str) -> Option<u32> {
    [&*BOUNDED_DURATION, &*BARE_DURATION].into_iter().find_map(|re| {
        re.captures_iter(query)
            .filter_map(|caps| caps.get(1)?.as_str().parse::<u32>().ok())
            .find(|minutes| *minutes > 0)
    })
}

pub fn analyze(query: &str) -> QueryContext {
    let text = query.trim();
    QueryContext {
        text: text.to_string(),
        // untrimmed, so a trailing "go " still counts
        detected_domains: detect_domains(query),
        duration_constraint: extract_duration_constraint(text),
    }
}
