//! Domain types shared by the catalog, the vector services and the engine.

use serde::{Deserialize, Serialize};
use std::fmt;

/// One assessment record from the catalog snapshot.
///
/// - `url`: stable identity, unique within a catalog
/// - `duration`: completion time in minutes; `None` means untimed/unknown
/// - `test_types`: domain labels as published by the catalog (free text,
///   usually one of the [`Domain`] labels)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogItem {
    pub url: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub duration: Option<u32>,
    #[serde(default, with = "yes_no")]
    pub remote_support: bool,
    #[serde(default, with = "yes_no")]
    pub adaptive_support: bool,
    #[serde(default)]
    pub test_types: Vec<String>,
}

impl CatalogItem {
    pub fn fits_duration(&self, max_minutes: u32) -> bool {
        self.duration.map_or(true, |d| d <= max_minutes)
    }

    pub fn matches_domain(&self, domain: Domain) -> bool {
        self.test_types.iter().any(|t| t.contains(domain.label()))
    }
}

/// Fixed topic vocabulary. Declaration order is the canonical order used for
/// detection output and bucket priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Domain {
    KnowledgeSkills,
    PersonalityBehaviour,
    AbilityAptitude,
    Competencies,
    Simulations,
    BiodataSituationalJudgement,
}

impl Domain {
    pub const ALL: [Domain; 6] = [
        Domain::KnowledgeSkills,
        Domain::PersonalityBehaviour,
        Domain::AbilityAptitude,
        Domain::Competencies,
        Domain::Simulations,
        Domain::BiodataSituationalJudgement,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Domain::KnowledgeSkills => "Knowledge & Skills",
            Domain::PersonalityBehaviour => "Personality & Behaviour",
            Domain::AbilityAptitude => "Ability & Aptitude",
            Domain::Competencies => "Competencies",
            Domain::Simulations => "Simulations",
            Domain::BiodataSituationalJudgement => "Biodata & Situational Judgement",
        }
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Per-request view of the query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QueryContext {
    pub text: String,
    pub detected_domains: Vec<Domain>,
    pub duration_constraint: Option<u32>,
}

/// A catalog item scored against one query. Scores are only comparable
/// within the retrieval batch that produced them.
#[derive(Debug, Clone, Copy)]
pub struct Candidate<'a> {
    pub item: &'a CatalogItem,
    pub score: f32,
}

/// Raw answer from a vector index: a catalog row position and its similarity.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub row: usize,
    pub score: f32,
}

/// Item returned to callers of the engine.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recommendation {
    pub url: String,
    pub name: String,
    #[serde(with = "yes_no")]
    pub adaptive_support: bool,
    pub description: String,
    pub duration: Option<u32>,
    #[serde(with = "yes_no")]
    pub remote_support: bool,
    #[serde(rename = "test_type")]
    pub test_types: Vec<String>,
    pub score: f32,
}

impl From<Candidate<'_>> for Recommendation {
    fn from(c: Candidate<'_>) -> Self {
        let item = c.item;
        Self {
            url: item.url.clone(),
            name: item.name.clone(),
            adaptive_support: item.adaptive_support,
            description: item.description.clone(),
            duration: item.duration,
            remote_support: item.remote_support,
            test_types: item.test_types.clone(),
            score: c.score,
        }
    }
}

/// The snapshot stores support flags as "Yes"/"No"; plain booleans are accepted too.
mod yes_no {
    use serde::{Deserialize, Deserializer, Serializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Text(String),
    }

    #[allow(clippy::trivially_copy_pass_by_ref)]
    pub fn serialize<S: Serializer>(value: &bool, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(if *value { "Yes" } else { "No" })
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
        Ok(match Flag::deserialize(deserializer)? {
            Flag::Bool(b) => b,
            Flag::Text(s) => matches!(s.trim().to_ascii_lowercase().as_str(), "yes" | "y" | "true" | "1"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_snapshot_record_with_yes_no_flags() {
        let raw = r#"{
            "name": "Java 8 (New)",
            "url": "https://example.com/java-8-new/",
            "description": "Multi-choice test",
            "duration": 18,
            "remote_support": "Yes",
            "adaptive_support": "No",
            "test_types": ["Knowledge & Skills"]
        }"#;
        let item: CatalogItem = serde_json::from_str(raw).unwrap();
        assert!(item.remote_support);
        assert!(!item.adaptive_support);
        assert_eq!(item.duration, Some(18));
        assert!(item.matches_domain(Domain::KnowledgeSkills));
        assert!(!item.matches_domain(Domain::Simulations));
    }

    #[test]
    fn missing_optional_fields_take_defaults() {
        let item: CatalogItem =
            serde_json::from_str(r#"{"url": "u", "duration": null, "remote_support": true}"#).unwrap();
        assert_eq!(item.duration, None);
        assert!(item.remote_support);
        assert!(item.test_types.is_empty());
        assert!(item.fits_duration(1), "untimed items fit any bound");
    }

    #[test]
    fn recommendation_uses_response_field_names() {
        let item = CatalogItem {
            url: "u".into(),
            name: "n".into(),
            description: String::new(),
            duration: None,
            remote_support: true,
            adaptive_support: false,
            test_types: vec!["Simulations".into()],
        };
        let rec = Recommendation::from(Candidate { item: &item, score: 0.5 });
        let json = serde_json::to_value(&rec).unwrap();
        assert_eq!(json["test_type"][0], "Simulations");
        assert_eq!(json["remote_support"], "Yes");
        assert_eq!(json["adaptive_support"], "No");
    }

    #[test]
    fn canonical_order_is_declaration_order() {
        let mut shuffled = vec![Domain::Simulations, Domain::KnowledgeSkills, Domain::Competencies];
        shuffled.sort();
        assert_eq!(shuffled, vec![Domain::KnowledgeSkills, Domain::Competencies, Domain::Simulations]);
    }
}
