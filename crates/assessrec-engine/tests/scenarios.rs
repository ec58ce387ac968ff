use std::collections::HashSet;
use std::sync::Arc;

use assessrec_core::catalog::Catalog;
use assessrec_core::config::EngineSettings;
use assessrec_core::error::Error;
use assessrec_core::traits::{Embedder, VectorIndex};
use assessrec_core::types::{CatalogItem, Domain};
use assessrec_embed::HashEmbedder;
use assessrec_engine::{balancer, RecommendationEngine, DEFAULT_TOP_N};
use assessrec_vector::FlatIndex;

fn item(slug: &str, name: &str, test_type: &str, duration: Option<u32>) -> CatalogItem {
    CatalogItem {
        url: format!("https://catalog.test/view/{slug}/"),
        name: name.to_string(),
        description: format!("{name}. Measures {}.", test_type.to_lowercase()),
        duration,
        remote_support: true,
        adaptive_support: false,
        test_types: vec![test_type.to_string()],
    }
}

fn catalog() -> Catalog {
    let mut items = Vec::new();
    for (i, topic) in ["core java", "java frameworks", "java web services", "advanced java", "java design patterns", "java 8", "enterprise java beans", "java platform"].iter().enumerate() {
        items.push(item(&format!("java-{i}"), &format!("Java developer {topic}"), "Knowledge & Skills", Some(10 + 5 * i as u32)));
    }
    for (i, topic) in ["teamwork", "collaboration", "team player", "workplace collaboration"].iter().enumerate() {
        items.push(item(&format!("collab-{i}"), &format!("Team collaboration skills {topic}"), "Personality & Behaviour", Some(20)));
    }
    for (i, topic) in ["numerical", "verbal", "inductive", "deductive", "general"].iter().enumerate() {
        items.push(item(&format!("cog-{i}"), &format!("Cognitive {topic} reasoning test"), "Ability & Aptitude", Some(12 + i as u32)));
    }
    items.push(item("sim-0", "Contact center call simulation", "Simulations", None));
    Catalog::from_items(items).unwrap()
}

fn engine() -> RecommendationEngine {
    let catalog = Arc::new(catalog());
    let embedder = Arc::new(HashEmbedder::new(256));
    let index = Arc::new(FlatIndex::build(&catalog, embedder.as_ref()).unwrap());
    RecommendationEngine::new(catalog, embedder, index, EngineSettings::default()).unwrap()
}

#[test]
fn java_query_stays_technical() {
    let out = engine().recommend("Java developer", DEFAULT_TOP_N).unwrap();
    assert_eq!(out.context.detected_domains, vec![Domain::KnowledgeSkills]);
    assert_eq!(out.items.len(), 10);
    assert!(out.items[0].test_types.contains(&"Knowledge & Skills".to_string()));
}

#[test]
fn mixed_query_gets_both_domains() {
    let engine = engine();
    let query = "Java developer and team collaboration skills";
    let out = engine.recommend(query, 10).unwrap();
    assert_eq!(out.context.detected_domains, vec![Domain::KnowledgeSkills, Domain::PersonalityBehaviour]);
    assert_eq!(balancer::quota(10, 2), 5);

    // Pool of min(10 * 4, 18) candidates straight from the flat index.
    let catalog = catalog();
    let embedder = HashEmbedder::new(256);
    let index = FlatIndex::build(&catalog, &embedder).unwrap();
    let hits = index.search(&embedder.embed(query).unwrap(), 18).unwrap();
    let baseline: Vec<&CatalogItem> = hits.iter().map(|h| catalog.get(h.row).unwrap()).collect();
    assert_eq!(baseline.len(), 18);

    let has = |it: &CatalogItem, label: &str| it.test_types.iter().any(|t| t == label);
    let mut expected: Vec<&str> = Vec::new();
    for label in ["Knowledge & Skills", "Personality & Behaviour"] {
        expected.extend(baseline.iter().filter(|it| has(**it, label)).take(5).map(|it| it.url.as_str()));
    }
    // only four behavioural items exist, so one slot is filled from the baseline
    assert_eq!(expected.len(), 9);
    let fill = baseline.iter().map(|it| it.url.as_str()).find(|u| !expected.contains(u)).unwrap();
    expected.push(fill);

    let got: Vec<&str> = out.items.iter().map(|r| r.url.as_str()).collect();
    assert_eq!(got, expected);
}

#[test]
fn cognitive_query_respects_duration() {
    let out = engine().recommend("cognitive test under 15 minutes", 10).unwrap();
    assert_eq!(out.context.duration_constraint, Some(15));
    assert!(out.relaxation.is_none());
    assert!(out.items.len() >= 5);
    assert!(out.items.iter().all(|r| r.duration.map_or(true, |d| d <= 15)));
}

#[test]
fn tight_duration_is_relaxed() {
    let out = engine().recommend("java assessment within 10 minutes", 10).unwrap();
    let relaxation = out.relaxation.expect("only a couple of items fit");
    assert_eq!(relaxation.constraint, 10);
    assert!(relaxation.kept < 5);
    assert_eq!(out.items.len(), 10);
}

#[test]
fn results_are_unique_and_finite() {
    let out = engine().recommend("simulation for contact center and java skills", 10).unwrap();
    let urls: HashSet<&str> = out.items.iter().map(|r| r.url.as_str()).collect();
    assert_eq!(urls.len(), out.items.len());
    assert!(out.items.iter().all(|r| r.score.is_finite()));
}

#[test]
fn empty_query_is_invalid() {
    let err = engine().recommend("", 10).unwrap_err();
    assert!(matches!(err, Error::InvalidQuery(_)));
}

#[test]
fn same_query_same_answer() {
    let engine = engine();
    let a = engine.recommend("verbal reasoning and teamwork", 7).unwrap();
    let b = engine.recommend("verbal reasoning and teamwork", 7).unwrap();
    assert_eq!(a.items, b.items);
    assert_eq!(a.items.len(), 7);
}

#[test]
fn response_uses_catalog_field_names() {
    let out = engine().recommend("Java developer", 5).unwrap();
    let json = serde_json::to_value(&out.items[0]).unwrap();
    assert!(json.get("test_type").is_some());
    assert_eq!(json["remote_support"], "Yes");
    assert_eq!(json["adaptive_support"], "No");
}
