use assessrec_core::catalog::Catalog;
use assessrec_core::error::Error;
use assessrec_core::traits::{Embedder, VectorIndex};
use assessrec_core::types::CatalogItem;
use assessrec_embed::HashEmbedder;
use assessrec_vector::{FlatIndex, IndexManifest, IndexWriter, LanceIndex};
use tempfile::TempDir;

fn item(url: &str, name: &str, types: &[&str]) -> CatalogItem {
    CatalogItem {
        url: url.to_string(),
        name: name.to_string(),
        description: format!("{name} assessment"),
        duration: Some(20),
        remote_support: true,
        adaptive_support: false,
        test_types: types.iter().map(|t| t.to_string()).collect(),
    }
}

fn catalog() -> Catalog {
    Catalog::from_items(vec![
        item("https://x/java", "Java 8 developer", &["Knowledge & Skills"]),
        item("https://x/opq", "Occupational personality questionnaire", &["Personality & Behaviour"]),
        item("https://x/verify", "Verify numerical reasoning", &["Ability & Aptitude"]),
        item("https://x/sql", "SQL server developer", &["Knowledge & Skills"]),
    ])
    .unwrap()
}

fn build(tmp: &TempDir, catalog: &Catalog, embedder: &HashEmbedder) -> IndexManifest {
    let rt = tokio::runtime::Runtime::new().unwrap();
    rt.block_on(IndexWriter::new(tmp.path(), "assessments").build(catalog, embedder)).expect("build")
}

#[test]
fn lance_index_matches_flat_index() {
    let tmp = TempDir::new().unwrap();
    let catalog = catalog();
    let embedder = HashEmbedder::new(64);
    let manifest = build(&tmp, &catalog, &embedder);
    assert_eq!(manifest.rows, 4);
    assert_eq!(manifest.dim, 64);

    let lance = LanceIndex::open(tmp.path(), &catalog, embedder.id()).expect("open");
    let flat = FlatIndex::build(&catalog, &embedder).expect("flat");
    assert_eq!(lance.len(), flat.len());

    let q = embedder.embed("java developer").unwrap();
    let lance_hits = lance.search(&q, 3).unwrap();
    let flat_hits = flat.search(&q, 3).unwrap();
    assert_eq!(lance_hits.len(), 3);
    assert_eq!(lance_hits[0].row, flat_hits[0].row, "both rank the same best row");
    assert!((lance_hits[0].score - flat_hits[0].score).abs() < 1e-4);
    for pair in lance_hits.windows(2) { assert!(pair[0].score >= pair[1].score); }
}

#[test]
fn rebuild_replaces_previous_index() {
    let tmp = TempDir::new().unwrap();
    let catalog = catalog();
    let embedder = HashEmbedder::new(32);
    build(&tmp, &catalog, &embedder);
    build(&tmp, &catalog, &embedder);
    let lance = LanceIndex::open(tmp.path(), &catalog, embedder.id()).expect("open");
    assert_eq!(lance.len(), 4, "no duplicated rows after a rebuild");
}

#[test]
fn opening_with_another_catalog_is_refused() {
    let tmp = TempDir::new().unwrap();
    let catalog = catalog();
    let embedder = HashEmbedder::new(32);
    build(&tmp, &catalog, &embedder);

    let smaller = Catalog::from_items(catalog.items()[..2].to_vec()).unwrap();
    let err = LanceIndex::open(tmp.path(), &smaller, embedder.id()).err().expect("must fail");
    assert!(matches!(err, Error::ServiceUnavailable(_)), "got {err:?}");
}

#[test]
fn empty_catalog_builds_an_empty_index() {
    let tmp = TempDir::new().unwrap();
    let catalog = Catalog::from_items(vec![]).unwrap();
    let embedder = HashEmbedder::new(16);
    build(&tmp, &catalog, &embedder);
    let lance = LanceIndex::open(tmp.path(), &catalog, embedder.id()).expect("open");
    assert!(lance.is_empty());
    assert!(lance.search(&embedder.embed("anything").unwrap(), 5).unwrap().is_empty());
}
