// Integration tests for fincabot
use fincabot::prelude::*;
use std::collections::BTreeMap;
use std::path::Path;

fn listing(id: &str, beds: u32, town: &str, price: f64) -> Listing {
    Listing {
        id: id.to_string(),
        date: "2024-02-11".to_string(),
        reference: format!("R-{id}"),
        price,
        currency: "EUR".to_string(),
        price_freq: PriceFrequency::Sale,
        property_type: "Apartment".to_string(),
        town: town.to_string(),
        province: Some("Alicante".to_string()),
        country: "Spain".to_string(),
        beds: Some(beds),
        baths: Some(1),
        surface_built: Some(70.0),
        descriptions: BTreeMap::from([(
            "es".to_string(),
            format!("Piso de {beds} dormitorios en {town}"),
        )]),
        features: vec!["Terrace".to_string()],
        name: format!("{town} apartment"),
        ..Listing::default()
    }
}

fn scenario_listings() -> Vec<Listing> {
    vec![
        listing("1", 2, "Guardamar", 140_000.0),
        listing("2", 4, "Torrevieja", 300_000.0),
    ]
}

fn volatile(backend: BackendKind) -> Box<dyn ListingStore> {
    create_store(&StoreConfig {
        backend,
        mode: StorageMode::Volatile,
        embed_model: DEFAULT_MODEL.to_string(),
    })
    .unwrap()
}

fn durable(backend: BackendKind, dir: &Path, model: &str) -> Box<dyn ListingStore> {
    create_store(&StoreConfig {
        backend,
        mode: StorageMode::Durable(dir.to_path_buf()),
        embed_model: model.to_string(),
    })
    .unwrap()
}

#[test]
fn test_load_then_needs_loading_is_false() {
    for backend in [BackendKind::Hnsw, BackendKind::Flat] {
        let store = volatile(backend);
        assert!(store.needs_loading());

        store.load(&scenario_listings()).unwrap();
        assert!(!store.needs_loading(), "{backend:?}");
    }
}

#[test]
fn test_clear_returns_the_store_to_empty() {
    for backend in [BackendKind::Hnsw, BackendKind::Flat] {
        let store = volatile(backend);
        store.load(&scenario_listings()).unwrap();
        store.clear().unwrap();
        assert!(store.needs_loading(), "{backend:?}");
        assert!(store.search("apartment", 5).is_empty());
    }
}

#[test]
fn test_search_before_load_returns_empty_not_error() {
    for backend in [BackendKind::Hnsw, BackendKind::Flat] {
        let store = volatile(backend);
        assert!(store.search("2 bedroom apartment", 5).is_empty());
    }
}

#[test]
fn test_search_returns_at_most_top_k() {
    for backend in [BackendKind::Hnsw, BackendKind::Flat] {
        let store = volatile(backend);
        store.load(&scenario_listings()).unwrap();

        assert_eq!(store.search("apartment in Spain", 1).len(), 1);
        assert_eq!(store.search("apartment in Spain", 2).len(), 2);
        // more requested than indexed: return what is available
        assert_eq!(store.search("apartment in Spain", 10).len(), 2);
    }
}

#[test]
fn test_scores_are_presented_higher_is_better() {
    for backend in [BackendKind::Hnsw, BackendKind::Flat] {
        let store = volatile(backend);
        store
            .load(&[
                listing("1", 2, "Guardamar", 140_000.0),
                listing("2", 3, "Torrevieja", 200_000.0),
                listing("3", 4, "Orihuela", 300_000.0),
            ])
            .unwrap();

        let matches = store.search("2 bedroom apartment Guardamar", 3);
        assert!(!matches.is_empty());
        for pair in matches.windows(2) {
            assert!(pair[0].score >= pair[1].score, "{backend:?}");
        }
    }
}

#[test]
fn test_empty_load_fails_and_leaves_nothing_loaded() {
    for backend in [BackendKind::Hnsw, BackendKind::Flat] {
        let store = volatile(backend);
        assert!(matches!(store.load(&[]), Err(Error::EmptyLoad)));
        assert!(store.needs_loading(), "{backend:?}");
    }
}

#[test]
fn test_query_retrieves_the_matching_listing() {
    for backend in [BackendKind::Hnsw, BackendKind::Flat] {
        let store = volatile(backend);
        store.load(&scenario_listings()).unwrap();

        let matches = store.search("2 bedroom apartment Guardamar", 1);
        assert_eq!(matches.len(), 1, "{backend:?}");
        assert_eq!(matches[0].listing.id, "1", "{backend:?}");

        let matches = store.search("4 bedroom apartment Torrevieja", 1);
        assert_eq!(matches.len(), 1, "{backend:?}");
        assert_eq!(matches[0].listing.id, "2", "{backend:?}");
    }
}

#[test]
fn test_durable_store_survives_restart_without_reload() {
    for backend in [BackendKind::Hnsw, BackendKind::Flat] {
        let dir = tempfile::tempdir().unwrap();

        let store = durable(backend, dir.path(), DEFAULT_MODEL);
        assert!(store.needs_loading(), "{backend:?}");
        store.load(&scenario_listings()).unwrap();
        drop(store);

        // New instance over the same directory: no load call needed.
        let reopened = durable(backend, dir.path(), DEFAULT_MODEL);
        assert!(!reopened.needs_loading(), "{backend:?}");
        assert_eq!(reopened.len(), 2, "{backend:?}");

        let matches = reopened.search("2 bedroom apartment Guardamar", 1);
        assert_eq!(matches.len(), 1, "{backend:?}");
        assert_eq!(matches[0].listing.id, "1", "{backend:?}");
    }
}

#[test]
fn test_clear_removes_durable_artifacts() {
    let dir = tempfile::tempdir().unwrap();
    let store = durable(BackendKind::Hnsw, dir.path(), DEFAULT_MODEL);
    store.load(&scenario_listings()).unwrap();
    store.clear().unwrap();

    assert!(store.needs_loading());
    assert!(!dir.path().join("listings.db").exists());

    let reopened = durable(BackendKind::Hnsw, dir.path(), DEFAULT_MODEL);
    assert!(reopened.needs_loading());
}

#[test]
fn test_flat_store_requires_both_artifacts() {
    let dir = tempfile::tempdir().unwrap();
    let store = durable(BackendKind::Flat, dir.path(), DEFAULT_MODEL);
    store.load(&scenario_listings()).unwrap();
    assert!(dir.path().join("index.bin").exists());
    assert!(dir.path().join("listings.bin").exists());
    drop(store);

    // Losing the side table alone flips the store back to needing a load.
    std::fs::remove_file(dir.path().join("listings.bin")).unwrap();
    let reopened = durable(BackendKind::Flat, dir.path(), DEFAULT_MODEL);
    assert!(reopened.needs_loading());
}

#[test]
fn test_persisted_index_under_a_different_model_is_rejected() {
    for backend in [BackendKind::Hnsw, BackendKind::Flat] {
        let dir = tempfile::tempdir().unwrap();

        let store = durable(backend, dir.path(), "trigram-en-256");
        store.load(&scenario_listings()).unwrap();
        drop(store);

        let mismatched = durable(backend, dir.path(), "trigram-en-512");
        assert!(
            matches!(
                mismatched.load(&scenario_listings()),
                Err(Error::DimensionMismatch { .. })
            ),
            "{backend:?}"
        );
        // Searching through the mismatched artifact degrades to no results.
        assert!(mismatched.search("apartment", 5).is_empty(), "{backend:?}");
    }
}

#[test]
fn test_feed_to_store_pipeline() {
    let xml = r#"<root>
      <property>
        <id>1</id>
        <ref>GM-1</ref>
        <price>140000</price>
        <currency>EUR</currency>
        <price_freq>sale</price_freq>
        <type>Apartment</type>
        <town>Guardamar</town>
        <province>Alicante</province>
        <country>Spain</country>
        <beds>2</beds>
        <baths>1</baths>
        <desc><es>Apartamento cerca de la playa</es></desc>
        <features><feature>Terrace</feature></features>
        <pool>1</pool>
        <property_name>Beachside apartment</property_name>
      </property>
      <property>
        <id>2</id>
        <ref>TV-2</ref>
        <price>300000</price>
        <currency>EUR</currency>
        <price_freq>sale</price_freq>
        <type>Villa</type>
        <town>Torrevieja</town>
        <country>Spain</country>
        <beds>4</beds>
        <baths>3</baths>
        <desc><es>Villa con piscina privada</es></desc>
        <pool>1</pool>
        <property_name>Villa Mirador</property_name>
      </property>
    </root>"#;

    let listings = fincabot::parse_feed(xml).unwrap();
    assert_eq!(listings.len(), 2);

    let store = volatile(BackendKind::Hnsw);
    store.load(&listings).unwrap();

    let matches = store.search("2 bedroom apartment Guardamar", 1);
    assert_eq!(matches.len(), 1);
    assert_eq!(matches[0].listing.id, "1");
    assert_eq!(matches[0].listing.beds, Some(2));
    assert!(matches[0].listing.pool);
}

#[test]
fn test_reload_replaces_the_whole_working_set() {
    let dir = tempfile::tempdir().unwrap();
    let store = durable(BackendKind::Hnsw, dir.path(), DEFAULT_MODEL);

    store.load(&scenario_listings()).unwrap();
    store
        .load(&[listing("7", 3, "Orihuela", 210_000.0)])
        .unwrap();

    assert_eq!(store.len(), 1);
    let matches = store.search("apartment", 10);
    assert!(matches.iter().all(|m| m.listing.id == "7"));

    // The replacement is what persisted, too.
    drop(store);
    let reopened = durable(BackendKind::Hnsw, dir.path(), DEFAULT_MODEL);
    assert_eq!(reopened.len(), 1);
}
