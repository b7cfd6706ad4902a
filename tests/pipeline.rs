use chrono::Utc;
use shelf_match::model::COMPETITOR_COLUMNS;
use shelf_match::storage::SqliteStorage;
use shelf_match::{
    CatalogRecord, Currency, Lexicon, PipelineError, ProductPipeline, RawProductRecord, Udm, Unit,
};

fn listing(name: &str, price: f64, currency: Currency, source_id: &str) -> RawProductRecord {
    RawProductRecord {
        name: name.to_string(),
        price,
        currency,
        source_id: source_id.to_string(),
        url: format!("https://{source_id}.example/item"),
        captured_at: Utc::now(),
    }
}

fn catalog_row(catalog_id: i64, name: &str, price: f64, profit: f64) -> CatalogRecord {
    CatalogRecord {
        catalog_id,
        product: listing(name, price, Currency::Usd, "catalog"),
        profit,
    }
}

fn catalog() -> Vec<CatalogRecord> {
    vec![
        catalog_row(101, "P.A.N. harina blanca de maiz 1 kg", 1.20, 30.5),
        catalog_row(101, "P.A.N. harina blanca de maiz 1 kg", 1.30, 28.0),
        catalog_row(102, "Arroz Diana 1kg", 1.45, 12.0),
        catalog_row(103, "Aceite de Girasol Vatel 1L", 3.10, 40.0),
        catalog_row(104, "Salsa de Tomate Pampero 397g", 1.95, 8.5),
    ]
}

fn pipeline(threshold: u8) -> ProductPipeline {
    ProductPipeline::new(Lexicon::embedded().unwrap(), threshold)
}

fn approx(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

#[test]
fn test_enrichment_of_both_sides_of_a_match() {
    let pipeline = pipeline(85);
    let enricher = pipeline.enricher();
    let market = enricher.normalize(&listing("Harina P.A.N. Blanca 1Kg", 1.25, Currency::Usd, "kalea"));
    let internal = enricher.normalize(&catalog()[0].product);

    assert_eq!(market.brand.as_deref(), Some("p.a.n."));
    assert_eq!(internal.brand.as_deref(), Some("p.a.n."));
    assert_eq!(market.udm, Some(Udm::new(1.0, Unit::Kilogramos)));
    assert_eq!(internal.udm, market.udm);
    assert_eq!(internal.normalized_name, "1 blanca harina kg maiz p.a.n.");
}

#[test]
fn test_pan_listing_matches_catalog() {
    let market = vec![listing("Harina P.A.N. Blanca 1Kg", 1.25, Currency::Usd, "kalea")];
    let output = pipeline(85).match_records(&market, &catalog()).unwrap();

    assert_eq!(output.matches.len(), 1);
    let m = &output.matches[0];
    assert_eq!(m.catalog_id, 101);
    assert_eq!(m.source_id, "kalea");
    assert!(m.score >= 85, "score {}", m.score);
}

#[test]
fn test_different_quantity_does_not_match() {
    let market = vec![
        listing("Arroz Diana 900g", 1.30, Currency::Usd, "kalea"),
        listing("Aceite Vatel Girasol 1L", 3.05, Currency::Usd, "kalea"),
    ];
    let output = pipeline(85).match_records(&market, &catalog()).unwrap();

    assert!(output.matches.iter().all(|m| m.catalog_id != 102));
    assert_eq!(output.matches.len(), 1);
    assert_eq!(output.matches[0].catalog_id, 103);
    assert_eq!(output.stats.unmatched, 1);
    assert!(output.stats.unit_rejections >= 1);
}

#[test]
fn test_different_known_brands_do_not_match() {
    let market = vec![listing("Galletas rellenas de chocolate Oreo 36g", 0.80, Currency::Usd, "kalea")];
    let catalog = vec![
        catalog_row(7, "Galletas rellenas de chocolate Kinder 36g", 0.95, 10.0),
        catalog_row(8, "Oreo Galletas rellenas de chocolate 36g", 0.75, 6.0),
    ];
    let output = pipeline(85).match_records(&market, &catalog).unwrap();

    assert_eq!(output.matches.len(), 1);
    assert_eq!(output.matches[0].catalog_id, 8);
    assert_eq!(output.stats.brand_rejections, 1);

    let kinder_only = &catalog[..1];
    assert!(matches!(
        pipeline(85).match_records(&market, kinder_only),
        Err(PipelineError::NoMatches { .. })
    ));
}

#[test]
fn test_only_unmatched_records_is_fatal() {
    let market = vec![listing("Arroz Diana 900g", 1.30, Currency::Usd, "kalea")];
    match pipeline(85).match_records(&market, &catalog()) {
        Err(PipelineError::NoMatches { market, catalog }) => {
            assert_eq!(market, 1);
            assert_eq!(catalog, 5);
        }
        other => panic!("Expected NoMatches, got {other:?}"),
    }
}

#[test]
fn test_empty_catalog_is_fatal() {
    let market = vec![listing("Harina P.A.N. Blanca 1Kg", 1.25, Currency::Usd, "kalea")];
    assert!(matches!(
        pipeline(85).match_records(&market, &[]),
        Err(PipelineError::NoMatches { .. })
    ));
}

#[test]
fn test_many_listings_map_to_one_catalog_product() {
    let market = vec![
        listing("Harina P.A.N. Blanca 1Kg", 1.25, Currency::Usd, "kalea"),
        listing("P.A.N. Harina Blanca 1 Kg", 118.0, Currency::Bsd, "kromi"),
        listing("Salsa Pampero de Tomate 397 g", 1.89, Currency::Usd, "kalea"),
    ];
    let output = pipeline(85).match_records(&market, &catalog()).unwrap();

    let pan: Vec<_> = output.matches.iter().filter(|m| m.catalog_id == 101).collect();
    assert_eq!(pan.len(), 2);
    assert_eq!(pan[1].score, 100);
    assert!(approx(pan[1].market_price, 1.18));

    assert_eq!(output.stats.accepted, 3);
    assert_eq!(output.stats.per_vendor.get("kalea"), Some(&2));
    assert_eq!(output.stats.per_vendor.get("kromi"), Some(&1));
}

#[test]
fn test_feature_table_values() {
    let market = vec![
        listing("Harina P.A.N. Blanca 1Kg", 1.25, Currency::Usd, "kalea"),
        listing("P.A.N. Harina Blanca 1 Kg", 118.0, Currency::Bsd, "kromi"),
    ];
    let features = pipeline(85).match_records(&market, &catalog()).unwrap().features;

    assert_eq!(features.vendors, vec!["kalea", "kromi"]);
    assert_eq!(features.rows.len(), 1);
    let row = &features.rows[0];
    assert_eq!(row.catalog_id, 101);
    assert_eq!(row.name, "P.A.N. harina blanca de maiz 1 kg");
    assert!(approx(row.profit_sum, 58.5));
    assert!(approx(row.mean_price, 1.25));
    assert!(approx(row.competitor_prices[0], 1.25));
    assert!(approx(row.competitor_prices[1], 1.18));
    assert_eq!(row.competitor_prices[COMPETITOR_COLUMNS - 1], 0.0);
}

#[test]
fn test_threshold_boundary_is_inclusive() {
    let market = vec![listing("Harina P.A.N. Blanca 1Kg", 1.25, Currency::Usd, "kalea")];
    let score = pipeline(0).match_records(&market, &catalog()).unwrap().matches[0].score;

    assert!(pipeline(score).match_records(&market, &catalog()).is_ok());
    assert!(matches!(
        pipeline(score + 1).match_records(&market, &catalog()),
        Err(PipelineError::NoMatches { .. })
    ));
}

#[test]
fn test_results_do_not_depend_on_input_order() {
    let market = vec![
        listing("Harina P.A.N. Blanca 1Kg", 1.25, Currency::Usd, "kalea"),
        listing("Aceite Vatel Girasol 1L", 3.05, Currency::Usd, "kalea"),
        listing("P.A.N. Harina Blanca 1 Kg", 118.0, Currency::Bsd, "kromi"),
    ];
    let pipeline = pipeline(85);
    let forward = pipeline.match_records(&market, &catalog()).unwrap();

    let mut reversed_market = market.clone();
    reversed_market.reverse();
    let mut reversed_catalog = catalog();
    reversed_catalog.reverse();
    let backward = pipeline.match_records(&reversed_market, &reversed_catalog).unwrap();

    let key = |m: &shelf_match::MatchResult| (m.market_name.clone(), m.catalog_id, m.score);
    let mut a: Vec<_> = forward.matches.iter().map(key).collect();
    let mut b: Vec<_> = backward.matches.iter().map(key).collect();
    a.sort();
    b.sort();
    assert_eq!(a, b);
    assert_eq!(forward.features.vendors, backward.features.vendors);
}

#[test]
fn test_outputs_persist_in_store() {
    let storage = SqliteStorage::open_in_memory().unwrap();
    storage.save_catalog_records(&catalog()).unwrap();

    let market = vec![listing("Harina P.A.N. Blanca 1Kg", 1.25, Currency::Usd, "kalea")];
    let pipeline = pipeline(85);
    let normalized = pipeline.enricher().normalize_all(&market);
    let output = pipeline
        .match_normalized(&normalized, &storage.get_catalog_records().unwrap())
        .unwrap();

    assert_eq!(storage.persist_run(&normalized, &output).unwrap(), 1);

    assert_eq!(storage.get_match_results().unwrap(), output.matches);
    assert_eq!(storage.get_feature_table().unwrap(), output.features);
    assert_eq!(storage.count_preprocessed("kalea").unwrap(), 1);
}
