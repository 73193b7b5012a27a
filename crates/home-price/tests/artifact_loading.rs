//! End-to-end checks for loading trained artifacts from disk and serving
//! estimates through the public router.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use home_price::pricing::{
    pricing_router, ArtifactPaths, ArtifactStore, LoadError, PriceQuery, PricingContext,
};
use serde_json::{json, Value};
use tower::ServiceExt;

const COLUMNS: &str = r#"{"data_columns": ["total_sqft", "age", "bhk", "as rao nagar", "kompally", "madhapur", "apartment", "independent house", "villa"]}"#;

fn write_artifacts(dir: &Path, columns: &str, model: &str) -> ArtifactPaths {
    let paths = ArtifactPaths {
        columns: dir.join("columns.json"),
        model: dir.join("home_prices_model.json"),
    };
    fs::write(&paths.columns, columns).expect("write columns");
    fs::write(&paths.model, model).expect("write model");
    paths
}

fn linear_model() -> String {
    json!({
        "coefficients": [0.06, -0.4, 3.5, 12.0, 6.0, 30.0, 0.0, 18.0, 45.0],
        "intercept": -8.25,
    })
    .to_string()
}

fn query(locality: &str, property_type: &str, area_sqft: f64, age_years: u32, bedrooms: u32) -> PriceQuery {
    PriceQuery {
        locality: locality.to_string(),
        property_type: property_type.to_string(),
        area_sqft,
        age_years,
        bedrooms,
    }
}

#[test]
fn loads_columns_and_model_from_directory() {
    let dir = tempfile::tempdir().expect("create temp dir");
    let paths = write_artifacts(dir.path(), COLUMNS, &linear_model());

    let store = ArtifactStore::load(&paths).expect("artifacts load");

    assert_eq!(
        store.get_locality_names(),
        ["as rao nagar", "kompally", "madhapur"]
    );
    assert_eq!(
        store.get_property_types(),
        ["apartment", "independent house", "villa"]
    );

    let price = store
        .estimate_price(&query("AS Rao Nagar", "Apartment", 680.0, 6, 2))
        .expect("estimate succeeds");
    // -8.25 + 40.8 - 2.4 + 7.0 + 12.0
    assert_eq!(price, 49.15);
}

#[test]
fn missing_model_file_is_a_load_error() {
    let dir = tempfile::tempdir().expect("create temp dir");
    let paths = ArtifactPaths {
        columns: dir.path().join("columns.json"),
        model: dir.path().join("absent.json"),
    };
    fs::write(&paths.columns, COLUMNS).expect("write columns");

    let err = ArtifactStore::load(&paths).expect_err("model file is missing");
    assert!(matches!(err, LoadError::Read { ref path, .. } if path == &paths.model));
}

#[test]
fn malformed_column_document_is_a_load_error() {
    let dir = tempfile::tempdir().expect("create temp dir");
    let paths = write_artifacts(dir.path(), "{\"data_columns\": ", &linear_model());

    let err = ArtifactStore::load(&paths).expect_err("columns are malformed");
    assert!(matches!(err, LoadError::Columns { .. }));
}

#[test]
fn coefficient_count_must_match_columns() {
    let dir = tempfile::tempdir().expect("create temp dir");
    let model = json!({ "coefficients": [1.0, 2.0], "intercept": 0.0 }).to_string();
    let paths = write_artifacts(dir.path(), COLUMNS, &model);

    let err = ArtifactStore::load(&paths).expect_err("widths differ");
    assert!(matches!(
        err,
        LoadError::WidthMismatch {
            columns: 9,
            coefficients: 2
        }
    ));
}

#[test]
fn recorded_feature_names_must_match_columns() {
    let dir = tempfile::tempdir().expect("create temp dir");
    let model = json!({
        "coefficients": vec![0.0; 9],
        "intercept": 0.0,
        "feature_names": ["a", "b", "c", "d", "e", "f", "g", "h", "i"],
    })
    .to_string();
    let paths = write_artifacts(dir.path(), COLUMNS, &model);

    let err = ArtifactStore::load(&paths).expect_err("names differ");
    assert!(matches!(err, LoadError::FeatureNames { .. }));
}

#[test]
fn degraded_load_keeps_an_empty_store() {
    let dir = tempfile::tempdir().expect("create temp dir");
    let paths = ArtifactPaths {
        columns: dir.path().join("missing-columns.json"),
        model: dir.path().join("missing-model.json"),
    };

    let store = ArtifactStore::load_or_degraded(&paths);

    assert!(!store.is_loaded());
    assert!(store.get_locality_names().is_empty());
}

#[tokio::test]
async fn router_serves_estimates_from_loaded_artifacts() {
    let dir = tempfile::tempdir().expect("create temp dir");
    let paths = write_artifacts(dir.path(), COLUMNS, &linear_model());
    let store = Arc::new(ArtifactStore::load(&paths).expect("artifacts load"));
    let router = pricing_router(Arc::new(PricingContext {
        store,
        catalog_max_age_secs: 60,
    }));

    let response = router
        .clone()
        .oneshot(
            Request::get("/get_location_names")
                .body(Body::empty())
                .expect("request builds"),
        )
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(header::CACHE_CONTROL).map(|v| v.as_bytes()),
        Some(&b"public, max-age=60, s-maxage=60"[..])
    );

    let response = router
        .oneshot(
            Request::post("/predict_home_price")
                .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(Body::from(
                    "locality=Kompally&property_type=Villa&area_in_sqft=1700&age_of_property=0&bedrooms=3",
                ))
                .expect("request builds"),
        )
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::OK);
    let body = axum::body::to_bytes(response.into_body(), 1024)
        .await
        .expect("read body");
    let payload: Value = serde_json::from_slice(&body).expect("json payload");
    // -8.25 + 102.0 + 10.5 + 6.0 + 45.0
    assert_eq!(payload, json!({ "estimated_price": 155.25 }));
}
