use std::sync::{Arc, Mutex};

use axum::response::Response;
use serde_json::Value;

use crate::pricing::columns::FeatureColumns;
use crate::pricing::model::{ModelError, PriceModel};
use crate::pricing::router::{pricing_router, PricingContext};
use crate::pricing::store::ArtifactStore;

pub(super) const COLUMNS: [&str; 8] = [
    "area_sqft",
    "age",
    "bedrooms",
    "loc_a",
    "loc_b",
    "type_x",
    "type_y",
    "type_z",
];

pub(super) fn columns() -> FeatureColumns {
    FeatureColumns::new(COLUMNS.iter().map(|name| name.to_string()).collect())
        .expect("valid columns")
}

/// Linear model that remembers every vector it scores.
#[derive(Debug)]
pub(super) struct RecordingModel {
    weights: Vec<f64>,
    intercept: f64,
    calls: Mutex<Vec<Vec<f64>>>,
}

impl RecordingModel {
    pub(super) fn new(weights: Vec<f64>, intercept: f64) -> Self {
        Self {
            weights,
            intercept,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub(super) fn calls(&self) -> Vec<Vec<f64>> {
        self.calls.lock().expect("calls mutex poisoned").clone()
    }
}

impl PriceModel for RecordingModel {
    fn feature_count(&self) -> usize {
        self.weights.len()
    }

    fn predict(&self, features: &[f64]) -> Result<f64, ModelError> {
        self.calls
            .lock()
            .expect("calls mutex poisoned")
            .push(features.to_vec());
        Ok(self
            .weights
            .iter()
            .zip(features)
            .fold(self.intercept, |acc, (w, x)| acc + w * x))
    }
}

/// Model that always fails, for exercising the 500 path.
#[derive(Debug)]
pub(super) struct BrokenModel;

impl PriceModel for BrokenModel {
    fn feature_count(&self) -> usize {
        COLUMNS.len()
    }

    fn predict(&self, _features: &[f64]) -> Result<f64, ModelError> {
        Err(ModelError::NonFinite)
    }
}

pub(super) fn recording_model() -> RecordingModel {
    RecordingModel::new(
        vec![0.1234, -2.0, 15.0, 40.0, 25.0, 10.0, 20.0, 30.0],
        5.0,
    )
}

pub(super) fn loaded_store() -> Arc<ArtifactStore<RecordingModel>> {
    Arc::new(ArtifactStore::from_parts(columns(), recording_model()).expect("widths match"))
}

pub(super) fn context<M>(store: Arc<ArtifactStore<M>>) -> Arc<PricingContext<M>> {
    Arc::new(PricingContext {
        store,
        catalog_max_age_secs: 3600,
    })
}

pub(super) fn router_with_store<M>(store: Arc<ArtifactStore<M>>) -> axum::Router
where
    M: PriceModel + 'static,
{
    pricing_router(context(store))
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 4096)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
