use std::sync::Arc;

use axum::{
    extract::{FromRequest, Multipart, Request, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Form, Json, Router,
};
use serde_json::{json, Value};
use tracing::error;

use crate::error::AppError;

use super::model::PriceModel;
use super::request::{EstimateRequest, ValidationError};
use super::store::{ArtifactStore, EstimateError};

/// Shared state handed to every pricing handler.
pub struct PricingContext<M> {
    pub store: Arc<ArtifactStore<M>>,
    pub catalog_max_age_secs: u32,
}

impl<M> PricingContext<M> {
    fn catalog_cache_control(&self) -> String {
        format!(
            "public, max-age={age}, s-maxage={age}",
            age = self.catalog_max_age_secs
        )
    }
}

/// Router builder exposing the catalog and estimate endpoints.
pub fn pricing_router<M>(context: Arc<PricingContext<M>>) -> Router
where
    M: PriceModel + 'static,
{
    Router::new()
        .route("/get_location_names", get(locations_handler::<M>))
        .route("/get_property_types", get(property_types_handler::<M>))
        .route("/predict_home_price", post(estimate_handler::<M>))
        .with_state(context)
}

pub(crate) async fn locations_handler<M>(State(context): State<Arc<PricingContext<M>>>) -> Response
where
    M: PriceModel + 'static,
{
    catalog_response(&context, "locations", context.store.get_locality_names())
}

pub(crate) async fn property_types_handler<M>(
    State(context): State<Arc<PricingContext<M>>>,
) -> Response
where
    M: PriceModel + 'static,
{
    catalog_response(&context, "property_types", context.store.get_property_types())
}

fn catalog_response<M>(context: &PricingContext<M>, key: &str, values: &[String]) -> Response
where
    M: PriceModel + 'static,
{
    if !context.store.is_loaded() {
        error!(
            catalog = key,
            error = %EstimateError::NotInitialized,
            "catalog requested before artifacts loaded"
        );
        let payload = json!({ key: [] });
        return (StatusCode::INTERNAL_SERVER_ERROR, Json(payload)).into_response();
    }

    let payload = json!({ key: values });
    (
        StatusCode::OK,
        [(header::CACHE_CONTROL, context.catalog_cache_control())],
        Json(payload),
    )
        .into_response()
}

pub(crate) async fn estimate_handler<M>(
    State(context): State<Arc<PricingContext<M>>>,
    request: Request,
) -> Result<Json<Value>, AppError>
where
    M: PriceModel + 'static,
{
    let query = read_estimate_request(request).await?.into_query()?;

    let estimated_price = context.store.estimate_price(&query).map_err(|err| {
        error!(
            error = %err,
            locality = %query.locality,
            property_type = %query.property_type,
            "price estimate failed"
        );
        AppError::from(err)
    })?;

    Ok(Json(json!({ "estimated_price": estimated_price })))
}

/// Picks the body decoder from `Content-Type`. A request without one is read as
/// an empty form.
async fn read_estimate_request(request: Request) -> Result<EstimateRequest, ValidationError> {
    match body_kind(request.headers()) {
        BodyKind::Json => Json::<EstimateRequest>::from_request(request, &())
            .await
            .map(|Json(payload)| payload)
            .map_err(|rejection| malformed(rejection.body_text())),
        BodyKind::Form => Form::<EstimateRequest>::from_request(request, &())
            .await
            .map(|Form(payload)| payload)
            .map_err(|rejection| malformed(rejection.body_text())),
        BodyKind::Multipart => read_multipart(request).await,
        BodyKind::Missing => Ok(EstimateRequest::default()),
        BodyKind::Unsupported(content_type) => {
            Err(ValidationError::UnsupportedContentType(content_type))
        }
    }
}

async fn read_multipart(request: Request) -> Result<EstimateRequest, ValidationError> {
    let mut multipart = Multipart::from_request(request, &())
        .await
        .map_err(|rejection| malformed(rejection.body_text()))?;

    let mut payload = EstimateRequest::default();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| malformed(err.body_text()))?
    {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };
        let value = field.text().await.map_err(|err| malformed(err.body_text()))?;
        payload.set_text_field(&name, value);
    }
    Ok(payload)
}

fn malformed(message: String) -> ValidationError {
    if message.is_empty() {
        ValidationError::MissingCategory
    } else {
        ValidationError::MalformedBody(message)
    }
}

enum BodyKind {
    Json,
    Form,
    Multipart,
    Missing,
    Unsupported(String),
}

fn body_kind(headers: &HeaderMap) -> BodyKind {
    let Some(value) = headers.get(header::CONTENT_TYPE) else {
        return BodyKind::Missing;
    };
    let content_type = String::from_utf8_lossy(value.as_bytes()).to_ascii_lowercase();

    if content_type.starts_with("application/json") {
        BodyKind::Json
    } else if content_type.starts_with("application/x-www-form-urlencoded") {
        BodyKind::Form
    } else if content_type.starts_with("multipart/form-data") {
        BodyKind::Multipart
    } else if content_type.trim().is_empty() {
        BodyKind::Missing
    } else {
        let essence = content_type.split(';').next().unwrap_or_default().trim();
        BodyKind::Unsupported(essence.to_string())
    }
}
