use crate::cli::ServeArgs;
use crate::infra::{cors_layer, AppState};
use crate::routes::with_service_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use chrono::Utc;
use axum::Router;
use home_price::config::{AppConfig, HttpConfig};
use home_price::error::AppError;
use home_price::pricing::{ArtifactStore, PriceModel, PricingContext};
use home_price::telemetry;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::info;

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }
    if let Some(dir) = args.artifacts.artifacts_dir.take() {
        config.artifacts.directory = dir;
    }

    telemetry::init(&config.telemetry)?;

    // Loaded before the listener binds; a failed load leaves an empty store.
    let store = Arc::new(ArtifactStore::load_or_degraded(&config.artifacts.paths()));

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
        artifacts: store.summary(),
        started_at: Utc::now(),
    };

    let context = Arc::new(PricingContext {
        store,
        catalog_max_age_secs: config.http.catalog_max_age_secs,
    });

    let app = build_app(context, app_state, &config.http).layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "home price estimator ready");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Pricing and process routes with the shared state and CORS layers applied.
pub(crate) fn build_app<M>(
    context: Arc<PricingContext<M>>,
    app_state: AppState,
    http: &HttpConfig,
) -> Router
where
    M: PriceModel + 'static,
{
    with_service_routes(context)
        .layer(Extension(app_state))
        .layer(cors_layer(http))
}
