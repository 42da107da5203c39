use crate::cli::ServeArgs;
use crate::infra::{fixture_settings, AppState, FixtureConfigStore};
use crate::routes::with_shipping_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::info;
use verdura::config::AppConfig;
use verdura::error::AppError;
use verdura::shipping::gateway::HttpRatingProvider;
use verdura::shipping::ShippingRateService;
use verdura::telemetry;

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let provider = Arc::new(HttpRatingProvider::new(
        config.rating.base_url.clone(),
        config.rating.timeout_secs,
    )?);
    let store = Arc::new(FixtureConfigStore::new(fixture_settings(&config.rating)));
    let rate_service = Arc::new(ShippingRateService::new(provider, store));

    let app = with_shipping_routes(rate_service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        mode = config.rating.mode.label(),
        "shipping rate service ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
