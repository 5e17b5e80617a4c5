use crate::cli::ServeArgs;
use crate::infra::{AppState, InMemoryBusinessStore, InMemoryReportStore};
use crate::routes::with_scam_watch_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use scam_watch::config::AppConfig;
use scam_watch::error::AppError;
use scam_watch::reports::ScamWatchService;
use scam_watch::telemetry;
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

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let service = Arc::new(ScamWatchService::new(
        Arc::new(InMemoryReportStore::default()),
        Arc::new(InMemoryBusinessStore::default()),
        config.scores.clone(),
    ));

    let app = with_scam_watch_routes(service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        recompute_workers = config.scores.recompute_workers,
        watchlist_threshold = config.scores.watchlist_threshold,
        "scam watch service ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
