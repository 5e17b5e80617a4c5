use crate::infra::AppState;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Extension;
use axum::Json;
use chrono::{DateTime, Utc};
use scam_watch::reports::{
    parse_timestamp, scam_watch_router, BusinessStore, ReportStore, ReportType, ScamWatchService,
};
use scam_watch::scoring::{ReportSignal, ScamScoreCalculator, ScoreBreakdown};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

/// Ad-hoc report as a client would send it; timestamps stay raw until scoring.
#[derive(Debug, Deserialize)]
pub(crate) struct PreviewReport {
    pub(crate) report_type: ReportType,
    #[serde(default)]
    pub(crate) created_at: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ScorePreviewRequest {
    pub(crate) reports: Vec<PreviewReport>,
    #[serde(default)]
    pub(crate) now: Option<DateTime<Utc>>,
}

pub(crate) fn with_scam_watch_routes<R, B>(service: Arc<ScamWatchService<R, B>>) -> axum::Router
where
    R: ReportStore + 'static,
    B: BusinessStore + 'static,
{
    scam_watch_router(service)
        .route("/health", axum::routing::get(healthcheck))
        .route("/ready", axum::routing::get(readiness_endpoint))
        .route("/metrics", axum::routing::get(metrics_endpoint))
        .route(
            "/api/v1/scores/preview",
            axum::routing::post(score_preview_endpoint),
        )
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

/// Scores a report list without touching any store.
pub(crate) async fn score_preview_endpoint(
    Json(payload): Json<ScorePreviewRequest>,
) -> Json<ScoreBreakdown> {
    let ScorePreviewRequest { reports, now } = payload;

    let signals: Vec<ReportSignal> = reports
        .into_iter()
        .map(|report| {
            let created_at = report.created_at.as_deref().and_then(parse_timestamp);
            ReportSignal::new(report.report_type, created_at)
        })
        .collect();

    let now = now.unwrap_or_else(Utc::now);
    Json(ScamScoreCalculator::default().score(&signals, now))
}
