use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;

use super::domain::{BusinessId, BusinessRegistration, ReportSubmission, ReportType};
use super::extract::{ApiJson, ApiQuery};
use super::repository::{BusinessStore, ReportStore, StoreError};
use super::service::{DirectoryQuery, ScamWatchError, ScamWatchService, SubmissionError};

type SharedService<R, B> = Arc<ScamWatchService<R, B>>;

/// Router builder exposing report intake, directory, and score maintenance endpoints.
pub fn scam_watch_router<R, B>(service: SharedService<R, B>) -> Router
where
    R: ReportStore + 'static,
    B: BusinessStore + 'static,
{
    Router::new()
        .route(
            "/api/v1/businesses",
            post(register_business_handler::<R, B>).get(directory_handler::<R, B>),
        )
        .route(
            "/api/v1/businesses/:business_id",
            get(business_handler::<R, B>),
        )
        .route(
            "/api/v1/businesses/:business_id/reports",
            get(business_reports_handler::<R, B>),
        )
        .route(
            "/api/v1/businesses/:business_id/score",
            post(recompute_handler::<R, B>),
        )
        .route("/api/v1/watchlist", get(watchlist_handler::<R, B>))
        .route(
            "/api/v1/reports",
            post(submit_report_handler::<R, B>).get(reports_by_type_handler::<R, B>),
        )
        .route(
            "/api/v1/scores/recompute",
            post(recompute_all_handler::<R, B>),
        )
        .with_state(service)
}

#[derive(Debug, Deserialize)]
pub(crate) struct ReportTypeQuery {
    #[serde(rename = "type")]
    pub(crate) report_type: ReportType,
}

pub(crate) fn error_response(error: ScamWatchError) -> Response {
    let status = match &error {
        ScamWatchError::Validation(SubmissionError::UnknownBusiness(_)) => StatusCode::NOT_FOUND,
        ScamWatchError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
        ScamWatchError::Store(StoreError::NotFound) => StatusCode::NOT_FOUND,
        ScamWatchError::Store(StoreError::Conflict) => StatusCode::CONFLICT,
        ScamWatchError::Store(StoreError::Unavailable(_)) => StatusCode::INTERNAL_SERVER_ERROR,
    };

    let payload = json!({ "error": error.to_string() });
    (status, Json(payload)).into_response()
}

pub(crate) async fn register_business_handler<R, B>(
    State(service): State<SharedService<R, B>>,
    ApiJson(registration): ApiJson<BusinessRegistration>,
) -> Response
where
    R: ReportStore + 'static,
    B: BusinessStore + 'static,
{
    match service.register_business(registration) {
        Ok(business) => (StatusCode::CREATED, Json(business)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn directory_handler<R, B>(
    State(service): State<SharedService<R, B>>,
    ApiQuery(query): ApiQuery<DirectoryQuery>,
) -> Response
where
    R: ReportStore + 'static,
    B: BusinessStore + 'static,
{
    match service.directory(&query) {
        Ok(businesses) => (StatusCode::OK, Json(businesses)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn business_handler<R, B>(
    State(service): State<SharedService<R, B>>,
    Path(business_id): Path<String>,
) -> Response
where
    R: ReportStore + 'static,
    B: BusinessStore + 'static,
{
    match service.business(&BusinessId(business_id)) {
        Ok(business) => (StatusCode::OK, Json(business)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn business_reports_handler<R, B>(
    State(service): State<SharedService<R, B>>,
    Path(business_id): Path<String>,
) -> Response
where
    R: ReportStore + 'static,
    B: BusinessStore + 'static,
{
    match service.reports_for_business(&BusinessId(business_id)) {
        Ok(reports) => (StatusCode::OK, Json(reports)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn recompute_handler<R, B>(
    State(service): State<SharedService<R, B>>,
    Path(business_id): Path<String>,
) -> Response
where
    R: ReportStore + 'static,
    B: BusinessStore + 'static,
{
    match service.recompute(&BusinessId(business_id), Utc::now()) {
        Ok(update) => (StatusCode::OK, Json(update)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn watchlist_handler<R, B>(State(service): State<SharedService<R, B>>) -> Response
where
    R: ReportStore + 'static,
    B: BusinessStore + 'static,
{
    match service.watchlist() {
        Ok(businesses) => {
            let payload = json!({
                "threshold": service.settings().watchlist_threshold,
                "businesses": businesses,
            });
            (StatusCode::OK, Json(payload)).into_response()
        }
        Err(error) => error_response(error),
    }
}

pub(crate) async fn submit_report_handler<R, B>(
    State(service): State<SharedService<R, B>>,
    ApiJson(submission): ApiJson<ReportSubmission>,
) -> Response
where
    R: ReportStore + 'static,
    B: BusinessStore + 'static,
{
    match service.submit_report(submission) {
        Ok(receipt) => (StatusCode::CREATED, Json(receipt)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn reports_by_type_handler<R, B>(
    State(service): State<SharedService<R, B>>,
    ApiQuery(query): ApiQuery<ReportTypeQuery>,
) -> Response
where
    R: ReportStore + 'static,
    B: BusinessStore + 'static,
{
    match service.reports_by_type(&query.report_type) {
        Ok(reports) => (StatusCode::OK, Json(reports)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn recompute_all_handler<R, B>(
    State(service): State<SharedService<R, B>>,
) -> Response
where
    R: ReportStore + 'static,
    B: BusinessStore + 'static,
{
    match service.recompute_all(Utc::now()) {
        Ok(summary) => (StatusCode::OK, Json(summary)).into_response(),
        Err(error) => error_response(error),
    }
}
