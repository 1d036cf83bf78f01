use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, rejection::QueryRejection, Json, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Extension,
};
use serde::Deserialize;
use tracing::{info, instrument, warn};
use utoipa::{IntoParams, ToSchema};

use clinic_records_domain::auth::UserInfo;
use clinic_records_domain::entities::{
    AlertsReport, CreateReadingRequest, ParameterType, Period, Reading, StatisticsReport, Threshold,
    TrendAnalysis, UpsertThresholdRequest,
};
use clinic_records_domain::services::health_metrics::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};
use clinic_records_domain::services::HealthMetricsServiceTrait;

use crate::entities::{ErrorResponse, PaginatedResponse, ReadingsPage};

/// Service type for dependency injection
pub type HealthMetricsService = Arc<dyn HealthMetricsServiceTrait>;

/// Query parameters for listing readings
#[derive(Debug, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct ReadingsQueryParams {
    /// Patient to read; ignored for patients, required for other roles
    pub patient_id: Option<i64>,

    /// Restrict to one parameter type
    pub parameter_type: Option<ParameterType>,

    /// Maximum number of results (default: 100, max: 1000)
    pub limit: Option<usize>,

    /// Pagination offset (default: 0)
    pub offset: Option<usize>,
}

/// Query parameters for statistics and trends
#[derive(Debug, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct AnalyticsQueryParams {
    /// Patient to analyse; ignored for patients, required for other roles
    pub patient_id: Option<i64>,

    /// Optional for statistics, required for trends
    pub parameter_type: Option<ParameterType>,

    /// day, week, month or year (default: month)
    pub period: Option<Period>,
}

/// Query parameters naming a patient
#[derive(Debug, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct PatientQueryParams {
    /// Ignored for patients, required for other roles
    pub patient_id: Option<i64>,
}

fn bad_query(rejection: QueryRejection) -> ErrorResponse {
    warn!("Rejected query string: {}", rejection.body_text());
    ErrorResponse::validation_error(rejection.body_text())
}

fn bad_body(rejection: JsonRejection) -> ErrorResponse {
    warn!("Rejected request body: {}", rejection.body_text());
    ErrorResponse::validation_error(rejection.body_text())
}

/// Record a new health reading
#[utoipa::path(
    post,
    path = "/api/v1/health-metrics",
    request_body = CreateReadingRequest,
    responses(
        (status = 201, description = "Reading recorded", body = Reading),
        (status = 400, description = "Invalid request or malformed value", body = ErrorResponse),
        (status = 401, description = "Missing or invalid token"),
        (status = 403, description = "Role may not record readings", body = ErrorResponse),
        (status = 500, description = "Storage failure", body = ErrorResponse),
    ),
    security(
        ("bearer" = [])
    ),
    tag = "health_metrics"
)]
#[instrument(skip(service, user, body), fields(user_id = user.user_id))]
pub async fn record_reading(
    State(service): State<HealthMetricsService>,
    Extension(user): Extension<UserInfo>,
    body: Result<Json<CreateReadingRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ErrorResponse> {
    let Json(request) = body.map_err(bad_body)?;
    let reading = service.record_reading(&user, request).await?;

    info!("Health reading created with ID: {}", reading.id);
    Ok((StatusCode::CREATED, Json(reading)))
}

/// List readings, newest first
#[utoipa::path(
    get,
    path = "/api/v1/health-metrics",
    params(ReadingsQueryParams),
    responses(
        (status = 200, description = "Page of readings", body = ReadingsPage),
        (status = 400, description = "Missing patient_id or bad query", body = ErrorResponse),
        (status = 401, description = "Missing or invalid token"),
        (status = 500, description = "Storage failure", body = ErrorResponse),
    ),
    security(
        ("bearer" = [])
    ),
    tag = "health_metrics"
)]
#[instrument(skip(service, user, query), fields(user_id = user.user_id))]
pub async fn list_readings(
    State(service): State<HealthMetricsService>,
    Extension(user): Extension<UserInfo>,
    query: Result<Query<ReadingsQueryParams>, QueryRejection>,
) -> Result<Json<ReadingsPage>, ErrorResponse> {
    let Query(params) = query.map_err(bad_query)?;
    let limit = params.limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
    let offset = params.offset.unwrap_or(0);

    let (data, total_count) = service
        .list_readings(&user, params.patient_id, params.parameter_type, Some(limit), Some(offset))
        .await?;

    Ok(Json(PaginatedResponse { data, total_count, offset, limit }))
}

/// Statistics per parameter type over a period
#[utoipa::path(
    get,
    path = "/api/v1/health-metrics/statistics",
    params(AnalyticsQueryParams),
    responses(
        (status = 200, description = "Statistics per parameter type", body = StatisticsReport),
        (status = 400, description = "Missing patient_id or bad query", body = ErrorResponse),
        (status = 401, description = "Missing or invalid token"),
        (status = 500, description = "Storage failure", body = ErrorResponse),
    ),
    security(
        ("bearer" = [])
    ),
    tag = "health_metrics"
)]
#[instrument(skip(service, user, query), fields(user_id = user.user_id))]
pub async fn get_statistics(
    State(service): State<HealthMetricsService>,
    Extension(user): Extension<UserInfo>,
    query: Result<Query<AnalyticsQueryParams>, QueryRejection>,
) -> Result<Json<StatisticsReport>, ErrorResponse> {
    let Query(params) = query.map_err(bad_query)?;
    let report = service
        .get_statistics(&user, params.patient_id, params.parameter_type, params.period)
        .await?;

    Ok(Json(report))
}

/// Bucketed trend for one parameter type
#[utoipa::path(
    get,
    path = "/api/v1/health-metrics/trends",
    params(AnalyticsQueryParams),
    responses(
        (status = 200, description = "Trend series and direction", body = TrendAnalysis),
        (status = 400, description = "Missing patient_id or parameter_type", body = ErrorResponse),
        (status = 401, description = "Missing or invalid token"),
        (status = 500, description = "Storage failure", body = ErrorResponse),
    ),
    security(
        ("bearer" = [])
    ),
    tag = "health_metrics"
)]
#[instrument(skip(service, user, query), fields(user_id = user.user_id))]
pub async fn get_trends(
    State(service): State<HealthMetricsService>,
    Extension(user): Extension<UserInfo>,
    query: Result<Query<AnalyticsQueryParams>, QueryRejection>,
) -> Result<Json<TrendAnalysis>, ErrorResponse> {
    let Query(params) = query.map_err(bad_query)?;
    let trend = service
        .get_trend(&user, params.patient_id, params.parameter_type, params.period)
        .await?;

    Ok(Json(trend))
}

/// Latest readings outside their normal range
#[utoipa::path(
    get,
    path = "/api/v1/health-metrics/alerts",
    params(PatientQueryParams),
    responses(
        (status = 200, description = "Current alerts", body = AlertsReport),
        (status = 400, description = "Missing patient_id", body = ErrorResponse),
        (status = 401, description = "Missing or invalid token"),
        (status = 500, description = "Storage failure", body = ErrorResponse),
    ),
    security(
        ("bearer" = [])
    ),
    tag = "health_metrics"
)]
#[instrument(skip(service, user, query), fields(user_id = user.user_id))]
pub async fn get_alerts(
    State(service): State<HealthMetricsService>,
    Extension(user): Extension<UserInfo>,
    query: Result<Query<PatientQueryParams>, QueryRejection>,
) -> Result<Json<AlertsReport>, ErrorResponse> {
    let Query(params) = query.map_err(bad_query)?;
    let report = service.get_alerts(&user, params.patient_id).await?;

    Ok(Json(report))
}

/// Thresholds configured for a patient
#[utoipa::path(
    get,
    path = "/api/v1/health-metrics/thresholds",
    params(PatientQueryParams),
    responses(
        (status = 200, description = "Patient thresholds", body = [Threshold]),
        (status = 400, description = "Missing patient_id", body = ErrorResponse),
        (status = 401, description = "Missing or invalid token"),
        (status = 500, description = "Storage failure", body = ErrorResponse),
    ),
    security(
        ("bearer" = [])
    ),
    tag = "health_metrics"
)]
#[instrument(skip(service, user, query), fields(user_id = user.user_id))]
pub async fn list_thresholds(
    State(service): State<HealthMetricsService>,
    Extension(user): Extension<UserInfo>,
    query: Result<Query<PatientQueryParams>, QueryRejection>,
) -> Result<Json<Vec<Threshold>>, ErrorResponse> {
    let Query(params) = query.map_err(bad_query)?;
    let thresholds = service.list_thresholds(&user, params.patient_id).await?;

    Ok(Json(thresholds))
}

/// Create or replace the caller's threshold for a parameter type
#[utoipa::path(
    put,
    path = "/api/v1/health-metrics/thresholds",
    request_body = UpsertThresholdRequest,
    responses(
        (status = 200, description = "Threshold saved", body = Threshold),
        (status = 400, description = "Invalid range", body = ErrorResponse),
        (status = 401, description = "Missing or invalid token"),
        (status = 403, description = "Only patients manage thresholds", body = ErrorResponse),
        (status = 500, description = "Storage failure", body = ErrorResponse),
    ),
    security(
        ("bearer" = [])
    ),
    tag = "health_metrics"
)]
#[instrument(skip(service, user, body), fields(user_id = user.user_id))]
pub async fn upsert_threshold(
    State(service): State<HealthMetricsService>,
    Extension(user): Extension<UserInfo>,
    body: Result<Json<UpsertThresholdRequest>, JsonRejection>,
) -> Result<Json<Threshold>, ErrorResponse> {
    let Json(request) = body.map_err(bad_body)?;
    let threshold = service.upsert_threshold(&user, request).await?;

    Ok(Json(threshold))
}
