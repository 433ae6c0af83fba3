use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use std::sync::Arc;
use tracing::info;
use validator::Validate;

use crate::{
    error::{ApiError, Result},
    middleware::{ADDITIONAL_AUTH_INFO, LEGACY_AUTH_TOKEN},
    models::*,
    state::AppState,
};

/// Auth token from the request headers, preferring `additional-auth-info`
pub fn auth_token(headers: &HeaderMap) -> Option<String> {
    [ADDITIONAL_AUTH_INFO, LEGACY_AUTH_TOKEN]
        .iter()
        .filter_map(|name| headers.get(*name))
        .filter_map(|value| value.to_str().ok())
        .map(str::trim)
        .find(|value| !value.is_empty())
        .map(String::from)
}

/// Claims for a vehicle
#[utoipa::path(
    get,
    path = "/api/claims/claimInfo/vehicles/{vehicleId}",
    params(
        ("vehicleId" = String, Path, description = "Vehicle identifier"),
        ClaimsQuery,
    ),
    responses(
        (status = 200, description = "Claims for the vehicle, or null when the vehicle is unknown", body = ClaimsResponse),
        (status = 400, description = "Invalid identifier or API version", body = ErrorResponse)
    ),
    tag = "claims"
)]
pub async fn get_vehicle_claims(
    State(state): State<Arc<AppState>>,
    Path(vehicle_id): Path<String>,
    Query(query): Query<ClaimsQuery>,
    headers: HeaderMap,
) -> Result<Json<Option<ClaimsResponse>>> {
    let token = auth_token(&headers);

    let info = state
        .provider
        .retrieve_vehicle_user_info(&vehicle_id, None, token.as_deref(), query.path_list())
        .await?;

    Ok(Json(info.map(ClaimsResponse::from)))
}

/// Claims for a vehicle/user pair
#[utoipa::path(
    get,
    path = "/api/claims/claimInfo/vehicles/{vehicleId}/users/{userId}",
    params(
        ("vehicleId" = String, Path, description = "Vehicle identifier"),
        ("userId" = String, Path, description = "User identifier"),
        ClaimsQuery,
    ),
    responses(
        (status = 200, description = "Claims for the pair, or null when the vehicle or association is unknown", body = ClaimsResponse),
        (status = 400, description = "Invalid identifier or API version", body = ErrorResponse)
    ),
    tag = "claims"
)]
pub async fn get_vehicle_user_claims(
    State(state): State<Arc<AppState>>,
    Path((vehicle_id, user_id)): Path<(String, String)>,
    Query(query): Query<ClaimsQuery>,
    headers: HeaderMap,
) -> Result<Json<Option<ClaimsResponse>>> {
    let token = auth_token(&headers);

    let info = state
        .provider
        .retrieve_vehicle_user_info(&vehicle_id, Some(&user_id), token.as_deref(), query.path_list())
        .await?;

    Ok(Json(info.map(ClaimsResponse::from)))
}

/// Claims for a vehicle grouped by caller-chosen labels
#[utoipa::path(
    post,
    path = "/api/claims/claimInfo/vehicles/{vehicleId}/labels",
    params(
        ("vehicleId" = String, Path, description = "Vehicle identifier"),
    ),
    request_body(content = LabeledPathsRequest, description = "Map of label to path patterns"),
    responses(
        (status = 200, description = "Labeled claims, or null when the vehicle is unknown", body = LabeledClaimsResponse),
        (status = 400, description = "Invalid identifier or API version", body = ErrorResponse)
    ),
    tag = "claims"
)]
pub async fn post_labeled_claims(
    State(state): State<Arc<AppState>>,
    Path(vehicle_id): Path<String>,
    headers: HeaderMap,
    Json(labels): Json<LabeledPathsRequest>,
) -> Result<Json<Option<LabeledClaimsResponse>>> {
    let token = auth_token(&headers);

    let info = state
        .provider
        .retrieve_labeled_claims(&vehicle_id, token.as_deref(), labels.into_labeled_paths())
        .await?;

    Ok(Json(info.map(LabeledClaimsResponse::from)))
}

/// Write a claim record
#[utoipa::path(
    post,
    path = "/api/claimsstore",
    request_body = ClaimsStoreRequest,
    responses(
        (status = 200, description = "Record written", body = ClaimsStoreResponse),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 500, description = "Store failure", body = ErrorResponse)
    ),
    tag = "claims-store"
)]
pub async fn create_claims(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ClaimsStoreRequest>,
) -> Result<Json<ClaimsStoreResponse>> {
    req.validate()
        .map_err(|e| ApiError::ValidationError(e.to_string()))?;

    info!("Processing create claims request");

    let record = state
        .provider
        .create_claims(
            req.vehicle_id.as_deref(),
            req.user_id.as_deref(),
            req.service_id.as_deref(),
            req.claims.unwrap_or_default(),
        )
        .await?;

    Ok(Json(ClaimsStoreResponse {
        id: record.id,
        partition_key: record.partition_key,
    }))
}

/// Remove a claim record
#[utoipa::path(
    delete,
    path = "/api/claimsstore",
    request_body = ClaimsStoreRequest,
    responses(
        (status = 200, description = "Record removed"),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 404, description = "Record not found", body = ErrorResponse)
    ),
    tag = "claims-store"
)]
pub async fn remove_claims(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ClaimsStoreRequest>,
) -> Result<StatusCode> {
    req.validate()
        .map_err(|e| ApiError::ValidationError(e.to_string()))?;

    info!("Processing remove claims request");

    state
        .provider
        .remove_claims(
            req.vehicle_id.as_deref(),
            req.user_id.as_deref(),
            req.service_id.as_deref(),
        )
        .await?;

    Ok(StatusCode::OK)
}

/// Liveness probe
#[utoipa::path(
    get,
    path = "/api/healthcheck",
    responses(
        (status = 200, description = "Service is running", body = String)
    ),
    tag = "health"
)]
pub async fn healthcheck() -> &'static str {
    "App is Healthy"
}

/// Health check endpoint
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse)
    ),
    tag = "health"
)]
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: state.version.clone(),
        uptime_seconds: state.uptime_seconds(),
    })
}

/// Prometheus metrics
#[utoipa::path(
    get,
    path = "/metrics",
    responses(
        (status = 200, description = "Metrics in Prometheus text format", body = String),
        (status = 404, description = "Metrics are disabled", body = ErrorResponse)
    ),
    tag = "health"
)]
pub async fn metrics(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse> {
    let text = state
        .provider
        .export_metrics()
        .await
        .ok_or_else(|| ApiError::NotFound("metrics are disabled".to_string()))?;

    Ok(([(header::CONTENT_TYPE, "text/plain; version=0.0.4")], text))
}
