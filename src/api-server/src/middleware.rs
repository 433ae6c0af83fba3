//! Middleware layer for the API server
//!
//! This module provides middleware components for:
//! - API version negotiation
//! - Request logging and tracing
//! - CORS configuration
//! - Request ID tracking
//! - Error logging

use axum::{
    extract::{Query, Request},
    http::{header, HeaderName, HeaderValue, Method, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::collections::HashMap;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info, warn};
use uuid::Uuid;

/// Request ID header name
pub const X_REQUEST_ID: &str = "x-request-id";

/// Auth token header
pub const ADDITIONAL_AUTH_INFO: &str = "additional-auth-info";

/// Legacy auth token header
pub const LEGACY_AUTH_TOKEN: &str = "authtoken";

/// Query parameter selecting the API version
pub const API_VERSION_PARAM: &str = "api-version";

/// Response header listing supported API versions
pub const API_SUPPORTED_VERSIONS: &str = "api-supported-versions";

/// The only supported API version
pub const SUPPORTED_API_VERSION: &str = "2021-05-19";

/// Configure CORS middleware
pub fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([
            header::CONTENT_TYPE,
            header::ACCEPT,
            HeaderName::from_static(X_REQUEST_ID),
            HeaderName::from_static(ADDITIONAL_AUTH_INFO),
            HeaderName::from_static(LEGACY_AUTH_TOKEN),
        ])
        .expose_headers([
            HeaderName::from_static(X_REQUEST_ID),
            HeaderName::from_static(API_SUPPORTED_VERSIONS),
        ])
        .max_age(std::time::Duration::from_secs(3600))
}

/// API version middleware
///
/// Rejects requests whose `api-version` query parameter names an unsupported
/// version. A missing parameter selects the default version. Every response
/// reports the supported versions.
pub async fn api_version_middleware(request: Request, next: Next) -> Response {
    let requested = Query::<HashMap<String, String>>::try_from_uri(request.uri())
        .ok()
        .and_then(|Query(params)| params.get(API_VERSION_PARAM).cloned());

    let mut response = match requested.as_deref() {
        None | Some(SUPPORTED_API_VERSION) => next.run(request).await,
        Some(other) => {
            warn!(api_version = %other, "Unsupported API version requested");
            let status = StatusCode::BAD_REQUEST;
            (
                status,
                Json(json!({
                    "error": format!(
                        "The HTTP resource does not support the API version '{}'",
                        other
                    ),
                    "status": status.as_u16(),
                })),
            )
                .into_response()
        }
    };

    response.headers_mut().insert(
        HeaderName::from_static(API_SUPPORTED_VERSIONS),
        HeaderValue::from_static(SUPPORTED_API_VERSION),
    );

    response
}

/// Request ID middleware
///
/// Generates or extracts a unique request ID for tracking requests through
/// the system. The request ID is added to all log messages and returned in
/// the response headers.
pub async fn request_id_middleware(mut request: Request, next: Next) -> Response {
    let request_id = request
        .headers()
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| Uuid::parse_str(s).ok())
        .unwrap_or_else(Uuid::new_v4);

    request.extensions_mut().insert(request_id);

    let mut response = next.run(request).await;

    response.headers_mut().insert(
        X_REQUEST_ID,
        HeaderValue::from_str(&request_id.to_string())
            .unwrap_or_else(|_| HeaderValue::from_static("invalid-uuid")),
    );

    response
}

/// Request logging middleware
///
/// Logs all incoming requests with method, URI, and response status.
/// Includes request ID for correlation.
pub async fn logging_middleware(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let request_id = request
        .extensions()
        .get::<Uuid>()
        .copied()
        .unwrap_or_else(Uuid::new_v4);

    info!(
        request_id = %request_id,
        method = %method,
        uri = %uri,
        "Incoming request"
    );

    let start = std::time::Instant::now();
    let response = next.run(request).await;
    let elapsed = start.elapsed();

    let status = response.status();

    macro_rules! completed {
        ($level:expr) => {
            tracing::event!(
                $level,
                request_id = %request_id,
                method = %method,
                uri = %uri,
                status = status.as_u16(),
                duration_ms = elapsed.as_millis() as u64,
                "Request completed"
            )
        };
    }

    match status.as_u16() {
        500..=599 => completed!(tracing::Level::ERROR),
        400..=499 => completed!(tracing::Level::WARN),
        _ => completed!(tracing::Level::INFO),
    }

    response
}

/// Error logging middleware
///
/// Logs server errors with the request ID.
pub async fn error_handling_middleware(request: Request, next: Next) -> Response {
    let request_id = request
        .extensions()
        .get::<Uuid>()
        .copied()
        .unwrap_or_else(Uuid::new_v4);

    let response = next.run(request).await;

    if response.status().is_server_error() {
        error!(
            request_id = %request_id,
            status = %response.status().as_u16(),
            "Server error occurred"
        );
    }

    response
}
