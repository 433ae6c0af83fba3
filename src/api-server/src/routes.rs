//! Route definitions for the API server
//!
//! Routes are organized by functionality:
//! - Claim lookups (direct, vehicle/user, labeled)
//! - Claim record management
//! - Health, metrics and OpenAPI endpoints

use crate::{handlers, middleware, state::AppState};
use axum::{
    middleware as axum_middleware,
    routing::{get, post},
    Json, Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;

/// OpenAPI documentation configuration
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Vehicle Claims Provider API",
        version = "2021-05-19",
        description = "Resolves authorization claims for vehicle/user pairs",
        license(
            name = "MIT OR Apache-2.0"
        )
    ),
    paths(
        handlers::get_vehicle_claims,
        handlers::get_vehicle_user_claims,
        handlers::post_labeled_claims,
        handlers::create_claims,
        handlers::remove_claims,
        handlers::healthcheck,
        handlers::health_check,
        handlers::metrics,
    ),
    components(
        schemas(
            crate::models::ClaimsResponse,
            crate::models::LabeledClaimsResponse,
            crate::models::LabeledPathsRequest,
            crate::models::ClaimsStoreRequest,
            crate::models::ClaimsStoreResponse,
            crate::models::HealthResponse,
            crate::models::ErrorResponse,
        )
    ),
    tags(
        (name = "claims", description = "Claim resolution endpoints"),
        (name = "claims-store", description = "Claim record management endpoints"),
        (name = "health", description = "Health and monitoring endpoints"),
    ),
    servers(
        (url = "http://localhost:8080", description = "Local development server"),
    )
)]
pub struct ApiDoc;

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

/// Create the application router with all routes and middleware
pub fn create_router(state: Arc<AppState>) -> Router {
    let claims_routes = Router::new()
        .route("/vehicles/:vehicle_id", get(handlers::get_vehicle_claims))
        .route(
            "/vehicles/:vehicle_id/users/:user_id",
            get(handlers::get_vehicle_user_claims),
        )
        .route("/vehicles/:vehicle_id/labels", post(handlers::post_labeled_claims));

    let api_routes = Router::new()
        .nest("/claims/claimInfo", claims_routes)
        .route(
            "/claimsstore",
            post(handlers::create_claims).delete(handlers::remove_claims),
        )
        .route("/healthcheck", get(handlers::healthcheck))
        .layer(axum_middleware::from_fn(middleware::api_version_middleware));

    Router::new()
        // Health and metrics
        .route("/health", get(handlers::health_check))
        .route("/metrics", get(handlers::metrics))
        // API routes
        .nest("/api", api_routes)
        // OpenAPI documentation
        .route("/api-docs/openapi.json", get(openapi_json))
        // Add state
        .with_state(state)
        // Add middleware layers (executed bottom to top)
        .layer(axum_middleware::from_fn(middleware::error_handling_middleware))
        .layer(axum_middleware::from_fn(middleware::logging_middleware))
        .layer(axum_middleware::from_fn(middleware::request_id_middleware))
        .layer(middleware::cors_layer())
        .layer(TraceLayer::new_for_http())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use tower::ServiceExt;

    fn create_test_state() -> Arc<AppState> {
        Arc::new(AppState::default())
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let app = create_router(create_test_state());

        let response = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_metrics_endpoint() {
        let app = create_router(create_test_state());

        let response = app
            .oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_openapi_json() {
        let app = create_router(create_test_state());

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api-docs/openapi.json")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[test]
    fn test_openapi_lists_claim_routes() {
        let doc = ApiDoc::openapi();
        assert!(doc.paths.paths.contains_key("/api/claims/claimInfo/vehicles/{vehicleId}"));
        assert!(doc.paths.paths.contains_key("/api/claimsstore"));
    }
}
