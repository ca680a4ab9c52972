use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::middleware::request_id::{request_id_middleware, span_for_request};

use super::handlers;
use super::AppState;

/// Creates the main API router with all routes
///
/// CORS is wide open: the single-page frontend is served from a different
/// origin and the API holds no credentials.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health_check))
        // Session
        .route("/session", get(handlers::get_session))
        .route("/session/query", post(handlers::submit_query))
        .route("/session/reset", post(handlers::reset_session))
        .route(
            "/session/cards/:index/image-failure",
            post(handlers::image_failure),
        )
        .layer(TraceLayer::new_for_http().make_span_with(span_for_request))
        .layer(axum::middleware::from_fn(request_id_middleware))
        .layer(CorsLayer::permissive())
        .with_state(state)
}
