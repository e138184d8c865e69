//! Route definitions for the CharismaAI HTTP API.
//!
//! All routes are organized by domain and mounted under `/api`.

use axum::{
    Router,
    extract::DefaultBodyLimit,
    middleware as axum_middleware,
    routing::get,
};
use tower_http::compression::CompressionLayer;
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::middleware;
use crate::middleware::cors::build_cors_layer;
use crate::state::AppState;

/// Build the complete Axum router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let body_limit = state.config.server.body_limit_bytes;

    let api_routes = Router::new()
        .merge(admin_routes())
        .merge(background_routes())
        .merge(notification_routes())
        .merge(health_routes());

    let cors = build_cors_layer(&state.config.server.cors);

    Router::new()
        .nest("/api", api_routes)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(axum_middleware::from_fn(
            middleware::logging::request_logging,
        ))
        .with_state(state)
}

/// Admin task dashboard
fn admin_routes() -> Router<AppState> {
    Router::new().route(
        "/admin/background-tasks",
        get(handlers::admin::background_tasks::list_background_tasks)
            .post(handlers::admin::background_tasks::bulk_action),
    )
}

/// Per-user analysis jobs
fn background_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/background/analyze",
            get(handlers::background::get_analysis)
                .post(handlers::background::submit_analysis)
                .delete(handlers::background::cancel_analysis),
        )
        .route("/background/jobs", get(handlers::background::recent_jobs))
}

/// Server-sent notification stream
fn notification_routes() -> Router<AppState> {
    Router::new().route(
        "/notifications/stream",
        get(handlers::notification::stream),
    )
}

/// Liveness
fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(handlers::health::health))
}
