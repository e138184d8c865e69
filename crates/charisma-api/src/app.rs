//! Application builder: wires router, middleware, and state into an Axum app.

use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use axum::Router;
use tokio::net::TcpListener;

use charisma_auth::JwtDecoder;
use charisma_core::config::AppConfig;
use charisma_core::error::{AppError, ErrorKind};
use charisma_database::Stores;
use charisma_realtime::NotificationHub;
use charisma_service::{
    AnalysisJobService, AuditRecorder, BulkActionService, ErrorReporter, JobProgressReporter,
    TaskAggregationService,
};

use crate::router::build_router;
use crate::state::AppState;

/// Builds the complete Axum application with all routes and middleware.
pub fn build_app(state: AppState) -> Router {
    build_router(state)
}

/// Wires services over the given stores.
pub fn build_state(config: AppConfig, stores: Stores) -> AppState {
    let hub = NotificationHub::from_config(&config.realtime);
    let errors = ErrorReporter::new(Arc::clone(&stores.error_logs));
    let audit = AuditRecorder::new(Arc::clone(&stores.audit_logs));

    let aggregation = Arc::new(TaskAggregationService::new(
        Arc::clone(&stores.background_jobs),
        Arc::clone(&stores.task_queue),
        errors.clone(),
        &config.jobs,
    ));
    let bulk_actions = Arc::new(BulkActionService::new(
        Arc::clone(&stores.background_jobs),
        Arc::clone(&stores.task_queue),
        audit,
        errors,
        hub.clone(),
    ));
    let analysis = Arc::new(AnalysisJobService::new(
        Arc::clone(&stores.background_jobs),
        Arc::clone(&stores.task_queue),
        hub.clone(),
        &config.jobs,
    ));
    let progress = Arc::new(JobProgressReporter::new(
        Arc::clone(&stores.background_jobs),
        hub.clone(),
    ));

    AppState {
        jwt_decoder: Arc::new(JwtDecoder::new(&config.auth)),
        config: Arc::new(config),
        started_at: Instant::now(),
        stores,
        hub,
        aggregation,
        bulk_actions,
        analysis,
        progress,
    }
}

/// Runs the server until `shutdown` resolves.
pub async fn run_server<F>(config: AppConfig, shutdown: F) -> Result<(), AppError>
where
    F: Future<Output = ()> + Send + 'static,
{
    tracing::info!("Starting CharismaAI task server...");

    // ── Step 1: Initialize stores ────────────────────────────────
    tracing::info!(
        "Initializing stores (provider: {:?})...",
        config.database.provider
    );
    let stores = Stores::connect(&config.database).await?;
    let pool = stores.pool.clone();

    // ── Step 2: Initialize services ──────────────────────────────
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let state = build_state(config, stores);
    let app = build_app(state);

    // ── Step 3: Bind and serve ───────────────────────────────────
    let listener = TcpListener::bind(&addr).await.map_err(|e| {
        AppError::with_source(ErrorKind::Internal, format!("Failed to bind {addr}"), e)
    })?;
    tracing::info!("Listening on http://{addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Internal, "Server error", e))?;

    // ── Step 4: Release resources ────────────────────────────────
    if let Some(pool) = pool {
        pool.close().await;
    }
    tracing::info!("Server stopped");
    Ok(())
}
