//! Application state shared across all handlers and middleware.

use std::sync::Arc;
use std::time::Instant;

use charisma_auth::JwtDecoder;
use charisma_core::config::AppConfig;
use charisma_database::Stores;
use charisma_realtime::NotificationHub;
use charisma_service::{
    AnalysisJobService, BulkActionService, JobProgressReporter, TaskAggregationService,
};

/// Application state containing all shared dependencies.
///
/// Passed to every Axum handler via `State<AppState>`.
/// All fields are `Arc`-wrapped or cheaply cloneable.
#[derive(Debug, Clone)]
pub struct AppState {
    // ── Configuration ────────────────────────────────────────
    /// Application configuration
    pub config: Arc<AppConfig>,
    /// Process start, for uptime reporting
    pub started_at: Instant,

    // ── Infrastructure ───────────────────────────────────────
    /// Job stores and log sinks
    pub stores: Stores,
    /// Notification pub/sub
    pub hub: NotificationHub,

    // ── Auth ─────────────────────────────────────────────────
    /// JWT token decoder and validator
    pub jwt_decoder: Arc<JwtDecoder>,

    // ── Services ─────────────────────────────────────────────
    /// Admin task listing
    pub aggregation: Arc<TaskAggregationService>,
    /// Admin bulk actions
    pub bulk_actions: Arc<BulkActionService>,
    /// Per-user analysis jobs
    pub analysis: Arc<AnalysisJobService>,
    /// Worker-side job lifecycle updates
    pub progress: Arc<JobProgressReporter>,
}
