//! Admin listing of jobs merged from both stores.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use tracing::debug;

use charisma_core::AppError;
use charisma_core::config::JobsConfig;
use charisma_core::result::AppResult;
use charisma_core::types::{OffsetRequest, PaginationInfo};
use charisma_database::{BackgroundJobStore, TaskQueueStore};
use charisma_entity::error_log::ErrorSeverity;
use charisma_entity::job::{KindRegistry, StatusHistogram, UnifiedFilter, UnifiedJob};

use super::sort_newest_first;
use crate::context::RequestContext;
use crate::error_report::{BACKGROUND_TASKS_CATEGORY, ErrorReporter};

/// Parsed listing request.
#[derive(Debug, Clone, Default)]
pub struct TaskListQuery {
    /// Page window over the merged list.
    pub page: OffsetRequest,
    /// Caller filter in the unified vocabulary.
    pub filter: UnifiedFilter,
    /// Attach each job's payload.
    pub include_payload: bool,
}

/// Per-store totals and the histogram window.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemInfo {
    /// Matching rows in the legacy store.
    pub background_job_count: i64,
    /// Matching rows in the task queue.
    pub task_queue_count: i64,
    /// Histogram window in hours.
    pub stats_window_hours: i64,
    /// When the listing was produced.
    pub generated_at: DateTime<Utc>,
}

/// One page of the merged job list.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskListing {
    /// Jobs on this page, newest first.
    pub jobs: Vec<UnifiedJob>,
    /// Matching jobs across both stores.
    pub total_count: u64,
    /// Status histogram over the stats window.
    pub stats: StatusHistogram,
    /// Per-store details.
    pub system_info: SystemInfo,
    /// Page metadata.
    pub pagination: PaginationInfo,
}

/// Merges, pages, and summarizes jobs from both stores.
#[derive(Debug, Clone)]
pub struct TaskAggregationService {
    background_jobs: Arc<dyn BackgroundJobStore>,
    task_queue: Arc<dyn TaskQueueStore>,
    kinds: KindRegistry,
    errors: ErrorReporter,
    stats_window_hours: i64,
}

impl TaskAggregationService {
    /// Creates a new aggregation service.
    pub fn new(
        background_jobs: Arc<dyn BackgroundJobStore>,
        task_queue: Arc<dyn TaskQueueStore>,
        errors: ErrorReporter,
        config: &JobsConfig,
    ) -> Self {
        Self {
            background_jobs,
            task_queue,
            kinds: KindRegistry::from_config(config),
            errors,
            stats_window_hours: config.stats_window_hours,
        }
    }

    /// List one page of jobs. Store failures are reported to the error log
    /// and surface as a single stable error.
    pub async fn list(
        &self,
        ctx: &RequestContext,
        query: &TaskListQuery,
        endpoint: &str,
    ) -> AppResult<TaskListing> {
        match self.collect(query).await {
            Ok(listing) => Ok(listing),
            Err(e) => {
                self.errors
                    .report(
                        BACKGROUND_TASKS_CATEGORY,
                        ErrorSeverity::High,
                        &e,
                        Some(endpoint),
                        Some(ctx.user_id),
                    )
                    .await;
                Err(AppError::internal("Failed to fetch background tasks"))
            }
        }
    }

    async fn collect(&self, query: &TaskListQuery) -> AppResult<TaskListing> {
        let (legacy_filter, queue_filter) = self.kinds.split(&query.filter);
        let window = query.page.window();
        let since = Utc::now() - Duration::hours(self.stats_window_hours);

        let (legacy_rows, queue_rows, legacy_count, queue_count, legacy_stats, queue_stats) = tokio::try_join!(
            self.background_jobs.search(&legacy_filter, window),
            self.task_queue.search(&queue_filter, window),
            self.background_jobs.count(&legacy_filter),
            self.task_queue.count(&queue_filter),
            self.background_jobs.count_by_status_since(since),
            self.task_queue.count_by_status_since(since),
        )?;

        let mut merged: Vec<UnifiedJob> = legacy_rows
            .into_iter()
            .map(|job| UnifiedJob::from_background(job, query.include_payload))
            .chain(
                queue_rows
                    .into_iter()
                    .map(|job| UnifiedJob::from_task_queue(job, query.include_payload)),
            )
            .collect();
        sort_newest_first(&mut merged);
        let jobs = query.page.slice(merged);

        let mut stats = StatusHistogram::default();
        stats.record(&legacy_stats);
        stats.record(&queue_stats);

        let total_count = u64::try_from(legacy_count + queue_count).unwrap_or(0);
        debug!(
            returned = jobs.len(),
            total_count,
            offset = query.page.offset,
            limit = query.page.limit,
            "Aggregated background tasks"
        );

        Ok(TaskListing {
            pagination: PaginationInfo::new(&query.page, jobs.len(), total_count),
            jobs,
            total_count,
            stats,
            system_info: SystemInfo {
                background_job_count: legacy_count,
                task_queue_count: queue_count,
                stats_window_hours: self.stats_window_hours,
                generated_at: Utc::now(),
            },
        })
    }
}
