//! Job use cases spanning both job stores.

pub mod aggregation;
pub mod analysis;
pub mod bulk;
pub mod progress;

pub use aggregation::{SystemInfo, TaskAggregationService, TaskListQuery, TaskListing};
pub use analysis::{AnalysisJobService, SubmitAnalysis};
pub use bulk::{BulkActionService, BulkOutcome, BulkRequest};
pub use progress::JobProgressReporter;

use charisma_entity::job::UnifiedJob;

/// Stable newest-first ordering of unified jobs.
pub(crate) fn sort_newest_first(jobs: &mut [UnifiedJob]) {
    jobs.sort_by(|a, b| b.created_at.cmp(&a.created_at));
}

#[cfg(test)]
pub(crate) mod testing;
