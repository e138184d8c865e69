//! In-memory legacy background job store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use charisma_core::result::AppResult;
use charisma_entity::job::{
    BackgroundJob, BackgroundJobStatus, BulkAction, CreateBackgroundJob, JobFilter,
};

use super::table::{JobTable, open_statuses};
use crate::store::BackgroundJobStore;

/// Process-local [`BackgroundJobStore`].
#[derive(Debug)]
pub struct MemoryBackgroundJobStore {
    table: JobTable<BackgroundJob>,
}

impl MemoryBackgroundJobStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            table: JobTable::new(),
        }
    }

    /// Insert a fully formed row, e.g. a fixture with a fixed timestamp.
    pub async fn insert(&self, job: BackgroundJob) -> BackgroundJob {
        self.table.insert(job).await
    }
}

impl Default for MemoryBackgroundJobStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BackgroundJobStore for MemoryBackgroundJobStore {
    async fn create(&self, data: &CreateBackgroundJob) -> AppResult<BackgroundJob> {
        Ok(self.table.insert(BackgroundJob::new(data.clone())).await)
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<BackgroundJob>> {
        Ok(self.table.find(id).await)
    }

    async fn find_existing_ids(&self, ids: &[Uuid]) -> AppResult<Vec<Uuid>> {
        Ok(self.table.existing_ids(ids).await)
    }

    async fn search(
        &self,
        filter: &JobFilter<BackgroundJobStatus>,
        take: u64,
    ) -> AppResult<Vec<BackgroundJob>> {
        Ok(self.table.search(filter, take).await)
    }

    async fn count(&self, filter: &JobFilter<BackgroundJobStatus>) -> AppResult<i64> {
        Ok(self.table.count(filter).await)
    }

    async fn count_by_status_since(
        &self,
        since: DateTime<Utc>,
    ) -> AppResult<Vec<(BackgroundJobStatus, i64)>> {
        Ok(self.table.count_by_status_since(since).await)
    }

    async fn cancel_many(&self, ids: &[Uuid]) -> AppResult<u64> {
        let now = Utc::now();
        let eligible = BulkAction::Cancel.eligible_native::<BackgroundJobStatus>();
        Ok(self
            .table
            .update_many(ids, &eligible, |job| {
                job.status = BackgroundJobStatus::Cancelled;
                job.completed_at = Some(now);
                job.updated_at = now;
            })
            .await)
    }

    async fn retry_many(&self, ids: &[Uuid]) -> AppResult<u64> {
        let now = Utc::now();
        let eligible = BulkAction::Retry.eligible_native::<BackgroundJobStatus>();
        Ok(self
            .table
            .update_many(ids, &eligible, |job| {
                job.status = BackgroundJobStatus::Pending;
                job.progress = 0;
                job.error = None;
                job.started_at = None;
                job.completed_at = None;
                job.retry_count += 1;
                job.updated_at = now;
            })
            .await)
    }

    async fn delete_many(&self, ids: &[Uuid]) -> AppResult<u64> {
        let eligible = BulkAction::Delete.eligible_native::<BackgroundJobStatus>();
        Ok(self.table.delete_many(ids, &eligible).await)
    }

    async fn list_for_user(&self, user_id: Uuid, limit: u64) -> AppResult<Vec<BackgroundJob>> {
        Ok(self.table.search(&JobFilter::for_user(user_id), limit).await)
    }

    async fn mark_processing(
        &self,
        id: Uuid,
        step: Option<&str>,
    ) -> AppResult<Option<BackgroundJob>> {
        let now = Utc::now();
        Ok(self
            .table
            .update_one(id, &[BackgroundJobStatus::Pending], |job| {
                job.status = BackgroundJobStatus::Processing;
                job.started_at = Some(now);
                if let Some(step) = step {
                    job.current_step = Some(step.to_string());
                }
                job.updated_at = now;
            })
            .await)
    }

    async fn update_progress(
        &self,
        id: Uuid,
        progress: i32,
        step: Option<&str>,
    ) -> AppResult<Option<BackgroundJob>> {
        let now = Utc::now();
        Ok(self
            .table
            .update_one(id, &open_statuses::<BackgroundJobStatus>(), |job| {
                job.progress = job.progress.max(progress.clamp(0, 100));
                if let Some(step) = step {
                    job.current_step = Some(step.to_string());
                }
                job.updated_at = now;
            })
            .await)
    }

    async fn complete(
        &self,
        id: Uuid,
        result: &serde_json::Value,
    ) -> AppResult<Option<BackgroundJob>> {
        let now = Utc::now();
        Ok(self
            .table
            .update_one(id, &open_statuses::<BackgroundJobStatus>(), |job| {
                job.status = BackgroundJobStatus::Completed;
                job.progress = 100;
                job.result = Some(result.clone());
                job.completed_at = Some(now);
                job.updated_at = now;
            })
            .await)
    }

    async fn fail(&self, id: Uuid, error: &str) -> AppResult<Option<BackgroundJob>> {
        let now = Utc::now();
        Ok(self
            .table
            .update_one(id, &open_statuses::<BackgroundJobStatus>(), |job| {
                job.status = BackgroundJobStatus::Failed;
                job.error = Some(error.to_string());
                job.completed_at = Some(now);
                job.updated_at = now;
            })
            .await)
    }
}
