//! In-memory task queue store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use charisma_core::result::AppResult;
use charisma_entity::job::{BulkAction, CreateTaskQueueJob, JobFilter, TaskQueueJob, TaskQueueStatus};

use super::table::{JobTable, open_statuses};
use crate::store::TaskQueueStore;

/// Process-local [`TaskQueueStore`].
#[derive(Debug)]
pub struct MemoryTaskQueueStore {
    table: JobTable<TaskQueueJob>,
}

impl MemoryTaskQueueStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            table: JobTable::new(),
        }
    }

    /// Insert a fully formed row.
    pub async fn insert(&self, job: TaskQueueJob) -> TaskQueueJob {
        self.table.insert(job).await
    }
}

impl Default for MemoryTaskQueueStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TaskQueueStore for MemoryTaskQueueStore {
    async fn create(&self, data: &CreateTaskQueueJob) -> AppResult<TaskQueueJob> {
        Ok(self.table.insert(TaskQueueJob::new(data.clone())).await)
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<TaskQueueJob>> {
        Ok(self.table.find(id).await)
    }

    async fn find_existing_ids(&self, ids: &[Uuid]) -> AppResult<Vec<Uuid>> {
        Ok(self.table.existing_ids(ids).await)
    }

    async fn search(
        &self,
        filter: &JobFilter<TaskQueueStatus>,
        take: u64,
    ) -> AppResult<Vec<TaskQueueJob>> {
        Ok(self.table.search(filter, take).await)
    }

    async fn count(&self, filter: &JobFilter<TaskQueueStatus>) -> AppResult<i64> {
        Ok(self.table.count(filter).await)
    }

    async fn count_by_status_since(
        &self,
        since: DateTime<Utc>,
    ) -> AppResult<Vec<(TaskQueueStatus, i64)>> {
        Ok(self.table.count_by_status_since(since).await)
    }

    async fn cancel_many(&self, ids: &[Uuid]) -> AppResult<u64> {
        let now = Utc::now();
        let eligible = BulkAction::Cancel.eligible_native::<TaskQueueStatus>();
        Ok(self
            .table
            .update_many(ids, &eligible, |task| {
                task.status = TaskQueueStatus::Canceled;
                task.completed_at = Some(now);
                task.updated_at = now;
            })
            .await)
    }

    async fn retry_many(&self, ids: &[Uuid]) -> AppResult<u64> {
        let now = Utc::now();
        let eligible = BulkAction::Retry.eligible_native::<TaskQueueStatus>();
        Ok(self
            .table
            .update_many(ids, &eligible, |task| {
                task.status = TaskQueueStatus::Queued;
                task.progress = 0;
                task.error = None;
                task.started_at = None;
                task.completed_at = None;
                task.retry_count += 1;
                task.queued_at = now;
                task.updated_at = now;
            })
            .await)
    }

    async fn delete_many(&self, ids: &[Uuid]) -> AppResult<u64> {
        let eligible = BulkAction::Delete.eligible_native::<TaskQueueStatus>();
        Ok(self.table.delete_many(ids, &eligible).await)
    }

    async fn list_for_user(&self, user_id: Uuid, limit: u64) -> AppResult<Vec<TaskQueueJob>> {
        Ok(self.table.search(&JobFilter::for_user(user_id), limit).await)
    }

    async fn mark_processing(
        &self,
        id: Uuid,
        _step: Option<&str>,
    ) -> AppResult<Option<TaskQueueJob>> {
        let now = Utc::now();
        Ok(self
            .table
            .update_one(id, &[TaskQueueStatus::Queued], |task| {
                task.status = TaskQueueStatus::Running;
                task.started_at = Some(now);
                task.updated_at = now;
            })
            .await)
    }

    async fn update_progress(
        &self,
        id: Uuid,
        progress: i32,
        _step: Option<&str>,
    ) -> AppResult<Option<TaskQueueJob>> {
        let now = Utc::now();
        Ok(self
            .table
            .update_one(id, &open_statuses::<TaskQueueStatus>(), |task| {
                task.progress = task.progress.max(progress.clamp(0, 100));
                task.updated_at = now;
            })
            .await)
    }

    async fn complete(
        &self,
        id: Uuid,
        result: &serde_json::Value,
    ) -> AppResult<Option<TaskQueueJob>> {
        let now = Utc::now();
        Ok(self
            .table
            .update_one(id, &open_statuses::<TaskQueueStatus>(), |task| {
                task.status = TaskQueueStatus::Completed;
                task.progress = 100;
                task.result = Some(result.clone());
                task.completed_at = Some(now);
                task.updated_at = now;
            })
            .await)
    }

    async fn fail(&self, id: Uuid, error: &str) -> AppResult<Option<TaskQueueJob>> {
        let now = Utc::now();
        Ok(self
            .table
            .update_one(id, &open_statuses::<TaskQueueStatus>(), |task| {
                task.status = TaskQueueStatus::Failed;
                task.error = Some(error.to_string());
                task.completed_at = Some(now);
                task.updated_at = now;
            })
            .await)
    }
}
