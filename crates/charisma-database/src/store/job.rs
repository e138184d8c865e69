//! Job store traits, one per table.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use charisma_core::result::AppResult;
use charisma_entity::job::{
    BackgroundJob, BackgroundJobStatus, CreateBackgroundJob, CreateTaskQueueJob, JobFilter,
    TaskQueueJob, TaskQueueStatus,
};

/// Access to the legacy `background_jobs` table.
///
/// Bulk mutations only touch rows whose status is eligible for the action
/// and return the number of rows changed. Worker-facing updates return
/// `None` when the job does not exist or is no longer in a status that
/// accepts the update.
#[async_trait]
pub trait BackgroundJobStore: Send + Sync + std::fmt::Debug + 'static {
    /// Insert a new `PENDING` job.
    async fn create(&self, data: &CreateBackgroundJob) -> AppResult<BackgroundJob>;

    /// Find a job by ID.
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<BackgroundJob>>;

    /// Return the subset of `ids` present in this table.
    async fn find_existing_ids(&self, ids: &[Uuid]) -> AppResult<Vec<Uuid>>;

    /// Newest-first jobs matching `filter`, at most `take` of them.
    async fn search(
        &self,
        filter: &JobFilter<BackgroundJobStatus>,
        take: u64,
    ) -> AppResult<Vec<BackgroundJob>>;

    /// Number of jobs matching `filter`.
    async fn count(&self, filter: &JobFilter<BackgroundJobStatus>) -> AppResult<i64>;

    /// Per-status counts of jobs created at or after `since`.
    async fn count_by_status_since(
        &self,
        since: DateTime<Utc>,
    ) -> AppResult<Vec<(BackgroundJobStatus, i64)>>;

    /// Cancel pending or processing jobs.
    async fn cancel_many(&self, ids: &[Uuid]) -> AppResult<u64>;

    /// Reset failed jobs to `PENDING`.
    async fn retry_many(&self, ids: &[Uuid]) -> AppResult<u64>;

    /// Delete jobs in a terminal status.
    async fn delete_many(&self, ids: &[Uuid]) -> AppResult<u64>;

    /// A user's most recent jobs.
    async fn list_for_user(&self, user_id: Uuid, limit: u64) -> AppResult<Vec<BackgroundJob>>;

    /// Move a pending job to `PROCESSING`.
    async fn mark_processing(&self, id: Uuid, step: Option<&str>)
    -> AppResult<Option<BackgroundJob>>;

    /// Record progress on a non-terminal job. Progress never decreases.
    async fn update_progress(
        &self,
        id: Uuid,
        progress: i32,
        step: Option<&str>,
    ) -> AppResult<Option<BackgroundJob>>;

    /// Mark a non-terminal job as `COMPLETED` with its result.
    async fn complete(
        &self,
        id: Uuid,
        result: &serde_json::Value,
    ) -> AppResult<Option<BackgroundJob>>;

    /// Mark a non-terminal job as `FAILED`.
    async fn fail(&self, id: Uuid, error: &str) -> AppResult<Option<BackgroundJob>>;
}

/// Access to the `task_queue` table.
#[async_trait]
pub trait TaskQueueStore: Send + Sync + std::fmt::Debug + 'static {
    /// Insert a new `QUEUED` task.
    async fn create(&self, data: &CreateTaskQueueJob) -> AppResult<TaskQueueJob>;

    /// Find a task by ID.
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<TaskQueueJob>>;

    /// Return the subset of `ids` present in this table.
    async fn find_existing_ids(&self, ids: &[Uuid]) -> AppResult<Vec<Uuid>>;

    /// Newest-first tasks matching `filter`, at most `take` of them.
    async fn search(
        &self,
        filter: &JobFilter<TaskQueueStatus>,
        take: u64,
    ) -> AppResult<Vec<TaskQueueJob>>;

    /// Number of tasks matching `filter`.
    async fn count(&self, filter: &JobFilter<TaskQueueStatus>) -> AppResult<i64>;

    /// Per-status counts of tasks created at or after `since`.
    async fn count_by_status_since(
        &self,
        since: DateTime<Utc>,
    ) -> AppResult<Vec<(TaskQueueStatus, i64)>>;

    /// Cancel queued or running tasks.
    async fn cancel_many(&self, ids: &[Uuid]) -> AppResult<u64>;

    /// Re-queue failed tasks.
    async fn retry_many(&self, ids: &[Uuid]) -> AppResult<u64>;

    /// Delete tasks in a terminal status.
    async fn delete_many(&self, ids: &[Uuid]) -> AppResult<u64>;

    /// A user's most recent tasks.
    async fn list_for_user(&self, user_id: Uuid, limit: u64) -> AppResult<Vec<TaskQueueJob>>;

    /// Move a queued task to `RUNNING`.
    async fn mark_processing(&self, id: Uuid, step: Option<&str>)
    -> AppResult<Option<TaskQueueJob>>;

    /// Record progress on a non-terminal task. Progress never decreases.
    async fn update_progress(
        &self,
        id: Uuid,
        progress: i32,
        step: Option<&str>,
    ) -> AppResult<Option<TaskQueueJob>>;

    /// Mark a non-terminal task as `COMPLETED` with its result.
    async fn complete(
        &self,
        id: Uuid,
        result: &serde_json::Value,
    ) -> AppResult<Option<TaskQueueJob>>;

    /// Mark a non-terminal task as `FAILED`.
    async fn fail(&self, id: Uuid, error: &str) -> AppResult<Option<TaskQueueJob>>;
}
