//! Store doubles for service tests.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use charisma_core::AppError;
use charisma_core::error::ErrorKind;
use charisma_core::result::AppResult;
use charisma_database::TaskQueueStore;
use charisma_entity::job::{CreateTaskQueueJob, JobFilter, TaskQueueJob, TaskQueueStatus};

/// A task queue whose every call fails like a dropped connection.
#[derive(Debug, Default)]
pub struct UnreachableTaskQueue;

fn down<T>() -> AppResult<T> {
    Err(AppError::with_source(
        ErrorKind::Database,
        "Task queue query failed",
        std::io::Error::other("connection refused"),
    ))
}

#[async_trait]
impl TaskQueueStore for UnreachableTaskQueue {
    async fn create(&self, _data: &CreateTaskQueueJob) -> AppResult<TaskQueueJob> {
        down()
    }

    async fn find_by_id(&self, _id: Uuid) -> AppResult<Option<TaskQueueJob>> {
        down()
    }

    async fn find_existing_ids(&self, _ids: &[Uuid]) -> AppResult<Vec<Uuid>> {
        down()
    }

    async fn search(
        &self,
        _filter: &JobFilter<TaskQueueStatus>,
        _take: u64,
    ) -> AppResult<Vec<TaskQueueJob>> {
        down()
    }

    async fn count(&self, _filter: &JobFilter<TaskQueueStatus>) -> AppResult<i64> {
        down()
    }

    async fn count_by_status_since(
        &self,
        _since: DateTime<Utc>,
    ) -> AppResult<Vec<(TaskQueueStatus, i64)>> {
        down()
    }

    async fn cancel_many(&self, _ids: &[Uuid]) -> AppResult<u64> {
        down()
    }

    async fn retry_many(&self, _ids: &[Uuid]) -> AppResult<u64> {
        down()
    }

    async fn delete_many(&self, _ids: &[Uuid]) -> AppResult<u64> {
        down()
    }

    async fn list_for_user(&self, _user_id: Uuid, _limit: u64) -> AppResult<Vec<TaskQueueJob>> {
        down()
    }

    async fn mark_processing(
        &self,
        _id: Uuid,
        _step: Option<&str>,
    ) -> AppResult<Option<TaskQueueJob>> {
        down()
    }

    async fn update_progress(
        &self,
        _id: Uuid,
        _progress: i32,
        _step: Option<&str>,
    ) -> AppResult<Option<TaskQueueJob>> {
        down()
    }

    async fn complete(
        &self,
        _id: Uuid,
        _result: &serde_json::Value,
    ) -> AppResult<Option<TaskQueueJob>> {
        down()
    }

    async fn fail(&self, _id: Uuid, _error: &str) -> AppResult<Option<TaskQueueJob>> {
        down()
    }
}
