//! Task queue repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use charisma_core::error::{AppError, ErrorKind};
use charisma_core::result::AppResult;
use charisma_entity::job::{
    BulkAction, CreateTaskQueueJob, JobFilter, NativeStatus, TaskQueueJob, TaskQueueStatus,
};

use super::{push_filter, sql_limit, status_names};
use crate::store::TaskQueueStore;

/// Repository for the `task_queue` table.
#[derive(Debug, Clone)]
pub struct TaskQueueRepository {
    pool: PgPool,
}

impl TaskQueueRepository {
    /// Create a new task queue repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn non_terminal() -> Vec<String> {
        let open: Vec<TaskQueueStatus> = TaskQueueStatus::ALL
            .into_iter()
            .filter(|s| !s.to_unified().is_terminal())
            .collect();
        status_names(&open)
    }

    fn db_error(message: &'static str) -> impl FnOnce(sqlx::Error) -> AppError {
        move |e| AppError::with_source(ErrorKind::Database, message, e)
    }
}

#[async_trait]
impl TaskQueueStore for TaskQueueRepository {
    async fn create(&self, data: &CreateTaskQueueJob) -> AppResult<TaskQueueJob> {
        sqlx::query_as::<_, TaskQueueJob>(
            "INSERT INTO task_queue (user_id, task_type, priority, payload, max_retries) \
             VALUES ($1, $2, $3, $4, $5) RETURNING *",
        )
        .bind(data.user_id)
        .bind(&data.task_type)
        .bind(data.priority)
        .bind(&data.payload)
        .bind(data.max_retries)
        .fetch_one(&self.pool)
        .await
        .map_err(Self::db_error("Failed to enqueue task"))
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<TaskQueueJob>> {
        sqlx::query_as::<_, TaskQueueJob>("SELECT * FROM task_queue WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(Self::db_error("Failed to find task"))
    }

    async fn find_existing_ids(&self, ids: &[Uuid]) -> AppResult<Vec<Uuid>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        sqlx::query_scalar::<_, Uuid>("SELECT id FROM task_queue WHERE id = ANY($1)")
            .bind(ids)
            .fetch_all(&self.pool)
            .await
            .map_err(Self::db_error("Failed to look up task ids"))
    }

    async fn search(
        &self,
        filter: &JobFilter<TaskQueueStatus>,
        take: u64,
    ) -> AppResult<Vec<TaskQueueJob>> {
        if filter.match_nothing || take == 0 {
            return Ok(Vec::new());
        }
        let mut qb = QueryBuilder::<Postgres>::new("SELECT * FROM task_queue WHERE TRUE");
        push_filter(&mut qb, filter, "task_type");
        qb.push(" ORDER BY created_at DESC LIMIT ")
            .push_bind(sql_limit(take));

        qb.build_query_as::<TaskQueueJob>()
            .fetch_all(&self.pool)
            .await
            .map_err(Self::db_error("Failed to search tasks"))
    }

    async fn count(&self, filter: &JobFilter<TaskQueueStatus>) -> AppResult<i64> {
        if filter.match_nothing {
            return Ok(0);
        }
        let mut qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM task_queue WHERE TRUE");
        push_filter(&mut qb, filter, "task_type");

        qb.build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await
            .map_err(Self::db_error("Failed to count tasks"))
    }

    async fn count_by_status_since(
        &self,
        since: DateTime<Utc>,
    ) -> AppResult<Vec<(TaskQueueStatus, i64)>> {
        sqlx::query_as::<_, (TaskQueueStatus, i64)>(
            "SELECT status, COUNT(*) FROM task_queue WHERE created_at >= $1 GROUP BY status",
        )
        .bind(since)
        .fetch_all(&self.pool)
        .await
        .map_err(Self::db_error("Failed to count tasks by status"))
    }

    async fn cancel_many(&self, ids: &[Uuid]) -> AppResult<u64> {
        if ids.is_empty() {
            return Ok(0);
        }
        let eligible = status_names(&BulkAction::Cancel.eligible_native::<TaskQueueStatus>());
        let result = sqlx::query(
            "UPDATE task_queue SET status = 'CANCELED', completed_at = NOW(), updated_at = NOW() \
             WHERE id = ANY($1) AND status::text = ANY($2)",
        )
        .bind(ids)
        .bind(&eligible)
        .execute(&self.pool)
        .await
        .map_err(Self::db_error("Failed to cancel tasks"))?;
        Ok(result.rows_affected())
    }

    async fn retry_many(&self, ids: &[Uuid]) -> AppResult<u64> {
        if ids.is_empty() {
            return Ok(0);
        }
        let eligible = status_names(&BulkAction::Retry.eligible_native::<TaskQueueStatus>());
        let result = sqlx::query(
            "UPDATE task_queue SET status = 'QUEUED', progress = 0, error = NULL, \
             started_at = NULL, completed_at = NULL, retry_count = retry_count + 1, \
             queued_at = NOW(), updated_at = NOW() \
             WHERE id = ANY($1) AND status::text = ANY($2)",
        )
        .bind(ids)
        .bind(&eligible)
        .execute(&self.pool)
        .await
        .map_err(Self::db_error("Failed to retry tasks"))?;
        Ok(result.rows_affected())
    }

    async fn delete_many(&self, ids: &[Uuid]) -> AppResult<u64> {
        if ids.is_empty() {
            return Ok(0);
        }
        let eligible = status_names(&BulkAction::Delete.eligible_native::<TaskQueueStatus>());
        let result = sqlx::query("DELETE FROM task_queue WHERE id = ANY($1) AND status::text = ANY($2)")
            .bind(ids)
            .bind(&eligible)
            .execute(&self.pool)
            .await
            .map_err(Self::db_error("Failed to delete tasks"))?;
        Ok(result.rows_affected())
    }

    async fn list_for_user(&self, user_id: Uuid, limit: u64) -> AppResult<Vec<TaskQueueJob>> {
        sqlx::query_as::<_, TaskQueueJob>(
            "SELECT * FROM task_queue WHERE user_id = $1 ORDER BY created_at DESC LIMIT $2",
        )
        .bind(user_id)
        .bind(sql_limit(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(Self::db_error("Failed to list user tasks"))
    }

    async fn mark_processing(
        &self,
        id: Uuid,
        _step: Option<&str>,
    ) -> AppResult<Option<TaskQueueJob>> {
        sqlx::query_as::<_, TaskQueueJob>(
            "UPDATE task_queue SET status = 'RUNNING', started_at = NOW(), updated_at = NOW() \
             WHERE id = $1 AND status = 'QUEUED' RETURNING *",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Self::db_error("Failed to start task"))
    }

    async fn update_progress(
        &self,
        id: Uuid,
        progress: i32,
        _step: Option<&str>,
    ) -> AppResult<Option<TaskQueueJob>> {
        sqlx::query_as::<_, TaskQueueJob>(
            "UPDATE task_queue SET progress = GREATEST(progress, $2), updated_at = NOW() \
             WHERE id = $1 AND status::text = ANY($3) RETURNING *",
        )
        .bind(id)
        .bind(progress.clamp(0, 100))
        .bind(Self::non_terminal())
        .fetch_optional(&self.pool)
        .await
        .map_err(Self::db_error("Failed to update task progress"))
    }

    async fn complete(
        &self,
        id: Uuid,
        result: &serde_json::Value,
    ) -> AppResult<Option<TaskQueueJob>> {
        sqlx::query_as::<_, TaskQueueJob>(
            "UPDATE task_queue SET status = 'COMPLETED', progress = 100, result = $2, \
             completed_at = NOW(), updated_at = NOW() \
             WHERE id = $1 AND status::text = ANY($3) RETURNING *",
        )
        .bind(id)
        .bind(result)
        .bind(Self::non_terminal())
        .fetch_optional(&self.pool)
        .await
        .map_err(Self::db_error("Failed to complete task"))
    }

    async fn fail(&self, id: Uuid, error: &str) -> AppResult<Option<TaskQueueJob>> {
        sqlx::query_as::<_, TaskQueueJob>(
            "UPDATE task_queue SET status = 'FAILED', error = $2, \
             completed_at = NOW(), updated_at = NOW() \
             WHERE id = $1 AND status::text = ANY($3) RETURNING *",
        )
        .bind(id)
        .bind(error)
        .bind(Self::non_terminal())
        .fetch_optional(&self.pool)
        .await
        .map_err(Self::db_error("Failed to fail task"))
    }
}
