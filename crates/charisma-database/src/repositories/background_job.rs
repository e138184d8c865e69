//! Legacy background job repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use charisma_core::error::{AppError, ErrorKind};
use charisma_core::result::AppResult;
use charisma_entity::job::{
    BackgroundJob, BackgroundJobStatus, BulkAction, CreateBackgroundJob, JobFilter, NativeStatus,
};

use super::{push_filter, sql_limit, status_names};
use crate::store::BackgroundJobStore;

/// Repository for the `background_jobs` table.
#[derive(Debug, Clone)]
pub struct BackgroundJobRepository {
    pool: PgPool,
}

impl BackgroundJobRepository {
    /// Create a new background job repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn non_terminal() -> Vec<String> {
        let open: Vec<BackgroundJobStatus> = BackgroundJobStatus::ALL
            .into_iter()
            .filter(|s| !s.to_unified().is_terminal())
            .collect();
        status_names(&open)
    }
}

#[async_trait]
impl BackgroundJobStore for BackgroundJobRepository {
    async fn create(&self, data: &CreateBackgroundJob) -> AppResult<BackgroundJob> {
        sqlx::query_as::<_, BackgroundJob>(
            "INSERT INTO background_jobs (user_id, job_type, payload, current_step, total_steps, max_retries) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING *",
        )
        .bind(data.user_id)
        .bind(&data.job_type)
        .bind(&data.payload)
        .bind(&data.current_step)
        .bind(data.total_steps)
        .bind(data.max_retries)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to create background job", e))
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<BackgroundJob>> {
        sqlx::query_as::<_, BackgroundJob>("SELECT * FROM background_jobs WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find background job", e))
    }

    async fn find_existing_ids(&self, ids: &[Uuid]) -> AppResult<Vec<Uuid>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        sqlx::query_scalar::<_, Uuid>("SELECT id FROM background_jobs WHERE id = ANY($1)")
            .bind(ids)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to look up background job ids", e)
            })
    }

    async fn search(
        &self,
        filter: &JobFilter<BackgroundJobStatus>,
        take: u64,
    ) -> AppResult<Vec<BackgroundJob>> {
        if filter.match_nothing || take == 0 {
            return Ok(Vec::new());
        }
        let mut qb = QueryBuilder::<Postgres>::new("SELECT * FROM background_jobs WHERE TRUE");
        push_filter(&mut qb, filter, "job_type");
        qb.push(" ORDER BY created_at DESC LIMIT ")
            .push_bind(sql_limit(take));

        qb.build_query_as::<BackgroundJob>()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to search background jobs", e))
    }

    async fn count(&self, filter: &JobFilter<BackgroundJobStatus>) -> AppResult<i64> {
        if filter.match_nothing {
            return Ok(0);
        }
        let mut qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM background_jobs WHERE TRUE");
        push_filter(&mut qb, filter, "job_type");

        qb.build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to count background jobs", e))
    }

    async fn count_by_status_since(
        &self,
        since: DateTime<Utc>,
    ) -> AppResult<Vec<(BackgroundJobStatus, i64)>> {
        sqlx::query_as::<_, (BackgroundJobStatus, i64)>(
            "SELECT status, COUNT(*) FROM background_jobs WHERE created_at >= $1 GROUP BY status",
        )
        .bind(since)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to count background jobs by status", e)
        })
    }

    async fn cancel_many(&self, ids: &[Uuid]) -> AppResult<u64> {
        if ids.is_empty() {
            return Ok(0);
        }
        let eligible = status_names(&BulkAction::Cancel.eligible_native::<BackgroundJobStatus>());
        let result = sqlx::query(
            "UPDATE background_jobs SET status = 'CANCELLED', completed_at = NOW(), updated_at = NOW() \
             WHERE id = ANY($1) AND status::text = ANY($2)",
        )
        .bind(ids)
        .bind(&eligible)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to cancel background jobs", e))?;
        Ok(result.rows_affected())
    }

    async fn retry_many(&self, ids: &[Uuid]) -> AppResult<u64> {
        if ids.is_empty() {
            return Ok(0);
        }
        let eligible = status_names(&BulkAction::Retry.eligible_native::<BackgroundJobStatus>());
        let result = sqlx::query(
            "UPDATE background_jobs SET status = 'PENDING', progress = 0, error = NULL, \
             started_at = NULL, completed_at = NULL, retry_count = retry_count + 1, updated_at = NOW() \
             WHERE id = ANY($1) AND status::text = ANY($2)",
        )
        .bind(ids)
        .bind(&eligible)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to retry background jobs", e))?;
        Ok(result.rows_affected())
    }

    async fn delete_many(&self, ids: &[Uuid]) -> AppResult<u64> {
        if ids.is_empty() {
            return Ok(0);
        }
        let eligible = status_names(&BulkAction::Delete.eligible_native::<BackgroundJobStatus>());
        let result = sqlx::query("DELETE FROM background_jobs WHERE id = ANY($1) AND status::text = ANY($2)")
            .bind(ids)
            .bind(&eligible)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to delete background jobs", e))?;
        Ok(result.rows_affected())
    }

    async fn list_for_user(&self, user_id: Uuid, limit: u64) -> AppResult<Vec<BackgroundJob>> {
        sqlx::query_as::<_, BackgroundJob>(
            "SELECT * FROM background_jobs WHERE user_id = $1 ORDER BY created_at DESC LIMIT $2",
        )
        .bind(user_id)
        .bind(sql_limit(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list user background jobs", e))
    }

    async fn mark_processing(
        &self,
        id: Uuid,
        step: Option<&str>,
    ) -> AppResult<Option<BackgroundJob>> {
        sqlx::query_as::<_, BackgroundJob>(
            "UPDATE background_jobs SET status = 'PROCESSING', started_at = NOW(), \
             current_step = COALESCE($2, current_step), updated_at = NOW() \
             WHERE id = $1 AND status = 'PENDING' RETURNING *",
        )
        .bind(id)
        .bind(step)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to start background job", e))
    }

    async fn update_progress(
        &self,
        id: Uuid,
        progress: i32,
        step: Option<&str>,
    ) -> AppResult<Option<BackgroundJob>> {
        sqlx::query_as::<_, BackgroundJob>(
            "UPDATE background_jobs SET progress = GREATEST(progress, $2), \
             current_step = COALESCE($3, current_step), updated_at = NOW() \
             WHERE id = $1 AND status::text = ANY($4) RETURNING *",
        )
        .bind(id)
        .bind(progress.clamp(0, 100))
        .bind(step)
        .bind(Self::non_terminal())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to update background job progress", e)
        })
    }

    async fn complete(
        &self,
        id: Uuid,
        result: &serde_json::Value,
    ) -> AppResult<Option<BackgroundJob>> {
        sqlx::query_as::<_, BackgroundJob>(
            "UPDATE background_jobs SET status = 'COMPLETED', progress = 100, result = $2, \
             completed_at = NOW(), updated_at = NOW() \
             WHERE id = $1 AND status::text = ANY($3) RETURNING *",
        )
        .bind(id)
        .bind(result)
        .bind(Self::non_terminal())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to complete background job", e))
    }

    async fn fail(&self, id: Uuid, error: &str) -> AppResult<Option<BackgroundJob>> {
        sqlx::query_as::<_, BackgroundJob>(
            "UPDATE background_jobs SET status = 'FAILED', error = $2, \
             completed_at = NOW(), updated_at = NOW() \
             WHERE id = $1 AND status::text = ANY($3) RETURNING *",
        )
        .bind(id)
        .bind(error)
        .bind(Self::non_terminal())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to fail background job", e))
    }
}
