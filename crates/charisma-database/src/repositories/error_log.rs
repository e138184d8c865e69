//! Error log repository implementation.

use async_trait::async_trait;
use sqlx::PgPool;

use charisma_core::error::{AppError, ErrorKind};
use charisma_core::result::AppResult;
use charisma_entity::error_log::{CreateErrorLogEntry, ErrorLogEntry};

use super::sql_limit;
use crate::store::ErrorLogSink;

/// Repository for the `error_logs` table.
#[derive(Debug, Clone)]
pub struct ErrorLogRepository {
    pool: PgPool,
}

impl ErrorLogRepository {
    /// Create a new error log repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ErrorLogSink for ErrorLogRepository {
    async fn record(&self, entry: &CreateErrorLogEntry) -> AppResult<ErrorLogEntry> {
        sqlx::query_as::<_, ErrorLogEntry>(
            "INSERT INTO error_logs (category, severity, message, stack_trace, endpoint, user_id) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING *",
        )
        .bind(&entry.category)
        .bind(entry.severity)
        .bind(&entry.message)
        .bind(&entry.stack_trace)
        .bind(&entry.endpoint)
        .bind(entry.user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to record error", e))
    }

    async fn recent(&self, limit: u64) -> AppResult<Vec<ErrorLogEntry>> {
        sqlx::query_as::<_, ErrorLogEntry>(
            "SELECT * FROM error_logs ORDER BY created_at DESC LIMIT $1",
        )
        .bind(sql_limit(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list error entries", e))
    }
}
