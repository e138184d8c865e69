//! Audit log repository implementation.

use async_trait::async_trait;
use sqlx::PgPool;

use charisma_core::error::{AppError, ErrorKind};
use charisma_core::result::AppResult;
use charisma_entity::audit::{AuditLogEntry, CreateAuditLogEntry};

use super::sql_limit;
use crate::store::AuditLogSink;

/// Repository for the `audit_logs` table.
#[derive(Debug, Clone)]
pub struct AuditLogRepository {
    pool: PgPool,
}

impl AuditLogRepository {
    /// Create a new audit log repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AuditLogSink for AuditLogRepository {
    async fn record(&self, entry: &CreateAuditLogEntry) -> AppResult<AuditLogEntry> {
        sqlx::query_as::<_, AuditLogEntry>(
            "INSERT INTO audit_logs (user_id, action, category, metadata) \
             VALUES ($1, $2, $3, $4) RETURNING *",
        )
        .bind(entry.user_id)
        .bind(&entry.action)
        .bind(&entry.category)
        .bind(&entry.metadata)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to create audit entry", e))
    }

    async fn recent(&self, limit: u64) -> AppResult<Vec<AuditLogEntry>> {
        sqlx::query_as::<_, AuditLogEntry>(
            "SELECT * FROM audit_logs ORDER BY created_at DESC LIMIT $1",
        )
        .bind(sql_limit(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list audit entries", e))
    }
}
