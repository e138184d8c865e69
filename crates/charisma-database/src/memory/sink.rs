//! In-memory log sinks.

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use charisma_core::result::AppResult;
use charisma_entity::audit::{AuditLogEntry, CreateAuditLogEntry};
use charisma_entity::error_log::{CreateErrorLogEntry, ErrorLogEntry};

use crate::store::{AuditLogSink, ErrorLogSink};

/// Process-local [`ErrorLogSink`].
#[derive(Debug, Default)]
pub struct MemoryErrorLogSink {
    entries: RwLock<Vec<ErrorLogEntry>>,
}

impl MemoryErrorLogSink {
    /// Create an empty sink.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ErrorLogSink for MemoryErrorLogSink {
    async fn record(&self, entry: &CreateErrorLogEntry) -> AppResult<ErrorLogEntry> {
        let row = ErrorLogEntry {
            id: Uuid::new_v4(),
            category: entry.category.clone(),
            severity: entry.severity,
            message: entry.message.clone(),
            stack_trace: entry.stack_trace.clone(),
            endpoint: entry.endpoint.clone(),
            user_id: entry.user_id,
            created_at: Utc::now(),
        };
        self.entries.write().await.push(row.clone());
        Ok(row)
    }

    async fn recent(&self, limit: u64) -> AppResult<Vec<ErrorLogEntry>> {
        Ok(newest_first(&self.entries.read().await, limit))
    }
}

/// Process-local [`AuditLogSink`].
#[derive(Debug, Default)]
pub struct MemoryAuditLogSink {
    entries: RwLock<Vec<AuditLogEntry>>,
}

impl MemoryAuditLogSink {
    /// Create an empty sink.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AuditLogSink for MemoryAuditLogSink {
    async fn record(&self, entry: &CreateAuditLogEntry) -> AppResult<AuditLogEntry> {
        let row = AuditLogEntry {
            id: Uuid::new_v4(),
            user_id: entry.user_id,
            action: entry.action.clone(),
            category: entry.category.clone(),
            metadata: entry.metadata.clone(),
            created_at: Utc::now(),
        };
        self.entries.write().await.push(row.clone());
        Ok(row)
    }

    async fn recent(&self, limit: u64) -> AppResult<Vec<AuditLogEntry>> {
        Ok(newest_first(&self.entries.read().await, limit))
    }
}

fn newest_first<T: Clone>(entries: &[T], limit: u64) -> Vec<T> {
    entries
        .iter()
        .rev()
        .take(usize::try_from(limit).unwrap_or(usize::MAX))
        .cloned()
        .collect()
}
