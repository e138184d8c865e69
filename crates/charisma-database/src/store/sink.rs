//! Append-only log sinks.

use async_trait::async_trait;

use charisma_core::result::AppResult;
use charisma_entity::audit::{AuditLogEntry, CreateAuditLogEntry};
use charisma_entity::error_log::{CreateErrorLogEntry, ErrorLogEntry};

/// Persistent record of server-side failures.
#[async_trait]
pub trait ErrorLogSink: Send + Sync + std::fmt::Debug + 'static {
    /// Append an entry.
    async fn record(&self, entry: &CreateErrorLogEntry) -> AppResult<ErrorLogEntry>;

    /// Most recent entries, newest first.
    async fn recent(&self, limit: u64) -> AppResult<Vec<ErrorLogEntry>>;
}

/// Persistent record of admin actions.
#[async_trait]
pub trait AuditLogSink: Send + Sync + std::fmt::Debug + 'static {
    /// Append an entry.
    async fn record(&self, entry: &CreateAuditLogEntry) -> AppResult<AuditLogEntry>;

    /// Most recent entries, newest first.
    async fn recent(&self, limit: u64) -> AppResult<Vec<AuditLogEntry>>;
}
