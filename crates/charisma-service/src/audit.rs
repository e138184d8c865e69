//! Best-effort audit trail for admin actions.

use std::sync::Arc;

use tracing::warn;
use uuid::Uuid;

use charisma_database::AuditLogSink;
use charisma_entity::audit::CreateAuditLogEntry;

/// Writes audit entries without letting sink failures reach the caller.
#[derive(Debug, Clone)]
pub struct AuditRecorder {
    sink: Arc<dyn AuditLogSink>,
}

impl AuditRecorder {
    /// Creates a new audit recorder.
    pub fn new(sink: Arc<dyn AuditLogSink>) -> Self {
        Self { sink }
    }

    /// Record an action. Failures are logged and dropped.
    pub async fn record(
        &self,
        user_id: Uuid,
        action: &str,
        category: &str,
        metadata: serde_json::Value,
    ) {
        let entry = CreateAuditLogEntry {
            user_id,
            action: action.to_string(),
            category: category.to_string(),
            metadata,
        };
        if let Err(e) = self.sink.record(&entry).await {
            warn!(error = %e, action, %user_id, "Failed to write audit entry");
        }
    }
}
