//! Audit log entry entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// An immutable audit log entry recording an admin action.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct AuditLogEntry {
    /// Unique audit entry identifier.
    pub id: Uuid,
    /// The user who performed the action.
    pub user_id: Uuid,
    /// The action that was performed (e.g. `"background_tasks.retry"`).
    pub action: String,
    /// Action category (e.g. `"ADMIN"`).
    pub category: String,
    /// Additional details about the action (JSON).
    pub metadata: serde_json::Value,
    /// When the action occurred.
    pub created_at: DateTime<Utc>,
}

/// Data required to create a new audit log entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateAuditLogEntry {
    /// The user who performed the action.
    pub user_id: Uuid,
    /// The action performed.
    pub action: String,
    /// Action category.
    pub category: String,
    /// Additional details.
    pub metadata: serde_json::Value,
}
