//! Error log entry entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use uuid::Uuid;

/// How serious a logged error is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "error_severity", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorSeverity {
    /// Informational.
    Low,
    /// Degraded behaviour.
    Medium,
    /// A request failed.
    High,
    /// The service is unusable.
    Critical,
}

impl ErrorSeverity {
    /// Return the severity as an uppercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "LOW",
            Self::Medium => "MEDIUM",
            Self::High => "HIGH",
            Self::Critical => "CRITICAL",
        }
    }
}

impl fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A persisted server-side error.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ErrorLogEntry {
    /// Unique entry identifier.
    pub id: Uuid,
    /// Subsystem category (e.g. `"BACKGROUND_TASKS"`).
    pub category: String,
    /// Severity.
    pub severity: ErrorSeverity,
    /// Error message.
    pub message: String,
    /// Error chain or backtrace text.
    pub stack_trace: Option<String>,
    /// Request path that failed.
    pub endpoint: Option<String>,
    /// User whose request failed.
    pub user_id: Option<Uuid>,
    /// When the error was recorded.
    pub created_at: DateTime<Utc>,
}

/// Data required to record an error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateErrorLogEntry {
    /// Subsystem category.
    pub category: String,
    /// Severity.
    pub severity: ErrorSeverity,
    /// Error message.
    pub message: String,
    /// Error chain text.
    pub stack_trace: Option<String>,
    /// Request path.
    pub endpoint: Option<String>,
    /// User whose request failed.
    pub user_id: Option<Uuid>,
}
