//! Legacy background job model (`background_jobs` table).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use uuid::Uuid;

use super::vocabulary::NativeStatus;

/// Status of a legacy background job.
///
/// Variant order matches the rows of [`super::STATUS_TABLE`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "background_job_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BackgroundJobStatus {
    /// Waiting for a worker.
    Pending,
    /// Being processed by a worker.
    Processing,
    /// Finished successfully.
    Completed,
    /// Finished with an error.
    Failed,
    /// Stopped by a user or an admin.
    Cancelled,
}

impl fmt::Display for BackgroundJobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A row of the legacy `background_jobs` table.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct BackgroundJob {
    /// Unique job identifier.
    pub id: Uuid,
    /// Owner of the job.
    pub user_id: Uuid,
    /// Job kind (e.g. `"analysis"`).
    pub job_type: String,
    /// Current status.
    pub status: BackgroundJobStatus,
    /// Completion percentage, 0 to 100.
    pub progress: i32,
    /// Human-readable name of the running phase.
    pub current_step: Option<String>,
    /// Number of phases the job reports.
    pub total_steps: i32,
    /// Job input (JSON).
    pub payload: serde_json::Value,
    /// Result data on completion (JSON).
    pub result: Option<serde_json::Value>,
    /// Error message on failure.
    pub error: Option<String>,
    /// Number of times the job has been retried.
    pub retry_count: i32,
    /// Retry budget.
    pub max_retries: i32,
    /// When the job was created.
    pub created_at: DateTime<Utc>,
    /// When a worker picked the job up.
    pub started_at: Option<DateTime<Utc>>,
    /// When the job reached a terminal status.
    pub completed_at: Option<DateTime<Utc>>,
    /// When the row was last written.
    pub updated_at: DateTime<Utc>,
}

impl BackgroundJob {
    /// Build a fresh `PENDING` row from creation data.
    pub fn new(data: CreateBackgroundJob) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            user_id: data.user_id,
            job_type: data.job_type,
            status: BackgroundJobStatus::Pending,
            progress: 0,
            current_step: data.current_step,
            total_steps: data.total_steps,
            payload: data.payload,
            result: None,
            error: None,
            retry_count: 0,
            max_retries: data.max_retries,
            created_at: now,
            started_at: None,
            completed_at: None,
            updated_at: now,
        }
    }

    /// Whether the job has reached a final status.
    pub fn is_terminal(&self) -> bool {
        self.status.to_unified().is_terminal()
    }
}

/// Data required to create a legacy background job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateBackgroundJob {
    /// Owner of the job.
    pub user_id: Uuid,
    /// Job kind.
    pub job_type: String,
    /// Job input.
    pub payload: serde_json::Value,
    /// Initial step label.
    pub current_step: Option<String>,
    /// Number of phases.
    pub total_steps: i32,
    /// Retry budget.
    pub max_retries: i32,
}
