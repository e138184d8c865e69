//! Task queue model (`task_queue` table).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use uuid::Uuid;

use super::vocabulary::NativeStatus;

/// Status of a task queue entry.
///
/// Variant order matches the rows of [`super::STATUS_TABLE`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "task_queue_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskQueueStatus {
    /// Waiting in the queue.
    Queued,
    /// Being executed.
    Running,
    /// Finished successfully.
    Completed,
    /// Finished with an error.
    Failed,
    /// Stopped before completion.
    Canceled,
}

impl fmt::Display for TaskQueueStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A row of the `task_queue` table.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct TaskQueueJob {
    /// Unique task identifier.
    pub id: Uuid,
    /// Owner of the task.
    pub user_id: Uuid,
    /// Task kind (e.g. `"story_generation"`).
    pub task_type: String,
    /// Current status.
    pub status: TaskQueueStatus,
    /// Scheduling priority (higher runs first).
    pub priority: i32,
    /// Completion percentage, 0 to 100.
    pub progress: i32,
    /// Task input (JSON).
    pub payload: serde_json::Value,
    /// Result data on completion (JSON).
    pub result: Option<serde_json::Value>,
    /// Error message on failure.
    pub error: Option<String>,
    /// Number of times the task has been retried.
    pub retry_count: i32,
    /// Retry budget.
    pub max_retries: i32,
    /// When the task was created.
    pub created_at: DateTime<Utc>,
    /// When the task last entered the queue.
    pub queued_at: DateTime<Utc>,
    /// When execution started.
    pub started_at: Option<DateTime<Utc>>,
    /// When the task reached a terminal status.
    pub completed_at: Option<DateTime<Utc>>,
    /// When the row was last written.
    pub updated_at: DateTime<Utc>,
}

impl TaskQueueJob {
    /// Build a fresh `QUEUED` row from creation data.
    pub fn new(data: CreateTaskQueueJob) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            user_id: data.user_id,
            task_type: data.task_type,
            status: TaskQueueStatus::Queued,
            priority: data.priority,
            progress: 0,
            payload: data.payload,
            result: None,
            error: None,
            retry_count: 0,
            max_retries: data.max_retries,
            created_at: now,
            queued_at: now,
            started_at: None,
            completed_at: None,
            updated_at: now,
        }
    }

    /// Whether the task has reached a final status.
    pub fn is_terminal(&self) -> bool {
        self.status.to_unified().is_terminal()
    }
}

/// Data required to enqueue a task.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTaskQueueJob {
    /// Owner of the task.
    pub user_id: Uuid,
    /// Task kind.
    pub task_type: String,
    /// Scheduling priority.
    pub priority: i32,
    /// Task input.
    pub payload: serde_json::Value,
    /// Retry budget.
    pub max_retries: i32,
}
