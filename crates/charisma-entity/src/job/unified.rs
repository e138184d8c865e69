//! Store-independent job view.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use super::background::BackgroundJob;
use super::task_queue::TaskQueueJob;
use super::vocabulary::{NativeStatus, UnifiedStatus};

/// Which store a unified job came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum JobSource {
    /// The legacy `background_jobs` table.
    #[serde(rename = "backgroundJob")]
    BackgroundJob,
    /// The `task_queue` table.
    #[serde(rename = "taskQueue")]
    TaskQueue,
}

impl JobSource {
    /// Return the source as its wire tag.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BackgroundJob => "backgroundJob",
            Self::TaskQueue => "taskQueue",
        }
    }

    /// Parse a wire tag.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "backgroundJob" => Some(Self::BackgroundJob),
            "taskQueue" => Some(Self::TaskQueue),
            _ => None,
        }
    }
}

impl fmt::Display for JobSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A job from either store, in one shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnifiedJob {
    /// Job identifier.
    pub id: Uuid,
    /// Origin store.
    pub source: JobSource,
    /// Owner.
    pub user_id: Uuid,
    /// Job kind.
    #[serde(rename = "type")]
    pub job_type: String,
    /// Status in the unified vocabulary.
    pub status: UnifiedStatus,
    /// Completion percentage.
    pub progress: i32,
    /// Running phase label.
    pub current_step: Option<String>,
    /// Number of phases.
    pub total_steps: i32,
    /// Result data.
    pub result: Option<serde_json::Value>,
    /// Failure message.
    pub error: Option<String>,
    /// Retries so far.
    pub retry_count: i32,
    /// Retry budget.
    pub max_retries: i32,
    /// Task queue priority.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<i32>,
    /// Job input, only present when requested.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<serde_json::Value>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Start time.
    pub started_at: Option<DateTime<Utc>>,
    /// Completion time.
    pub completed_at: Option<DateTime<Utc>>,
    /// Last write time.
    pub updated_at: DateTime<Utc>,
}

impl UnifiedJob {
    /// Normalize a legacy background job.
    pub fn from_background(job: BackgroundJob, include_payload: bool) -> Self {
        Self {
            id: job.id,
            source: JobSource::BackgroundJob,
            user_id: job.user_id,
            job_type: job.job_type,
            status: job.status.to_unified(),
            progress: job.progress,
            current_step: job.current_step,
            total_steps: job.total_steps,
            result: job.result,
            error: job.error,
            retry_count: job.retry_count,
            max_retries: job.max_retries,
            priority: None,
            payload: include_payload.then_some(job.payload),
            created_at: job.created_at,
            started_at: job.started_at,
            completed_at: job.completed_at,
            updated_at: job.updated_at,
        }
    }

    /// Normalize a task queue entry. Task queue rows have no step tracking,
    /// so they report a single step named after the task kind.
    pub fn from_task_queue(job: TaskQueueJob, include_payload: bool) -> Self {
        Self {
            id: job.id,
            source: JobSource::TaskQueue,
            user_id: job.user_id,
            current_step: Some(format!("{} Task", job.task_type)),
            job_type: job.task_type,
            status: job.status.to_unified(),
            progress: job.progress,
            total_steps: 1,
            result: job.result,
            error: job.error,
            retry_count: job.retry_count,
            max_retries: job.max_retries,
            priority: Some(job.priority),
            payload: include_payload.then_some(job.payload),
            created_at: job.created_at,
            started_at: job.started_at,
            completed_at: job.completed_at,
            updated_at: job.updated_at,
        }
    }

    /// Check if the job is in a final status.
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}

/// Job counts per unified status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusHistogram {
    /// Pending jobs.
    pub pending: i64,
    /// Processing jobs.
    pub processing: i64,
    /// Completed jobs.
    pub completed: i64,
    /// Failed jobs.
    pub failed: i64,
    /// Cancelled jobs.
    pub cancelled: i64,
    /// Sum of all buckets.
    pub total: i64,
}

impl StatusHistogram {
    /// Add `count` jobs to the bucket of `status`.
    pub fn add(&mut self, status: UnifiedStatus, count: i64) {
        let bucket = match status {
            UnifiedStatus::Pending => &mut self.pending,
            UnifiedStatus::Processing => &mut self.processing,
            UnifiedStatus::Completed => &mut self.completed,
            UnifiedStatus::Failed => &mut self.failed,
            UnifiedStatus::Cancelled => &mut self.cancelled,
        };
        *bucket += count;
        self.total += count;
    }

    /// Add native per-status counts from one store.
    pub fn record<S: NativeStatus>(&mut self, counts: &[(S, i64)]) {
        for (status, count) in counts {
            self.add(status.to_unified(), *count);
        }
    }

    /// Count in the bucket of `status`.
    pub fn get(&self, status: UnifiedStatus) -> i64 {
        match status {
            UnifiedStatus::Pending => self.pending,
            UnifiedStatus::Processing => self.processing,
            UnifiedStatus::Completed => self.completed,
            UnifiedStatus::Failed => self.failed,
            UnifiedStatus::Cancelled => self.cancelled,
        }
    }
}
