//! Response DTOs.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use charisma_entity::job::{BulkAction, UnifiedJob};
use charisma_service::job::BulkOutcome;

/// Standard success response wrapper. The payload's fields sit beside
/// `success` at the top level.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T: Serialize> {
    /// Whether the request was successful.
    pub success: bool,
    /// Response data.
    #[serde(flatten)]
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    /// Creates a successful response.
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

/// Per-store counts of a bulk action.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkActionDetails {
    /// Legacy store rows changed.
    pub background_jobs: u64,
    /// Task queue rows changed.
    pub task_queue_jobs: u64,
    /// Sum.
    pub total_affected: u64,
}

/// Bulk action result.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkActionResponse {
    /// Applied action.
    pub action: BulkAction,
    /// Total rows changed.
    pub affected_count: u64,
    /// Per-store counts.
    pub details: BulkActionDetails,
    /// Summary.
    pub message: String,
}

impl From<BulkOutcome> for BulkActionResponse {
    fn from(outcome: BulkOutcome) -> Self {
        Self {
            action: outcome.action,
            affected_count: outcome.total_affected,
            details: BulkActionDetails {
                background_jobs: outcome.background_jobs,
                task_queue_jobs: outcome.task_queue_jobs,
                total_affected: outcome.total_affected,
            },
            message: outcome.message,
        }
    }
}

/// Submission result.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitResponse {
    /// New job id.
    pub job_id: Uuid,
}

/// One job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobResponse {
    /// The job.
    pub job: UnifiedJob,
}

/// Several jobs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobListResponse {
    /// Jobs, newest first.
    pub jobs: Vec<UnifiedJob>,
}

/// Simple message response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    /// Message.
    pub message: String,
}

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    /// `ok` or `degraded`.
    pub status: String,
    /// Server version.
    pub version: String,
    /// Seconds since start.
    pub uptime_seconds: u64,
    /// `memory`, `connected`, or `unavailable`.
    pub database: String,
    /// Open notification streams.
    pub stream_subscribers: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_payload_is_flattened() {
        let body = ApiResponse::ok(SubmitResponse {
            job_id: Uuid::nil(),
        });
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            json!({"success": true, "jobId": Uuid::nil()})
        );
    }
}
