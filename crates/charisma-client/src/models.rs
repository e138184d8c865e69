//! Wire shapes consumed by the client.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use charisma_core::types::PaginationInfo;
use charisma_entity::job::{StatusHistogram, UnifiedJob};

/// Body of an analysis submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisRequest {
    /// Analysis template.
    pub template_id: String,
    /// Model.
    pub model_id: String,
    /// Provider.
    pub provider: String,
    /// File name.
    pub file_name: String,
    /// File text.
    pub file_content: String,
}

/// Filters of the admin task listing.
#[derive(Debug, Clone, Default)]
pub struct TaskListParams {
    /// Page size.
    pub limit: Option<u64>,
    /// Rows to skip.
    pub offset: Option<u64>,
    /// Status in either vocabulary.
    pub status: Option<String>,
    /// Owner.
    pub user_id: Option<Uuid>,
    /// Job kind.
    pub job_type: Option<String>,
    /// Attach payloads.
    pub include_payload: bool,
}

impl TaskListParams {
    /// Query string pairs.
    pub fn pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(limit) = self.limit {
            pairs.push(("limit", limit.to_string()));
        }
        if let Some(offset) = self.offset {
            pairs.push(("offset", offset.to_string()));
        }
        if let Some(status) = &self.status {
            pairs.push(("status", status.clone()));
        }
        if let Some(user_id) = self.user_id {
            pairs.push(("userId", user_id.to_string()));
        }
        if let Some(job_type) = &self.job_type {
            pairs.push(("type", job_type.clone()));
        }
        if self.include_payload {
            pairs.push(("includePayload", "true".to_string()));
        }
        pairs
    }
}

/// One page of the admin task listing.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskPage {
    /// Jobs on this page.
    pub jobs: Vec<UnifiedJob>,
    /// Matching jobs across both stores.
    pub total_count: u64,
    /// Histogram over the stats window.
    pub stats: StatusHistogram,
    /// Page metadata.
    pub pagination: PaginationInfo,
}

/// Result of an admin bulk action.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkActionResult {
    /// Applied action.
    pub action: String,
    /// Rows changed.
    pub affected_count: u64,
    /// Summary.
    pub message: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SubmitBody {
    pub job_id: Uuid,
}

#[derive(Debug, Deserialize)]
pub(crate) struct JobBody {
    pub job: UnifiedJob,
}

#[derive(Debug, Deserialize)]
pub(crate) struct JobsBody {
    pub jobs: Vec<UnifiedJob>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    #[serde(default)]
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_params_pairs() {
        let params = TaskListParams {
            limit: Some(10),
            status: Some("running".into()),
            include_payload: true,
            ..Default::default()
        };
        assert_eq!(
            params.pairs(),
            vec![
                ("limit", "10".to_string()),
                ("status", "running".to_string()),
                ("includePayload", "true".to_string()),
            ]
        );
        assert!(TaskListParams::default().pairs().is_empty());
    }
}
