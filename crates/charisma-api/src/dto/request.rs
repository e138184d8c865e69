//! Request DTOs with validation.
//!
//! Query parameters arrive as strings and are parsed here so that bad input
//! is reported through the standard error body.

use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use charisma_core::config::JobsConfig;
use charisma_core::error::AppError;
use charisma_core::result::AppResult;
use charisma_core::types::OffsetRequest;
use charisma_entity::job::{UnifiedFilter, UnifiedStatus};
use charisma_service::job::{BulkRequest, SubmitAnalysis, TaskListQuery};

fn parse_number(name: &str, raw: Option<&str>) -> AppResult<Option<u64>> {
    raw.map(str::trim)
        .filter(|v| !v.is_empty())
        .map(|v| {
            v.parse::<u64>().map_err(|_| {
                AppError::validation(format!("{name} must be a non-negative integer"))
            })
        })
        .transpose()
}

fn parse_uuid(name: &str, raw: &str) -> AppResult<Uuid> {
    Uuid::parse_str(raw.trim()).map_err(|_| AppError::validation(format!("Invalid {name}: {raw}")))
}

/// Query of `GET /api/admin/background-tasks`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskListParams {
    /// Page size.
    pub limit: Option<String>,
    /// Rows to skip.
    pub offset: Option<String>,
    /// Status in either vocabulary.
    pub status: Option<String>,
    /// Owner filter.
    pub user_id: Option<String>,
    /// Job kind filter.
    #[serde(rename = "type")]
    pub job_type: Option<String>,
    /// Attach payloads.
    pub include_payload: Option<String>,
}

impl TaskListParams {
    /// Parse into a service query.
    pub fn into_query(self, config: &JobsConfig) -> AppResult<TaskListQuery> {
        let page = OffsetRequest::new(
            parse_number("limit", self.limit.as_deref())?,
            parse_number("offset", self.offset.as_deref())?,
            config.default_limit,
            config.max_limit,
        );

        let status = self
            .status
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .map(str::parse::<UnifiedStatus>)
            .transpose()?;
        let user_id = self
            .user_id
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .map(|raw| parse_uuid("userId", raw))
            .transpose()?;
        let job_type = self.job_type.filter(|s| !s.trim().is_empty());
        let include_payload = matches!(
            self.include_payload.as_deref().map(str::trim),
            Some("true" | "1")
        );

        Ok(TaskListQuery {
            page,
            filter: UnifiedFilter {
                status,
                user_id,
                job_type,
            },
            include_payload,
        })
    }
}

/// Body of `POST /api/admin/background-tasks`.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct BulkActionRequest {
    /// Action name.
    #[validate(length(min = 1, message = "action is required"))]
    pub action: String,
    /// Target job ids.
    #[serde(default)]
    pub job_ids: Vec<String>,
    /// Store tag per id.
    #[serde(default)]
    pub sources: Option<Vec<String>>,
}

impl BulkActionRequest {
    /// Validate into a service request.
    pub fn into_request(self) -> AppResult<BulkRequest> {
        BulkRequest::parse(&self.action, &self.job_ids, self.sources.as_deref())
    }
}

/// Body of `POST /api/background/analyze`.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeRequest {
    /// Analysis template.
    #[validate(length(min = 1, message = "templateId is required"))]
    pub template_id: String,
    /// Model.
    #[validate(length(min = 1, message = "modelId is required"))]
    pub model_id: String,
    /// Provider.
    #[validate(length(min = 1, message = "provider is required"))]
    pub provider: String,
    /// File name.
    #[validate(length(min = 1, message = "fileName is required"))]
    pub file_name: String,
    /// File text.
    #[validate(length(min = 1, message = "fileContent is required"))]
    pub file_content: String,
}

impl From<AnalyzeRequest> for SubmitAnalysis {
    fn from(req: AnalyzeRequest) -> Self {
        Self {
            template_id: req.template_id,
            model_id: req.model_id,
            provider: req.provider,
            file_name: req.file_name,
            file_content: req.file_content,
        }
    }
}

/// `?jobId=` query.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobIdParams {
    /// Target job.
    pub job_id: Option<String>,
}

impl JobIdParams {
    /// The required job id.
    pub fn job_id(&self) -> AppResult<Uuid> {
        match self.job_id.as_deref().filter(|s| !s.trim().is_empty()) {
            Some(raw) => parse_uuid("jobId", raw),
            None => Err(AppError::validation("jobId is required")),
        }
    }
}

/// `?limit=` query of the recent jobs list.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HistoryParams {
    /// Maximum jobs to return.
    pub limit: Option<String>,
}

impl HistoryParams {
    /// Parsed limit.
    pub fn limit(&self) -> AppResult<Option<u64>> {
        parse_number("limit", self.limit.as_deref())
    }
}
