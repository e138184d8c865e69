//! Per-user analysis job handlers.

use axum::Json;
use axum::extract::{Query, State};

use crate::dto::request::{AnalyzeRequest, HistoryParams, JobIdParams};
use crate::dto::response::{
    ApiResponse, JobListResponse, JobResponse, MessageResponse, SubmitResponse,
};
use crate::error::ApiError;
use crate::extractors::{AuthUser, ValidatedJson};
use crate::state::AppState;

/// POST /api/background/analyze
pub async fn submit_analysis(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidatedJson(body): ValidatedJson<AnalyzeRequest>,
) -> Result<Json<ApiResponse<SubmitResponse>>, ApiError> {
    let job = state.analysis.submit(&auth, body.into()).await?;
    Ok(Json(ApiResponse::ok(SubmitResponse { job_id: job.id })))
}

/// GET /api/background/analyze?jobId=
pub async fn get_analysis(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(params): Query<JobIdParams>,
) -> Result<Json<ApiResponse<JobResponse>>, ApiError> {
    let job = state.analysis.get(&auth, params.job_id()?).await?;
    Ok(Json(ApiResponse::ok(JobResponse { job })))
}

/// DELETE /api/background/analyze?jobId=
pub async fn cancel_analysis(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(params): Query<JobIdParams>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    state.analysis.cancel(&auth, params.job_id()?).await?;
    Ok(Json(ApiResponse::ok(MessageResponse {
        message: "Job cancelled".to_string(),
    })))
}

/// GET /api/background/jobs?limit=
pub async fn recent_jobs(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(params): Query<HistoryParams>,
) -> Result<Json<ApiResponse<JobListResponse>>, ApiError> {
    let jobs = state.analysis.recent(&auth, params.limit()?).await?;
    Ok(Json(ApiResponse::ok(JobListResponse { jobs })))
}
