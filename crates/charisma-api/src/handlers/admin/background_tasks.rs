//! Admin background task dashboard handlers.

use axum::Json;
use axum::body::Bytes;
use axum::extract::{Query, State};

use charisma_service::job::TaskListing;

use crate::dto::request::{BulkActionRequest, TaskListParams};
use crate::dto::response::{ApiResponse, BulkActionResponse};
use crate::error::ApiError;
use crate::extractors::{AuthUser, ValidatedJson};
use crate::middleware::rbac::require_admin;
use crate::state::AppState;

/// Endpoint path recorded with persisted errors.
pub const ENDPOINT: &str = "/api/admin/background-tasks";

/// GET /api/admin/background-tasks
pub async fn list_background_tasks(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(params): Query<TaskListParams>,
) -> Result<Json<ApiResponse<TaskListing>>, ApiError> {
    require_admin(&auth)?;
    let query = params.into_query(&state.config.jobs)?;
    let listing = state.aggregation.list(&auth, &query, ENDPOINT).await?;
    Ok(Json(ApiResponse::ok(listing)))
}

/// POST /api/admin/background-tasks
pub async fn bulk_action(
    State(state): State<AppState>,
    auth: AuthUser,
    body: Bytes,
) -> Result<Json<ApiResponse<BulkActionResponse>>, ApiError> {
    require_admin(&auth)?;
    let ValidatedJson(body) = ValidatedJson::<BulkActionRequest>::from_bytes(&body)?;
    let request = body.into_request()?;
    let outcome = state.bulk_actions.execute(&auth, &request, ENDPOINT).await?;
    Ok(Json(ApiResponse::ok(outcome.into())))
}
