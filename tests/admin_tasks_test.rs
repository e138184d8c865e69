//! Integration tests for the admin background task endpoint.

mod helpers;

use axum::http::StatusCode;
use serde_json::json;
use uuid::Uuid;

use charisma_database::AuditLogSink;
use charisma_entity::job::{BackgroundJobStatus, TaskQueueStatus};
use charisma_entity::user::UserRole;

const PATH: &str = "/api/admin/background-tasks";

#[tokio::test]
async fn test_list_requires_token() {
    let app = helpers::TestApp::new();

    let response = app.request("GET", PATH, None, None).await;

    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(response.body["success"], false);
    assert_eq!(response.body["error"], "UNAUTHORIZED");
}

#[tokio::test]
async fn test_list_rejects_non_admin_without_data() {
    let app = helpers::TestApp::new();
    app.seed_background(Uuid::new_v4(), "analysis", BackgroundJobStatus::Pending)
        .await;
    let token = app.token(Uuid::new_v4(), UserRole::User);

    let response = app.request("GET", PATH, None, Some(&token)).await;

    assert_eq!(response.status, StatusCode::FORBIDDEN);
    assert_eq!(response.body["error"], "FORBIDDEN");
    assert!(response.body.get("jobs").is_none());
    assert!(response.body.get("stats").is_none());
}

#[tokio::test]
async fn test_list_merges_both_stores() {
    let app = helpers::TestApp::new();
    let owner = Uuid::new_v4();
    app.seed_background(owner, "analysis", BackgroundJobStatus::Completed)
        .await;
    app.seed_background(owner, "analysis", BackgroundJobStatus::Failed)
        .await;
    app.seed_task(owner, "story_generation", TaskQueueStatus::Queued)
        .await;
    let token = app.admin_token();

    let response = app.request("GET", PATH, None, Some(&token)).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["success"], true);
    assert_eq!(response.body["jobs"].as_array().unwrap().len(), 3);
    assert_eq!(response.body["totalCount"], 3);
    assert_eq!(response.body["stats"]["completed"], 1);
    assert_eq!(response.body["stats"]["failed"], 1);
    assert_eq!(response.body["stats"]["pending"], 1);
    assert_eq!(response.body["stats"]["total"], 3);
    assert_eq!(response.body["systemInfo"]["backgroundJobCount"], 2);
    assert_eq!(response.body["systemInfo"]["taskQueueCount"], 1);
    assert!(response.body["jobs"][0].get("payload").is_none());
}

#[tokio::test]
async fn test_list_filters_by_status_in_either_vocabulary() {
    let app = helpers::TestApp::new();
    let owner = Uuid::new_v4();
    app.seed_background(owner, "analysis", BackgroundJobStatus::Pending)
        .await;
    app.seed_task(owner, "report_export", TaskQueueStatus::Queued)
        .await;
    app.seed_task(owner, "report_export", TaskQueueStatus::Completed)
        .await;
    let token = app.admin_token();

    let response = app
        .request("GET", &format!("{PATH}?status=queued"), None, Some(&token))
        .await;

    assert_eq!(response.status, StatusCode::OK);
    let jobs = response.body["jobs"].as_array().unwrap();
    assert_eq!(jobs.len(), 2);
    assert!(jobs.iter().all(|job| job["status"] == "PENDING"));
}

#[tokio::test]
async fn test_list_pages_with_limit_and_offset() {
    let app = helpers::TestApp::new();
    let owner = Uuid::new_v4();
    for _ in 0..3 {
        app.seed_background(owner, "analysis", BackgroundJobStatus::Completed)
            .await;
    }
    let token = app.admin_token();

    let response = app
        .request("GET", &format!("{PATH}?limit=2&offset=2"), None, Some(&token))
        .await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["jobs"].as_array().unwrap().len(), 1);
    assert_eq!(response.body["pagination"]["limit"], 2);
    assert_eq!(response.body["pagination"]["offset"], 2);
    assert_eq!(response.body["pagination"]["hasMore"], false);
}

#[tokio::test]
async fn test_list_rejects_bad_query() {
    let app = helpers::TestApp::new();
    let token = app.admin_token();

    let bad_status = app
        .request("GET", &format!("{PATH}?status=sleeping"), None, Some(&token))
        .await;
    let bad_limit = app
        .request("GET", &format!("{PATH}?limit=ten"), None, Some(&token))
        .await;

    assert_eq!(bad_status.status, StatusCode::BAD_REQUEST);
    assert_eq!(bad_status.body["error"], "VALIDATION_ERROR");
    assert_eq!(bad_limit.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_bulk_cancel_touches_open_jobs_and_audits() {
    let app = helpers::TestApp::new();
    let owner = Uuid::new_v4();
    let open = app
        .seed_background(owner, "analysis", BackgroundJobStatus::Processing)
        .await;
    let done = app
        .seed_background(owner, "analysis", BackgroundJobStatus::Completed)
        .await;
    let queued = app
        .seed_task(owner, "story_generation", TaskQueueStatus::Queued)
        .await;
    let token = app.admin_token();

    let response = app
        .request(
            "POST",
            PATH,
            Some(json!({
                "action": "cancel",
                "jobIds": [open.id, done.id, queued.id],
            })),
            Some(&token),
        )
        .await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["action"], "cancel");
    assert_eq!(response.body["affectedCount"], 2);
    assert_eq!(response.body["details"]["backgroundJobs"], 1);
    assert_eq!(response.body["details"]["taskQueueJobs"], 1);

    let audit = app.audit_logs.recent(10).await.unwrap();
    assert_eq!(audit.len(), 1);
    assert_eq!(audit[0].action, "background_tasks.cancel");
}

#[tokio::test]
async fn test_bulk_rejects_unknown_action_and_non_admin() {
    let app = helpers::TestApp::new();
    let admin = app.admin_token();
    let user = app.token(Uuid::new_v4(), UserRole::User);
    let body = json!({ "action": "explode", "jobIds": [Uuid::new_v4()] });

    let unknown = app.request("POST", PATH, Some(body.clone()), Some(&admin)).await;
    let forbidden = app.request("POST", PATH, Some(body), Some(&user)).await;

    assert_eq!(unknown.status, StatusCode::BAD_REQUEST);
    assert_eq!(forbidden.status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_bulk_checks_role_before_reading_body() {
    let app = helpers::TestApp::new();
    let user = app.token(Uuid::new_v4(), UserRole::User);

    let empty_action = app
        .request("POST", PATH, Some(json!({ "action": "" })), Some(&user))
        .await;
    let wrong_shape = app
        .request("POST", PATH, Some(json!({ "jobIds": 5 })), Some(&user))
        .await;

    assert_eq!(empty_action.status, StatusCode::FORBIDDEN);
    assert_eq!(empty_action.body["error"], "FORBIDDEN");
    assert_eq!(wrong_shape.status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_bulk_retry_spans_both_stores_without_sources() {
    let app = helpers::TestApp::new();
    let owner = Uuid::new_v4();
    let legacy = app.seed_failed_background(owner).await;
    let task = app.seed_failed_task(owner).await;
    let token = app.admin_token();

    let response = app
        .request(
            "POST",
            PATH,
            Some(json!({ "action": "retry", "jobIds": [legacy.id, task.id] })),
            Some(&token),
        )
        .await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["affectedCount"], 2);
    assert_eq!(response.body["details"]["backgroundJobs"], 1);
    assert_eq!(response.body["details"]["taskQueueJobs"], 1);
    assert_eq!(response.body["details"]["totalAffected"], 2);
}

#[tokio::test]
async fn test_retried_jobs_read_back_as_fresh() {
    let app = helpers::TestApp::new();
    let owner = Uuid::new_v4();
    let legacy = app.seed_failed_background(owner).await;
    let task = app.seed_failed_task(owner).await;
    let token = app.admin_token();

    let retried = app
        .request(
            "POST",
            PATH,
            Some(json!({ "action": "retry", "jobIds": [legacy.id, task.id] })),
            Some(&token),
        )
        .await;
    assert_eq!(retried.status, StatusCode::OK);

    let listing = app.request("GET", PATH, None, Some(&token)).await;
    let jobs = listing.body["jobs"].as_array().unwrap();
    assert_eq!(jobs.len(), 2);
    for job in jobs {
        assert_eq!(job["status"], "PENDING");
        assert_eq!(job["progress"], 0);
        assert!(job["error"].is_null());
        assert_eq!(job["retryCount"], 1);
    }
    assert_eq!(listing.body["stats"]["failed"], 0);

    let owner_token = app.token(owner, UserRole::User);
    let path = format!("/api/background/analyze?jobId={}", legacy.id);
    let read = app.request("GET", &path, None, Some(&owner_token)).await;
    assert_eq!(read.status, StatusCode::OK);
    assert_eq!(read.body["job"]["status"], "PENDING");
    assert_eq!(read.body["job"]["progress"], 0);
    assert!(read.body["job"]["error"].is_null());
}

#[tokio::test]
async fn test_list_tolerates_huge_offset() {
    let app = helpers::TestApp::new();
    app.seed_background(Uuid::new_v4(), "analysis", BackgroundJobStatus::Completed)
        .await;
    let token = app.admin_token();

    let response = app
        .request(
            "GET",
            &format!("{PATH}?offset={}", u64::MAX),
            None,
            Some(&token),
        )
        .await;

    assert_eq!(response.status, StatusCode::OK);
    assert!(response.body["jobs"].as_array().unwrap().is_empty());
    assert_eq!(response.body["pagination"]["hasMore"], false);
}

#[tokio::test]
async fn test_queue_control_is_a_no_op() {
    let app = helpers::TestApp::new();
    let token = app.admin_token();

    let response = app
        .request(
            "POST",
            PATH,
            Some(json!({ "action": "pause_queue" })),
            Some(&token),
        )
        .await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["affectedCount"], 0);
}
