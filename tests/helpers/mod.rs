//! Shared test helpers for integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::Value;
use tower::ServiceExt;
use uuid::Uuid;

use charisma_api::{AppState, build_app, build_state};
use charisma_auth::JwtEncoder;
use charisma_core::config::AppConfig;
use charisma_database::Stores;
use charisma_database::memory::{
    MemoryAuditLogSink, MemoryBackgroundJobStore, MemoryErrorLogSink, MemoryTaskQueueStore,
};
use charisma_entity::job::{
    BackgroundJob, BackgroundJobStatus, CreateBackgroundJob, CreateTaskQueueJob, TaskQueueJob,
    TaskQueueStatus,
};
use charisma_entity::user::UserRole;

/// Test application context over in-memory stores
pub struct TestApp {
    /// The Axum router for making test requests
    pub router: Router,
    /// Shared state, for driving services directly
    pub state: AppState,
    /// Application config
    pub config: AppConfig,
    /// Legacy job store, for seeding rows in any status
    pub background_jobs: Arc<MemoryBackgroundJobStore>,
    /// Task queue store, for seeding rows in any status
    pub task_queue: Arc<MemoryTaskQueueStore>,
    /// Audit sink
    pub audit_logs: Arc<MemoryAuditLogSink>,
}

impl TestApp {
    /// Create a new test application
    pub fn new() -> Self {
        let config = AppConfig::default();
        let background_jobs = Arc::new(MemoryBackgroundJobStore::new());
        let task_queue = Arc::new(MemoryTaskQueueStore::new());
        let audit_logs = Arc::new(MemoryAuditLogSink::new());
        let stores = Stores {
            background_jobs: background_jobs.clone(),
            task_queue: task_queue.clone(),
            error_logs: Arc::new(MemoryErrorLogSink::new()),
            audit_logs: audit_logs.clone(),
            pool: None,
        };

        let state = build_state(config.clone(), stores);
        let router = build_app(state.clone());

        Self {
            router,
            state,
            config,
            background_jobs,
            task_queue,
            audit_logs,
        }
    }

    /// Mint a session token
    pub fn token(&self, user_id: Uuid, role: UserRole) -> String {
        JwtEncoder::new(&self.config.auth)
            .issue(user_id, role, "tester")
            .expect("Failed to sign token")
    }

    /// Token for a fresh admin
    pub fn admin_token(&self) -> String {
        self.token(Uuid::new_v4(), UserRole::Admin)
    }

    /// Insert a legacy job in the given status
    pub async fn seed_background(
        &self,
        user_id: Uuid,
        job_type: &str,
        status: BackgroundJobStatus,
    ) -> BackgroundJob {
        let mut job = BackgroundJob::new(CreateBackgroundJob {
            user_id,
            job_type: job_type.to_string(),
            payload: serde_json::json!({ "fileName": "chat.txt" }),
            current_step: None,
            total_steps: 4,
            max_retries: 3,
        });
        job.status = status;
        self.background_jobs.insert(job).await
    }

    /// Insert a task queue job in the given status
    pub async fn seed_task(
        &self,
        user_id: Uuid,
        task_type: &str,
        status: TaskQueueStatus,
    ) -> TaskQueueJob {
        let mut job = TaskQueueJob::new(CreateTaskQueueJob {
            user_id,
            task_type: task_type.to_string(),
            priority: 5,
            payload: serde_json::json!({ "storyId": 7 }),
            max_retries: 3,
        });
        job.status = status;
        self.task_queue.insert(job).await
    }

    /// Insert a legacy job that failed part way through
    pub async fn seed_failed_background(&self, user_id: Uuid) -> BackgroundJob {
        let mut job = BackgroundJob::new(CreateBackgroundJob {
            user_id,
            job_type: "analysis".to_string(),
            payload: serde_json::json!({ "fileName": "chat.txt" }),
            current_step: Some("Analyzing".to_string()),
            total_steps: 4,
            max_retries: 3,
        });
        job.status = BackgroundJobStatus::Failed;
        job.progress = 60;
        job.error = Some("model timeout".to_string());
        self.background_jobs.insert(job).await
    }

    /// Insert a task queue job that failed part way through
    pub async fn seed_failed_task(&self, user_id: Uuid) -> TaskQueueJob {
        let mut job = TaskQueueJob::new(CreateTaskQueueJob {
            user_id,
            task_type: "story_generation".to_string(),
            priority: 5,
            payload: serde_json::json!({ "storyId": 7 }),
            max_retries: 3,
        });
        job.status = TaskQueueStatus::Failed;
        job.progress = 35;
        job.error = Some("worker crashed".to_string());
        self.task_queue.insert(job).await
    }

    /// Make an HTTP request to the test app
    pub async fn request(
        &self,
        method: &str,
        path: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> TestResponse {
        let body_str = body
            .map(|b| serde_json::to_string(&b).expect("Failed to serialize body"))
            .unwrap_or_default();

        let mut req = Request::builder()
            .method(method)
            .uri(path)
            .header("Content-Type", "application/json");

        if let Some(token) = token {
            req = req.header("Authorization", format!("Bearer {}", token));
        }

        let req = req
            .body(Body::from(body_str))
            .expect("Failed to build request");

        let response = self
            .router
            .clone()
            .oneshot(req)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let body_bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024)
            .await
            .expect("Failed to read body");

        let body: Value = serde_json::from_slice(&body_bytes).unwrap_or(Value::Null);

        TestResponse { status, body }
    }
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    /// HTTP status code
    pub status: StatusCode,
    /// Parsed JSON body
    pub body: Value,
}
