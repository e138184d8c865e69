//! Per-user analysis jobs: submit, inspect, cancel, and list.

use std::sync::Arc;

use serde_json::json;
use tracing::info;
use uuid::Uuid;

use charisma_core::AppError;
use charisma_core::config::JobsConfig;
use charisma_core::result::AppResult;
use charisma_database::{BackgroundJobStore, TaskQueueStore};
use charisma_entity::job::{BackgroundJob, CreateBackgroundJob, JobSource, UnifiedJob};
use charisma_entity::notification::{EventType, StreamEvent};
use charisma_realtime::NotificationHub;

use super::sort_newest_first;
use crate::context::RequestContext;

/// Job kind written for conversation analyses.
pub const ANALYSIS_JOB_TYPE: &str = "analysis";

/// Step label of a freshly submitted job.
pub const QUEUED_STEP: &str = "Queued";

/// Default size of the recent jobs panel.
pub const DEFAULT_HISTORY_LIMIT: u64 = 10;

/// Input of an analysis submission.
#[derive(Debug, Clone)]
pub struct SubmitAnalysis {
    /// Analysis template.
    pub template_id: String,
    /// Model to run.
    pub model_id: String,
    /// AI provider name.
    pub provider: String,
    /// Uploaded file name.
    pub file_name: String,
    /// Uploaded file text.
    pub file_content: String,
}

/// Analysis job use cases for the job owner.
#[derive(Debug, Clone)]
pub struct AnalysisJobService {
    background_jobs: Arc<dyn BackgroundJobStore>,
    task_queue: Arc<dyn TaskQueueStore>,
    hub: NotificationHub,
    total_steps: i32,
    max_retries: i32,
    max_history_limit: u64,
}

impl AnalysisJobService {
    /// Creates a new analysis job service.
    pub fn new(
        background_jobs: Arc<dyn BackgroundJobStore>,
        task_queue: Arc<dyn TaskQueueStore>,
        hub: NotificationHub,
        config: &JobsConfig,
    ) -> Self {
        Self {
            background_jobs,
            task_queue,
            hub,
            total_steps: config.analysis_total_steps,
            max_retries: config.analysis_max_retries,
            max_history_limit: config.max_history_limit.max(1),
        }
    }

    /// Queue a new analysis owned by the caller.
    pub async fn submit(
        &self,
        ctx: &RequestContext,
        input: SubmitAnalysis,
    ) -> AppResult<BackgroundJob> {
        let job = self
            .background_jobs
            .create(&CreateBackgroundJob {
                user_id: ctx.user_id,
                job_type: ANALYSIS_JOB_TYPE.to_string(),
                payload: json!({
                    "templateId": input.template_id,
                    "modelId": input.model_id,
                    "provider": input.provider,
                    "fileName": input.file_name,
                    "fileContent": input.file_content,
                }),
                current_step: Some(QUEUED_STEP.to_string()),
                total_steps: self.total_steps,
                max_retries: self.max_retries,
            })
            .await?;

        info!(job_id = %job.id, user_id = %ctx.user_id, "Analysis job queued");
        self.hub.publish(StreamEvent::for_user(
            ctx.user_id,
            EventType::JobQueued,
            "Analysis queued",
            format!("Analysis of {} has been queued", input.file_name),
            json!({ "jobId": job.id }),
        ));
        Ok(job)
    }

    /// Fetch a job from either store. Jobs the caller may not read are
    /// reported as missing.
    pub async fn get(&self, ctx: &RequestContext, job_id: Uuid) -> AppResult<UnifiedJob> {
        let (legacy, queued) = tokio::try_join!(
            self.background_jobs.find_by_id(job_id),
            self.task_queue.find_by_id(job_id),
        )?;
        let job = legacy
            .map(|job| UnifiedJob::from_background(job, false))
            .or_else(|| queued.map(|job| UnifiedJob::from_task_queue(job, false)));

        match job {
            Some(job) if ctx.can_access(job.user_id) => Ok(job),
            _ => Err(AppError::not_found("Job not found")),
        }
    }

    /// Cancel a pending or processing job.
    pub async fn cancel(&self, ctx: &RequestContext, job_id: Uuid) -> AppResult<()> {
        let job = self.get(ctx, job_id).await?;
        if job.is_terminal() {
            return Err(AppError::conflict(format!(
                "Job is already {}",
                job.status.as_str().to_lowercase()
            )));
        }

        let affected = match job.source {
            JobSource::BackgroundJob => {
                self.background_jobs.cancel_many(&[job_id]).await?
            }
            JobSource::TaskQueue => {
                self.task_queue.cancel_many(&[job_id]).await?
            }
        };
        if affected == 0 {
            return Err(AppError::conflict("Job finished before it could be cancelled"));
        }

        info!(%job_id, user_id = %ctx.user_id, source = %job.source, "Job cancelled");
        self.hub.publish(StreamEvent::for_user(
            job.user_id,
            EventType::JobCancelled,
            "Job cancelled",
            format!("Your {} job was cancelled", job.job_type),
            json!({ "jobId": job_id }),
        ));
        Ok(())
    }

    /// The caller's most recent jobs from both stores, newest first.
    pub async fn recent(
        &self,
        ctx: &RequestContext,
        limit: Option<u64>,
    ) -> AppResult<Vec<UnifiedJob>> {
        let limit = limit
            .unwrap_or(DEFAULT_HISTORY_LIMIT)
            .clamp(1, self.max_history_limit);
        let (legacy, queued) = tokio::try_join!(
            self.background_jobs.list_for_user(ctx.user_id, limit),
            self.task_queue.list_for_user(ctx.user_id, limit),
        )?;

        let mut jobs: Vec<UnifiedJob> = legacy
            .into_iter()
            .map(|job| UnifiedJob::from_background(job, false))
            .chain(
                queued
                    .into_iter()
                    .map(|job| UnifiedJob::from_task_queue(job, false)),
            )
            .collect();
        sort_newest_first(&mut jobs);
        jobs.truncate(usize::try_from(limit).unwrap_or(usize::MAX));
        Ok(jobs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use charisma_core::error::ErrorKind;
    use charisma_database::memory::{MemoryBackgroundJobStore, MemoryTaskQueueStore};
    use charisma_entity::job::{
        BackgroundJobStatus, CreateTaskQueueJob, TaskQueueJob, UnifiedStatus,
    };
    use charisma_entity::user::UserRole;
    use chrono::{Duration, Utc};

    struct Fixture {
        legacy: Arc<MemoryBackgroundJobStore>,
        queue: Arc<MemoryTaskQueueStore>,
        hub: NotificationHub,
        service: AnalysisJobService,
    }

    fn fixture() -> Fixture {
        let legacy = Arc::new(MemoryBackgroundJobStore::new());
        let queue = Arc::new(MemoryTaskQueueStore::new());
        let hub = NotificationHub::new(16);
        let service = AnalysisJobService::new(
            legacy.clone(),
            queue.clone(),
            hub.clone(),
            &JobsConfig::default(),
        );
        Fixture {
            legacy,
            queue,
            hub,
            service,
        }
    }

    fn user() -> RequestContext {
        RequestContext::new(Uuid::new_v4(), UserRole::User, "user")
    }

    fn input() -> SubmitAnalysis {
        SubmitAnalysis {
            template_id: "tpl-1".into(),
            model_id: "model-1".into(),
            provider: "openai".into(),
            file_name: "chat.txt".into(),
            file_content: "hello".into(),
        }
    }

    #[tokio::test]
    async fn test_submit_creates_queued_analysis() {
        let fx = fixture();
        let ctx = user();
        let mut events = fx.hub.subscribe(ctx.user_id, false);

        let job = fx.service.submit(&ctx, input()).await.unwrap();
        assert_eq!(job.status, BackgroundJobStatus::Pending);
        assert_eq!(job.job_type, ANALYSIS_JOB_TYPE);
        assert_eq!(job.current_step.as_deref(), Some(QUEUED_STEP));
        assert_eq!(job.total_steps, JobsConfig::default().analysis_total_steps);
        assert_eq!(job.payload["fileName"], "chat.txt");

        let event = events.recv().await.unwrap();
        assert_eq!(event.event_type, EventType::JobQueued);
        assert_eq!(event.data["jobId"], json!(job.id));
    }

    #[tokio::test]
    async fn test_get_hides_other_users_jobs() {
        let fx = fixture();
        let owner = user();
        let job = fx.service.submit(&owner, input()).await.unwrap();

        let seen = fx.service.get(&owner, job.id).await.unwrap();
        assert_eq!(seen.status, UnifiedStatus::Pending);

        let err = fx.service.get(&user(), job.id).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFound);

        let admin = RequestContext::new(Uuid::new_v4(), UserRole::Admin, "admin");
        assert!(fx.service.get(&admin, job.id).await.is_ok());
    }

    #[tokio::test]
    async fn test_cancel_then_cancel_again_conflicts() {
        let fx = fixture();
        let ctx = user();
        let job = fx.service.submit(&ctx, input()).await.unwrap();

        fx.service.cancel(&ctx, job.id).await.unwrap();
        let stored = fx.legacy.find_by_id(job.id).await.unwrap().unwrap();
        assert_eq!(stored.status, BackgroundJobStatus::Cancelled);

        let err = fx.service.cancel(&ctx, job.id).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Conflict);
        let err = fx.service.cancel(&ctx, Uuid::new_v4()).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_recent_merges_both_stores() {
        let fx = fixture();
        let ctx = user();
        let first = fx.service.submit(&ctx, input()).await.unwrap();

        let mut task = TaskQueueJob::new(CreateTaskQueueJob {
            user_id: ctx.user_id,
            task_type: "report_export".into(),
            priority: 0,
            payload: json!({}),
            max_retries: 3,
        });
        task.created_at = Utc::now() + Duration::seconds(5);
        let task = fx.queue.insert(task).await;
        fx.service.submit(&user(), input()).await.unwrap();

        let recent = fx.service.recent(&ctx, None).await.unwrap();
        let ids: Vec<_> = recent.iter().map(|j| j.id).collect();
        assert_eq!(ids, vec![task.id, first.id]);

        let one = fx.service.recent(&ctx, Some(1)).await.unwrap();
        assert_eq!(one.len(), 1);
        assert_eq!(one[0].id, task.id);
    }
}
