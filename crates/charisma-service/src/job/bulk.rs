//! Admin bulk actions applied across both stores.

use std::sync::Arc;

use serde::Serialize;
use serde_json::json;
use tracing::{info, warn};
use uuid::Uuid;

use charisma_core::AppError;
use charisma_core::result::AppResult;
use charisma_database::{BackgroundJobStore, TaskQueueStore};
use charisma_entity::error_log::ErrorSeverity;
use charisma_entity::job::{BulkAction, JobSource};
use charisma_entity::notification::{EventType, StreamEvent};
use charisma_realtime::NotificationHub;

use crate::audit::AuditRecorder;
use crate::context::RequestContext;
use crate::error_report::{BACKGROUND_TASKS_CATEGORY, ErrorReporter};

/// Audit category for admin operations.
pub const ADMIN_AUDIT_CATEGORY: &str = "ADMIN";

/// A validated bulk action request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BulkRequest {
    /// Action to apply.
    pub action: BulkAction,
    /// Target jobs.
    pub job_ids: Vec<Uuid>,
    /// Store of each target, index-aligned with `job_ids`.
    pub sources: Option<Vec<JobSource>>,
}

impl BulkRequest {
    /// Validate a raw request body.
    pub fn parse(
        action: &str,
        job_ids: &[String],
        sources: Option<&[String]>,
    ) -> AppResult<Self> {
        let action: BulkAction = action.parse()?;

        if job_ids.is_empty() && !action.is_queue_control() {
            return Err(AppError::validation("jobIds must not be empty"));
        }

        let job_ids = job_ids
            .iter()
            .map(|raw| {
                Uuid::parse_str(raw)
                    .map_err(|_| AppError::validation(format!("Invalid job id: {raw}")))
            })
            .collect::<AppResult<Vec<_>>>()?;

        let sources = match sources {
            None => None,
            Some(tags) if tags.len() != job_ids.len() => {
                return Err(AppError::validation(
                    "sources must have the same length as jobIds",
                ));
            }
            Some(tags) => Some(
                tags.iter()
                    .map(|tag| {
                        JobSource::parse(tag).ok_or_else(|| {
                            AppError::validation(format!("Unknown job source: {tag}"))
                        })
                    })
                    .collect::<AppResult<Vec<_>>>()?,
            ),
        };

        Ok(Self {
            action,
            job_ids,
            sources,
        })
    }
}

/// Result of a bulk action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkOutcome {
    /// Action that was applied.
    pub action: BulkAction,
    /// Rows changed in the legacy store.
    pub background_jobs: u64,
    /// Rows changed in the task queue.
    pub task_queue_jobs: u64,
    /// Sum of both stores.
    pub total_affected: u64,
    /// Human-readable summary.
    pub message: String,
}

/// Applies cancel, retry, and delete to jobs in either store.
#[derive(Debug, Clone)]
pub struct BulkActionService {
    background_jobs: Arc<dyn BackgroundJobStore>,
    task_queue: Arc<dyn TaskQueueStore>,
    audit: AuditRecorder,
    errors: ErrorReporter,
    hub: NotificationHub,
}

impl BulkActionService {
    /// Creates a new bulk action service.
    pub fn new(
        background_jobs: Arc<dyn BackgroundJobStore>,
        task_queue: Arc<dyn TaskQueueStore>,
        audit: AuditRecorder,
        errors: ErrorReporter,
        hub: NotificationHub,
    ) -> Self {
        Self {
            background_jobs,
            task_queue,
            audit,
            errors,
            hub,
        }
    }

    /// Apply `request` on behalf of an admin.
    pub async fn execute(
        &self,
        ctx: &RequestContext,
        request: &BulkRequest,
        endpoint: &str,
    ) -> AppResult<BulkOutcome> {
        let action = request.action;
        if action.is_queue_control() {
            info!(%action, admin_id = %ctx.user_id, "Queue control requested but unavailable");
            return Ok(BulkOutcome {
                action,
                background_jobs: 0,
                task_queue_jobs: 0,
                total_affected: 0,
                message: format!("Queue control ({action}) is not available; no jobs were affected"),
            });
        }

        let (legacy_ids, queue_ids) = match self.partition(request).await {
            Ok(parts) => parts,
            Err(e) => {
                self.report(ctx, &e, endpoint).await;
                return Err(AppError::internal("Failed to perform bulk action"));
            }
        };

        let (legacy, queue) = tokio::join!(
            self.apply_legacy(action, &legacy_ids),
            self.apply_queue(action, &queue_ids),
        );

        let mut attempted = 0;
        let mut failed = 0;
        let mut tally = |outcome: Option<AppResult<u64>>, source: JobSource| match outcome {
            None => Ok(0),
            Some(Ok(n)) => {
                attempted += 1;
                Ok(n)
            }
            Some(Err(e)) => {
                attempted += 1;
                failed += 1;
                warn!(%action, %source, error = %e, "Bulk action failed for one store");
                Err(e)
            }
        };
        let legacy = tally(legacy, JobSource::BackgroundJob);
        let queue = tally(queue, JobSource::TaskQueue);

        for e in [&legacy, &queue].into_iter().filter_map(|r| r.as_ref().err()) {
            self.report(ctx, e, endpoint).await;
        }
        if attempted > 0 && failed == attempted {
            return Err(AppError::internal("Failed to perform bulk action"));
        }

        let background_jobs = legacy.unwrap_or(0);
        let task_queue_jobs = queue.unwrap_or(0);
        let total_affected = background_jobs + task_queue_jobs;
        info!(
            %action,
            admin_id = %ctx.user_id,
            requested = request.job_ids.len(),
            background_jobs,
            task_queue_jobs,
            affected = total_affected,
            "Bulk action applied"
        );

        self.audit
            .record(
                ctx.user_id,
                &action.audit_action(),
                ADMIN_AUDIT_CATEGORY,
                json!({
                    "requested": request.job_ids.len(),
                    "backgroundJobs": background_jobs,
                    "taskQueueJobs": task_queue_jobs,
                    "totalAffected": total_affected,
                }),
            )
            .await;

        let message = format!("{action} applied to {total_affected} job(s)");
        self.hub.publish(StreamEvent::for_admins(
            EventType::BulkAction,
            "Bulk action",
            message.clone(),
            json!({
                "action": action,
                "backgroundJobs": background_jobs,
                "taskQueueJobs": task_queue_jobs,
                "totalAffected": total_affected,
            }),
        ));

        Ok(BulkOutcome {
            action,
            background_jobs,
            task_queue_jobs,
            total_affected,
            message,
        })
    }

    /// Split target ids per store. Ids found in neither store are dropped.
    async fn partition(&self, request: &BulkRequest) -> AppResult<(Vec<Uuid>, Vec<Uuid>)> {
        if let Some(sources) = &request.sources {
            let mut legacy = Vec::new();
            let mut queue = Vec::new();
            for (id, source) in request.job_ids.iter().zip(sources) {
                match source {
                    JobSource::BackgroundJob => legacy.push(*id),
                    JobSource::TaskQueue => queue.push(*id),
                }
            }
            return Ok((legacy, queue));
        }

        tokio::try_join!(
            self.background_jobs.find_existing_ids(&request.job_ids),
            self.task_queue.find_existing_ids(&request.job_ids),
        )
    }

    async fn apply_legacy(&self, action: BulkAction, ids: &[Uuid]) -> Option<AppResult<u64>> {
        if ids.is_empty() {
            return None;
        }
        let store = &self.background_jobs;
        Some(match action {
            BulkAction::Cancel => store.cancel_many(ids).await,
            BulkAction::Retry => store.retry_many(ids).await,
            BulkAction::Delete => store.delete_many(ids).await,
            BulkAction::PauseQueue | BulkAction::ResumeQueue => Ok(0),
        })
    }

    async fn apply_queue(&self, action: BulkAction, ids: &[Uuid]) -> Option<AppResult<u64>> {
        if ids.is_empty() {
            return None;
        }
        let store = &self.task_queue;
        Some(match action {
            BulkAction::Cancel => store.cancel_many(ids).await,
            BulkAction::Retry => store.retry_many(ids).await,
            BulkAction::Delete => store.delete_many(ids).await,
            BulkAction::PauseQueue | BulkAction::ResumeQueue => Ok(0),
        })
    }

    async fn report(&self, ctx: &RequestContext, error: &AppError, endpoint: &str) {
        self.errors
            .report(
                BACKGROUND_TASKS_CATEGORY,
                ErrorSeverity::High,
                error,
                Some(endpoint),
                Some(ctx.user_id),
            )
            .await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::job::testing::UnreachableTaskQueue;
    use charisma_core::error::ErrorKind;
    use charisma_database::memory::{
        MemoryAuditLogSink, MemoryBackgroundJobStore, MemoryErrorLogSink, MemoryTaskQueueStore,
    };
    use charisma_database::{AuditLogSink, ErrorLogSink};
    use charisma_entity::job::{
        BackgroundJob, BackgroundJobStatus, CreateBackgroundJob, CreateTaskQueueJob, TaskQueueJob,
        TaskQueueStatus,
    };
    use charisma_entity::user::UserRole;

    struct Fixture {
        legacy: Arc<MemoryBackgroundJobStore>,
        queue: Arc<MemoryTaskQueueStore>,
        audit: Arc<MemoryAuditLogSink>,
        errors: Arc<MemoryErrorLogSink>,
        hub: NotificationHub,
        service: BulkActionService,
    }

    fn fixture_with(queue_store: Option<Arc<dyn TaskQueueStore>>) -> Fixture {
        let legacy = Arc::new(MemoryBackgroundJobStore::new());
        let queue = Arc::new(MemoryTaskQueueStore::new());
        let audit = Arc::new(MemoryAuditLogSink::new());
        let errors = Arc::new(MemoryErrorLogSink::new());
        let hub = NotificationHub::new(16);
        let service = BulkActionService::new(
            legacy.clone(),
            queue_store.unwrap_or_else(|| queue.clone() as Arc<dyn TaskQueueStore>),
            AuditRecorder::new(audit.clone()),
            ErrorReporter::new(errors.clone()),
            hub.clone(),
        );
        Fixture {
            legacy,
            queue,
            audit,
            errors,
            hub,
            service,
        }
    }

    fn admin() -> RequestContext {
        RequestContext::new(Uuid::new_v4(), UserRole::Admin, "admin")
    }

    async fn legacy_job(fx: &Fixture, status: BackgroundJobStatus) -> Uuid {
        let mut job = BackgroundJob::new(CreateBackgroundJob {
            user_id: Uuid::new_v4(),
            job_type: "analysis".into(),
            payload: json!({}),
            current_step: None,
            total_steps: 4,
            max_retries: 3,
        });
        job.status = status;
        fx.legacy.insert(job).await.id
    }

    async fn queue_job(fx: &Fixture, status: TaskQueueStatus) -> Uuid {
        let mut job = TaskQueueJob::new(CreateTaskQueueJob {
            user_id: Uuid::new_v4(),
            task_type: "story_generation".into(),
            priority: 1,
            payload: json!({}),
            max_retries: 3,
        });
        job.status = status;
        fx.queue.insert(job).await.id
    }

    fn ids(ids: &[Uuid]) -> Vec<String> {
        ids.iter().map(Uuid::to_string).collect()
    }

    #[test]
    fn test_parse_rejects_bad_input() {
        let id = Uuid::new_v4().to_string();
        let cases: Vec<(&str, Vec<String>, Option<Vec<String>>)> = vec![
            ("explode", vec![id.clone()], None),
            ("cancel", vec![], None),
            ("retry", vec!["not-a-uuid".into()], None),
            ("delete", vec![id.clone()], Some(vec![])),
            ("delete", vec![id.clone()], Some(vec!["legacy".into()])),
        ];
        for (action, job_ids, sources) in cases {
            let err = BulkRequest::parse(action, &job_ids, sources.as_deref()).unwrap_err();
            assert_eq!(err.kind, ErrorKind::Validation, "{action} {job_ids:?}");
        }
    }

    #[test]
    fn test_parse_queue_control_without_ids() {
        let req = BulkRequest::parse("pause_queue", &[], None).unwrap();
        assert_eq!(req.action, BulkAction::PauseQueue);
        assert!(req.job_ids.is_empty());
    }

    #[tokio::test]
    async fn test_cancel_across_stores_without_sources() {
        let fx = fixture_with(None);
        let pending = legacy_job(&fx, BackgroundJobStatus::Pending).await;
        let done = legacy_job(&fx, BackgroundJobStatus::Completed).await;
        let running = queue_job(&fx, TaskQueueStatus::Running).await;
        let unknown = Uuid::new_v4();

        let req =
            BulkRequest::parse("cancel", &ids(&[pending, done, running, unknown]), None).unwrap();
        let out = fx.service.execute(&admin(), &req, "/t").await.unwrap();

        assert_eq!(out.background_jobs, 1);
        assert_eq!(out.task_queue_jobs, 1);
        assert_eq!(out.total_affected, 2);
        assert_eq!(
            fx.legacy.find_by_id(done).await.unwrap().unwrap().status,
            BackgroundJobStatus::Completed
        );
        assert_eq!(
            fx.queue.find_by_id(running).await.unwrap().unwrap().status,
            TaskQueueStatus::Canceled
        );
    }

    #[tokio::test]
    async fn test_repeat_cancel_affects_nothing() {
        let fx = fixture_with(None);
        let pending = legacy_job(&fx, BackgroundJobStatus::Pending).await;
        let req = BulkRequest::parse("cancel", &ids(&[pending]), None).unwrap();
        assert_eq!(fx.service.execute(&admin(), &req, "/t").await.unwrap().total_affected, 1);
        assert_eq!(fx.service.execute(&admin(), &req, "/t").await.unwrap().total_affected, 0);
    }

    #[tokio::test]
    async fn test_sources_route_ids_to_named_store() {
        let fx = fixture_with(None);
        let failed = queue_job(&fx, TaskQueueStatus::Failed).await;
        let sources = vec!["backgroundJob".to_string()];
        let req = BulkRequest::parse("retry", &ids(&[failed]), Some(&sources)).unwrap();
        let out = fx.service.execute(&admin(), &req, "/t").await.unwrap();
        assert_eq!(out.total_affected, 0);

        let sources = vec!["taskQueue".to_string()];
        let req = BulkRequest::parse("retry", &ids(&[failed]), Some(&sources)).unwrap();
        let out = fx.service.execute(&admin(), &req, "/t").await.unwrap();
        assert_eq!(out.task_queue_jobs, 1);
        let job = fx.queue.find_by_id(failed).await.unwrap().unwrap();
        assert_eq!(job.status, TaskQueueStatus::Queued);
        assert_eq!(job.retry_count, 1);
    }

    #[tokio::test]
    async fn test_delete_only_terminal_and_audits() {
        let fx = fixture_with(None);
        let processing = legacy_job(&fx, BackgroundJobStatus::Processing).await;
        let cancelled = legacy_job(&fx, BackgroundJobStatus::Cancelled).await;
        let ctx = admin();

        let mut events = fx.hub.subscribe(ctx.user_id, true);
        let req = BulkRequest::parse("delete", &ids(&[processing, cancelled]), None).unwrap();
        let out = fx.service.execute(&ctx, &req, "/t").await.unwrap();

        assert_eq!(out.total_affected, 1);
        assert!(fx.legacy.find_by_id(processing).await.unwrap().is_some());
        assert!(fx.legacy.find_by_id(cancelled).await.unwrap().is_none());

        let audit = fx.audit.recent(10).await.unwrap();
        assert_eq!(audit.len(), 1);
        assert_eq!(audit[0].action, "background_tasks.delete");
        assert_eq!(audit[0].category, ADMIN_AUDIT_CATEGORY);
        assert_eq!(audit[0].metadata["requested"], 2);
        assert_eq!(audit[0].metadata["totalAffected"], 1);

        let event = events.recv().await.unwrap();
        assert_eq!(event.event_type, EventType::BulkAction);
    }

    #[tokio::test]
    async fn test_queue_control_is_noop() {
        let fx = fixture_with(None);
        let pending = legacy_job(&fx, BackgroundJobStatus::Pending).await;
        let req = BulkRequest::parse("resume_queue", &ids(&[pending]), None).unwrap();
        let out = fx.service.execute(&admin(), &req, "/t").await.unwrap();
        assert_eq!(out.total_affected, 0);
        assert!(out.message.contains("not available"));
        assert!(fx.audit.recent(10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_one_store_failing_still_reports_other() {
        let fx = fixture_with(Some(Arc::new(UnreachableTaskQueue)));
        let pending = legacy_job(&fx, BackgroundJobStatus::Pending).await;
        let sources = vec!["backgroundJob".to_string(), "taskQueue".to_string()];
        let req = BulkRequest::parse(
            "cancel",
            &ids(&[pending, Uuid::new_v4()]),
            Some(&sources),
        )
        .unwrap();

        let out = fx.service.execute(&admin(), &req, "/t").await.unwrap();
        assert_eq!(out.background_jobs, 1);
        assert_eq!(out.task_queue_jobs, 0);
        assert_eq!(fx.errors.recent(10).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_every_attempted_store_failing_is_internal() {
        let fx = fixture_with(Some(Arc::new(UnreachableTaskQueue)));
        let sources = vec!["taskQueue".to_string()];
        let req = BulkRequest::parse("cancel", &ids(&[Uuid::new_v4()]), Some(&sources)).unwrap();

        let err = fx.service.execute(&admin(), &req, "/t").await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Internal);
        assert_eq!(err.message, "Failed to perform bulk action");
        assert!(fx.audit.recent(10).await.unwrap().is_empty());
    }
}
