//! Progress updates reported by the analysis worker.

use std::sync::Arc;

use serde_json::json;
use tracing::{info, warn};
use uuid::Uuid;

use charisma_core::AppError;
use charisma_core::result::AppResult;
use charisma_database::BackgroundJobStore;
use charisma_entity::job::{BackgroundJob, NativeStatus};
use charisma_entity::notification::{EventType, StreamEvent};
use charisma_realtime::NotificationHub;

/// Moves legacy jobs through their lifecycle and notifies the owner when
/// they finish.
#[derive(Debug, Clone)]
pub struct JobProgressReporter {
    background_jobs: Arc<dyn BackgroundJobStore>,
    hub: NotificationHub,
}

impl JobProgressReporter {
    /// Creates a new progress reporter.
    pub fn new(background_jobs: Arc<dyn BackgroundJobStore>, hub: NotificationHub) -> Self {
        Self {
            background_jobs,
            hub,
        }
    }

    /// Claim a pending job.
    pub async fn start(&self, job_id: Uuid, step: Option<&str>) -> AppResult<BackgroundJob> {
        match self.background_jobs.mark_processing(job_id, step).await? {
            Some(job) => {
                info!(%job_id, "Job processing started");
                Ok(job)
            }
            None => Err(self.rejected(job_id).await),
        }
    }

    /// Record progress, clamped to 0..=100.
    pub async fn progress(
        &self,
        job_id: Uuid,
        progress: i32,
        step: Option<&str>,
    ) -> AppResult<BackgroundJob> {
        let progress = progress.clamp(0, 100);
        match self
            .background_jobs
            .update_progress(job_id, progress, step)
            .await?
        {
            Some(job) => Ok(job),
            None => Err(self.rejected(job_id).await),
        }
    }

    /// Finish a job successfully.
    pub async fn complete(
        &self,
        job_id: Uuid,
        result: serde_json::Value,
    ) -> AppResult<BackgroundJob> {
        let Some(job) = self.background_jobs.complete(job_id, &result).await? else {
            return Err(self.rejected(job_id).await);
        };
        info!(%job_id, "Job completed");
        self.hub.publish(StreamEvent::for_user(
            job.user_id,
            EventType::AnalysisComplete,
            "Analysis complete",
            format!("Your {} job has finished", job.job_type),
            json!({ "jobId": job.id, "result": result }),
        ));
        Ok(job)
    }

    /// Finish a job with an error.
    pub async fn fail(&self, job_id: Uuid, error: &str) -> AppResult<BackgroundJob> {
        let Some(job) = self.background_jobs.fail(job_id, error).await? else {
            return Err(self.rejected(job_id).await);
        };
        warn!(%job_id, error, "Job failed");
        self.hub.publish(StreamEvent::for_user(
            job.user_id,
            EventType::AnalysisFailed,
            "Analysis failed",
            error.to_string(),
            json!({ "jobId": job.id, "error": error }),
        ));
        Ok(job)
    }

    async fn rejected(&self, job_id: Uuid) -> AppError {
        match self.background_jobs.find_by_id(job_id).await {
            Ok(Some(job)) => AppError::conflict(format!(
                "Job {job_id} cannot be updated while {}",
                job.status.as_str()
            )),
            Ok(None) => AppError::not_found(format!("Job {job_id} not found")),
            Err(e) => e,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use charisma_core::error::ErrorKind;
    use charisma_database::memory::MemoryBackgroundJobStore;
    use charisma_entity::job::{BackgroundJobStatus, CreateBackgroundJob};

    async fn setup() -> (JobProgressReporter, NotificationHub, BackgroundJob) {
        let store = Arc::new(MemoryBackgroundJobStore::new());
        let hub = NotificationHub::new(16);
        let job = store
            .create(&CreateBackgroundJob {
                user_id: Uuid::new_v4(),
                job_type: "analysis".into(),
                payload: json!({}),
                current_step: Some("Queued".into()),
                total_steps: 4,
                max_retries: 3,
            })
            .await
            .unwrap();
        (JobProgressReporter::new(store, hub.clone()), hub, job)
    }

    #[tokio::test]
    async fn test_lifecycle_publishes_completion() {
        let (reporter, hub, job) = setup().await;
        let mut events = hub.subscribe(job.user_id, false);

        let started = reporter.start(job.id, Some("Parsing")).await.unwrap();
        assert_eq!(started.status, BackgroundJobStatus::Processing);
        assert!(started.started_at.is_some());

        let updated = reporter.progress(job.id, 150, Some("Scoring")).await.unwrap();
        assert_eq!(updated.progress, 100);

        let done = reporter.complete(job.id, json!({"score": 7})).await.unwrap();
        assert_eq!(done.status, BackgroundJobStatus::Completed);

        let event = events.recv().await.unwrap();
        assert_eq!(event.event_type, EventType::AnalysisComplete);
        assert_eq!(event.data["result"]["score"], 7);
    }

    #[tokio::test]
    async fn test_updates_after_terminal_conflict() {
        let (reporter, hub, job) = setup().await;
        let mut events = hub.subscribe(job.user_id, false);

        reporter.fail(job.id, "provider timeout").await.unwrap();
        let event = events.recv().await.unwrap();
        assert_eq!(event.event_type, EventType::AnalysisFailed);
        assert_eq!(event.message, "provider timeout");

        let err = reporter.progress(job.id, 10, None).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Conflict);
        let err = reporter.start(Uuid::new_v4(), None).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFound);
    }
}
