//! Follows one analysis job from submission to a terminal state.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

use charisma_core::config::ClientConfig;
use charisma_entity::job::{UnifiedJob, UnifiedStatus};

use crate::api::AnalysisApi;
use crate::error::ClientError;
use crate::models::AnalysisRequest;

/// Where the poller is in a job's life.
#[derive(Debug, Clone, PartialEq)]
pub enum PollerState {
    /// No job.
    Idle,
    /// Waiting for the submission response.
    Submitting,
    /// Job accepted; `job` holds the last successful poll.
    Polling {
        /// Followed job.
        job_id: Uuid,
        /// Latest snapshot.
        job: Option<UnifiedJob>,
    },
    /// Job finished.
    Completed {
        /// Finished job.
        job_id: Uuid,
        /// Job result.
        result: Option<serde_json::Value>,
    },
    /// Job failed.
    Failed {
        /// Failed job.
        job_id: Uuid,
        /// Failure message.
        error: String,
    },
    /// Job was cancelled.
    Cancelled {
        /// Cancelled job.
        job_id: Uuid,
    },
}

impl PollerState {
    /// The job being followed or last followed.
    pub fn job_id(&self) -> Option<Uuid> {
        match self {
            Self::Idle | Self::Submitting => None,
            Self::Polling { job_id, .. }
            | Self::Completed { job_id, .. }
            | Self::Failed { job_id, .. }
            | Self::Cancelled { job_id } => Some(*job_id),
        }
    }
}

/// Callbacks fired by the poller.
pub trait PollObserver: Send + Sync + 'static {
    /// A poll returned a non-terminal snapshot.
    fn on_progress(&self, _job: &UnifiedJob) {}

    /// The job completed.
    fn on_complete(&self, _job: &UnifiedJob) {}

    /// Submission failed or the job failed.
    fn on_error(&self, _message: &str) {}
}

/// Observer that ignores every callback.
#[derive(Debug, Default)]
pub struct NoopObserver;

impl PollObserver for NoopObserver {}

/// Submits an analysis and polls it at a fixed interval until it reaches a
/// terminal state. Dropping the poller stops polling.
pub struct JobPoller {
    api: Arc<dyn AnalysisApi>,
    observer: Arc<dyn PollObserver>,
    interval: Duration,
    state: Arc<watch::Sender<PollerState>>,
    task: Mutex<Option<CancellationToken>>,
}

impl std::fmt::Debug for JobPoller {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JobPoller")
            .field("interval", &self.interval)
            .field("state", &*self.state.borrow())
            .finish()
    }
}

impl JobPoller {
    /// Create an idle poller.
    pub fn new(
        api: Arc<dyn AnalysisApi>,
        observer: Arc<dyn PollObserver>,
        interval: Duration,
    ) -> Self {
        let (state, _) = watch::channel(PollerState::Idle);
        Self {
            api,
            observer,
            interval,
            state: Arc::new(state),
            task: Mutex::new(None),
        }
    }

    /// Create an idle poller using `client.poll_interval_ms`.
    pub fn from_config(
        api: Arc<dyn AnalysisApi>,
        observer: Arc<dyn PollObserver>,
        config: &ClientConfig,
    ) -> Self {
        Self::new(api, observer, config.poll_interval())
    }

    /// Current state.
    pub fn state(&self) -> PollerState {
        self.state.borrow().clone()
    }

    /// Watch state changes.
    pub fn subscribe(&self) -> watch::Receiver<PollerState> {
        self.state.subscribe()
    }

    fn lock_task(&self) -> MutexGuard<'_, Option<CancellationToken>> {
        self.task.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Submit an analysis and start polling it.
    pub async fn submit(&self, request: &AnalysisRequest) -> Result<Uuid, ClientError> {
        self.stop();
        self.state.send_replace(PollerState::Submitting);

        match self.api.submit(request).await {
            Ok(job_id) => {
                info!(%job_id, "Analysis submitted");
                self.track(job_id);
                Ok(job_id)
            }
            Err(e) => {
                warn!(error = %e, "Analysis submission failed");
                self.state.send_replace(PollerState::Idle);
                self.observer.on_error(&e.to_string());
                Err(e)
            }
        }
    }

    /// Start polling an already submitted job.
    pub fn track(&self, job_id: Uuid) {
        let token = CancellationToken::new();
        if let Some(previous) = self.lock_task().replace(token.clone()) {
            previous.cancel();
        }
        self.state.send_replace(PollerState::Polling { job_id, job: None });

        tokio::spawn(poll_loop(
            Arc::clone(&self.api),
            Arc::clone(&self.observer),
            Arc::clone(&self.state),
            self.interval,
            job_id,
            token,
        ));
    }

    /// Cancel the followed job. Does nothing unless a job is being polled.
    ///
    /// If the job reaches a terminal state while the cancel request is in
    /// flight, that state is kept.
    pub async fn cancel(&self) -> Result<(), ClientError> {
        let PollerState::Polling { job_id, .. } = self.state() else {
            return Ok(());
        };
        self.api.cancel(job_id).await?;

        let cancelled = self.state.send_if_modified(|current| match current {
            PollerState::Polling { job_id: polled, .. } if *polled == job_id => {
                if let Some(token) = self.lock_task().take() {
                    token.cancel();
                }
                *current = PollerState::Cancelled { job_id };
                true
            }
            _ => false,
        });
        if cancelled {
            info!(%job_id, "Analysis cancelled");
        }
        Ok(())
    }

    /// Stop polling without touching the job.
    pub fn stop(&self) {
        if let Some(token) = self.lock_task().take() {
            token.cancel();
        }
    }
}

impl Drop for JobPoller {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn poll_loop(
    api: Arc<dyn AnalysisApi>,
    observer: Arc<dyn PollObserver>,
    state: Arc<watch::Sender<PollerState>>,
    interval: Duration,
    job_id: Uuid,
    token: CancellationToken,
) {
    let mut ticker = tokio::time::interval_at(Instant::now() + interval, interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = token.cancelled() => return,
            _ = ticker.tick() => {}
        }

        let result = api.get_job(job_id).await;
        if token.is_cancelled() {
            return;
        }

        let job = match result {
            Ok(job) => job,
            Err(e) => {
                warn!(%job_id, error = %e, "Job poll failed");
                continue;
            }
        };
        debug!(%job_id, status = %job.status.as_str(), progress = job.progress, "Polled job");

        match job.status {
            UnifiedStatus::Completed => {
                let next = PollerState::Completed {
                    job_id,
                    result: job.result.clone(),
                };
                if publish(&state, &token, next) {
                    observer.on_complete(&job);
                }
                return;
            }
            UnifiedStatus::Failed => {
                let error = job
                    .error
                    .clone()
                    .unwrap_or_else(|| "Analysis failed".to_string());
                let next = PollerState::Failed {
                    job_id,
                    error: error.clone(),
                };
                if publish(&state, &token, next) {
                    observer.on_error(&error);
                }
                return;
            }
            UnifiedStatus::Cancelled => {
                publish(&state, &token, PollerState::Cancelled { job_id });
                return;
            }
            UnifiedStatus::Pending | UnifiedStatus::Processing => {
                let snapshot = PollerState::Polling {
                    job_id,
                    job: Some(job.clone()),
                };
                if !publish(&state, &token, snapshot) {
                    return;
                }
                observer.on_progress(&job);
            }
        }
    }
}

/// Write `next` unless the loop was stopped. The token is checked under the
/// state lock.
fn publish(
    state: &watch::Sender<PollerState>,
    token: &CancellationToken,
    next: PollerState,
) -> bool {
    state.send_if_modified(|current| {
        if token.is_cancelled() {
            return false;
        }
        *current = next;
        true
    })
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use async_trait::async_trait;
    use charisma_entity::job::{BackgroundJob, CreateBackgroundJob};
    use serde_json::json;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::Notify;

    #[derive(Default)]
    pub(crate) struct FakeApi {
        pub job_id: Uuid,
        pub fail_submit: bool,
        pub poll_gate: Option<Arc<Notify>>,
        pub cancel_gate: Option<Arc<Notify>>,
        pub polls: Mutex<VecDeque<Result<UnifiedJob, ClientError>>>,
        pub poll_count: AtomicUsize,
        pub cancel_count: AtomicUsize,
        pub recent: Mutex<Vec<UnifiedJob>>,
        pub recent_count: AtomicUsize,
    }

    pub(crate) fn job(id: Uuid, status: UnifiedStatus) -> UnifiedJob {
        let mut job = UnifiedJob::from_background(
            BackgroundJob::new(CreateBackgroundJob {
                user_id: Uuid::new_v4(),
                job_type: "analysis".into(),
                payload: json!({}),
                current_step: None,
                total_steps: 4,
                max_retries: 3,
            }),
            false,
        );
        job.id = id;
        job.status = status;
        job
    }

    #[async_trait]
    impl AnalysisApi for FakeApi {
        async fn submit(&self, _request: &AnalysisRequest) -> Result<Uuid, ClientError> {
            if self.fail_submit {
                return Err(ClientError::Http {
                    status: 400,
                    message: "fileContent is required".into(),
                });
            }
            Ok(self.job_id)
        }

        async fn get_job(&self, job_id: Uuid) -> Result<UnifiedJob, ClientError> {
            self.poll_count.fetch_add(1, Ordering::SeqCst);
            if let Some(gate) = &self.poll_gate {
                gate.notified().await;
            }
            self.polls
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(job(job_id, UnifiedStatus::Processing)))
        }

        async fn cancel(&self, _job_id: Uuid) -> Result<(), ClientError> {
            self.cancel_count.fetch_add(1, Ordering::SeqCst);
            if let Some(gate) = &self.cancel_gate {
                gate.notified().await;
            }
            Ok(())
        }

        async fn recent_jobs(&self, limit: u64) -> Result<Vec<UnifiedJob>, ClientError> {
            self.recent_count.fetch_add(1, Ordering::SeqCst);
            let jobs = self.recent.lock().unwrap();
            Ok(jobs.iter().take(limit as usize).cloned().collect())
        }
    }

    #[derive(Default)]
    struct Recorder {
        completed: Mutex<Vec<Uuid>>,
        errors: Mutex<Vec<String>>,
    }

    impl PollObserver for Recorder {
        fn on_complete(&self, job: &UnifiedJob) {
            self.completed.lock().unwrap().push(job.id);
        }

        fn on_error(&self, message: &str) {
            self.errors.lock().unwrap().push(message.to_string());
        }
    }

    fn request() -> AnalysisRequest {
        AnalysisRequest {
            template_id: "t".into(),
            model_id: "m".into(),
            provider: "p".into(),
            file_name: "chat.txt".into(),
            file_content: "hello".into(),
        }
    }

    fn poller(api: Arc<FakeApi>, recorder: Arc<Recorder>) -> JobPoller {
        JobPoller::new(api, recorder, Duration::from_millis(2000))
    }

    #[tokio::test(start_paused = true)]
    async fn test_polls_until_completed() {
        let id = Uuid::new_v4();
        let mut done = job(id, UnifiedStatus::Completed);
        done.result = Some(json!({"score": 9}));
        let api = Arc::new(FakeApi {
            job_id: id,
            polls: Mutex::new(VecDeque::from([
                Ok(job(id, UnifiedStatus::Pending)),
                Err(ClientError::Http {
                    status: 502,
                    message: "bad gateway".into(),
                }),
                Ok(done),
            ])),
            ..Default::default()
        });
        let recorder = Arc::new(Recorder::default());
        let poller = poller(api.clone(), recorder.clone());

        assert_eq!(poller.submit(&request()).await.unwrap(), id);
        assert_eq!(poller.state(), PollerState::Polling { job_id: id, job: None });

        tokio::time::sleep(Duration::from_millis(1999)).await;
        assert_eq!(api.poll_count.load(Ordering::SeqCst), 0);

        tokio::time::sleep(Duration::from_millis(2)).await;
        assert_eq!(api.poll_count.load(Ordering::SeqCst), 1);
        assert!(matches!(poller.state(), PollerState::Polling { job: Some(_), .. }));

        tokio::time::sleep(Duration::from_millis(4000)).await;
        assert_eq!(api.poll_count.load(Ordering::SeqCst), 3);
        assert_eq!(
            poller.state(),
            PollerState::Completed {
                job_id: id,
                result: Some(json!({"score": 9})),
            }
        );
        assert_eq!(*recorder.completed.lock().unwrap(), vec![id]);

        tokio::time::sleep(Duration::from_secs(20)).await;
        assert_eq!(api.poll_count.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_job_reports_error() {
        let id = Uuid::new_v4();
        let mut failed = job(id, UnifiedStatus::Failed);
        failed.error = Some("provider timeout".into());
        let api = Arc::new(FakeApi {
            job_id: id,
            polls: Mutex::new(VecDeque::from([Ok(failed)])),
            ..Default::default()
        });
        let recorder = Arc::new(Recorder::default());
        let poller = poller(api, recorder.clone());

        poller.submit(&request()).await.unwrap();
        tokio::time::sleep(Duration::from_millis(2001)).await;
        assert_eq!(
            poller.state(),
            PollerState::Failed {
                job_id: id,
                error: "provider timeout".into(),
            }
        );
        assert_eq!(*recorder.errors.lock().unwrap(), vec!["provider timeout"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_submit_failure_returns_to_idle() {
        let api = Arc::new(FakeApi {
            fail_submit: true,
            ..Default::default()
        });
        let recorder = Arc::new(Recorder::default());
        let poller = poller(api.clone(), recorder.clone());

        assert!(poller.submit(&request()).await.is_err());
        assert_eq!(poller.state(), PollerState::Idle);
        assert_eq!(recorder.errors.lock().unwrap().len(), 1);

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(api.poll_count.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_stops_polling_immediately() {
        let id = Uuid::new_v4();
        let api = Arc::new(FakeApi {
            job_id: id,
            ..Default::default()
        });
        let poller = poller(api.clone(), Arc::new(Recorder::default()));

        poller.submit(&request()).await.unwrap();
        tokio::time::sleep(Duration::from_millis(2001)).await;
        poller.cancel().await.unwrap();

        assert_eq!(poller.state(), PollerState::Cancelled { job_id: id });
        assert_eq!(api.cancel_count.load(Ordering::SeqCst), 1);
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(api.poll_count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_discards_poll_in_flight() {
        let id = Uuid::new_v4();
        let gate = Arc::new(Notify::new());
        let api = Arc::new(FakeApi {
            job_id: id,
            poll_gate: Some(gate.clone()),
            polls: Mutex::new(VecDeque::from([Ok(job(id, UnifiedStatus::Completed))])),
            ..Default::default()
        });
        let recorder = Arc::new(Recorder::default());
        let poller = poller(api.clone(), recorder.clone());

        poller.submit(&request()).await.unwrap();
        tokio::time::sleep(Duration::from_millis(2001)).await;
        assert_eq!(api.poll_count.load(Ordering::SeqCst), 1);

        poller.cancel().await.unwrap();
        gate.notify_one();
        tokio::time::sleep(Duration::from_secs(10)).await;

        assert_eq!(poller.state(), PollerState::Cancelled { job_id: id });
        assert!(recorder.completed.lock().unwrap().is_empty());
        assert_eq!(api.poll_count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_completion_during_cancel_is_kept() {
        let id = Uuid::new_v4();
        let gate = Arc::new(Notify::new());
        let api = Arc::new(FakeApi {
            job_id: id,
            cancel_gate: Some(gate.clone()),
            polls: Mutex::new(VecDeque::from([Ok(job(id, UnifiedStatus::Completed))])),
            ..Default::default()
        });
        let recorder = Arc::new(Recorder::default());
        let poller = poller(api.clone(), recorder.clone());

        poller.submit(&request()).await.unwrap();
        let release = async {
            tokio::time::sleep(Duration::from_millis(2001)).await;
            gate.notify_one();
        };
        let (cancelled, ()) = tokio::join!(poller.cancel(), release);

        cancelled.unwrap();
        assert_eq!(api.cancel_count.load(Ordering::SeqCst), 1);
        assert_eq!(
            poller.state(),
            PollerState::Completed {
                job_id: id,
                result: None,
            }
        );
        assert_eq!(*recorder.completed.lock().unwrap(), vec![id]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_stops_polling() {
        let id = Uuid::new_v4();
        let api = Arc::new(FakeApi {
            job_id: id,
            ..Default::default()
        });
        let poller = poller(api.clone(), Arc::new(Recorder::default()));
        poller.submit(&request()).await.unwrap();
        drop(poller);

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(api.poll_count.load(Ordering::SeqCst), 0);
    }
}
