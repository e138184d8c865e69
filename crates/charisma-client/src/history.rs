//! The "recent jobs" panel: loaded once, refreshed on demand.

use std::sync::Arc;

use tokio::sync::RwLock;

use charisma_core::config::ClientConfig;
use charisma_entity::job::UnifiedJob;

use crate::api::AnalysisApi;
use crate::error::ClientError;

/// Recent jobs of the current user, independent of any poller.
pub struct JobHistory {
    api: Arc<dyn AnalysisApi>,
    limit: u64,
    jobs: RwLock<Option<Vec<UnifiedJob>>>,
}

impl std::fmt::Debug for JobHistory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JobHistory").field("limit", &self.limit).finish()
    }
}

impl JobHistory {
    /// Create an empty history of at most `limit` jobs.
    pub fn new(api: Arc<dyn AnalysisApi>, limit: u64) -> Self {
        Self {
            api,
            limit: limit.max(1),
            jobs: RwLock::new(None),
        }
    }

    /// Create an empty history sized by `client.history_size`.
    pub fn from_config(api: Arc<dyn AnalysisApi>, config: &ClientConfig) -> Self {
        Self::new(api, config.history_size)
    }

    /// Jobs from the first load, fetching them if this is the first call.
    pub async fn load(&self) -> Result<Vec<UnifiedJob>, ClientError> {
        if let Some(jobs) = self.jobs.read().await.as_ref() {
            return Ok(jobs.clone());
        }
        self.refresh().await
    }

    /// Fetch the list again.
    pub async fn refresh(&self) -> Result<Vec<UnifiedJob>, ClientError> {
        let jobs = self.api.recent_jobs(self.limit).await?;
        *self.jobs.write().await = Some(jobs.clone());
        Ok(jobs)
    }

    /// Last loaded list, empty before the first load.
    pub async fn jobs(&self) -> Vec<UnifiedJob> {
        self.jobs.read().await.clone().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::poller::tests::{FakeApi, job};
    use charisma_entity::job::UnifiedStatus;
    use std::sync::atomic::Ordering;
    use uuid::Uuid;

    #[tokio::test]
    async fn test_load_once_then_refresh() {
        let api = Arc::new(FakeApi::default());
        let first = job(Uuid::new_v4(), UnifiedStatus::Completed);
        api.recent.lock().unwrap().push(first.clone());
        let history = JobHistory::new(api.clone(), 5);

        assert!(history.jobs().await.is_empty());
        assert_eq!(history.load().await.unwrap(), vec![first.clone()]);
        assert_eq!(history.load().await.unwrap().len(), 1);
        assert_eq!(api.recent_count.load(Ordering::SeqCst), 1);

        let second = job(Uuid::new_v4(), UnifiedStatus::Pending);
        api.recent.lock().unwrap().insert(0, second.clone());
        assert_eq!(history.refresh().await.unwrap(), vec![second, first]);
        assert_eq!(api.recent_count.load(Ordering::SeqCst), 2);
    }
}
