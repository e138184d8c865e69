//! Per-store job filters and the job kind registry.

use std::collections::HashSet;

use charisma_core::config::JobsConfig;
use uuid::Uuid;

use super::background::BackgroundJobStatus;
use super::task_queue::TaskQueueStatus;
use super::vocabulary::{NativeStatus, UnifiedStatus};

/// Filter over one store, in that store's native vocabulary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobFilter<S> {
    /// Native status to match.
    pub status: Option<S>,
    /// Owner to match.
    pub user_id: Option<Uuid>,
    /// Job kind to match.
    pub job_type: Option<String>,
    /// When set, the store is skipped and matches no rows.
    pub match_nothing: bool,
}

impl<S> Default for JobFilter<S> {
    fn default() -> Self {
        Self {
            status: None,
            user_id: None,
            job_type: None,
            match_nothing: false,
        }
    }
}

impl<S: NativeStatus> JobFilter<S> {
    /// A filter that matches no rows.
    pub fn nothing() -> Self {
        Self {
            match_nothing: true,
            ..Self::default()
        }
    }

    /// Filter on owner only.
    pub fn for_user(user_id: Uuid) -> Self {
        Self {
            user_id: Some(user_id),
            ..Self::default()
        }
    }

    /// Evaluate the filter against a row's fields.
    pub fn matches(&self, status: S, user_id: Uuid, job_type: &str) -> bool {
        !self.match_nothing
            && self.status.is_none_or(|s| s == status)
            && self.user_id.is_none_or(|u| u == user_id)
            && self.job_type.as_deref().is_none_or(|t| t == job_type)
    }
}

/// Filter in the unified vocabulary, as received from callers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UnifiedFilter {
    /// Unified status.
    pub status: Option<UnifiedStatus>,
    /// Owner.
    pub user_id: Option<Uuid>,
    /// Job kind.
    pub job_type: Option<String>,
}

/// Which store each job kind is written to.
#[derive(Debug, Clone, Default)]
pub struct KindRegistry {
    background: HashSet<String>,
    task_queue: HashSet<String>,
}

impl KindRegistry {
    /// Build a registry from explicit kind lists.
    pub fn new<I, J>(background: I, task_queue: J) -> Self
    where
        I: IntoIterator<Item = String>,
        J: IntoIterator<Item = String>,
    {
        Self {
            background: background.into_iter().collect(),
            task_queue: task_queue.into_iter().collect(),
        }
    }

    /// Build a registry from the jobs configuration section.
    pub fn from_config(config: &JobsConfig) -> Self {
        Self::new(
            config.background_job_kinds.iter().cloned(),
            config.task_queue_kinds.iter().cloned(),
        )
    }

    /// Whether a kind could appear in the legacy store. Unregistered kinds could appear anywhere.
    pub fn in_background(&self, kind: &str) -> bool {
        self.background.contains(kind) || !self.task_queue.contains(kind)
    }

    /// Whether a kind could appear in the task queue.
    pub fn in_task_queue(&self, kind: &str) -> bool {
        self.task_queue.contains(kind) || !self.background.contains(kind)
    }

    /// Translate a unified filter into one filter per store.
    pub fn split(
        &self,
        filter: &UnifiedFilter,
    ) -> (JobFilter<BackgroundJobStatus>, JobFilter<TaskQueueStatus>) {
        let kind = filter.job_type.as_deref();
        (
            Self::native(filter, kind.is_none_or(|k| self.in_background(k))),
            Self::native(filter, kind.is_none_or(|k| self.in_task_queue(k))),
        )
    }

    fn native<S: NativeStatus>(filter: &UnifiedFilter, applicable: bool) -> JobFilter<S> {
        if !applicable {
            return JobFilter::nothing();
        }
        JobFilter {
            status: filter.status.map(S::from_unified),
            user_id: filter.user_id,
            job_type: filter.job_type.clone(),
            match_nothing: false,
        }
    }
}
