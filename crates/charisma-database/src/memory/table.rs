//! Generic row table shared by the in-memory job stores.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use charisma_entity::job::{
    BackgroundJob, BackgroundJobStatus, JobFilter, NativeStatus, TaskQueueJob, TaskQueueStatus,
};

/// Accessors a row needs for filtering and ordering.
pub(crate) trait JobRow: Clone + Send + Sync + std::fmt::Debug + 'static {
    type Status: NativeStatus;

    fn id(&self) -> Uuid;
    fn status(&self) -> Self::Status;
    fn user_id(&self) -> Uuid;
    fn kind(&self) -> &str;
    fn created_at(&self) -> DateTime<Utc>;
}

impl JobRow for BackgroundJob {
    type Status = BackgroundJobStatus;

    fn id(&self) -> Uuid {
        self.id
    }
    fn status(&self) -> BackgroundJobStatus {
        self.status
    }
    fn user_id(&self) -> Uuid {
        self.user_id
    }
    fn kind(&self) -> &str {
        &self.job_type
    }
    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

impl JobRow for TaskQueueJob {
    type Status = TaskQueueStatus;

    fn id(&self) -> Uuid {
        self.id
    }
    fn status(&self) -> TaskQueueStatus {
        self.status
    }
    fn user_id(&self) -> Uuid {
        self.user_id
    }
    fn kind(&self) -> &str {
        &self.task_type
    }
    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

/// Rows in insertion order behind an async lock.
#[derive(Debug)]
pub(crate) struct JobTable<R> {
    rows: RwLock<Vec<R>>,
}

impl<R: JobRow> JobTable<R> {
    pub(crate) fn new() -> Self {
        Self {
            rows: RwLock::new(Vec::new()),
        }
    }

    pub(crate) async fn insert(&self, row: R) -> R {
        self.rows.write().await.push(row.clone());
        row
    }

    pub(crate) async fn find(&self, id: Uuid) -> Option<R> {
        self.rows.read().await.iter().find(|r| r.id() == id).cloned()
    }

    pub(crate) async fn existing_ids(&self, ids: &[Uuid]) -> Vec<Uuid> {
        let wanted: HashSet<&Uuid> = ids.iter().collect();
        self.rows
            .read()
            .await
            .iter()
            .map(JobRow::id)
            .filter(|id| wanted.contains(id))
            .collect()
    }

    /// Matching rows, newest first. Rows with equal timestamps keep insertion order.
    pub(crate) async fn search(&self, filter: &JobFilter<R::Status>, take: u64) -> Vec<R> {
        let rows = self.rows.read().await;
        let mut matched: Vec<R> = rows
            .iter()
            .filter(|r| filter.matches(r.status(), r.user_id(), r.kind()))
            .cloned()
            .collect();
        matched.sort_by(|a, b| b.created_at().cmp(&a.created_at()));
        matched.truncate(usize::try_from(take).unwrap_or(usize::MAX));
        matched
    }

    pub(crate) async fn count(&self, filter: &JobFilter<R::Status>) -> i64 {
        self.rows
            .read()
            .await
            .iter()
            .filter(|r| filter.matches(r.status(), r.user_id(), r.kind()))
            .count() as i64
    }

    pub(crate) async fn count_by_status_since(&self, since: DateTime<Utc>) -> Vec<(R::Status, i64)> {
        let rows = self.rows.read().await;
        R::Status::ALL
            .into_iter()
            .filter_map(|status| {
                let n = rows
                    .iter()
                    .filter(|r| r.status() == status && r.created_at() >= since)
                    .count() as i64;
                (n > 0).then_some((status, n))
            })
            .collect()
    }

    /// Apply `apply` to every row in `ids` whose status is in `eligible`.
    pub(crate) async fn update_many(
        &self,
        ids: &[Uuid],
        eligible: &[R::Status],
        apply: impl Fn(&mut R) + Send,
    ) -> u64 {
        let wanted: HashSet<&Uuid> = ids.iter().collect();
        let mut rows = self.rows.write().await;
        let mut affected = 0;
        for row in rows
            .iter_mut()
            .filter(|r| wanted.contains(&r.id()) && eligible.contains(&r.status()))
        {
            apply(row);
            affected += 1;
        }
        affected
    }

    pub(crate) async fn delete_many(&self, ids: &[Uuid], eligible: &[R::Status]) -> u64 {
        let wanted: HashSet<&Uuid> = ids.iter().collect();
        let mut rows = self.rows.write().await;
        let before = rows.len();
        rows.retain(|r| !(wanted.contains(&r.id()) && eligible.contains(&r.status())));
        (before - rows.len()) as u64
    }

    /// Apply `apply` to one row if its status is in `eligible`, returning the updated row.
    pub(crate) async fn update_one(
        &self,
        id: Uuid,
        eligible: &[R::Status],
        apply: impl FnOnce(&mut R) + Send,
    ) -> Option<R> {
        let mut rows = self.rows.write().await;
        let row = rows
            .iter_mut()
            .find(|r| r.id() == id && eligible.contains(&r.status()))?;
        apply(row);
        Some(row.clone())
    }
}

/// Native statuses that are not terminal.
pub(crate) fn open_statuses<S: NativeStatus>() -> Vec<S> {
    S::ALL
        .into_iter()
        .filter(|s| !s.to_unified().is_terminal())
        .collect()
}
