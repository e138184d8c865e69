//! PostgreSQL repository implementations of the store traits.

pub mod audit;
pub mod background_job;
pub mod error_log;
pub mod task_queue;

pub use audit::AuditLogRepository;
pub use background_job::BackgroundJobRepository;
pub use error_log::ErrorLogRepository;
pub use task_queue::TaskQueueRepository;

use sqlx::{Postgres, QueryBuilder};

use charisma_entity::job::{JobFilter, NativeStatus};

/// A row count as a `LIMIT` bind. Postgres rejects negative limits, so
/// counts past `i64::MAX` saturate instead of wrapping.
pub(crate) fn sql_limit(count: u64) -> i64 {
    i64::try_from(count).unwrap_or(i64::MAX)
}

/// Status names for a `status::text = ANY($n)` predicate.
pub(crate) fn status_names<S: NativeStatus>(statuses: &[S]) -> Vec<String> {
    statuses.iter().map(|s| s.as_str().to_string()).collect()
}

/// Append the predicates of `filter` to a query that already has a `WHERE`.
pub(crate) fn push_filter<S: NativeStatus>(
    qb: &mut QueryBuilder<'_, Postgres>,
    filter: &JobFilter<S>,
    kind_column: &str,
) {
    if let Some(status) = filter.status {
        qb.push(" AND status::text = ").push_bind(status.as_str());
    }
    if let Some(user_id) = filter.user_id {
        qb.push(" AND user_id = ").push_bind(user_id);
    }
    if let Some(kind) = &filter.job_type {
        qb.push(format!(" AND {kind_column} = "))
            .push_bind(kind.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use charisma_entity::job::{BulkAction, TaskQueueStatus};
    use uuid::Uuid;

    #[test]
    fn test_sql_limit_saturates() {
        assert_eq!(sql_limit(25), 25);
        assert_eq!(sql_limit(i64::MAX as u64), i64::MAX);
        assert_eq!(sql_limit(u64::MAX), i64::MAX);
    }

    #[test]
    fn test_status_names_use_native_vocabulary() {
        let names = status_names(&BulkAction::Cancel.eligible_native::<TaskQueueStatus>());
        assert_eq!(names, vec!["QUEUED".to_string(), "RUNNING".to_string()]);
    }

    #[test]
    fn test_push_filter_builds_placeholders_in_order() {
        let filter = JobFilter {
            status: Some(TaskQueueStatus::Failed),
            user_id: Some(Uuid::nil()),
            job_type: Some("report_export".into()),
            match_nothing: false,
        };
        let mut qb = QueryBuilder::<Postgres>::new("SELECT * FROM task_queue WHERE TRUE");
        push_filter(&mut qb, &filter, "task_type");
        assert_eq!(
            qb.sql(),
            "SELECT * FROM task_queue WHERE TRUE AND status::text = $1 AND user_id = $2 AND task_type = $3"
        );
    }
}
