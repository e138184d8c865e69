//! Admin bulk actions over job ids.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::vocabulary::{NativeStatus, UnifiedStatus};

/// An admin bulk action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BulkAction {
    /// Stop pending or processing jobs.
    Cancel,
    /// Re-queue failed jobs.
    Retry,
    /// Remove jobs in a terminal status.
    Delete,
    /// Pause queue processing. Accepted but not implemented by any store.
    PauseQueue,
    /// Resume queue processing. Accepted but not implemented by any store.
    ResumeQueue,
}

impl BulkAction {
    /// Unified statuses a job must be in for this action to affect it.
    pub fn eligible_statuses(&self) -> &'static [UnifiedStatus] {
        match self {
            Self::Cancel => &[UnifiedStatus::Pending, UnifiedStatus::Processing],
            Self::Retry => &[UnifiedStatus::Failed],
            Self::Delete => &[
                UnifiedStatus::Completed,
                UnifiedStatus::Failed,
                UnifiedStatus::Cancelled,
            ],
            Self::PauseQueue | Self::ResumeQueue => &[],
        }
    }

    /// Eligible statuses in a store's native vocabulary.
    pub fn eligible_native<S: NativeStatus>(&self) -> Vec<S> {
        S::native_set(self.eligible_statuses())
    }

    /// Check if the action works at queue level rather than per job.
    pub fn is_queue_control(&self) -> bool {
        matches!(self, Self::PauseQueue | Self::ResumeQueue)
    }

    /// Return the action as its wire name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cancel => "cancel",
            Self::Retry => "retry",
            Self::Delete => "delete",
            Self::PauseQueue => "pause_queue",
            Self::ResumeQueue => "resume_queue",
        }
    }

    /// Audit log action name.
    pub fn audit_action(&self) -> String {
        format!("background_tasks.{}", self.as_str())
    }
}

impl fmt::Display for BulkAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BulkAction {
    type Err = charisma_core::AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cancel" => Ok(Self::Cancel),
            "retry" => Ok(Self::Retry),
            "delete" => Ok(Self::Delete),
            "pause_queue" => Ok(Self::PauseQueue),
            "resume_queue" => Ok(Self::ResumeQueue),
            _ => Err(charisma_core::AppError::validation(format!(
                "Invalid action: '{s}'. Expected one of: cancel, retry, delete, pause_queue, resume_queue"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::job::{BackgroundJobStatus, TaskQueueStatus};

    #[test]
    fn test_cancel_eligibility_per_store() {
        assert_eq!(
            BulkAction::Cancel.eligible_native::<BackgroundJobStatus>(),
            vec![BackgroundJobStatus::Pending, BackgroundJobStatus::Processing]
        );
        assert_eq!(
            BulkAction::Cancel.eligible_native::<TaskQueueStatus>(),
            vec![TaskQueueStatus::Queued, TaskQueueStatus::Running]
        );
    }

    #[test]
    fn test_delete_only_terminal() {
        assert!(
            BulkAction::Delete
                .eligible_statuses()
                .iter()
                .all(UnifiedStatus::is_terminal)
        );
        assert_eq!(
            BulkAction::Delete.eligible_native::<TaskQueueStatus>(),
            vec![
                TaskQueueStatus::Completed,
                TaskQueueStatus::Failed,
                TaskQueueStatus::Canceled
            ]
        );
    }

    #[test]
    fn test_queue_control_touches_nothing() {
        assert!(BulkAction::PauseQueue.is_queue_control());
        assert!(BulkAction::ResumeQueue.eligible_statuses().is_empty());
        assert!(!BulkAction::Retry.is_queue_control());
    }

    #[test]
    fn test_parse() {
        assert_eq!("retry".parse::<BulkAction>().unwrap(), BulkAction::Retry);
        assert_eq!(
            "pause_queue".parse::<BulkAction>().unwrap(),
            BulkAction::PauseQueue
        );
        assert!("purge".parse::<BulkAction>().is_err());
        assert_eq!(BulkAction::Delete.audit_action(), "background_tasks.delete");
    }
}
