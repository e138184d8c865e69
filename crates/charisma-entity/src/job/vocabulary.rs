//! Status vocabulary shared by both job stores.
//!
//! [`STATUS_TABLE`] is the one place where the unified status names meet the
//! native names of each store. Filter translation, result normalization,
//! histogram bucketing and bulk-action eligibility all read from it.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::background::BackgroundJobStatus;
use super::task_queue::TaskQueueStatus;

/// Store-independent job status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UnifiedStatus {
    /// Waiting for a worker.
    Pending,
    /// Being worked on.
    Processing,
    /// Finished successfully.
    Completed,
    /// Finished with an error.
    Failed,
    /// Stopped before completion.
    Cancelled,
}

/// Unified status ↔ native status rows. Row `i` holds the variants whose
/// discriminant is `i` in every column.
pub const STATUS_TABLE: [(UnifiedStatus, BackgroundJobStatus, TaskQueueStatus); 5] = [
    (
        UnifiedStatus::Pending,
        BackgroundJobStatus::Pending,
        TaskQueueStatus::Queued,
    ),
    (
        UnifiedStatus::Processing,
        BackgroundJobStatus::Processing,
        TaskQueueStatus::Running,
    ),
    (
        UnifiedStatus::Completed,
        BackgroundJobStatus::Completed,
        TaskQueueStatus::Completed,
    ),
    (
        UnifiedStatus::Failed,
        BackgroundJobStatus::Failed,
        TaskQueueStatus::Failed,
    ),
    (
        UnifiedStatus::Cancelled,
        BackgroundJobStatus::Cancelled,
        TaskQueueStatus::Canceled,
    ),
];

impl UnifiedStatus {
    /// Every unified status, in table order.
    pub const ALL: [UnifiedStatus; 5] = [
        Self::Pending,
        Self::Processing,
        Self::Completed,
        Self::Failed,
        Self::Cancelled,
    ];

    /// Return the status as an uppercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Processing => "PROCESSING",
            Self::Completed => "COMPLETED",
            Self::Failed => "FAILED",
            Self::Cancelled => "CANCELLED",
        }
    }

    /// Check if the status is final.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Cancelled)
    }

    /// Resolve a unified name or either store's native name, ignoring case.
    pub fn parse_alias(value: &str) -> Option<Self> {
        let wanted = value.trim().to_ascii_uppercase();
        STATUS_TABLE
            .iter()
            .find(|(unified, legacy, queue)| {
                unified.as_str() == wanted || legacy.as_str() == wanted || queue.as_str() == wanted
            })
            .map(|row| row.0)
    }
}

impl fmt::Display for UnifiedStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UnifiedStatus {
    type Err = charisma_core::AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_alias(s).ok_or_else(|| {
            charisma_core::AppError::validation(format!(
                "Invalid status: '{s}'. Expected one of: PENDING, PROCESSING, COMPLETED, FAILED, CANCELLED"
            ))
        })
    }
}

/// A store's native status enum, mapped through [`STATUS_TABLE`].
pub trait NativeStatus: Copy + Eq + fmt::Debug + Send + Sync + 'static {
    /// Every native status, in table order.
    const ALL: [Self; 5];

    /// Row of this status in [`STATUS_TABLE`].
    fn row(self) -> usize;

    /// Pick this store's column out of a table row.
    fn column(row: &(UnifiedStatus, BackgroundJobStatus, TaskQueueStatus)) -> Self;

    /// The stored string form.
    fn as_str(&self) -> &'static str;

    /// Map to the unified vocabulary.
    fn to_unified(self) -> UnifiedStatus {
        STATUS_TABLE[self.row()].0
    }

    /// Map from the unified vocabulary.
    fn from_unified(status: UnifiedStatus) -> Self {
        Self::column(&STATUS_TABLE[status as usize])
    }

    /// Translate a set of unified statuses into native ones.
    fn native_set(statuses: &[UnifiedStatus]) -> Vec<Self> {
        statuses.iter().map(|s| Self::from_unified(*s)).collect()
    }
}

impl NativeStatus for BackgroundJobStatus {
    const ALL: [Self; 5] = [
        Self::Pending,
        Self::Processing,
        Self::Completed,
        Self::Failed,
        Self::Cancelled,
    ];

    fn row(self) -> usize {
        self as usize
    }

    fn column(row: &(UnifiedStatus, BackgroundJobStatus, TaskQueueStatus)) -> Self {
        row.1
    }

    fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Processing => "PROCESSING",
            Self::Completed => "COMPLETED",
            Self::Failed => "FAILED",
            Self::Cancelled => "CANCELLED",
        }
    }
}

impl NativeStatus for TaskQueueStatus {
    const ALL: [Self; 5] = [
        Self::Queued,
        Self::Running,
        Self::Completed,
        Self::Failed,
        Self::Canceled,
    ];

    fn row(self) -> usize {
        self as usize
    }

    fn column(row: &(UnifiedStatus, BackgroundJobStatus, TaskQueueStatus)) -> Self {
        row.2
    }

    fn as_str(&self) -> &'static str {
        match self {
            Self::Queued => "QUEUED",
            Self::Running => "RUNNING",
            Self::Completed => "COMPLETED",
            Self::Failed => "FAILED",
            Self::Canceled => "CANCELED",
        }
    }
}

/// Normalize a raw status string to the unified vocabulary.
///
/// Known native names are mapped; anything else is returned unchanged.
pub fn normalize_status_str(status: &str) -> String {
    STATUS_TABLE
        .iter()
        .find(|(unified, legacy, queue)| {
            unified.as_str() == status || legacy.as_str() == status || queue.as_str() == status
        })
        .map(|row| row.0.as_str().to_string())
        .unwrap_or_else(|| status.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_rows_align_with_discriminants() {
        for (i, (unified, legacy, queue)) in STATUS_TABLE.iter().enumerate() {
            assert_eq!(*unified as usize, i);
            assert_eq!(legacy.row(), i);
            assert_eq!(queue.row(), i);
        }
    }

    #[test]
    fn test_legacy_round_trip() {
        for status in BackgroundJobStatus::ALL {
            assert_eq!(BackgroundJobStatus::from_unified(status.to_unified()), status);
        }
    }

    #[test]
    fn test_task_queue_mapping() {
        let cases = [
            (TaskQueueStatus::Queued, UnifiedStatus::Pending),
            (TaskQueueStatus::Running, UnifiedStatus::Processing),
            (TaskQueueStatus::Completed, UnifiedStatus::Completed),
            (TaskQueueStatus::Failed, UnifiedStatus::Failed),
            (TaskQueueStatus::Canceled, UnifiedStatus::Cancelled),
        ];
        for (native, unified) in cases {
            assert_eq!(native.to_unified(), unified);
            assert_eq!(TaskQueueStatus::from_unified(unified), native);
        }
    }

    #[test]
    fn test_normalize_status_str() {
        let cases = [
            ("QUEUED", "PENDING"),
            ("RUNNING", "PROCESSING"),
            ("CANCELED", "CANCELLED"),
            ("PENDING", "PENDING"),
            ("PROCESSING", "PROCESSING"),
            ("COMPLETED", "COMPLETED"),
            ("FAILED", "FAILED"),
            ("CANCELLED", "CANCELLED"),
            ("PAUSED", "PAUSED"),
            ("", ""),
        ];
        for (input, expected) in cases {
            assert_eq!(normalize_status_str(input), expected, "input {input:?}");
        }
    }

    #[test]
    fn test_parse_alias_is_case_insensitive() {
        assert_eq!(UnifiedStatus::parse_alias("queued"), Some(UnifiedStatus::Pending));
        assert_eq!(UnifiedStatus::parse_alias("Running"), Some(UnifiedStatus::Processing));
        assert_eq!(UnifiedStatus::parse_alias(" canceled "), Some(UnifiedStatus::Cancelled));
        assert_eq!(UnifiedStatus::parse_alias("failed"), Some(UnifiedStatus::Failed));
        assert_eq!(UnifiedStatus::parse_alias("bogus"), None);
        assert!("bogus".parse::<UnifiedStatus>().is_err());
    }

    #[test]
    fn test_terminal_statuses() {
        let terminal: Vec<_> = UnifiedStatus::ALL
            .into_iter()
            .filter(UnifiedStatus::is_terminal)
            .collect();
        assert_eq!(
            terminal,
            vec![
                UnifiedStatus::Completed,
                UnifiedStatus::Failed,
                UnifiedStatus::Cancelled
            ]
        );
    }
}
