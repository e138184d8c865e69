//! Job domain entities for both persistent stores.
//!
//! The legacy `background_jobs` table and the newer `task_queue` table use
//! different status vocabularies. [`vocabulary`] holds the single mapping
//! between them and [`unified`] the store-independent view.

pub mod action;
pub mod background;
pub mod filter;
pub mod task_queue;
pub mod unified;
pub mod vocabulary;

pub use action::BulkAction;
pub use background::{BackgroundJob, BackgroundJobStatus, CreateBackgroundJob};
pub use filter::{JobFilter, KindRegistry, UnifiedFilter};
pub use task_queue::{CreateTaskQueueJob, TaskQueueJob, TaskQueueStatus};
pub use unified::{JobSource, StatusHistogram, UnifiedJob};
pub use vocabulary::{NativeStatus, STATUS_TABLE, UnifiedStatus, normalize_status_str};
