//! # charisma-client
//!
//! Client side of the CharismaAI background task API: a typed HTTP client,
//! the job poller that follows one analysis to completion, the recent jobs
//! list, and the notification feed that turns server events into toasts.

pub mod api;
pub mod error;
pub mod feed;
pub mod history;
pub mod models;
pub mod poller;
pub mod sse;
pub mod toast;

pub use api::{AnalysisApi, EventSource, HttpAnalysisClient};
pub use error::ClientError;
pub use feed::{NotificationFeed, toast_for_event};
pub use history::JobHistory;
pub use models::{AnalysisRequest, BulkActionResult, TaskListParams, TaskPage};
pub use poller::{JobPoller, NoopObserver, PollObserver, PollerState};
pub use sse::{SseDecoder, SseFrame};
pub use toast::{Toast, ToastKind, ToastQueue};
