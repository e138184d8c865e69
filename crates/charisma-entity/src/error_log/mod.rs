//! Persisted server error records.

pub mod model;

pub use model::{CreateErrorLogEntry, ErrorLogEntry, ErrorSeverity};
