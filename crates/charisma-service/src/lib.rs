//! # charisma-service
//!
//! Use cases behind the background task endpoints. Each service receives
//! its stores and collaborators as `Arc`s at construction time and knows
//! nothing about HTTP.

pub mod audit;
pub mod context;
pub mod error_report;
pub mod job;

pub use audit::AuditRecorder;
pub use context::RequestContext;
pub use error_report::ErrorReporter;
pub use job::{
    AnalysisJobService, BulkActionService, JobProgressReporter, TaskAggregationService,
};
