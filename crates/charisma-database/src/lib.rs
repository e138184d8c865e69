//! # charisma-database
//!
//! Store traits for the two job tables and the log sinks, with PostgreSQL
//! repositories and in-memory implementations behind them.

pub mod connection;
pub mod memory;
pub mod migration;
pub mod repositories;
pub mod store;

pub use connection::DatabasePool;
pub use store::{AuditLogSink, BackgroundJobStore, ErrorLogSink, Stores, TaskQueueStore};
