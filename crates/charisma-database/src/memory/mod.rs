//! In-memory store implementations.
//!
//! Used by the `memory` database provider for development and by every test
//! suite that needs stores without a PostgreSQL server.

mod background_job;
mod sink;
mod table;
mod task_queue;

pub use background_job::MemoryBackgroundJobStore;
pub use sink::{MemoryAuditLogSink, MemoryErrorLogSink};
pub use task_queue::MemoryTaskQueueStore;
