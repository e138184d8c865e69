//! Store traits and provider selection.
//!
//! The service layer only sees the traits in this module. The configured
//! provider decides whether PostgreSQL repositories or in-memory stores sit
//! behind them.

pub mod job;
pub mod sink;

use std::sync::Arc;

use tracing::info;

use charisma_core::config::{DatabaseConfig, DatabaseProvider};
use charisma_core::result::AppResult;

pub use self::job::{BackgroundJobStore, TaskQueueStore};
pub use self::sink::{AuditLogSink, ErrorLogSink};

use crate::connection::DatabasePool;
use crate::memory::{
    MemoryAuditLogSink, MemoryBackgroundJobStore, MemoryErrorLogSink, MemoryTaskQueueStore,
};
use crate::migration::run_migrations;
use crate::repositories::{
    AuditLogRepository, BackgroundJobRepository, ErrorLogRepository, TaskQueueRepository,
};

/// Every store the application needs, behind trait objects.
#[derive(Debug, Clone)]
pub struct Stores {
    /// Legacy `background_jobs` store.
    pub background_jobs: Arc<dyn BackgroundJobStore>,
    /// `task_queue` store.
    pub task_queue: Arc<dyn TaskQueueStore>,
    /// Error log sink.
    pub error_logs: Arc<dyn ErrorLogSink>,
    /// Audit log sink.
    pub audit_logs: Arc<dyn AuditLogSink>,
    /// PostgreSQL pool, when the postgres provider is active.
    pub pool: Option<DatabasePool>,
}

impl Stores {
    /// Build the stores for the configured provider.
    ///
    /// For PostgreSQL this connects the pool and, if enabled, runs pending
    /// migrations before returning.
    pub async fn connect(config: &DatabaseConfig) -> AppResult<Self> {
        match config.provider {
            DatabaseProvider::Postgres => {
                let db = DatabasePool::connect(config).await?;
                if config.run_migrations {
                    run_migrations(db.pool()).await?;
                }
                Ok(Self::postgres(db))
            }
            DatabaseProvider::Memory => {
                info!("Using in-memory job stores");
                Ok(Self::memory())
            }
        }
    }

    /// PostgreSQL-backed stores sharing one pool.
    pub fn postgres(db: DatabasePool) -> Self {
        let pool = db.pool().clone();
        Self {
            background_jobs: Arc::new(BackgroundJobRepository::new(pool.clone())),
            task_queue: Arc::new(TaskQueueRepository::new(pool.clone())),
            error_logs: Arc::new(ErrorLogRepository::new(pool.clone())),
            audit_logs: Arc::new(AuditLogRepository::new(pool)),
            pool: Some(db),
        }
    }

    /// Fresh, empty in-memory stores.
    pub fn memory() -> Self {
        Self {
            background_jobs: Arc::new(MemoryBackgroundJobStore::new()),
            task_queue: Arc::new(MemoryTaskQueueStore::new()),
            error_logs: Arc::new(MemoryErrorLogSink::new()),
            audit_logs: Arc::new(MemoryAuditLogSink::new()),
            pool: None,
        }
    }
}
