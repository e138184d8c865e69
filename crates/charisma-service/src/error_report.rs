//! Best-effort persistence of server-side failures.

use std::error::Error as _;
use std::sync::Arc;

use tracing::{error, warn};
use uuid::Uuid;

use charisma_core::AppError;
use charisma_database::ErrorLogSink;
use charisma_entity::error_log::{CreateErrorLogEntry, ErrorSeverity};

/// Category used for failures of the background task endpoints.
pub const BACKGROUND_TASKS_CATEGORY: &str = "BACKGROUND_TASKS";

/// Logs an error and copies it to the error log sink.
#[derive(Debug, Clone)]
pub struct ErrorReporter {
    sink: Arc<dyn ErrorLogSink>,
}

impl ErrorReporter {
    /// Creates a new error reporter.
    pub fn new(sink: Arc<dyn ErrorLogSink>) -> Self {
        Self { sink }
    }

    /// Report a failure. A failing sink is logged and otherwise ignored.
    pub async fn report(
        &self,
        category: &str,
        severity: ErrorSeverity,
        err: &AppError,
        endpoint: Option<&str>,
        user_id: Option<Uuid>,
    ) {
        let chain = error_chain(err);
        error!(
            category,
            %severity,
            endpoint = endpoint.unwrap_or("-"),
            error = %err,
            chain = chain.as_deref().unwrap_or(""),
            "Request failed"
        );

        let entry = CreateErrorLogEntry {
            category: category.to_string(),
            severity,
            message: err.to_string(),
            stack_trace: chain,
            endpoint: endpoint.map(String::from),
            user_id,
        };
        if let Err(e) = self.sink.record(&entry).await {
            warn!(error = %e, category, "Failed to persist error log entry");
        }
    }
}

/// Render the `source()` chain below `err`, one cause per line.
fn error_chain(err: &AppError) -> Option<String> {
    let mut causes = Vec::new();
    let mut current = err.source();
    while let Some(cause) = current {
        causes.push(cause.to_string());
        current = cause.source();
    }
    (!causes.is_empty()).then(|| causes.join("\ncaused by: "))
}
