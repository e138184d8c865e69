//! Background task aggregation configuration.

use serde::{Deserialize, Serialize};

/// Settings for the job aggregation, bulk action, and analysis endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobsConfig {
    /// Page size used when the caller omits `limit`.
    #[serde(default = "default_limit")]
    pub default_limit: u64,
    /// Upper bound for `limit`.
    #[serde(default = "default_max_limit")]
    pub max_limit: u64,
    /// Trailing window for the status histogram, in hours.
    #[serde(default = "default_stats_window")]
    pub stats_window_hours: i64,
    /// Job kinds written to the legacy background job table.
    #[serde(default = "default_background_job_kinds")]
    pub background_job_kinds: Vec<String>,
    /// Job kinds written to the task queue table.
    #[serde(default = "default_task_queue_kinds")]
    pub task_queue_kinds: Vec<String>,
    /// Number of phases an analysis job reports.
    #[serde(default = "default_analysis_steps")]
    pub analysis_total_steps: i32,
    /// Retry budget recorded on new analysis jobs.
    #[serde(default = "default_max_retries")]
    pub analysis_max_retries: i32,
    /// Upper bound for the recent-jobs history list.
    #[serde(default = "default_history_limit")]
    pub max_history_limit: u64,
}

impl Default for JobsConfig {
    fn default() -> Self {
        Self {
            default_limit: default_limit(),
            max_limit: default_max_limit(),
            stats_window_hours: default_stats_window(),
            background_job_kinds: default_background_job_kinds(),
            task_queue_kinds: default_task_queue_kinds(),
            analysis_total_steps: default_analysis_steps(),
            analysis_max_retries: default_max_retries(),
            max_history_limit: default_history_limit(),
        }
    }
}

fn default_limit() -> u64 {
    50
}

fn default_max_limit() -> u64 {
    200
}

fn default_stats_window() -> i64 {
    24
}

fn default_background_job_kinds() -> Vec<String> {
    vec!["analysis".to_string(), "batch_analysis".to_string()]
}

fn default_task_queue_kinds() -> Vec<String> {
    vec![
        "story_generation".to_string(),
        "insight_extraction".to_string(),
        "report_export".to_string(),
    ]
}

fn default_analysis_steps() -> i32 {
    4
}

fn default_max_retries() -> i32 {
    3
}

fn default_history_limit() -> u64 {
    20
}
