//! Table and JSON output formatting for CLI commands.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tabled::{Table, Tabled};

use charisma_entity::job::UnifiedJob;

/// Output format selection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable table
    #[default]
    Table,
    /// JSON output
    Json,
}

/// One job as a table row.
#[derive(Debug, Serialize, Tabled)]
pub struct JobRow {
    /// Job identifier
    #[tabled(rename = "ID")]
    pub id: String,
    /// Originating store
    #[tabled(rename = "Source")]
    pub source: String,
    /// Job kind
    #[tabled(rename = "Type")]
    pub job_type: String,
    /// Unified status
    #[tabled(rename = "Status")]
    pub status: String,
    /// Progress percentage
    #[tabled(rename = "Progress")]
    pub progress: String,
    /// Current step, if any
    #[tabled(rename = "Step")]
    pub step: String,
    /// Creation time
    #[tabled(rename = "Created")]
    pub created_at: String,
}

impl From<&UnifiedJob> for JobRow {
    fn from(job: &UnifiedJob) -> Self {
        Self {
            id: job.id.to_string(),
            source: job.source.to_string(),
            job_type: job.job_type.clone(),
            status: job.status.as_str().to_string(),
            progress: format!("{}%", job.progress),
            step: job.current_step.clone().unwrap_or_else(|| "-".to_string()),
            created_at: format_time(&job.created_at),
        }
    }
}

/// Render a timestamp for humans.
pub fn format_time(at: &DateTime<Utc>) -> String {
    at.format("%Y-%m-%d %H:%M:%S").to_string()
}

/// Print jobs in the selected format
pub fn print_jobs(jobs: &[UnifiedJob], format: OutputFormat) {
    match format {
        OutputFormat::Table => {
            let rows: Vec<JobRow> = jobs.iter().map(JobRow::from).collect();
            print_list(&rows, format);
        }
        OutputFormat::Json => print_item(&jobs, format),
    }
}

/// Print a list of items in the selected format
pub fn print_list<T: Serialize + Tabled>(items: &[T], format: OutputFormat) {
    match format {
        OutputFormat::Table => {
            if items.is_empty() {
                println!("No results found.");
            } else {
                println!("{}", Table::new(items));
            }
        }
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(items).unwrap_or_else(|_| "[]".to_string());
            println!("{}", json);
        }
    }
}

/// Print a single item in the selected format
pub fn print_item<T: Serialize + std::fmt::Debug>(item: &T, format: OutputFormat) {
    match format {
        OutputFormat::Table => {
            println!("{:#?}", item);
        }
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(item).unwrap_or_else(|_| "{}".to_string());
            println!("{}", json);
        }
    }
}

/// Print a success message
pub fn print_success(msg: &str) {
    println!("✓ {}", msg);
}

/// Print a warning message
pub fn print_warning(msg: &str) {
    println!("⚠ {}", msg);
}

/// Print an error message
pub fn print_error(msg: &str) {
    eprintln!("✗ {}", msg);
}

/// Print a key-value pair
pub fn print_kv(key: &str, value: &str) {
    println!("  {:<24} {}", format!("{}:", key), value);
}
