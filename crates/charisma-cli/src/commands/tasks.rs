//! Admin listing and bulk actions across both job stores.

use anyhow::Context;
use clap::{Args, Subcommand};
use uuid::Uuid;

use charisma_client::{HttpAnalysisClient, TaskListParams};

use crate::output::{self, OutputFormat};

/// Arguments for the tasks command
#[derive(Debug, Args)]
pub struct TasksArgs {
    /// Tasks subcommand
    #[command(subcommand)]
    pub command: TasksCommand,
}

/// Tasks subcommands
#[derive(Debug, Subcommand)]
pub enum TasksCommand {
    /// One page of jobs with status counts
    List {
        /// Page size
        #[arg(short, long)]
        limit: Option<u64>,
        /// Rows to skip
        #[arg(short, long)]
        offset: Option<u64>,
        /// Status filter, in any store's vocabulary
        #[arg(short, long)]
        status: Option<String>,
        /// Owner filter
        #[arg(short, long)]
        user: Option<Uuid>,
        /// Job kind filter
        #[arg(short = 't', long = "type")]
        job_type: Option<String>,
        /// Include job payloads
        #[arg(long)]
        include_payload: bool,
    },
    /// Apply cancel, retry, delete, or a queue control action
    Bulk {
        /// Action name
        action: String,
        /// Job ids
        ids: Vec<Uuid>,
        /// Store per id (backgroundJob or taskQueue), comma separated
        #[arg(long, value_delimiter = ',')]
        sources: Vec<String>,
    },
}

/// Execute tasks commands
pub async fn execute(
    args: &TasksArgs,
    client: &HttpAnalysisClient,
    format: OutputFormat,
) -> anyhow::Result<()> {
    match &args.command {
        TasksCommand::List {
            limit,
            offset,
            status,
            user,
            job_type,
            include_payload,
        } => {
            let params = TaskListParams {
                limit: *limit,
                offset: *offset,
                status: status.clone(),
                user_id: *user,
                job_type: job_type.clone(),
                include_payload: *include_payload,
            };
            let page = client
                .list_tasks(&params)
                .await
                .context("Failed to list tasks")?;

            output::print_jobs(&page.jobs, format);
            if format == OutputFormat::Table {
                println!();
                output::print_kv(
                    "Showing",
                    &format!(
                        "{} of {} (offset {})",
                        page.jobs.len(),
                        page.total_count,
                        page.pagination.offset
                    ),
                );
                output::print_kv("Pending", &page.stats.pending.to_string());
                output::print_kv("Processing", &page.stats.processing.to_string());
                output::print_kv("Completed", &page.stats.completed.to_string());
                output::print_kv("Failed", &page.stats.failed.to_string());
                output::print_kv("Cancelled", &page.stats.cancelled.to_string());
            }
        }
        TasksCommand::Bulk {
            action,
            ids,
            sources,
        } => {
            let sources = (!sources.is_empty()).then_some(sources.as_slice());
            let result = client
                .bulk_action(action, ids, sources)
                .await
                .context("Bulk action failed")?;
            output::print_success(&result.message);
            output::print_kv("Affected", &result.affected_count.to_string());
        }
    }
    Ok(())
}
