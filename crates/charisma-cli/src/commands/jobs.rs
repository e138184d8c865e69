//! The caller's own analysis jobs.

use std::sync::Arc;

use anyhow::Context;
use clap::{Args, Subcommand};
use uuid::Uuid;

use charisma_client::{AnalysisApi, HttpAnalysisClient, JobHistory};
use charisma_core::config::AppConfig;

use crate::output::{self, OutputFormat};

/// Arguments for the jobs command
#[derive(Debug, Args)]
pub struct JobsArgs {
    /// Jobs subcommand
    #[command(subcommand)]
    pub command: JobsCommand,
}

/// Jobs subcommands
#[derive(Debug, Subcommand)]
pub enum JobsCommand {
    /// Most recent jobs, newest first
    Recent {
        /// Number of jobs (defaults to `client.history_size`)
        #[arg(short, long)]
        limit: Option<u64>,
    },
    /// One job
    Show {
        /// Job id
        id: Uuid,
    },
    /// Cancel a job that has not finished
    Cancel {
        /// Job id
        id: Uuid,
    },
}

/// Execute jobs commands
pub async fn execute(
    args: &JobsArgs,
    client: HttpAnalysisClient,
    config: &AppConfig,
    format: OutputFormat,
) -> anyhow::Result<()> {
    match &args.command {
        JobsCommand::Recent { limit } => {
            let limit = limit.unwrap_or(config.client.history_size);
            let history = JobHistory::new(Arc::new(client), limit);
            let jobs = history.load().await.context("Failed to load recent jobs")?;
            output::print_jobs(&jobs, format);
        }
        JobsCommand::Show { id } => {
            let job = client.get_job(*id).await.context("Failed to fetch job")?;
            output::print_item(&job, format);
        }
        JobsCommand::Cancel { id } => {
            client.cancel(*id).await.context("Failed to cancel job")?;
            output::print_success(&format!("Job {id} cancelled"));
        }
    }
    Ok(())
}
