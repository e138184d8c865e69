//! Submit an analysis and follow it with the job poller.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, bail};
use clap::Args;

use charisma_client::{AnalysisRequest, HttpAnalysisClient, JobPoller, PollObserver, PollerState};
use charisma_core::config::AppConfig;
use charisma_entity::job::UnifiedJob;

use crate::output::{self, OutputFormat};

/// Arguments for the analyze command
#[derive(Debug, Args)]
pub struct AnalyzeArgs {
    /// Chat transcript to analyze
    pub file: PathBuf,
    /// Analysis template id
    #[arg(short, long)]
    pub template: String,
    /// Model id
    #[arg(short, long)]
    pub model: String,
    /// AI provider
    #[arg(short, long)]
    pub provider: String,
}

struct ProgressPrinter;

impl PollObserver for ProgressPrinter {
    fn on_progress(&self, job: &UnifiedJob) {
        println!(
            "  {:<10} {:>3}%  {}",
            job.status.as_str(),
            job.progress,
            job.current_step.as_deref().unwrap_or("")
        );
    }
}

/// Submit, then poll until the job is terminal. Ctrl+C cancels the job.
pub async fn execute(
    args: &AnalyzeArgs,
    client: HttpAnalysisClient,
    config: &AppConfig,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let file_content = tokio::fs::read_to_string(&args.file)
        .await
        .with_context(|| format!("Failed to read '{}'", args.file.display()))?;
    let file_name = args
        .file
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| args.file.display().to_string());

    let request = AnalysisRequest {
        template_id: args.template.clone(),
        model_id: args.model.clone(),
        provider: args.provider.clone(),
        file_name,
        file_content,
    };

    let poller = JobPoller::from_config(Arc::new(client), Arc::new(ProgressPrinter), &config.client);
    let mut states = poller.subscribe();

    let job_id = poller.submit(&request).await.context("Submission failed")?;
    output::print_kv("Job", &job_id.to_string());

    loop {
        tokio::select! {
            changed = states.changed() => {
                if changed.is_err() {
                    bail!("Poller stopped unexpectedly");
                }
            }
            _ = tokio::signal::ctrl_c() => {
                poller.cancel().await.context("Failed to cancel job")?;
                output::print_warning("Analysis cancelled");
                return Ok(());
            }
        }

        let state = states.borrow_and_update().clone();
        match state {
            PollerState::Completed { result, .. } => {
                output::print_success("Analysis complete");
                if let Some(result) = result {
                    output::print_item(&result, format);
                }
                return Ok(());
            }
            PollerState::Failed { error, .. } => bail!("Analysis failed: {error}"),
            PollerState::Cancelled { .. } => {
                output::print_warning("Analysis was cancelled");
                return Ok(());
            }
            PollerState::Idle | PollerState::Submitting | PollerState::Polling { .. } => {}
        }
    }
}
