//! CLI command definitions and dispatch.

pub mod analyze;
pub mod jobs;
pub mod migrate;
pub mod tasks;
pub mod token;
pub mod watch;

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};

use charisma_client::HttpAnalysisClient;
use charisma_core::config::AppConfig;

use crate::output::OutputFormat;

/// Environment variable holding the session token.
pub const TOKEN_ENV: &str = "CHARISMA_TOKEN";

/// CharismaAI background task tooling
#[derive(Debug, Parser)]
#[command(name = "charisma", version, about, long_about = None)]
pub struct Cli {
    /// Configuration directory
    #[arg(short, long, default_value = "config")]
    pub config: String,

    /// Configuration overlay to apply on top of `default.toml`
    #[arg(short, long, default_value = "development")]
    pub env: String,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub format: OutputFormat,

    /// API base URL, overriding `client.base_url`
    #[arg(long)]
    pub url: Option<String>,

    /// Session token; read from CHARISMA_TOKEN when omitted
    #[arg(long)]
    pub token: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Mint a session token
    Token(token::TokenArgs),
    /// Submit a chat analysis and follow it to completion
    Analyze(analyze::AnalyzeArgs),
    /// Your own analysis jobs
    Jobs(jobs::JobsArgs),
    /// Admin view over both job stores
    Tasks(tasks::TasksArgs),
    /// Print live notifications
    Watch,
    /// Database migration management
    Migrate,
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(&self) -> anyhow::Result<()> {
        let config = self.load_config()?;
        match &self.command {
            Commands::Token(args) => token::execute(args, &config),
            Commands::Analyze(args) => {
                analyze::execute(args, self.client(&config)?, &config, self.format).await
            }
            Commands::Jobs(args) => {
                jobs::execute(args, self.client(&config)?, &config, self.format).await
            }
            Commands::Tasks(args) => tasks::execute(args, &self.client(&config)?, self.format).await,
            Commands::Watch => watch::execute(self.client(&config)?, &config, self.format).await,
            Commands::Migrate => migrate::execute(&config).await,
        }
    }

    fn load_config(&self) -> anyhow::Result<AppConfig> {
        let mut config = AppConfig::load_from(&self.config, &self.env)
            .with_context(|| format!("Failed to load config from '{}'", self.config))?;
        if let Some(url) = &self.url {
            config.client.base_url = url.clone();
        }
        Ok(config)
    }

    fn client(&self, config: &AppConfig) -> anyhow::Result<HttpAnalysisClient> {
        let token = match &self.token {
            Some(token) => token.clone(),
            None => match std::env::var(TOKEN_ENV) {
                Ok(token) => token,
                Err(_) => bail!("No session token: pass --token or set {TOKEN_ENV}"),
            },
        };
        HttpAnalysisClient::from_config(&config.client, token)
            .context("Failed to create API client")
    }
}
