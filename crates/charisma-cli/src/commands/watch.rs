//! Print live notifications until interrupted.

use std::sync::Arc;

use tokio::sync::broadcast::error::RecvError;

use charisma_client::{HttpAnalysisClient, NotificationFeed, toast_for_event};
use charisma_core::config::AppConfig;

use crate::output::{self, OutputFormat};

/// Follow the notification stream, reconnecting when it drops.
pub async fn execute(
    client: HttpAnalysisClient,
    config: &AppConfig,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let feed = NotificationFeed::from_config(Arc::new(client), &config.client);
    let mut events = feed.subscribe();
    feed.start();
    output::print_success("Watching notifications (Ctrl+C to stop)");

    loop {
        tokio::select! {
            received = events.recv() => match received {
                Ok(event) => match format {
                    OutputFormat::Json => {
                        println!("{}", serde_json::to_string(&event)?);
                    }
                    OutputFormat::Table => {
                        let marker = match toast_for_event(&event) {
                            Some(kind) => format!("{kind:?}"),
                            None => "-".to_string(),
                        };
                        println!(
                            "[{}] {:<8} {:<20} {}: {}",
                            output::format_time(&event.timestamp),
                            marker,
                            event.event_type.as_str(),
                            event.title,
                            event.message
                        );
                    }
                },
                Err(RecvError::Lagged(skipped)) => {
                    output::print_warning(&format!("Skipped {skipped} notifications"));
                }
                Err(RecvError::Closed) => break,
            },
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    feed.stop();
    Ok(())
}
