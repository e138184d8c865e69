//! Client-side polling and notification configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Settings for the job poller, toast queue, and notification feed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Base URL of the API server.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Fixed interval between job status polls, in milliseconds.
    #[serde(default = "default_poll_interval")]
    pub poll_interval_ms: u64,
    /// Delay before re-opening a dropped notification stream, in milliseconds.
    #[serde(default = "default_reconnect_delay")]
    pub reconnect_delay_ms: u64,
    /// Default toast lifetime, in milliseconds.
    #[serde(default = "default_toast_duration")]
    pub toast_duration_ms: u64,
    /// Maximum number of toasts displayed at once.
    #[serde(default = "default_max_toasts")]
    pub max_toasts: usize,
    /// Size of the recent-jobs history list.
    #[serde(default = "default_history_size")]
    pub history_size: u64,
    /// HTTP request timeout, in seconds.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u64,
}

impl ClientConfig {
    /// Poll interval as a [`Duration`].
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Reconnect delay as a [`Duration`].
    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_millis(self.reconnect_delay_ms)
    }

    /// Default toast lifetime as a [`Duration`].
    pub fn toast_duration(&self) -> Duration {
        Duration::from_millis(self.toast_duration_ms)
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            poll_interval_ms: default_poll_interval(),
            reconnect_delay_ms: default_reconnect_delay(),
            toast_duration_ms: default_toast_duration(),
            max_toasts: default_max_toasts(),
            history_size: default_history_size(),
            request_timeout_seconds: default_request_timeout(),
        }
    }
}

fn default_base_url() -> String {
    "http://127.0.0.1:3000".to_string()
}

fn default_poll_interval() -> u64 {
    2000
}

fn default_reconnect_delay() -> u64 {
    5000
}

fn default_toast_duration() -> u64 {
    5000
}

fn default_max_toasts() -> usize {
    5
}

fn default_history_size() -> u64 {
    5
}

fn default_request_timeout() -> u64 {
    30
}
