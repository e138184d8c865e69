//! Server push configuration.

use serde::{Deserialize, Serialize};

/// Notification stream (SSE) configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RealtimeConfig {
    /// Buffer size of the in-process broadcast channel.
    #[serde(default = "default_channel_buffer")]
    pub channel_buffer_size: usize,
    /// Interval between SSE keep-alive comments, in seconds.
    #[serde(default = "default_keep_alive")]
    pub keep_alive_seconds: u64,
}

impl Default for RealtimeConfig {
    fn default() -> Self {
        Self {
            channel_buffer_size: default_channel_buffer(),
            keep_alive_seconds: default_keep_alive(),
        }
    }
}

fn default_channel_buffer() -> usize {
    256
}

fn default_keep_alive() -> u64 {
    15
}
