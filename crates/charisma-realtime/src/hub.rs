//! Broadcast hub for notification events.

use tokio::sync::broadcast;
use tracing::debug;
use uuid::Uuid;

use charisma_core::config::RealtimeConfig;
use charisma_entity::notification::StreamEvent;

use crate::subscription::EventSubscription;

/// In-memory pub/sub for notification events.
#[derive(Debug, Clone)]
pub struct NotificationHub {
    sender: broadcast::Sender<StreamEvent>,
}

impl NotificationHub {
    /// Create a hub whose channel buffers `buffer_size` events per subscriber.
    pub fn new(buffer_size: usize) -> Self {
        let (sender, _) = broadcast::channel(buffer_size.max(1));
        Self { sender }
    }

    /// Create a hub from the realtime configuration section.
    pub fn from_config(config: &RealtimeConfig) -> Self {
        Self::new(config.channel_buffer_size)
    }

    /// Publish an event. Returns the number of open streams it reached;
    /// publishing with nobody listening is not an error.
    pub fn publish(&self, event: StreamEvent) -> usize {
        let event_type = event.event_type;
        let delivered = self.sender.send(event).unwrap_or(0);
        debug!(%event_type, delivered, "Published notification event");
        delivered
    }

    /// Open a subscription that only yields events visible to this session.
    pub fn subscribe(&self, user_id: Uuid, is_admin: bool) -> EventSubscription {
        EventSubscription::new(self.sender.subscribe(), user_id, is_admin)
    }

    /// Number of open subscriptions.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}
