//! A single session's view of the hub.

use futures::Stream;
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::warn;
use uuid::Uuid;

use charisma_entity::notification::StreamEvent;

/// Receiver that skips events not addressed to its session.
#[derive(Debug)]
pub struct EventSubscription {
    receiver: broadcast::Receiver<StreamEvent>,
    user_id: Uuid,
    is_admin: bool,
}

impl EventSubscription {
    pub(crate) fn new(receiver: broadcast::Receiver<StreamEvent>, user_id: Uuid, is_admin: bool) -> Self {
        Self {
            receiver,
            user_id,
            is_admin,
        }
    }

    /// Wait for the next visible event. Returns `None` once the hub is gone.
    ///
    /// A subscriber that falls behind the channel buffer loses the oldest
    /// events and keeps going.
    pub async fn recv(&mut self) -> Option<StreamEvent> {
        loop {
            match self.receiver.recv().await {
                Ok(event) if event.is_visible_to(self.user_id, self.is_admin) => return Some(event),
                Ok(_) => continue,
                Err(RecvError::Lagged(skipped)) => {
                    warn!(user_id = %self.user_id, skipped, "Notification subscriber lagged");
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }

    /// Turn the subscription into a stream of visible events.
    pub fn into_stream(self) -> impl Stream<Item = StreamEvent> + Send + 'static {
        futures::stream::unfold(self, |mut sub| async move {
            sub.recv().await.map(|event| (event, sub))
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::NotificationHub;
    use charisma_entity::notification::{EventType, StreamEvent};
    use futures::StreamExt;
    use serde_json::json;
    use uuid::Uuid;

    #[tokio::test]
    async fn test_user_only_sees_own_and_broadcast_events() {
        let hub = NotificationHub::new(16);
        let me = Uuid::new_v4();
        let mut sub = hub.subscribe(me, false);

        hub.publish(StreamEvent::for_user(
            Uuid::new_v4(),
            EventType::AnalysisComplete,
            "Done",
            "not mine",
            json!({}),
        ));
        hub.publish(StreamEvent::for_admins(EventType::BulkAction, "Bulk", "admins", json!({})));
        hub.publish(StreamEvent::for_user(
            me,
            EventType::AnalysisFailed,
            "Failed",
            "mine",
            json!({}),
        ));
        hub.publish(StreamEvent::broadcast(EventType::System, "System", "all", json!({})));

        assert_eq!(sub.recv().await.unwrap().message, "mine");
        assert_eq!(sub.recv().await.unwrap().message, "all");
    }

    #[tokio::test]
    async fn test_admin_sees_admin_events() {
        let hub = NotificationHub::new(16);
        let stream = hub.subscribe(Uuid::new_v4(), true).into_stream();
        hub.publish(StreamEvent::for_admins(EventType::BulkAction, "Bulk", "3 jobs", json!({})));
        drop(hub);

        let events: Vec<_> = stream.collect().await;
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event_type, EventType::BulkAction);
    }

    #[tokio::test]
    async fn test_lagged_subscriber_recovers() {
        let hub = NotificationHub::new(2);
        let me = Uuid::new_v4();
        let mut sub = hub.subscribe(me, false);
        for i in 0..5 {
            hub.publish(StreamEvent::for_user(
                me,
                EventType::JobQueued,
                "Queued",
                format!("job {i}"),
                json!({}),
            ));
        }
        assert_eq!(sub.recv().await.unwrap().message, "job 3");
    }
}
