//! Long-lived notification subscription feeding the toast queue.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures::StreamExt;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use charisma_core::config::ClientConfig;
use charisma_entity::notification::{EventType, StreamEvent};

use crate::api::EventSource;
use crate::sse::{SseDecoder, SseFrame};
use crate::toast::{ToastKind, ToastQueue};

/// Toast category for a server event, or `None` for events that are not
/// shown.
pub fn toast_for_event(event: &StreamEvent) -> Option<ToastKind> {
    match event.event_type {
        EventType::AnalysisComplete => Some(ToastKind::Success),
        EventType::AnalysisFailed => Some(ToastKind::Error),
        EventType::JobCancelled => Some(ToastKind::Warning),
        EventType::JobQueued | EventType::BulkAction | EventType::System => Some(ToastKind::Info),
        EventType::Connected | EventType::Unknown => None,
    }
}

/// Keeps one event stream open, reconnecting after a fixed delay, and
/// turns events into toasts.
pub struct NotificationFeed {
    source: Arc<dyn EventSource>,
    toasts: ToastQueue,
    events: broadcast::Sender<StreamEvent>,
    reconnect_delay: Duration,
    running: Mutex<Option<CancellationToken>>,
}

impl std::fmt::Debug for NotificationFeed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotificationFeed")
            .field("reconnect_delay", &self.reconnect_delay)
            .field("running", &self.is_running())
            .finish()
    }
}

impl NotificationFeed {
    /// Create a stopped feed.
    pub fn new(source: Arc<dyn EventSource>, toasts: ToastQueue, reconnect_delay: Duration) -> Self {
        let (events, _) = broadcast::channel(64);
        Self {
            source,
            toasts,
            events,
            reconnect_delay,
            running: Mutex::new(None),
        }
    }

    /// Create a stopped feed from the client configuration section.
    pub fn from_config(source: Arc<dyn EventSource>, config: &ClientConfig) -> Self {
        Self::new(source, ToastQueue::from_config(config), config.reconnect_delay())
    }

    /// The toast queue this feed writes to.
    pub fn toasts(&self) -> &ToastQueue {
        &self.toasts
    }

    /// Every decoded event, including ones without a toast.
    pub fn subscribe(&self) -> broadcast::Receiver<StreamEvent> {
        self.events.subscribe()
    }

    /// Check whether the subscription task is running.
    pub fn is_running(&self) -> bool {
        self.lock_running()
            .as_ref()
            .is_some_and(|token| !token.is_cancelled())
    }

    fn lock_running(&self) -> std::sync::MutexGuard<'_, Option<CancellationToken>> {
        self.running.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Start the subscription. Returns `false` if it was already running.
    pub fn start(&self) -> bool {
        let mut running = self.lock_running();
        if running.as_ref().is_some_and(|token| !token.is_cancelled()) {
            return false;
        }

        let token = CancellationToken::new();
        *running = Some(token.clone());
        tokio::spawn(run_feed(
            Arc::clone(&self.source),
            self.toasts.clone(),
            self.events.clone(),
            self.reconnect_delay,
            token,
        ));
        true
    }

    /// Stop the subscription.
    pub fn stop(&self) {
        if let Some(token) = self.lock_running().take() {
            token.cancel();
        }
    }
}

impl Drop for NotificationFeed {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn run_feed(
    source: Arc<dyn EventSource>,
    toasts: ToastQueue,
    events: broadcast::Sender<StreamEvent>,
    reconnect_delay: Duration,
    token: CancellationToken,
) {
    loop {
        let connected = tokio::select! {
            _ = token.cancelled() => return,
            result = source.connect() => result,
        };

        match connected {
            Ok(mut stream) => {
                info!("Notification stream connected");
                let mut decoder = SseDecoder::new();
                loop {
                    let next = tokio::select! {
                        _ = token.cancelled() => return,
                        next = stream.next() => next,
                    };
                    match next {
                        Some(Ok(chunk)) => {
                            for frame in decoder.push(&chunk) {
                                deliver(&frame, &toasts, &events);
                            }
                        }
                        Some(Err(e)) => {
                            warn!(error = %e, "Notification stream failed");
                            break;
                        }
                        None => {
                            info!("Notification stream closed by server");
                            break;
                        }
                    }
                }
            }
            Err(e) => warn!(error = %e, "Failed to open notification stream"),
        }

        debug!(delay_ms = reconnect_delay.as_millis() as u64, "Reconnecting notification stream");
        tokio::select! {
            _ = token.cancelled() => return,
            _ = tokio::time::sleep(reconnect_delay) => {}
        }
    }
}

fn deliver(frame: &SseFrame, toasts: &ToastQueue, events: &broadcast::Sender<StreamEvent>) {
    let event: StreamEvent = match serde_json::from_str(&frame.data) {
        Ok(event) => event,
        Err(e) => {
            debug!(error = %e, "Skipping undecodable notification");
            return;
        }
    };
    if let Some(kind) = toast_for_event(&event) {
        toasts.push(kind, event.title.clone(), event.message.clone());
    }
    let _ = events.send(event);
}
