//! Server-sent notification stream.

use std::convert::Infallible;
use std::time::Duration;

use axum::extract::State;
use axum::response::sse::{Event, KeepAlive, Sse};
use futures::{Stream, StreamExt, stream};
use tracing::{info, warn};

use charisma_entity::notification::StreamEvent;

use crate::extractors::AuthUser;
use crate::state::AppState;

/// GET /api/notifications/stream
///
/// Opens with a `connected` event, then relays every hub event visible to
/// the caller.
pub async fn stream(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let subscription = state.hub.subscribe(auth.user_id, auth.is_admin());
    info!(user_id = %auth.user_id, "Notification stream opened");

    let greeting = StreamEvent::connected(auth.user_id);
    let events = stream::once(async move { greeting })
        .chain(subscription.into_stream())
        .map(|event| Ok(to_sse_event(&event)));

    let keep_alive = Duration::from_secs(state.config.realtime.keep_alive_seconds.max(1));
    Sse::new(events).keep_alive(KeepAlive::new().interval(keep_alive))
}

/// Encode a hub event as one SSE frame.
pub fn to_sse_event(event: &StreamEvent) -> Event {
    let frame = Event::default()
        .event(event.event_type.as_str())
        .id(event.id.to_string());
    match frame.json_data(event) {
        Ok(frame) => frame,
        Err(e) => {
            warn!(error = %e, event_id = %event.id, "Failed to encode notification");
            Event::default().comment("encoding error")
        }
    }
}
