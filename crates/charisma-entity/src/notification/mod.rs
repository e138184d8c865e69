//! Server-push notification events.

pub mod event;

pub use event::{Audience, EventType, StreamEvent};
