//! # charisma-realtime
//!
//! In-process fan-out of [`StreamEvent`](charisma_entity::notification::StreamEvent)s
//! to open notification streams. A single-node deployment is assumed; every
//! subscriber sees every event and filters by audience.

pub mod hub;
pub mod subscription;

pub use hub::NotificationHub;
pub use subscription::EventSubscription;
