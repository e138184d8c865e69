//! Admin-only handlers.

pub mod background_tasks;
