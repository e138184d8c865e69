//! Route handlers organized by domain.

pub mod admin;
pub mod background;
pub mod health;
pub mod notification;
