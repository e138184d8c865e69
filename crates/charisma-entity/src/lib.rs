//! # charisma-entity
//!
//! Domain entity models for the CharismaAI task service. Every struct in
//! this crate represents a database table row or a domain value object.
//! Database entities additionally derive `sqlx::FromRow`.

pub mod audit;
pub mod error_log;
pub mod job;
pub mod notification;
pub mod user;
