//! # charisma-api
//!
//! HTTP API layer for the CharismaAI background task service built on Axum.
//!
//! Provides the admin task endpoints, the per-user analysis job endpoints,
//! the server-sent notification stream, middleware (CORS, logging, RBAC),
//! extractors, DTOs, and error mapping.

pub mod app;
pub mod dto;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod state;

pub use app::{build_app, build_state, run_server};
pub use error::ApiError;
pub use state::AppState;
