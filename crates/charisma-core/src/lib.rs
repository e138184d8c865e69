//! # charisma-core
//!
//! Core crate for the CharismaAI task service. Contains configuration
//! schemas, shared pagination types, and the unified error system.
//!
//! This crate has **no** internal dependencies on other Charisma crates.

pub mod config;
pub mod error;
pub mod result;
pub mod types;

pub use error::AppError;
pub use result::AppResult;
