//! Core type definitions used across the Charisma workspace.

pub mod pagination;

pub use pagination::{OffsetRequest, PaginationInfo};
