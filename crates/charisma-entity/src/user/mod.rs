//! User-related value objects.

pub mod role;

pub use role::UserRole;
