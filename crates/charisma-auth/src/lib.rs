//! # charisma-auth
//!
//! Session token handling for the CharismaAI task service.
//!
//! Sessions are issued elsewhere; this crate only validates the HS256 tokens
//! they produce and can mint tokens for operators and tests.

pub mod jwt;

pub use jwt::{Claims, JwtDecoder, JwtEncoder};
