//! Request and response shapes.

pub mod request;
pub mod response;
