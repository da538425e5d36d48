//! Business logic shared by the HTTP handlers
//!
//! Services take the application state and return core errors; handlers
//! only translate requests and responses.

pub mod admin;
pub mod auth;
pub mod orders;
