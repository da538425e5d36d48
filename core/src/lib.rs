//! Core library for the mobile order service
//!
//! This crate defines the error taxonomy and the shared domain types
//! used across all workspace crates.

pub mod error;
pub mod types;

// Re-exports
pub use error::{ErrCode, Error, Result};
pub use types::{OrderStatus, Role};
