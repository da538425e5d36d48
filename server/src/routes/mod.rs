//! HTTP routes
//!
//! JSON endpoints live under [`api`], server-rendered pages under [`ui`].

pub mod api;
pub mod ui;
