//! Database query modules, one per table group

pub mod items;
pub mod orders;
pub mod shops;
pub mod users;

// Re-export commonly used functions for convenience
pub use items::*;
pub use orders::*;
pub use shops::*;
pub use users::*;
