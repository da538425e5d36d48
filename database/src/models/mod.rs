// Database models

pub mod item;
pub mod order;
pub mod shop;
pub mod user;

pub use item::*;
pub use order::*;
pub use shop::*;
pub use user::*;
