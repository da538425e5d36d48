use mobileorder_core::Role;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// User model - customers and shop admins
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct User {
    pub user_id: i64,
    pub email: String,
    pub role: Role,
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}
