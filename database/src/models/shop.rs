use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Shop model - a stall that sells items and receives orders
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Shop {
    pub shop_id: i64,
    pub name: String,
    pub location: Option<String>,
}

/// Input for creating a new shop
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateShop {
    pub name: String,
    pub location: Option<String>,
}

impl CreateShop {
    /// Validate the shop input
    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("Shop name cannot be empty".to_string());
        }
        Ok(())
    }
}
