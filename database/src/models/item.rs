use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Item model - a product on a shop's menu
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Item {
    pub item_id: i64,
    pub item_name: String,
    pub description: Option<String>,
    pub price: f64,
    pub is_available: bool,
}

impl Item {
    /// Price formatted for display, e.g. `¥500`
    pub fn price_label(&self) -> String {
        if self.price.fract() == 0.0 {
            format!("¥{:.0}", self.price)
        } else {
            format!("¥{:.2}", self.price)
        }
    }
}

/// Input for creating a new item
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateItem {
    pub item_name: String,
    pub description: Option<String>,
    pub price: f64,
    #[serde(default = "default_available")]
    pub is_available: bool,
}

fn default_available() -> bool {
    true
}

impl CreateItem {
    /// Validate the item input
    pub fn validate(&self) -> Result<(), String> {
        if self.item_name.trim().is_empty() {
            return Err("Item name cannot be empty".to_string());
        }
        if !self.price.is_finite() || self.price < 0.0 {
            return Err(format!("Invalid price: {}", self.price));
        }
        Ok(())
    }
}
