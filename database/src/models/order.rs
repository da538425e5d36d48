use chrono::{DateTime, Utc};
use mobileorder_core::OrderStatus;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Order model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Order {
    pub order_id: i64,
    /// `None` for guest orders that have not been claimed yet
    pub user_id: Option<i64>,
    pub shop_id: i64,
    pub order_date: DateTime<Utc>,
    pub total_amount: f64,
    pub status: OrderStatus,
    pub guest_order_token: Option<String>,
}

/// Input for inserting an order
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub user_id: Option<i64>,
    pub shop_id: i64,
    pub order_date: DateTime<Utc>,
    pub total_amount: f64,
    pub guest_order_token: Option<String>,
}

/// One line of an order, priced at the time of ordering
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct OrderLine {
    pub item_id: i64,
    pub quantity: i64,
    pub price_at_order: f64,
}

/// Item name and quantity shown on order lists
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemDetail {
    pub item_name: String,
    pub quantity: i64,
}

/// A customer's order joined with its shop and queue position
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct OrderWithDetails {
    pub order_id: i64,
    pub shop_name: String,
    pub location: Option<String>,
    pub order_date: DateTime<Utc>,
    pub total_amount: f64,
    pub status: OrderStatus,
    pub waiting_count: i64,
}

/// An order as the shop admin sees it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct AdminOrderRow {
    pub order_id: i64,
    /// `None` for guest orders
    pub customer_email: Option<String>,
    pub order_date: DateTime<Utc>,
    pub total_amount: f64,
    pub status: OrderStatus,
}
