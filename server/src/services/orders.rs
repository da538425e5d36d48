//! Customer ordering

use std::collections::BTreeMap;

use chrono::Utc;
use mobileorder_core::{Error, OrderStatus, Result};
use mobileorder_database::{
    queries::{
        count_waiting_orders, create_order, find_active_user_orders, find_items_by_order_ids,
        find_order_by_id_and_user, get_items_for_shop,
    },
    ItemDetail, NewOrder, OrderLine, OrderWithDetails,
};
use serde::Serialize;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::{state::AppState, validation::CreateOrderRequest};

/// A stored order
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlacedOrder {
    pub order_id: i64,
    pub total_amount: f64,
    /// Set for guest orders only
    pub guest_order_token: Option<String>,
}

/// An active order with its lines
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserOrder {
    #[serde(flatten)]
    pub order: OrderWithDetails,
    pub items: Vec<ItemDetail>,
}

/// Queue position of a single order
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderStatusView {
    pub order_id: i64,
    pub status: OrderStatus,
    pub waiting_count: i64,
}

/// Merge repeated item IDs by summing their quantities
fn merge_quantities(req: &CreateOrderRequest) -> Result<BTreeMap<i64, i64>> {
    let mut quantities = BTreeMap::new();
    for line in &req.items {
        let quantity: &mut i64 = quantities.entry(line.item_id).or_default();
        *quantity = quantity.checked_add(line.quantity).ok_or_else(|| {
            Error::ValidationFailed(format!("数量が大きすぎます: item_id {}", line.item_id))
        })?;
    }
    Ok(quantities)
}

/// Place an order at a shop
///
/// Without `user_id` the order is a guest order and receives a fresh guest
/// token. Prices are taken from the current menu.
#[instrument(skip(state, req), fields(lines = req.items.len()))]
pub async fn place_order(
    state: &AppState,
    shop_id: i64,
    user_id: Option<i64>,
    req: &CreateOrderRequest,
) -> Result<PlacedOrder> {
    req.validate()?;
    let quantities = merge_quantities(req)?;
    let item_ids: Vec<i64> = quantities.keys().copied().collect();

    let mut tx = state
        .pool
        .begin()
        .await
        .map_err(|e| Error::DatabaseError(format!("Failed to begin transaction: {}", e)))?;

    let items = get_items_for_shop(&mut *tx, shop_id, &item_ids).await?;

    let mut lines = Vec::with_capacity(quantities.len());
    let mut total_amount = 0.0;
    for (item_id, quantity) in quantities {
        let item = items.get(&item_id).ok_or_else(|| {
            Error::BadParam(format!("商品が見つかりません: item_id {}", item_id))
        })?;
        if !item.is_available {
            return Err(Error::Conflict(format!(
                "「{}」は現在販売しておりません。",
                item.item_name
            )));
        }
        total_amount += item.price * quantity as f64;
        lines.push(OrderLine {
            item_id,
            quantity,
            price_at_order: item.price,
        });
    }

    let guest_order_token = user_id.is_none().then(|| Uuid::new_v4().to_string());
    let order = NewOrder {
        user_id,
        shop_id,
        order_date: Utc::now(),
        total_amount,
        guest_order_token: guest_order_token.clone(),
    };

    let order_id = create_order(&mut tx, &order, &lines).await?;

    tx.commit()
        .await
        .map_err(|e| Error::DatabaseError(format!("Failed to commit transaction: {}", e)))?;

    info!(order_id, shop_id, total_amount, guest = user_id.is_none(), "Order placed");

    Ok(PlacedOrder {
        order_id,
        total_amount,
        guest_order_token,
    })
}

/// The caller's cooking and completed orders, newest first
#[instrument(skip(state))]
pub async fn list_user_orders(state: &AppState, user_id: i64) -> Result<Vec<UserOrder>> {
    let orders = find_active_user_orders(&state.pool, user_id).await?;
    let order_ids: Vec<i64> = orders.iter().map(|o| o.order_id).collect();
    let mut items = find_items_by_order_ids(&state.pool, &order_ids).await?;

    Ok(orders
        .into_iter()
        .map(|order| UserOrder {
            items: items.remove(&order.order_id).unwrap_or_default(),
            order,
        })
        .collect())
}

/// Status and waiting count of one of the caller's orders
#[instrument(skip(state))]
pub async fn order_status(state: &AppState, user_id: i64, order_id: i64) -> Result<OrderStatusView> {
    let order = find_order_by_id_and_user(&state.pool, order_id, user_id).await?;

    let waiting_count = if order.status == OrderStatus::Cooking {
        count_waiting_orders(&state.pool, order.shop_id, order.order_date).await?
    } else {
        0
    };

    Ok(OrderStatusView {
        order_id: order.order_id,
        status: order.status,
        waiting_count,
    })
}
