//! Kitchen workflow for shop admins

use mobileorder_core::{Error, OrderStatus, Result};
use mobileorder_database::{
    queries::{
        delete_order_by_id_and_shop, find_items_by_order_ids, find_order_by_id_and_shop,
        find_shop_orders_by_statuses, update_item_availability, update_order_status,
    },
    AdminOrderRow, ItemDetail,
};
use serde::Serialize;
use tracing::{info, instrument};

use crate::{auth::AdminUser, state::AppState};

/// An order as listed on the kitchen screen
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AdminOrder {
    #[serde(flatten)]
    pub order: AdminOrderRow,
    pub items: Vec<ItemDetail>,
}

/// Cooking and completed orders of a shop
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShopOrders {
    pub cooking: Vec<AdminOrder>,
    pub completed: Vec<AdminOrder>,
}

/// The shop's orders in one status, oldest first
#[instrument(skip(state))]
pub async fn list_orders(
    state: &AppState,
    admin: AdminUser,
    shop_id: i64,
    status: OrderStatus,
) -> Result<Vec<AdminOrder>> {
    admin.authorize_shop(shop_id)?;

    let rows = find_shop_orders_by_statuses(&state.pool, shop_id, &[status]).await?;
    let order_ids: Vec<i64> = rows.iter().map(|r| r.order_id).collect();
    let mut items = find_items_by_order_ids(&state.pool, &order_ids).await?;

    Ok(rows
        .into_iter()
        .map(|order| AdminOrder {
            items: items.remove(&order.order_id).unwrap_or_default(),
            order,
        })
        .collect())
}

/// Cooking and completed lists in one call
#[instrument(skip(state))]
pub async fn list_active_orders(state: &AppState, admin: AdminUser, shop_id: i64) -> Result<ShopOrders> {
    let cooking = list_orders(state, admin, shop_id, OrderStatus::Cooking).await?;
    let completed = list_orders(state, admin, shop_id, OrderStatus::Completed).await?;
    Ok(ShopOrders { cooking, completed })
}

/// Move an order of the admin's shop to its next status
#[instrument(skip(state))]
pub async fn advance_order_status(
    state: &AppState,
    admin: AdminUser,
    order_id: i64,
) -> Result<OrderStatus> {
    let mut tx = state
        .pool
        .begin()
        .await
        .map_err(|e| Error::DatabaseError(format!("Failed to begin transaction: {}", e)))?;

    let order = find_order_by_id_and_shop(&mut *tx, order_id, admin.shop_id).await?;
    let next = order.status.next().ok_or_else(|| {
        Error::Conflict("この注文は既に受け渡し済みです。".to_string())
    })?;
    update_order_status(&mut *tx, order_id, next).await?;

    tx.commit()
        .await
        .map_err(|e| Error::DatabaseError(format!("Failed to commit transaction: {}", e)))?;

    info!(order_id, admin_id = admin.user_id, from = %order.status, to = %next, "Order status advanced");
    Ok(next)
}

/// Delete an order of the admin's shop
#[instrument(skip(state))]
pub async fn delete_order(state: &AppState, admin: AdminUser, order_id: i64) -> Result<()> {
    delete_order_by_id_and_shop(&state.pool, order_id, admin.shop_id).await?;
    info!(order_id, shop_id = admin.shop_id, admin_id = admin.user_id, "Order deleted");
    Ok(())
}

/// Mark an item of the admin's shop as available or sold out
#[instrument(skip(state))]
pub async fn set_item_availability(
    state: &AppState,
    admin: AdminUser,
    item_id: i64,
    is_available: bool,
) -> Result<()> {
    update_item_availability(&state.pool, admin.shop_id, item_id, is_available).await?;
    info!(item_id, is_available, admin_id = admin.user_id, "Item availability updated");
    Ok(())
}
