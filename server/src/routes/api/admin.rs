//! Admin endpoints for the shop kitchen

use axum::{extract::State, response::IntoResponse, routing::{delete, get, patch}, Json, Router};
use mobileorder_core::OrderStatus;
use serde_json::json;
use tracing::instrument;

use super::{ApiJson, ApiPath, ApiResult};
use crate::{
    auth::AdminUser, services::admin, state::AppState, validation::UpdateAvailabilityRequest,
};

/// Create admin router
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/shops/{shop_id}/orders", get(list_active_orders))
        .route("/shops/{shop_id}/orders/cooking", get(list_cooking_orders))
        .route("/shops/{shop_id}/orders/completed", get(list_completed_orders))
        .route("/orders/{order_id}/status", patch(advance_order_status))
        .route("/orders/{order_id}", delete(delete_order))
        .route("/products/{product_id}/availability", patch(update_availability))
}

#[instrument(skip(state))]
async fn list_active_orders(
    State(state): State<AppState>,
    admin: AdminUser,
    ApiPath(shop_id): ApiPath<i64>,
) -> ApiResult<impl IntoResponse> {
    let orders = admin::list_active_orders(&state, admin, shop_id).await?;
    Ok(Json(orders))
}

#[instrument(skip(state))]
async fn list_cooking_orders(
    State(state): State<AppState>,
    admin: AdminUser,
    ApiPath(shop_id): ApiPath<i64>,
) -> ApiResult<impl IntoResponse> {
    let orders = admin::list_orders(&state, admin, shop_id, OrderStatus::Cooking).await?;
    Ok(Json(orders))
}

#[instrument(skip(state))]
async fn list_completed_orders(
    State(state): State<AppState>,
    admin: AdminUser,
    ApiPath(shop_id): ApiPath<i64>,
) -> ApiResult<impl IntoResponse> {
    let orders = admin::list_orders(&state, admin, shop_id, OrderStatus::Completed).await?;
    Ok(Json(orders))
}

/// Advance an order one step
#[instrument(skip(state))]
async fn advance_order_status(
    State(state): State<AppState>,
    admin: AdminUser,
    ApiPath(order_id): ApiPath<i64>,
) -> ApiResult<impl IntoResponse> {
    let status = admin::advance_order_status(&state, admin, order_id).await?;
    Ok(Json(json!({
        "message": "注文ステータスを更新しました。",
        "status": status,
    })))
}

#[instrument(skip(state))]
async fn delete_order(
    State(state): State<AppState>,
    admin: AdminUser,
    ApiPath(order_id): ApiPath<i64>,
) -> ApiResult<impl IntoResponse> {
    admin::delete_order(&state, admin, order_id).await?;
    Ok(Json(json!({ "message": "注文を削除しました。" })))
}

/// Mark a product available or sold out
#[instrument(skip(state, req))]
async fn update_availability(
    State(state): State<AppState>,
    admin: AdminUser,
    ApiPath(product_id): ApiPath<i64>,
    ApiJson(req): ApiJson<UpdateAvailabilityRequest>,
) -> ApiResult<impl IntoResponse> {
    admin::set_item_availability(&state, admin, product_id, req.is_available).await?;
    Ok(Json(json!({ "message": "商品の販売状態を更新しました。" })))
}
