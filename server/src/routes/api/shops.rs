//! Shop catalogue and ordering endpoints

use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::{get, post}, Json, Router};
use mobileorder_database::queries;
use serde_json::json;
use tracing::instrument;

use super::{ApiJson, ApiPath, ApiResult};
use crate::{auth::AuthUser, services::orders, state::AppState, validation::CreateOrderRequest};

const GUEST_ORDER_MESSAGE: &str =
    "Order created successfully as a guest. Please sign up to claim this order.";

/// Create shops router
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/shops/{shop_id}/products", get(list_products))
        .route("/shops/{shop_id}/guest-orders", post(create_guest_order))
        .route("/shops/{shop_id}/orders", post(create_order))
}

/// Items sold by a shop
#[instrument(skip(state))]
async fn list_products(
    State(state): State<AppState>,
    ApiPath(shop_id): ApiPath<i64>,
) -> ApiResult<impl IntoResponse> {
    let items = queries::list_shop_items(&state.pool, shop_id).await?;
    Ok(Json(items))
}

/// Order without an account
#[instrument(skip(state, req))]
async fn create_guest_order(
    State(state): State<AppState>,
    ApiPath(shop_id): ApiPath<i64>,
    ApiJson(req): ApiJson<CreateOrderRequest>,
) -> ApiResult<impl IntoResponse> {
    let placed = orders::place_order(&state, shop_id, None, &req).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "order_id": placed.order_id,
            "guest_order_token": placed.guest_order_token,
            "message": GUEST_ORDER_MESSAGE,
        })),
    ))
}

/// Order as the authenticated user
#[instrument(skip(state, user, req))]
async fn create_order(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath(shop_id): ApiPath<i64>,
    ApiJson(req): ApiJson<CreateOrderRequest>,
) -> ApiResult<impl IntoResponse> {
    let placed = orders::place_order(&state, shop_id, Some(user.user_id()), &req).await?;
    Ok((StatusCode::CREATED, Json(json!({ "order_id": placed.order_id }))))
}
