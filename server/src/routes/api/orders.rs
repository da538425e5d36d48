//! Customer order endpoints

use axum::{extract::State, response::IntoResponse, routing::get, Json, Router};
use tracing::instrument;

use super::{ApiPath, ApiResult};
use crate::{auth::AuthUser, services::orders, state::AppState};

/// Create orders router
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/orders", get(list_orders))
        .route("/orders/{order_id}/status", get(order_status))
}

/// The caller's active orders
#[instrument(skip(state, user))]
async fn list_orders(State(state): State<AppState>, user: AuthUser) -> ApiResult<impl IntoResponse> {
    let orders = orders::list_user_orders(&state, user.user_id()).await?;
    Ok(Json(orders))
}

/// Status and waiting count of one order
#[instrument(skip(state, user))]
async fn order_status(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath(order_id): ApiPath<i64>,
) -> ApiResult<impl IntoResponse> {
    let status = orders::order_status(&state, user.user_id(), order_id).await?;
    Ok(Json(status))
}
