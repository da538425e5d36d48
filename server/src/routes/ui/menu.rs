//! Menu pages

use askama::Template;
use axum::{extract::{Path, State}, response::Html, routing::get, Router};
use mobileorder_database::queries;
use tracing::instrument;

use super::AppError;
use crate::{
    state::AppState,
    templates::{MenuTemplate, ShopMenuTemplate},
};

/// Create menu router
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(home_page))
        .route("/shops/{shop_id}/menu", get(shop_menu_page))
}

/// Landing page
async fn home_page() -> Result<Html<String>, AppError> {
    let template = MenuTemplate::home();
    Ok(Html(template.render()?))
}

/// Menu of a single shop
#[instrument(skip(state))]
async fn shop_menu_page(
    State(state): State<AppState>,
    Path(shop_id): Path<i64>,
) -> Result<Html<String>, AppError> {
    let shop = queries::get_shop(&state.pool, shop_id).await?;
    let items = queries::list_shop_items(&state.pool, shop_id).await?;

    let template = ShopMenuTemplate::new(shop, &items);
    Ok(Html(template.render()?))
}
