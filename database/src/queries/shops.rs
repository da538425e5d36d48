//! Shop database queries

use mobileorder_core::{Error, Result};
use sqlx::{Pool, Sqlite};
use tracing::instrument;

use crate::models::{CreateShop, Shop};

/// Get shop by ID
#[instrument(skip(pool))]
pub async fn get_shop(pool: &Pool<Sqlite>, shop_id: i64) -> Result<Shop> {
    sqlx::query_as::<_, Shop>("SELECT shop_id, name, location FROM shops WHERE shop_id = ?")
        .bind(shop_id)
        .fetch_optional(pool)
        .await
        .map_err(|e| Error::GetDataFailed(format!("Failed to get shop: {}", e)))?
        .ok_or_else(|| Error::NoData("店舗が見つかりませんでした。".to_string()))
}

/// Create a new shop
#[instrument(skip(pool, input))]
pub async fn create_shop(pool: &Pool<Sqlite>, input: &CreateShop) -> Result<i64> {
    input.validate().map_err(Error::ValidationFailed)?;

    let result = sqlx::query("INSERT INTO shops (name, location) VALUES (?, ?)")
        .bind(&input.name)
        .bind(&input.location)
        .execute(pool)
        .await
        .map_err(|e| Error::InsertDataFailed(format!("Failed to create shop: {}", e)))?;

    Ok(result.last_insert_rowid())
}

/// Assign a user to a shop's staff
#[instrument(skip(pool))]
pub async fn add_shop_staff(pool: &Pool<Sqlite>, shop_id: i64, user_id: i64) -> Result<()> {
    sqlx::query("INSERT OR IGNORE INTO shop_staff (shop_id, user_id) VALUES (?, ?)")
        .bind(shop_id)
        .bind(user_id)
        .execute(pool)
        .await
        .map_err(|e| Error::InsertDataFailed(format!("Failed to add shop staff: {}", e)))?;

    Ok(())
}

/// Resolve the single shop an admin operates
///
/// An admin with no shop gets [`Error::NoData`]; an admin linked to several
/// shops indicates inconsistent data.
#[instrument(skip(pool))]
pub async fn find_shop_id_by_admin(pool: &Pool<Sqlite>, user_id: i64) -> Result<i64> {
    let shop_ids: Vec<i64> = sqlx::query_scalar(
        r#"
        SELECT s.shop_id
        FROM shops s
        INNER JOIN shop_staff ss ON s.shop_id = ss.shop_id
        WHERE ss.user_id = ?
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
    .map_err(|e| Error::GetDataFailed(format!("Failed to get admin shop: {}", e)))?;

    match shop_ids.as_slice() {
        [] => Err(Error::NoData(
            "管理者アカウントに紐づく店舗が見つかりませんでした。".to_string(),
        )),
        [shop_id] => Ok(*shop_id),
        _ => Err(Error::Other(format!(
            "data inconsistency: user_id {} is associated with multiple shops",
            user_id
        ))),
    }
}
