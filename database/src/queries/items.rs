//! Item (menu) database queries

use std::collections::HashMap;

use mobileorder_core::{Error, Result};
use sqlx::{Executor, Pool, QueryBuilder, Sqlite};
use tracing::instrument;

use crate::models::{CreateItem, Item};

/// List the items a shop sells, ordered by ID
#[instrument(skip(pool))]
pub async fn list_shop_items(pool: &Pool<Sqlite>, shop_id: i64) -> Result<Vec<Item>> {
    sqlx::query_as::<_, Item>(
        r#"
        SELECT i.item_id, i.item_name, i.description, i.price, i.is_available
        FROM items i
        INNER JOIN shop_item si ON i.item_id = si.item_id
        WHERE si.shop_id = ?
        ORDER BY i.item_id
        "#,
    )
    .bind(shop_id)
    .fetch_all(pool)
    .await
    .map_err(|e| Error::GetDataFailed(format!("商品一覧の取得に失敗しました: {}", e)))
}

/// Create a new item and put it on a shop's menu
#[instrument(skip(pool, input))]
pub async fn create_shop_item(pool: &Pool<Sqlite>, shop_id: i64, input: &CreateItem) -> Result<i64> {
    input.validate().map_err(Error::ValidationFailed)?;

    let mut tx = pool
        .begin()
        .await
        .map_err(|e| Error::DatabaseError(format!("Failed to begin transaction: {}", e)))?;

    let item_id = sqlx::query(
        r#"
        INSERT INTO items (item_name, description, price, is_available)
        VALUES (?, ?, ?, ?)
        "#,
    )
    .bind(&input.item_name)
    .bind(&input.description)
    .bind(input.price)
    .bind(input.is_available)
    .execute(&mut *tx)
    .await
    .map_err(|e| Error::InsertDataFailed(format!("Failed to create item: {}", e)))?
    .last_insert_rowid();

    sqlx::query("INSERT INTO shop_item (shop_id, item_id) VALUES (?, ?)")
        .bind(shop_id)
        .bind(item_id)
        .execute(&mut *tx)
        .await
        .map_err(|e| Error::InsertDataFailed(format!("Failed to link item to shop: {}", e)))?;

    tx.commit()
        .await
        .map_err(|e| Error::DatabaseError(format!("Failed to commit transaction: {}", e)))?;

    Ok(item_id)
}

/// Load the requested items, all of which must belong to the shop
///
/// `item_ids` must not contain duplicates. Any ID that is unknown or sold
/// by another shop makes the whole lookup fail with [`Error::BadParam`].
#[instrument(skip(executor))]
pub async fn get_items_for_shop<'e, E>(
    executor: E,
    shop_id: i64,
    item_ids: &[i64],
) -> Result<HashMap<i64, Item>>
where
    E: Executor<'e, Database = Sqlite>,
{
    if item_ids.is_empty() {
        return Ok(HashMap::new());
    }

    let mut builder = QueryBuilder::<Sqlite>::new(
        r#"
        SELECT i.item_id, i.item_name, i.description, i.price, i.is_available
        FROM items i
        INNER JOIN shop_item si ON i.item_id = si.item_id
        WHERE si.shop_id = "#,
    );
    builder.push_bind(shop_id);
    builder.push(" AND i.item_id IN (");
    let mut separated = builder.separated(", ");
    for item_id in item_ids {
        separated.push_bind(*item_id);
    }
    separated.push_unseparated(")");

    let items = builder
        .build_query_as::<Item>()
        .fetch_all(executor)
        .await
        .map_err(|e| Error::GetDataFailed(format!("店舗の所属商品情報の取得に失敗しました: {}", e)))?;

    if items.len() != item_ids.len() {
        return Err(Error::BadParam(
            "リクエストに、存在しないか店舗に属さない商品が含まれています。".to_string(),
        ));
    }

    Ok(items.into_iter().map(|item| (item.item_id, item)).collect())
}

/// Mark an item of the shop as available or sold out
#[instrument(skip(pool))]
pub async fn update_item_availability(
    pool: &Pool<Sqlite>,
    shop_id: i64,
    item_id: i64,
    is_available: bool,
) -> Result<()> {
    let result = sqlx::query(
        r#"
        UPDATE items
        SET is_available = ?, updated_at = CURRENT_TIMESTAMP
        WHERE item_id = ?
          AND item_id IN (SELECT item_id FROM shop_item WHERE shop_id = ?)
        "#,
    )
    .bind(is_available)
    .bind(item_id)
    .bind(shop_id)
    .execute(pool)
    .await
    .map_err(|e| Error::UpdateDataFailed(format!("商品の販売状態更新に失敗しました: {}", e)))?;

    if result.rows_affected() == 0 {
        return Err(Error::NoData("指定された商品が見つかりませんでした。".to_string()));
    }

    Ok(())
}
