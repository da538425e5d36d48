//! Order database queries

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use mobileorder_core::{Error, OrderStatus, Result};
use sqlx::{Executor, Pool, QueryBuilder, Sqlite, SqliteConnection};
use tracing::instrument;

use crate::{
    is_unique_violation,
    models::{AdminOrderRow, ItemDetail, NewOrder, Order, OrderLine, OrderWithDetails},
};

const ORDER_COLUMNS: &str =
    "order_id, user_id, shop_id, order_date, total_amount, status, guest_order_token";

/// Insert an order together with its lines and return the new order ID
///
/// Run this on a transaction so a failing line leaves no half-written order.
#[instrument(skip(conn, order, lines), fields(shop_id = order.shop_id, lines = lines.len()))]
pub async fn create_order(
    conn: &mut SqliteConnection,
    order: &NewOrder,
    lines: &[OrderLine],
) -> Result<i64> {
    let order_id = sqlx::query(
        r#"
        INSERT INTO orders (user_id, shop_id, order_date, total_amount, status, guest_order_token)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(order.user_id)
    .bind(order.shop_id)
    .bind(order.order_date)
    .bind(order.total_amount)
    .bind(OrderStatus::Cooking)
    .bind(&order.guest_order_token)
    .execute(&mut *conn)
    .await
    .map_err(|e| {
        if is_unique_violation(&e) {
            Error::Conflict("ゲスト注文トークンが重複しています。".to_string())
        } else {
            Error::InsertDataFailed(format!("注文の作成に失敗しました: {}", e))
        }
    })?
    .last_insert_rowid();

    for line in lines {
        sqlx::query(
            r#"
            INSERT INTO order_item (order_id, item_id, quantity, price_at_order)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(order_id)
        .bind(line.item_id)
        .bind(line.quantity)
        .bind(line.price_at_order)
        .execute(&mut *conn)
        .await
        .map_err(|e| Error::InsertDataFailed(format!("注文商品の作成に失敗しました: {}", e)))?;
    }

    Ok(order_id)
}

/// Attach an unclaimed guest order to a user
#[instrument(skip(executor, token))]
pub async fn claim_guest_order<'e, E>(executor: E, token: &str, user_id: i64) -> Result<()>
where
    E: Executor<'e, Database = Sqlite>,
{
    let result = sqlx::query(
        r#"
        UPDATE orders
        SET user_id = ?, updated_at = CURRENT_TIMESTAMP
        WHERE guest_order_token = ? AND user_id IS NULL
        "#,
    )
    .bind(user_id)
    .bind(token)
    .execute(executor)
    .await
    .map_err(|e| Error::UpdateDataFailed(format!("ゲスト注文の紐付けに失敗しました: {}", e)))?;

    if result.rows_affected() == 0 {
        return Err(Error::NoData(
            "指定されたゲスト注文が見つからないか、既に紐付け済みです。".to_string(),
        ));
    }

    Ok(())
}

/// A user's cooking and completed orders, newest first
///
/// `waiting_count` is the number of cooking orders of the same shop placed
/// strictly earlier; it is 0 for orders that are no longer cooking.
#[instrument(skip(pool))]
pub async fn find_active_user_orders(
    pool: &Pool<Sqlite>,
    user_id: i64,
) -> Result<Vec<OrderWithDetails>> {
    sqlx::query_as::<_, OrderWithDetails>(
        r#"
        SELECT
            o.order_id,
            s.name AS shop_name,
            s.location,
            o.order_date,
            o.total_amount,
            o.status,
            CASE WHEN o.status = 'cooking' THEN (
                SELECT COUNT(*)
                FROM orders w
                WHERE w.shop_id = o.shop_id
                  AND w.status = 'cooking'
                  AND w.order_date < o.order_date
            ) ELSE 0 END AS waiting_count
        FROM orders o
        INNER JOIN shops s ON o.shop_id = s.shop_id
        WHERE o.user_id = ?
          AND o.status IN ('cooking', 'completed')
        ORDER BY o.order_date DESC, o.order_id DESC
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
    .map_err(|e| Error::GetDataFailed(format!("注文履歴の取得に失敗しました: {}", e)))
}

/// Item names and quantities of the given orders, keyed by order ID
///
/// Orders without lines are absent from the map.
#[instrument(skip(pool, order_ids), fields(orders = order_ids.len()))]
pub async fn find_items_by_order_ids(
    pool: &Pool<Sqlite>,
    order_ids: &[i64],
) -> Result<HashMap<i64, Vec<ItemDetail>>> {
    let mut details: HashMap<i64, Vec<ItemDetail>> = HashMap::new();
    if order_ids.is_empty() {
        return Ok(details);
    }

    let mut builder = QueryBuilder::<Sqlite>::new(
        r#"
        SELECT oi.order_id, i.item_name, oi.quantity
        FROM order_item oi
        INNER JOIN items i ON oi.item_id = i.item_id
        WHERE oi.order_id IN ("#,
    );
    let mut separated = builder.separated(", ");
    for order_id in order_ids {
        separated.push_bind(*order_id);
    }
    separated.push_unseparated(") ORDER BY oi.order_id, oi.item_id");

    let rows: Vec<(i64, String, i64)> = builder
        .build_query_as()
        .fetch_all(pool)
        .await
        .map_err(|e| Error::GetDataFailed(format!("注文商品の取得に失敗しました: {}", e)))?;

    for (order_id, item_name, quantity) in rows {
        details
            .entry(order_id)
            .or_default()
            .push(ItemDetail { item_name, quantity });
    }

    Ok(details)
}

/// Get an order owned by the given user
#[instrument(skip(pool))]
pub async fn find_order_by_id_and_user(
    pool: &Pool<Sqlite>,
    order_id: i64,
    user_id: i64,
) -> Result<Order> {
    sqlx::query_as::<_, Order>(&format!(
        "SELECT {} FROM orders WHERE order_id = ? AND user_id = ?",
        ORDER_COLUMNS
    ))
    .bind(order_id)
    .bind(user_id)
    .fetch_optional(pool)
    .await
    .map_err(|e| Error::GetDataFailed(format!("注文の取得に失敗しました: {}", e)))?
    .ok_or_else(|| Error::NoData("注文が見つかりませんでした。".to_string()))
}

/// Number of cooking orders of a shop placed before `order_date`
#[instrument(skip(pool))]
pub async fn count_waiting_orders(
    pool: &Pool<Sqlite>,
    shop_id: i64,
    order_date: DateTime<Utc>,
) -> Result<i64> {
    sqlx::query_scalar(
        r#"
        SELECT COUNT(*)
        FROM orders
        WHERE shop_id = ? AND status = 'cooking' AND order_date < ?
        "#,
    )
    .bind(shop_id)
    .bind(order_date)
    .fetch_one(pool)
    .await
    .map_err(|e| Error::GetDataFailed(format!("待ち人数の取得に失敗しました: {}", e)))
}

/// A shop's orders in the given statuses, oldest first
#[instrument(skip(pool))]
pub async fn find_shop_orders_by_statuses(
    pool: &Pool<Sqlite>,
    shop_id: i64,
    statuses: &[OrderStatus],
) -> Result<Vec<AdminOrderRow>> {
    if statuses.is_empty() {
        return Ok(Vec::new());
    }

    let mut builder = QueryBuilder::<Sqlite>::new(
        r#"
        SELECT o.order_id, u.email AS customer_email, o.order_date, o.total_amount, o.status
        FROM orders o
        LEFT JOIN users u ON o.user_id = u.user_id
        WHERE o.shop_id = "#,
    );
    builder.push_bind(shop_id);
    builder.push(" AND o.status IN (");
    let mut separated = builder.separated(", ");
    for status in statuses {
        separated.push_bind(*status);
    }
    separated.push_unseparated(") ORDER BY o.order_date ASC, o.order_id ASC");

    builder
        .build_query_as::<AdminOrderRow>()
        .fetch_all(pool)
        .await
        .map_err(|e| Error::GetDataFailed(format!("店舗の注文一覧の取得に失敗しました: {}", e)))
}

/// Get an order placed at the given shop
#[instrument(skip(executor))]
pub async fn find_order_by_id_and_shop<'e, E>(
    executor: E,
    order_id: i64,
    shop_id: i64,
) -> Result<Order>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query_as::<_, Order>(&format!(
        "SELECT {} FROM orders WHERE order_id = ? AND shop_id = ?",
        ORDER_COLUMNS
    ))
    .bind(order_id)
    .bind(shop_id)
    .fetch_optional(executor)
    .await
    .map_err(|e| Error::GetDataFailed(format!("注文の取得に失敗しました: {}", e)))?
    .ok_or_else(|| Error::NoData("注文が見つかりませんでした。".to_string()))
}

/// Set the status of an order
#[instrument(skip(executor))]
pub async fn update_order_status<'e, E>(executor: E, order_id: i64, status: OrderStatus) -> Result<()>
where
    E: Executor<'e, Database = Sqlite>,
{
    let result = sqlx::query(
        "UPDATE orders SET status = ?, updated_at = CURRENT_TIMESTAMP WHERE order_id = ?",
    )
    .bind(status)
    .bind(order_id)
    .execute(executor)
    .await
    .map_err(|e| Error::UpdateDataFailed(format!("注文ステータスの更新に失敗しました: {}", e)))?;

    if result.rows_affected() == 0 {
        return Err(Error::NoData("注文が見つかりませんでした。".to_string()));
    }

    Ok(())
}

/// Delete an order of the given shop along with its lines
#[instrument(skip(pool))]
pub async fn delete_order_by_id_and_shop(
    pool: &Pool<Sqlite>,
    order_id: i64,
    shop_id: i64,
) -> Result<()> {
    let result = sqlx::query("DELETE FROM orders WHERE order_id = ? AND shop_id = ?")
        .bind(order_id)
        .bind(shop_id)
        .execute(pool)
        .await
        .map_err(|e| Error::DeleteDataFailed(format!("注文の削除に失敗しました: {}", e)))?;

    if result.rows_affected() == 0 {
        return Err(Error::NoData("削除対象の注文が見つかりませんでした。".to_string()));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queries::test_support::*;
    use chrono::Duration;
    use mobileorder_core::ErrCode;

    async fn setup_active_user_orders(pool: &Pool<Sqlite>) {
        insert_user(pool, 1, "user1@example.com").await;
        insert_user(pool, 2, "user2@example.com").await;
        insert_user(pool, 3, "user3@example.com").await;
        insert_shop(pool, 1, "Shop A", "Location A").await;
        insert_shop(pool, 2, "Shop B", "Location B").await;

        let base = base_time();
        let orders = [
            (1, 1, 1, 1, OrderStatus::Cooking),
            (2, 1, 1, 2, OrderStatus::Cooking),
            (3, 1, 1, 3, OrderStatus::Completed),
            (4, 1, 1, 4, OrderStatus::Handed),
            (5, 2, 1, 0, OrderStatus::Cooking),
            (6, 1, 2, 0, OrderStatus::Cooking),
            (7, 3, 1, 5, OrderStatus::Handed),
        ];
        for (order_id, user_id, shop_id, minutes, status) in orders {
            insert_order(
                pool,
                order_id,
                Some(user_id),
                shop_id,
                base + Duration::minutes(minutes),
                status,
            )
            .await;
        }
    }

    #[tokio::test]
    async fn test_find_active_user_orders_with_waiting_counts() {
        let pool = setup_test_db().await;
        setup_active_user_orders(&pool).await;

        let orders = find_active_user_orders(&pool, 1).await.unwrap();
        let got: Vec<(i64, &str, OrderStatus, i64)> = orders
            .iter()
            .map(|o| (o.order_id, o.shop_name.as_str(), o.status, o.waiting_count))
            .collect();

        assert_eq!(
            got,
            vec![
                (3, "Shop A", OrderStatus::Completed, 0),
                (2, "Shop A", OrderStatus::Cooking, 2),
                (1, "Shop A", OrderStatus::Cooking, 1),
                (6, "Shop B", OrderStatus::Cooking, 0),
            ]
        );
        assert_eq!(orders[0].location.as_deref(), Some("Location A"));
        assert_eq!(orders[1].order_date, base_time() + Duration::minutes(2));
    }

    #[tokio::test]
    async fn test_find_active_user_orders_empty() {
        let pool = setup_test_db().await;
        setup_active_user_orders(&pool).await;

        let orders = find_active_user_orders(&pool, 3).await.unwrap();
        assert!(orders.is_empty());
    }

    #[tokio::test]
    async fn test_count_waiting_orders_matches_list() {
        let pool = setup_test_db().await;
        setup_active_user_orders(&pool).await;

        let order = find_order_by_id_and_user(&pool, 2, 1).await.unwrap();
        let waiting = count_waiting_orders(&pool, order.shop_id, order.order_date)
            .await
            .unwrap();
        assert_eq!(waiting, 2);

        // Another user's order is not visible
        let err = find_order_by_id_and_user(&pool, 5, 1).await.unwrap_err();
        assert_eq!(err.code(), ErrCode::NoData);
    }

    #[tokio::test]
    async fn test_create_order_with_lines() {
        let pool = setup_test_db().await;
        insert_user(&pool, 1, "user1@example.com").await;
        insert_shop(&pool, 1, "Shop A", "Location A").await;
        insert_item(&pool, 1, 1, "Item A", 500.0).await;
        insert_item(&pool, 1, 2, "Item B", 300.0).await;

        let order = NewOrder {
            user_id: Some(1),
            shop_id: 1,
            order_date: base_time(),
            total_amount: 1300.0,
            guest_order_token: None,
        };
        let lines = vec![
            OrderLine { item_id: 1, quantity: 2, price_at_order: 500.0 },
            OrderLine { item_id: 2, quantity: 1, price_at_order: 300.0 },
        ];

        let mut tx = pool.begin().await.unwrap();
        let order_id = create_order(&mut tx, &order, &lines).await.unwrap();
        tx.commit().await.unwrap();

        let stored = find_order_by_id_and_user(&pool, order_id, 1).await.unwrap();
        assert_eq!(stored.status, OrderStatus::Cooking);
        assert_eq!(stored.total_amount, 1300.0);
        assert_eq!(stored.order_date, base_time());

        let details = find_items_by_order_ids(&pool, &[order_id]).await.unwrap();
        assert_eq!(
            details[&order_id],
            vec![
                ItemDetail { item_name: "Item A".to_string(), quantity: 2 },
                ItemDetail { item_name: "Item B".to_string(), quantity: 1 },
            ]
        );
    }

    #[tokio::test]
    async fn test_create_order_rolls_back_on_bad_line() {
        let pool = setup_test_db().await;
        insert_shop(&pool, 1, "Shop A", "Location A").await;

        let order = NewOrder {
            user_id: None,
            shop_id: 1,
            order_date: base_time(),
            total_amount: 100.0,
            guest_order_token: Some("token".to_string()),
        };
        // Item 99 does not exist
        let lines = vec![OrderLine { item_id: 99, quantity: 1, price_at_order: 100.0 }];

        let mut tx = pool.begin().await.unwrap();
        let err = create_order(&mut tx, &order, &lines).await.unwrap_err();
        assert_eq!(err.code(), ErrCode::InsertDataFailed);
        tx.rollback().await.unwrap();

        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM orders")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(count, 0);
    }

    #[tokio::test]
    async fn test_find_items_by_order_ids() {
        let pool = setup_test_db().await;
        insert_user(&pool, 1, "user1@example.com").await;
        insert_shop(&pool, 1, "Shop A", "Location A").await;
        insert_item(&pool, 1, 1, "Item A", 100.0).await;
        insert_item(&pool, 1, 2, "Item B", 200.0).await;
        for order_id in 1..=3 {
            insert_order(&pool, order_id, Some(1), 1, base_time(), OrderStatus::Cooking).await;
        }
        insert_order_item(&pool, 1, 1, 2).await;
        insert_order_item(&pool, 1, 2, 1).await;
        insert_order_item(&pool, 2, 1, 5).await;

        let details = find_items_by_order_ids(&pool, &[1, 2, 3]).await.unwrap();
        assert_eq!(details[&1].len(), 2);
        assert_eq!(details[&2], vec![ItemDetail { item_name: "Item A".to_string(), quantity: 5 }]);
        assert!(!details.contains_key(&3));

        assert!(find_items_by_order_ids(&pool, &[]).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_claim_guest_order() {
        let pool = setup_test_db().await;
        insert_user(&pool, 1, "user1@example.com").await;
        insert_shop(&pool, 1, "Shop A", "Location A").await;

        let order = NewOrder {
            user_id: None,
            shop_id: 1,
            order_date: base_time(),
            total_amount: 0.0,
            guest_order_token: Some("guest-token".to_string()),
        };
        let mut conn = pool.acquire().await.unwrap();
        let order_id = create_order(&mut conn, &order, &[]).await.unwrap();
        drop(conn);

        claim_guest_order(&pool, "guest-token", 1).await.unwrap();
        let claimed = find_order_by_id_and_user(&pool, order_id, 1).await.unwrap();
        assert_eq!(claimed.user_id, Some(1));

        // Second claim finds nothing left to claim
        let err = claim_guest_order(&pool, "guest-token", 1).await.unwrap_err();
        assert_eq!(err.code(), ErrCode::NoData);

        let err = claim_guest_order(&pool, "unknown", 1).await.unwrap_err();
        assert_eq!(err.code(), ErrCode::NoData);
    }

    #[tokio::test]
    async fn test_find_shop_orders_by_statuses() {
        let pool = setup_test_db().await;
        setup_active_user_orders(&pool).await;

        let cooking = find_shop_orders_by_statuses(&pool, 1, &[OrderStatus::Cooking])
            .await
            .unwrap();
        let ids: Vec<i64> = cooking.iter().map(|o| o.order_id).collect();
        assert_eq!(ids, vec![5, 1, 2]);
        assert_eq!(cooking[0].customer_email.as_deref(), Some("user2@example.com"));

        let done = find_shop_orders_by_statuses(
            &pool,
            1,
            &[OrderStatus::Completed, OrderStatus::Handed],
        )
        .await
        .unwrap();
        let ids: Vec<i64> = done.iter().map(|o| o.order_id).collect();
        assert_eq!(ids, vec![3, 4, 7]);
    }

    #[tokio::test]
    async fn test_guest_orders_have_no_email() {
        let pool = setup_test_db().await;
        insert_shop(&pool, 1, "Shop A", "Location A").await;
        insert_order(&pool, 1, None, 1, base_time(), OrderStatus::Cooking).await;

        let rows = find_shop_orders_by_statuses(&pool, 1, &[OrderStatus::Cooking])
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].customer_email, None);
    }

    #[tokio::test]
    async fn test_update_order_status() {
        let pool = setup_test_db().await;
        setup_active_user_orders(&pool).await;

        update_order_status(&pool, 1, OrderStatus::Completed).await.unwrap();
        let order = find_order_by_id_and_shop(&pool, 1, 1).await.unwrap();
        assert_eq!(order.status, OrderStatus::Completed);

        // Order 6 belongs to shop 2
        let err = find_order_by_id_and_shop(&pool, 6, 1).await.unwrap_err();
        assert_eq!(err.code(), ErrCode::NoData);

        let err = update_order_status(&pool, 99, OrderStatus::Handed).await.unwrap_err();
        assert_eq!(err.code(), ErrCode::NoData);
    }

    #[tokio::test]
    async fn test_delete_order_cascades_lines() {
        let pool = setup_test_db().await;
        insert_user(&pool, 1, "user1@example.com").await;
        insert_shop(&pool, 1, "Shop A", "Location A").await;
        insert_shop(&pool, 2, "Shop B", "Location B").await;
        insert_item(&pool, 1, 1, "Item A", 100.0).await;
        insert_order(&pool, 1, Some(1), 1, base_time(), OrderStatus::Cooking).await;
        insert_order_item(&pool, 1, 1, 2).await;

        // Wrong shop
        let err = delete_order_by_id_and_shop(&pool, 1, 2).await.unwrap_err();
        assert_eq!(err.code(), ErrCode::NoData);

        delete_order_by_id_and_shop(&pool, 1, 1).await.unwrap();

        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM order_item")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(count, 0);

        let err = delete_order_by_id_and_shop(&pool, 1, 1).await.unwrap_err();
        assert_eq!(err.code(), ErrCode::NoData);
    }
}
