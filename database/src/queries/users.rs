//! User database queries

use mobileorder_core::{Error, Result, Role};
use sqlx::{Executor, Pool, Sqlite};
use tracing::instrument;

use crate::{is_unique_violation, models::User};

/// Create a user and return the stored row
///
/// A duplicate email is reported as [`Error::Conflict`].
#[instrument(skip(executor))]
pub async fn create_user<'e, E>(executor: E, email: &str, role: Role) -> Result<User>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query_as::<_, User>(
        r#"
        INSERT INTO users (email, role)
        VALUES (?, ?)
        RETURNING user_id, email, role
        "#,
    )
    .bind(email)
    .bind(role)
    .fetch_one(executor)
    .await
    .map_err(|e| {
        if is_unique_violation(&e) {
            Error::Conflict("このメールアドレスは既に使用されています。".to_string())
        } else {
            Error::InsertDataFailed(format!("Failed to create user: {}", e))
        }
    })
}

/// Get user by email
#[instrument(skip(pool))]
pub async fn get_user_by_email(pool: &Pool<Sqlite>, email: &str) -> Result<User> {
    sqlx::query_as::<_, User>(
        r#"
        SELECT user_id, email, role
        FROM users
        WHERE email = ?
        "#,
    )
    .bind(email)
    .fetch_optional(pool)
    .await
    .map_err(|e| Error::GetDataFailed(format!("Failed to get user: {}", e)))?
    .ok_or_else(|| Error::NoData("指定されたメールアドレスのユーザーは見つかりませんでした。".to_string()))
}

/// Change a user's role
#[instrument(skip(pool))]
pub async fn set_user_role(pool: &Pool<Sqlite>, user_id: i64, role: Role) -> Result<()> {
    let result = sqlx::query(
        "UPDATE users SET role = ?, updated_at = CURRENT_TIMESTAMP WHERE user_id = ?",
    )
    .bind(role)
    .bind(user_id)
    .execute(pool)
    .await
    .map_err(|e| Error::UpdateDataFailed(format!("Failed to update user role: {}", e)))?;

    if result.rows_affected() == 0 {
        return Err(Error::NoData("ユーザーが見つかりませんでした。".to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queries::test_support::setup_test_db;
    use mobileorder_core::ErrCode;

    #[tokio::test]
    async fn test_user_lifecycle() {
        let pool = setup_test_db().await;

        let user = create_user(&pool, "new.user@example.com", Role::Customer)
            .await
            .unwrap();
        assert!(user.user_id > 0);
        assert_eq!(user.role, Role::Customer);

        let found = get_user_by_email(&pool, "new.user@example.com").await.unwrap();
        assert_eq!(found, user);

        set_user_role(&pool, user.user_id, Role::Admin).await.unwrap();
        let admin = get_user_by_email(&pool, "new.user@example.com").await.unwrap();
        assert!(admin.is_admin());
    }

    #[tokio::test]
    async fn test_duplicate_email_is_conflict() {
        let pool = setup_test_db().await;

        create_user(&pool, "dup@example.com", Role::Customer).await.unwrap();
        let err = create_user(&pool, "dup@example.com", Role::Customer)
            .await
            .unwrap_err();
        assert_eq!(err.code(), ErrCode::Conflict);
    }

    #[tokio::test]
    async fn test_unknown_email_is_no_data() {
        let pool = setup_test_db().await;

        let err = get_user_by_email(&pool, "nobody@example.com").await.unwrap_err();
        assert_eq!(err.code(), ErrCode::NoData);

        let err = set_user_role(&pool, 42, Role::Admin).await.unwrap_err();
        assert_eq!(err.code(), ErrCode::NoData);
    }
}
