//! Sign-up and login

use mobileorder_core::{Error, Result, Role};
use mobileorder_database::{
    queries::{claim_guest_order, create_user, find_shop_id_by_admin, get_user_by_email},
    User,
};
use serde::Serialize;
use tracing::{info, instrument, warn};

use crate::{state::AppState, validation::AuthenticateRequest};

/// Result of a successful sign-up
#[derive(Debug, Clone, Serialize)]
pub struct SignUpResponse {
    pub token: String,
    pub user: User,
}

/// Result of a successful login
#[derive(Debug, Clone, Serialize)]
pub struct LoginResponse {
    pub token: String,
}

/// Create a customer account and optionally claim a guest order
#[instrument(skip(state, req), fields(email = %req.email))]
pub async fn sign_up(state: &AppState, req: &AuthenticateRequest) -> Result<SignUpResponse> {
    req.validate()?;

    let mut tx = state
        .pool
        .begin()
        .await
        .map_err(|e| Error::DatabaseError(format!("Failed to begin transaction: {}", e)))?;

    let user = create_user(&mut *tx, &req.email, Role::Customer).await?;

    if let Some(token) = req.guest_token() {
        if let Err(e) = claim_guest_order(&mut *tx, token, user.user_id).await {
            warn!(user_id = user.user_id, error = %e, "Failed to claim guest order for new user");
        }
    }

    tx.commit()
        .await
        .map_err(|e| Error::DatabaseError(format!("Failed to commit transaction: {}", e)))?;

    let token = issue_token(state, &user).await?;
    info!(user_id = user.user_id, "User signed up");

    Ok(SignUpResponse { token, user })
}

/// Log in by email, subject to the rate limiter
#[instrument(skip(state, req), fields(email = %req.email))]
pub async fn log_in(state: &AppState, req: &AuthenticateRequest) -> Result<LoginResponse> {
    req.validate()?;
    state.rate_limiter.check(&req.email)?;

    let user = match get_user_by_email(&state.pool, &req.email).await {
        Ok(user) => user,
        Err(Error::NoData(_)) => {
            state.rate_limiter.record(&req.email, false);
            return Err(Error::Unauthorized(
                "メールアドレスが登録されていません。".to_string(),
            ));
        }
        Err(e) => return Err(e),
    };

    if let Some(token) = req.guest_token() {
        if let Err(e) = claim_guest_order(&state.pool, token, user.user_id).await {
            warn!(user_id = user.user_id, error = %e, "Failed to claim guest order for existing user");
        }
    }

    let token = issue_token(state, &user).await?;
    state.rate_limiter.record(&req.email, true);
    info!(user_id = user.user_id, role = %user.role, "User logged in");

    Ok(LoginResponse { token })
}

/// Issue a token, resolving an admin's shop
async fn issue_token(state: &AppState, user: &User) -> Result<String> {
    let shop_id = if user.is_admin() {
        Some(find_shop_id_by_admin(&state.pool, user.user_id).await?)
    } else {
        None
    };
    state.tokens.issue(user.user_id, user.role, shop_id)
}
