//! Access tokens and request authentication
//!
//! Tokens are HS256 JWTs. Handlers receive the caller through the
//! [`AuthUser`] and [`AdminUser`] extractors.

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use mobileorder_core::{Error, Result, Role};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::routes::api::ApiError;
use crate::state::AppState;

/// Token claims
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    pub user_id: i64,
    pub role: Role,
    /// Shop operated by an admin
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shop_id: Option<i64>,
    pub iat: i64,
    pub exp: i64,
}

/// Signs and verifies access tokens
#[derive(Clone)]
pub struct TokenKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl TokenKeys {
    pub fn new(secret: &str, ttl_hours: i64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl: Duration::try_hours(ttl_hours).unwrap_or_else(Duration::max_value),
        }
    }

    /// Issue a token for a user
    pub fn issue(&self, user_id: i64, role: Role, shop_id: Option<i64>) -> Result<String> {
        let now = Utc::now();
        let expires_at = now.checked_add_signed(self.ttl).ok_or_else(|| {
            Error::ConfigError("token lifetime exceeds the supported date range".to_string())
        })?;
        let claims = Claims {
            user_id,
            role,
            shop_id,
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        };

        encode(&Header::default(), &claims, &self.encoding)
            .map_err(|e| Error::Other(format!("failed to sign token: {e}")))
    }

    /// Verify signature and expiry of a token
    pub fn verify(&self, token: &str) -> Result<Claims> {
        decode::<Claims>(token, &self.decoding, &Validation::default())
            .map(|data| data.claims)
            .map_err(|e| {
                debug!(error = %e, "Rejected access token");
                Error::Unauthorized("認証トークンが無効です。".to_string())
            })
    }
}

fn bearer_token(parts: &Parts) -> Result<&str> {
    parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or_else(|| Error::Unauthorized("認証トークンがありません。".to_string()))
}

/// Any authenticated caller
#[derive(Debug, Clone)]
pub struct AuthUser(pub Claims);

impl AuthUser {
    pub fn user_id(&self) -> i64 {
        self.0.user_id
    }
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> std::result::Result<Self, Self::Rejection> {
        let token = bearer_token(parts)?;
        let claims = state.tokens.verify(token)?;
        Ok(AuthUser(claims))
    }
}

/// An authenticated admin together with the shop they operate
#[derive(Debug, Clone, Copy)]
pub struct AdminUser {
    pub user_id: i64,
    pub shop_id: i64,
}

impl AdminUser {
    /// Only the admin's own shop may be accessed
    pub fn authorize_shop(&self, shop_id: i64) -> Result<()> {
        if self.shop_id != shop_id {
            return Err(Error::Forbidden(
                "この店舗の情報にアクセスする権限がありません。".to_string(),
            ));
        }
        Ok(())
    }
}

impl TryFrom<Claims> for AdminUser {
    type Error = Error;

    fn try_from(claims: Claims) -> Result<Self> {
        if claims.role != Role::Admin {
            return Err(Error::Forbidden("管理者権限が必要です。".to_string()));
        }
        let shop_id = claims.shop_id.ok_or_else(|| {
            Error::Forbidden("管理者アカウントに店舗が紐づいていません。".to_string())
        })?;
        Ok(AdminUser {
            user_id: claims.user_id,
            shop_id,
        })
    }
}

impl FromRequestParts<AppState> for AdminUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> std::result::Result<Self, Self::Rejection> {
        let AuthUser(claims) = AuthUser::from_request_parts(parts, state).await?;
        Ok(AdminUser::try_from(claims)?)
    }
}
