//! Request bodies and their validation rules

use mobileorder_core::{Error, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;
use uuid::{Uuid, Version};

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9.!#$%&'*+/=?^_`{|}~-]+@[A-Za-z0-9](?:[A-Za-z0-9-]*[A-Za-z0-9])?(?:\.[A-Za-z0-9](?:[A-Za-z0-9-]*[A-Za-z0-9])?)+$")
        .expect("email pattern is valid")
});

pub fn is_valid_email(email: &str) -> bool {
    email.len() <= 254 && EMAIL_RE.is_match(email)
}

/// Whether `token` is a UUID v4 in the lowercase hyphenated form guest
/// order tokens are issued in
pub fn is_guest_token(token: &str) -> bool {
    Uuid::parse_str(token)
        .map(|uuid| {
            uuid.get_version() == Some(Version::Random) && uuid.hyphenated().to_string() == token
        })
        .unwrap_or(false)
}

/// Sign-up and login body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthenticateRequest {
    pub email: String,
    /// Guest order to attach to the account
    #[serde(default)]
    pub guest_order_token: Option<String>,
}

impl AuthenticateRequest {
    pub fn validate(&self) -> Result<()> {
        if !is_valid_email(&self.email) {
            return Err(Error::ValidationFailed(
                "メールアドレスの形式が正しくありません。".to_string(),
            ));
        }
        if let Some(token) = self.guest_token() {
            if !is_guest_token(token) {
                return Err(Error::ValidationFailed(
                    "ゲスト注文トークンの形式が正しくありません。".to_string(),
                ));
            }
        }
        Ok(())
    }

    /// The guest token, ignoring an empty string
    pub fn guest_token(&self) -> Option<&str> {
        self.guest_order_token
            .as_deref()
            .filter(|token| !token.is_empty())
    }
}

/// One requested line of an order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderItemRequest {
    pub item_id: i64,
    pub quantity: i64,
}

/// Order body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateOrderRequest {
    pub items: Vec<OrderItemRequest>,
}

impl CreateOrderRequest {
    pub fn validate(&self) -> Result<()> {
        if self.items.is_empty() {
            return Err(Error::ValidationFailed(
                "注文には1つ以上の商品が必要です。".to_string(),
            ));
        }
        for item in &self.items {
            if item.item_id < 1 {
                return Err(Error::ValidationFailed(format!(
                    "商品IDが不正です: {}",
                    item.item_id
                )));
            }
            if item.quantity < 1 {
                return Err(Error::ValidationFailed(format!(
                    "数量は1以上で指定してください: {}",
                    item.quantity
                )));
            }
        }
        Ok(())
    }
}

/// Availability toggle body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateAvailabilityRequest {
    pub is_available: bool,
}
