//! Shared types

use serde::{Deserialize, Serialize};

/// Account role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    Customer,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Customer => "customer",
            Self::Admin => "admin",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Order lifecycle: `cooking` -> `completed` -> `handed`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    /// Accepted and being prepared
    Cooking,
    /// Ready for pickup
    Completed,
    /// Handed over to the customer (terminal)
    Handed,
}

impl OrderStatus {
    /// Parse status from string
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "cooking" => Some(Self::Cooking),
            "completed" => Some(Self::Completed),
            "handed" => Some(Self::Handed),
            _ => None,
        }
    }

    /// Convert status to string
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cooking => "cooking",
            Self::Completed => "completed",
            Self::Handed => "handed",
        }
    }

    /// The status an order moves to when the kitchen advances it
    pub fn next(&self) -> Option<Self> {
        match self {
            Self::Cooking => Some(Self::Completed),
            Self::Completed => Some(Self::Handed),
            Self::Handed => None,
        }
    }

    /// Orders still visible to the customer
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Cooking | Self::Completed)
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
