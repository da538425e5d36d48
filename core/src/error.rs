//! Error types
//!
//! Every error carries one of the stable [`ErrCode`]s that clients see in
//! the `err_code` field of an error response.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Stable error codes exposed over the API
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrCode {
    /// Unexpected failure
    #[serde(rename = "U000")]
    Unknown,

    #[serde(rename = "S001")]
    InsertDataFailed,
    #[serde(rename = "S002")]
    GetDataFailed,
    /// Requested row does not exist (or is not visible to the caller)
    #[serde(rename = "S003")]
    NoData,
    #[serde(rename = "S004")]
    UpdateDataFailed,
    #[serde(rename = "S005")]
    DeleteDataFailed,

    #[serde(rename = "R001")]
    ReqBodyDecodeFailed,
    #[serde(rename = "R002")]
    BadParam,
    #[serde(rename = "R003")]
    ValidationFailed,

    #[serde(rename = "A001")]
    Unauthorized,
    #[serde(rename = "A002")]
    Forbidden,

    /// State conflict (duplicate email, status that cannot advance, ...)
    #[serde(rename = "C001")]
    Conflict,
}

impl ErrCode {
    /// Wire representation of the code
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unknown => "U000",
            Self::InsertDataFailed => "S001",
            Self::GetDataFailed => "S002",
            Self::NoData => "S003",
            Self::UpdateDataFailed => "S004",
            Self::DeleteDataFailed => "S005",
            Self::ReqBodyDecodeFailed => "R001",
            Self::BadParam => "R002",
            Self::ValidationFailed => "R003",
            Self::Unauthorized => "A001",
            Self::Forbidden => "A002",
            Self::Conflict => "C001",
        }
    }

    /// HTTP status code for this error code
    pub fn http_status(&self) -> u16 {
        match self {
            Self::BadParam | Self::ReqBodyDecodeFailed | Self::ValidationFailed => 400,
            Self::Unauthorized => 401,
            Self::Forbidden => 403,
            Self::NoData => 404,
            Self::Conflict => 409,
            _ => 500,
        }
    }
}

impl std::fmt::Display for ErrCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Main error type
#[derive(Debug, Error)]
pub enum Error {
    #[error("Failed to insert data: {0}")]
    InsertDataFailed(String),

    #[error("Failed to get data: {0}")]
    GetDataFailed(String),

    #[error("No data: {0}")]
    NoData(String),

    #[error("Failed to update data: {0}")]
    UpdateDataFailed(String),

    #[error("Failed to delete data: {0}")]
    DeleteDataFailed(String),

    #[error("Invalid request body: {0}")]
    ReqBodyDecodeFailed(String),

    #[error("Bad parameter: {0}")]
    BadParam(String),

    #[error("Validation failed: {0}")]
    ValidationFailed(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Scheduler error: {0}")]
    SchedulerError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Other error: {0}")]
    Other(String),
}

impl Error {
    /// API error code for this error
    pub fn code(&self) -> ErrCode {
        match self {
            Self::InsertDataFailed(_) => ErrCode::InsertDataFailed,
            Self::GetDataFailed(_) => ErrCode::GetDataFailed,
            Self::NoData(_) => ErrCode::NoData,
            Self::UpdateDataFailed(_) => ErrCode::UpdateDataFailed,
            Self::DeleteDataFailed(_) => ErrCode::DeleteDataFailed,
            Self::ReqBodyDecodeFailed(_) => ErrCode::ReqBodyDecodeFailed,
            Self::BadParam(_) => ErrCode::BadParam,
            Self::ValidationFailed(_) => ErrCode::ValidationFailed,
            Self::Unauthorized(_) => ErrCode::Unauthorized,
            Self::Forbidden(_) => ErrCode::Forbidden,
            Self::Conflict(_) => ErrCode::Conflict,
            Self::DatabaseError(_)
            | Self::ConfigError(_)
            | Self::SchedulerError(_)
            | Self::IoError(_)
            | Self::SerializationError(_)
            | Self::Other(_) => ErrCode::Unknown,
        }
    }

    /// Message safe to show to API clients
    ///
    /// Internal failures are reported generically; their detail only goes
    /// to the log.
    pub fn public_message(&self) -> String {
        match self {
            Self::NoData(msg)
            | Self::ReqBodyDecodeFailed(msg)
            | Self::BadParam(msg)
            | Self::ValidationFailed(msg)
            | Self::Unauthorized(msg)
            | Self::Forbidden(msg)
            | Self::Conflict(msg) => msg.clone(),
            Self::InsertDataFailed(_) => "データの登録に失敗しました。".to_string(),
            Self::GetDataFailed(_) => "データの取得に失敗しました。".to_string(),
            Self::UpdateDataFailed(_) => "データの更新に失敗しました。".to_string(),
            Self::DeleteDataFailed(_) => "データの削除に失敗しました。".to_string(),
            _ => "internal server error".to_string(),
        }
    }
}

// Convert anyhow::Error to our Error type
impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Error::Other(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_serialize_to_wire_format() {
        assert_eq!(serde_json::to_string(&ErrCode::NoData).unwrap(), "\"S003\"");
        assert_eq!(serde_json::to_string(&ErrCode::Conflict).unwrap(), "\"C001\"");
        assert_eq!(ErrCode::ValidationFailed.as_str(), "R003");
    }

    #[test]
    fn test_http_status_mapping() {
        assert_eq!(ErrCode::BadParam.http_status(), 400);
        assert_eq!(ErrCode::ReqBodyDecodeFailed.http_status(), 400);
        assert_eq!(ErrCode::Unauthorized.http_status(), 401);
        assert_eq!(ErrCode::Forbidden.http_status(), 403);
        assert_eq!(ErrCode::NoData.http_status(), 404);
        assert_eq!(ErrCode::Conflict.http_status(), 409);
        assert_eq!(ErrCode::GetDataFailed.http_status(), 500);
        assert_eq!(ErrCode::Unknown.http_status(), 500);
    }

    #[test]
    fn test_internal_errors_hide_detail() {
        let err = Error::DatabaseError("disk I/O error at /var/lib/db".to_string());
        assert_eq!(err.code(), ErrCode::Unknown);
        assert!(!err.public_message().contains("/var/lib/db"));

        let err = Error::NoData("注文が見つかりません。".to_string());
        assert_eq!(err.code(), ErrCode::NoData);
        assert_eq!(err.public_message(), "注文が見つかりません。");
    }
}
