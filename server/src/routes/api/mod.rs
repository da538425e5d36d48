//! JSON API
//!
//! ```text
//! /health                                         GET     Liveness probe
//! /auth/signup                                    POST    Create customer account
//! /auth/login                                     POST    Log in
//! /shops/{shop_id}/products                       GET     Shop menu
//! /shops/{shop_id}/guest-orders                   POST    Order without account
//! /shops/{shop_id}/orders                         POST    Order (bearer)
//! /orders                                         GET     Active orders (bearer)
//! /orders/{order_id}/status                       GET     Queue position (bearer)
//! /admin/shops/{shop_id}/orders                   GET     Cooking + completed (admin)
//! /admin/shops/{shop_id}/orders/cooking           GET     (admin)
//! /admin/shops/{shop_id}/orders/completed         GET     (admin)
//! /admin/orders/{order_id}/status                 PATCH   Advance status (admin)
//! /admin/orders/{order_id}                        DELETE  Delete order (admin)
//! /admin/products/{product_id}/availability       PATCH   Sold out toggle (admin)
//! ```
//!
//! Every failure is answered with `{"err_code": "...", "message": "..."}`.

pub mod admin;
pub mod auth;
pub mod orders;
pub mod shops;

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        FromRequest, FromRequestParts,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use mobileorder_core::{ErrCode, Error};
use serde::Serialize;
use tracing::{error, instrument, warn};

use crate::state::AppState;

/// Error returned by API handlers
#[derive(Debug)]
pub struct ApiError(pub Error);

/// Wire format of an error
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub err_code: ErrCode,
    pub message: String,
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        ApiError(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError(Error::ReqBodyDecodeFailed(format!(
            "リクエストボディの形式が正しくありません: {}",
            rejection.body_text()
        )))
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError(Error::BadParam(format!(
            "パスパラメータが不正です: {}",
            rejection.body_text()
        )))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let code = self.0.code();
        let status =
            StatusCode::from_u16(code.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        if status.is_server_error() {
            error!(err_code = %code, error = %self.0, "Request failed");
        } else {
            warn!(err_code = %code, error = %self.0, "Request rejected");
        }

        let body = ErrorBody {
            err_code: code,
            message: self.0.public_message(),
        };
        (status, Json(body)).into_response()
    }
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;

/// JSON body whose decoding failures become `R001`
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

/// Path parameters whose parsing failures become `R002`
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(ApiError))]
pub struct ApiPath<T>(pub T);

/// Create the API router
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health_check))
        .merge(auth::routes())
        .merge(shops::routes())
        .merge(orders::routes())
        .nest("/admin", admin::routes())
}

/// Health check endpoint
#[instrument]
async fn health_check() -> &'static str {
    "OK"
}


#[cfg(test)]
mod tests {
    use super::test_support::{app, send};
    use super::*;
    use axum::{
        body::{to_bytes, Body},
        http::{Method, Request},
    };
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_health() {
        let app = app(AppState::for_tests().await);
        let response = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], b"OK");
    }

    #[tokio::test]
    async fn test_error_body_shape() {
        let response = ApiError(Error::NoData("注文が見つかりませんでした。".to_string())).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["err_code"], "S003");
        assert_eq!(json["message"], "注文が見つかりませんでした。");
    }

    #[tokio::test]
    async fn test_internal_error_is_generic() {
        let response = ApiError(Error::DatabaseError("disk full".to_string())).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["err_code"], "U000");
        assert!(!json["message"].as_str().unwrap().contains("disk full"));
    }

    #[tokio::test]
    async fn test_malformed_path_is_bad_param() {
        let app = app(AppState::for_tests().await);
        let (status, body) = send(&app, Method::GET, "/shops/abc/products", None, None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["err_code"], "R002");
    }
}
