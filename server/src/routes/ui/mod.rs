//! UI routes - server-rendered pages

use askama::Template;
use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    Router,
};
use mobileorder_core::Error;
use tower_http::services::ServeDir;

use crate::state::AppState;
use crate::templates::NotFoundTemplate;

pub mod menu;

/// Create UI router with all page routes
pub fn ui_routes(static_dir: &str) -> Router<AppState> {
    Router::new()
        .merge(menu::routes())
        // Static files
        .nest_service("/static", ServeDir::new(static_dir))
        // 404 handler
        .fallback(not_found)
}

/// 404 handler
async fn not_found() -> Result<Response, AppError> {
    Err(AppError::NotFound("ページが見つかりませんでした。".to_string()))
}

// ============================================================================
// Error Handling
// ============================================================================

/// Custom error type for UI routes
#[derive(Debug)]
pub enum AppError {
    DatabaseError(String),
    TemplateError(String),
    NotFound(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::DatabaseError(msg) => {
                tracing::error!("Database error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error").into_response()
            }
            AppError::TemplateError(msg) => {
                tracing::error!("Template error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error").into_response()
            }
            AppError::NotFound(message) => {
                tracing::debug!("Not found: {}", message);
                match (NotFoundTemplate { message }).render() {
                    Ok(html) => (StatusCode::NOT_FOUND, Html(html)).into_response(),
                    Err(e) => {
                        tracing::error!("Template error: {}", e);
                        (StatusCode::NOT_FOUND, "Not found").into_response()
                    }
                }
            }
        }
    }
}

impl From<askama::Error> for AppError {
    fn from(err: askama::Error) -> Self {
        AppError::TemplateError(err.to_string())
    }
}

impl From<Error> for AppError {
    fn from(err: Error) -> Self {
        match err {
            Error::NoData(msg) => AppError::NotFound(msg),
            other => AppError::DatabaseError(other.to_string()),
        }
    }
}
