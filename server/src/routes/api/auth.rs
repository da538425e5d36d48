//! Sign-up and login endpoints

use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::post, Json, Router};
use tracing::instrument;

use super::{ApiJson, ApiResult};
use crate::{services::auth, state::AppState, validation::AuthenticateRequest};

/// Create auth router
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/auth/signup", post(sign_up))
        .route("/auth/login", post(log_in))
}

/// Create a customer account
#[instrument(skip(state, req))]
async fn sign_up(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<AuthenticateRequest>,
) -> ApiResult<impl IntoResponse> {
    let res = auth::sign_up(&state, &req).await?;
    Ok((StatusCode::CREATED, Json(res)))
}

/// Log in with an email address
#[instrument(skip(state, req))]
async fn log_in(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<AuthenticateRequest>,
) -> ApiResult<impl IntoResponse> {
    let res = auth::log_in(&state, &req).await?;
    Ok(Json(res))
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{app, send};
    use crate::state::AppState;
    use axum::http::{Method, StatusCode};
    use serde_json::json;

    #[tokio::test]
    async fn test_sign_up_then_log_in() {
        let state = AppState::for_tests().await;
        let app = app(state.clone());

        let (status, body) = send(
            &app,
            Method::POST,
            "/auth/signup",
            None,
            Some(json!({ "email": "new@example.com" })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["user"]["email"], "new@example.com");
        assert_eq!(body["user"]["role"], "customer");
        assert!(body["token"].as_str().is_some());

        let (status, body) = send(
            &app,
            Method::POST,
            "/auth/login",
            None,
            Some(json!({ "email": "new@example.com" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let token = body["token"].as_str().unwrap();
        assert!(state.tokens.verify(token).is_ok());
    }

    #[tokio::test]
    async fn test_sign_up_errors() {
        let app = app(AppState::for_tests().await);
        let body = json!({ "email": "dup@example.com" });

        let (status, _) = send(&app, Method::POST, "/auth/signup", None, Some(body.clone())).await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, res) = send(&app, Method::POST, "/auth/signup", None, Some(body)).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(res["err_code"], "C001");

        let (status, res) = send(
            &app,
            Method::POST,
            "/auth/signup",
            None,
            Some(json!({ "email": "not-an-email" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(res["err_code"], "R003");

        let (status, res) = send(&app, Method::POST, "/auth/signup", None, Some(json!({ "mail": 1 }))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(res["err_code"], "R001");
    }

    #[tokio::test]
    async fn test_log_in_unknown_email() {
        let app = app(AppState::for_tests().await);

        let (status, res) = send(
            &app,
            Method::POST,
            "/auth/login",
            None,
            Some(json!({ "email": "ghost@example.com" })),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(res["err_code"], "A001");
    }
}
