// ABOUTME: Administrator login, logout, and session status handlers.
// ABOUTME: Login verifies the password through the AuthGate and sets the `auth` cookie on success.

use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::{HeaderMap, header};
use axum::response::IntoResponse;
use serde::Deserialize;

use crate::app_state::SharedState;
use crate::error::ApiError;

/// Request body for POST /auth/login.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub password: Option<String>,
}

/// POST /auth/login - Exchange the administrator password for a session cookie.
pub async fn login(
    State(state): State<SharedState>,
    body: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let password = body
        .ok()
        .and_then(|Json(req)| req.password)
        .filter(|p| !p.is_empty())
        .ok_or(ApiError::InvalidPassword)?;

    let valid = state
        .auth
        .verify(&password)
        .await
        .map_err(ApiError::from_auth("Login failed"))?;

    if !valid {
        tracing::warn!("admin login rejected");
        return Err(ApiError::InvalidPassword);
    }

    tracing::info!("admin session started");
    Ok((
        [(header::SET_COOKIE, state.auth.start_session())],
        Json(serde_json::json!({ "success": true })),
    ))
}

/// POST /auth/logout - Clear the session cookie. Always succeeds.
pub async fn logout(State(state): State<SharedState>) -> impl IntoResponse {
    (
        [(header::SET_COOKIE, state.auth.end_session())],
        Json(serde_json::json!({ "success": true })),
    )
}

/// GET /auth/session - Report whether the caller holds an active session.
pub async fn session_status(
    State(state): State<SharedState>,
    headers: HeaderMap,
) -> Json<serde_json::Value> {
    let authenticated = state.auth.is_session_active(&headers);
    Json(serde_json::json!({ "authenticated": authenticated }))
}
