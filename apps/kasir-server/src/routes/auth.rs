//! Login, logout and the current user.

use axum::extract::State;
use axum::http::header::SET_COOKIE;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{info, warn};

use crate::auth::{verify_password, AuthUser};
use crate::error::{ApiError, ApiResult, ErrorCode};
use crate::extract::ApiJson;
use crate::state::AppState;
use kasir_core::User;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/me", get(me))
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub user: User,
    pub token: String,
}

fn invalid_credentials() -> ApiError {
    ApiError::new(ErrorCode::Unauthorized, "Username atau password salah")
}

async fn login(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<LoginRequest>,
) -> ApiResult<Response> {
    let username = request.username.trim().to_string();
    if username.is_empty() || request.password.is_empty() {
        return Err(invalid_credentials());
    }

    let Some(user) = state.db.users().find_by_username(&username).await? else {
        warn!(username = %username, "Login for unknown or inactive user");
        return Err(invalid_credentials());
    };

    // CPU-bound, runs on the blocking pool
    let password = request.password;
    let hash = user.password_hash.clone();
    let valid = tokio::task::spawn_blocking(move || verify_password(&password, &hash))
        .await
        .map_err(ApiError::internal)?;

    if !valid {
        warn!(username = %username, "Login with wrong password");
        return Err(invalid_credentials());
    }

    let token = state.sessions.issue(&user)?;
    info!(user_id = %user.id, role = user.role.as_str(), "User logged in");

    let cookie = state.sessions.session_cookie(&token);
    Ok(([(SET_COOKIE, cookie)], Json(LoginResponse { user, token })).into_response())
}

async fn logout(State(state): State<AppState>, user: AuthUser) -> Response {
    info!(user_id = %user.id, "User logged out");
    (
        [(SET_COOKIE, state.sessions.expired_cookie())],
        Json(json!({ "message": "Logout berhasil" })),
    )
        .into_response()
}

async fn me(State(state): State<AppState>, user: AuthUser) -> ApiResult<Json<User>> {
    let user = state.db.users().get_by_id(&user.id).await?;
    if !user.is_active {
        return Err(ApiError::unauthorized());
    }
    Ok(Json(user))
}
