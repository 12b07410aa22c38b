//! services/api/src/web/auth.rs
//!
//! Simulated login, signup and logout. Any filled-in form is accepted; passwords
//! are never checked or stored.

use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use chat_core::domain::{LoginForm, UserIdentity};
use chrono::{Duration, Utc};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{error, info};
use utoipa::ToSchema;

use crate::web::middleware::session_token;
use crate::web::state::AppState;

//=========================================================================================
// Request Types
//=========================================================================================

#[derive(Deserialize, ToSchema)]
pub struct SignupRequest {
    pub email: String,
    pub password: String,
    pub name: String,
}

#[derive(Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

//=========================================================================================
// Handlers
//=========================================================================================

/// POST /auth/signup - Log in under a chosen display name
#[utoipa::path(
    post,
    path = "/auth/signup",
    request_body = SignupRequest,
    responses(
        (status = 201, description = "Logged in", body = UserIdentity),
        (status = 400, description = "A field was left empty"),
        (status = 500, description = "Stored chats could not be loaded")
    )
)]
pub async fn signup_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SignupRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let form = LoginForm {
        email: req.email,
        password: req.password,
        name: Some(req.name),
    };
    let (user, cookie) = start_login(&state, form).await?;
    Ok((StatusCode::CREATED, [(header::SET_COOKIE, cookie)], Json(user)))
}

/// POST /auth/login - Log in with any email and password
#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in", body = UserIdentity),
        (status = 400, description = "A field was left empty"),
        (status = 500, description = "Stored chats could not be loaded")
    )
)]
pub async fn login_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let form = LoginForm {
        email: req.email,
        password: req.password,
        name: None,
    };
    let (user, cookie) = start_login(&state, form).await?;
    Ok((StatusCode::OK, [(header::SET_COOKIE, cookie)], Json(user)))
}

/// POST /auth/logout - Drop the in-memory chat state of this login
#[utoipa::path(
    post,
    path = "/auth/logout",
    responses(
        (status = 200, description = "Logout successful"),
        (status = 401, description = "No active login")
    )
)]
pub async fn logout_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let token = session_token(&headers)
        .ok_or((StatusCode::UNAUTHORIZED, "No session found".to_string()))?;

    if !state.end_login(token).await {
        return Err((StatusCode::UNAUTHORIZED, "No session found".to_string()));
    }

    let cookie = "session=; HttpOnly; Secure; SameSite=Lax; Path=/; Max-Age=0";
    Ok((StatusCode::OK, [(header::SET_COOKIE, cookie.to_string())]))
}

/// Validates the form and registers the user's controller under a new token.
async fn start_login(
    state: &AppState,
    form: LoginForm,
) -> Result<(UserIdentity, String), (StatusCode, String)> {
    let user = UserIdentity::sign_in(form, Utc::now())
        .map_err(|e| (StatusCode::BAD_REQUEST, e.to_string()))?;

    let token = state.start_login(user.clone()).await.map_err(|e| {
        error!("Failed to load chats for {}: {:?}", user.email, e);
        (StatusCode::INTERNAL_SERVER_ERROR, "Failed to load chats".to_string())
    })?;
    info!("Started login for {}", user.email);

    let cookie = format!(
        "session={}; HttpOnly; Secure; SameSite=Lax; Path=/; Max-Age={}",
        token,
        Duration::days(30).num_seconds()
    );
    Ok((user, cookie))
}
