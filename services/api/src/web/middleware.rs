//! services/api/src/web/middleware.rs
//!
//! Login middleware for protecting the workspace routes.

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, StatusCode},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use tracing::warn;

use crate::web::state::AppState;

/// Reads the login token out of the `session` cookie.
pub fn session_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::COOKIE)
        .and_then(|v| v.to_str().ok())?
        .split(';')
        .find_map(|c| c.trim().strip_prefix("session="))
        .filter(|token| !token.is_empty())
}

/// Middleware that resolves the `session` cookie to the user's controller.
///
/// If found, inserts the `ControllerHandle` into request extensions for handlers to use.
/// If missing or unknown, returns 401 Unauthorized.
pub async fn require_login(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let token = session_token(req.headers()).ok_or(StatusCode::UNAUTHORIZED)?;

    let controller = state.controller(token).await.ok_or_else(|| {
        warn!("Rejected request with unknown login token");
        StatusCode::UNAUTHORIZED
    })?;

    req.extensions_mut().insert(controller);
    Ok(next.run(req).await)
}
