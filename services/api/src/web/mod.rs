pub mod auth;
pub mod chat;
pub mod middleware;
pub mod protocol;
pub mod rest;
pub mod state;
pub mod workspace;

use axum::{
    middleware as axum_middleware,
    routing::{delete, get, post, put},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

pub use chat::chat_handler;
pub use middleware::require_login;
pub use state::AppState;

/// Builds the API router: the public gateway and auth routes plus the
/// workspace routes behind `require_login`.
pub fn router(app_state: Arc<AppState>, cors: CorsLayer) -> Router {
    // Public routes (no login required)
    let public_routes = Router::new()
        .route("/api/chat", post(chat_handler))
        .route("/auth/signup", post(auth::signup_handler))
        .route("/auth/login", post(auth::login_handler))
        .route("/auth/logout", post(auth::logout_handler));

    // Protected routes (login required)
    let protected_routes = Router::new()
        .route("/workspace", get(workspace::get_workspace_handler))
        .route("/sessions", post(workspace::create_session_handler))
        .route("/sessions/{id}", delete(workspace::delete_session_handler))
        .route("/sessions/{id}/select", post(workspace::select_session_handler))
        .route("/messages", post(workspace::submit_message_handler))
        .route("/preferences/sidebar", put(workspace::set_sidebar_handler))
        .route(
            "/preferences/sidebar/toggle",
            post(workspace::toggle_sidebar_handler),
        )
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            require_login,
        ));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}
