//! services/api/src/web/rest.rs
//!
//! The master definition for the OpenAPI specification.

use crate::web::{auth, chat, protocol, workspace};
use chat_core::domain::{ChatMessage, Role, UserIdentity};
use utoipa::OpenApi;

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        chat::chat_handler,
        auth::signup_handler,
        auth::login_handler,
        auth::logout_handler,
        workspace::get_workspace_handler,
        workspace::create_session_handler,
        workspace::select_session_handler,
        workspace::delete_session_handler,
        workspace::submit_message_handler,
        workspace::set_sidebar_handler,
        workspace::toggle_sidebar_handler,
    ),
    components(
        schemas(
            ChatMessage,
            Role,
            UserIdentity,
            protocol::ChatRequest,
            protocol::ErrorText,
            protocol::SubmitRequest,
            protocol::SubmitResponse,
            protocol::SidebarRequest,
            protocol::SessionSummary,
            protocol::WorkspaceView,
            auth::LoginRequest,
            auth::SignupRequest,
        )
    ),
    tags(
        (name = "Corvit Chat API", description = "Chat gateway and per-user chat sessions.")
    )
)]
pub struct ApiDoc;
