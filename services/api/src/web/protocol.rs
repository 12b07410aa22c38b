//! services/api/src/web/protocol.rs
//!
//! Defines the JSON payloads exchanged between the browser client and the API server.

use chat_core::controller::ChatController;
use chat_core::domain::{ChatMessage, Session, UserIdentity};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

//=========================================================================================
// Chat Gateway
//=========================================================================================

/// Body of `POST /api/chat`.
#[derive(Deserialize, Serialize, Debug, ToSchema)]
pub struct ChatRequest {
    pub messages: Vec<ChatMessage>,
}

/// Minimal body returned when a request carries no user message.
#[derive(Serialize, Deserialize, Debug, ToSchema)]
pub struct ErrorText {
    pub text: String,
}

//=========================================================================================
// Workspace (one logged-in user's chats)
//=========================================================================================

#[derive(Deserialize, Debug, ToSchema)]
pub struct SubmitRequest {
    pub content: String,
}

#[derive(Deserialize, Debug, ToSchema)]
pub struct SidebarRequest {
    pub open: bool,
}

/// One row of the session list.
#[derive(Serialize, Deserialize, Debug, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    pub id: String,
    pub title: String,
    pub last_updated: DateTime<Utc>,
    pub message_count: usize,
}

impl From<&Session> for SessionSummary {
    fn from(session: &Session) -> Self {
        Self {
            id: session.id.clone(),
            title: session.display_title(),
            last_updated: session.last_updated,
            message_count: session.messages.len(),
        }
    }
}

/// Everything a client needs to render the chat screen.
#[derive(Serialize, Deserialize, Debug, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WorkspaceView {
    pub user: UserIdentity,
    pub active_session_id: Option<String>,
    pub sessions: Vec<SessionSummary>,
    pub messages: Vec<ChatMessage>,
    pub is_loading: bool,
    pub sidebar_open: bool,
}

impl From<&ChatController> for WorkspaceView {
    fn from(controller: &ChatController) -> Self {
        Self {
            user: controller.user().clone(),
            active_session_id: controller.active_session_id().map(str::to_string),
            sessions: controller.sessions().iter().map(SessionSummary::from).collect(),
            messages: controller.messages().to_vec(),
            is_loading: controller.is_loading(),
            sidebar_open: controller.sidebar_open(),
        }
    }
}

/// Response to a submitted message. `reply` is absent when the input was empty.
#[derive(Serialize, Deserialize, Debug, ToSchema)]
pub struct SubmitResponse {
    pub reply: Option<ChatMessage>,
    pub workspace: WorkspaceView,
}
