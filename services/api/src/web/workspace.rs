//! services/api/src/web/workspace.rs
//!
//! Handlers behind the login middleware: session list management, message
//! submission and the sidebar preference. Each one works on the caller's
//! `ChatController`.

use crate::web::protocol::{SidebarRequest, SubmitRequest, SubmitResponse, WorkspaceView};
use crate::web::state::{AppState, ControllerHandle};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    Extension,
};
use chat_core::controller::Submission;
use chat_core::ports::PortError;
use std::sync::Arc;
use tracing::error;

type HandlerResult<T> = Result<T, (StatusCode, String)>;

fn port_failure(e: PortError) -> (StatusCode, String) {
    match e {
        PortError::NotFound(what) => (StatusCode::NOT_FOUND, what),
        other => {
            error!("Workspace operation failed: {:?}", other);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to update chats".to_string(),
            )
        }
    }
}

/// Current state of the caller's chats.
#[utoipa::path(
    get,
    path = "/workspace",
    responses((status = 200, body = WorkspaceView), (status = 401, description = "Not logged in"))
)]
pub async fn get_workspace_handler(
    Extension(controller): Extension<ControllerHandle>,
) -> Json<WorkspaceView> {
    let controller = controller.lock().await;
    Json(WorkspaceView::from(&*controller))
}

/// Start a new, empty chat and make it active.
#[utoipa::path(
    post,
    path = "/sessions",
    responses((status = 201, body = WorkspaceView), (status = 401, description = "Not logged in"))
)]
pub async fn create_session_handler(
    Extension(controller): Extension<ControllerHandle>,
) -> HandlerResult<impl IntoResponse> {
    let mut controller = controller.lock().await;
    controller.new_session().await.map_err(port_failure)?;
    Ok((StatusCode::CREATED, Json(WorkspaceView::from(&*controller))))
}

/// Make an existing chat the active one.
#[utoipa::path(
    post,
    path = "/sessions/{id}/select",
    params(("id" = String, Path, description = "Session id")),
    responses((status = 200, body = WorkspaceView), (status = 404, description = "Unknown session"))
)]
pub async fn select_session_handler(
    Extension(controller): Extension<ControllerHandle>,
    Path(id): Path<String>,
) -> HandlerResult<Json<WorkspaceView>> {
    let mut controller = controller.lock().await;
    controller.select_session(&id).map_err(port_failure)?;
    Ok(Json(WorkspaceView::from(&*controller)))
}

/// Delete a chat. Deleting the last one leaves a fresh empty chat behind.
#[utoipa::path(
    delete,
    path = "/sessions/{id}",
    params(("id" = String, Path, description = "Session id")),
    responses((status = 200, body = WorkspaceView), (status = 404, description = "Unknown session"))
)]
pub async fn delete_session_handler(
    Extension(controller): Extension<ControllerHandle>,
    Path(id): Path<String>,
) -> HandlerResult<Json<WorkspaceView>> {
    let mut controller = controller.lock().await;
    if !controller.delete_session(&id).await.map_err(port_failure)? {
        return Err((StatusCode::NOT_FOUND, format!("Session {} not found", id)));
    }
    Ok(Json(WorkspaceView::from(&*controller)))
}

/// Send a message in the active chat and wait for the reply.
///
/// The controller is released while the model is working, so the workspace can
/// still be read (with `isLoading` set) during the call.
#[utoipa::path(
    post,
    path = "/messages",
    request_body = SubmitRequest,
    responses(
        (status = 200, body = SubmitResponse),
        (status = 409, description = "A reply is still being generated")
    )
)]
pub async fn submit_message_handler(
    State(state): State<Arc<AppState>>,
    Extension(controller): Extension<ControllerHandle>,
    Json(req): Json<SubmitRequest>,
) -> HandlerResult<Json<SubmitResponse>> {
    let turn = {
        let mut guard = controller.lock().await;
        match guard.begin_submit(&req.content).await.map_err(port_failure)? {
            Submission::Started(turn) => turn,
            Submission::Empty => {
                return Ok(Json(SubmitResponse {
                    reply: None,
                    workspace: WorkspaceView::from(&*guard),
                }))
            }
            Submission::Busy => {
                return Err((
                    StatusCode::CONFLICT,
                    "A reply is still being generated".to_string(),
                ))
            }
        }
    };

    // The turn is finished in its own task, so it completes even if this
    // request is dropped mid-call.
    let chat = state.chat.clone();
    let task = tokio::spawn(async move {
        let outcome = chat.reply(&turn.transcript).await;
        let mut guard = controller.lock().await;
        let reply = guard.finish_submit(turn, outcome).await?;
        Ok::<_, PortError>((reply, WorkspaceView::from(&*guard)))
    });

    let (reply, workspace) = task
        .await
        .map_err(|e| {
            error!("Reply task did not complete: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to record the reply".to_string(),
            )
        })?
        .map_err(port_failure)?;
    Ok(Json(SubmitResponse {
        reply: Some(reply),
        workspace,
    }))
}

/// Show or hide the session sidebar.
#[utoipa::path(
    put,
    path = "/preferences/sidebar",
    request_body = SidebarRequest,
    responses((status = 200, body = WorkspaceView))
)]
pub async fn set_sidebar_handler(
    Extension(controller): Extension<ControllerHandle>,
    Json(req): Json<SidebarRequest>,
) -> HandlerResult<Json<WorkspaceView>> {
    let mut controller = controller.lock().await;
    controller.set_sidebar_open(req.open).await.map_err(port_failure)?;
    Ok(Json(WorkspaceView::from(&*controller)))
}

/// Flip the sidebar visibility.
#[utoipa::path(
    post,
    path = "/preferences/sidebar/toggle",
    responses((status = 200, body = WorkspaceView))
)]
pub async fn toggle_sidebar_handler(
    Extension(controller): Extension<ControllerHandle>,
) -> HandlerResult<Json<WorkspaceView>> {
    let mut controller = controller.lock().await;
    controller.toggle_sidebar().await.map_err(port_failure)?;
    Ok(Json(WorkspaceView::from(&*controller)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chat_core::domain::{ChatMessage, UserIdentity};
    use chat_core::gateway::{ChatGateway, FALLBACK_TEXT};
    use chat_core::ports::{ChatProvider, PortResult};
    use chat_core::storage::MemoryStorage;
    use std::time::Duration;
    use tokio::sync::Notify;

    struct ScriptedProvider {
        reply: Option<&'static str>,
    }

    #[async_trait]
    impl ChatProvider for ScriptedProvider {
        async fn generate(&self, _prompt: &str) -> PortResult<String> {
            self.reply
                .map(str::to_string)
                .ok_or_else(|| PortError::Unexpected("provider offline".to_string()))
        }

        fn model(&self) -> &str {
            "scripted"
        }
    }

    /// Holds every call until released.
    struct GatedProvider {
        entered: Notify,
        release: Notify,
    }

    #[async_trait]
    impl ChatProvider for GatedProvider {
        async fn generate(&self, _prompt: &str) -> PortResult<String> {
            self.entered.notify_one();
            self.release.notified().await;
            Ok("finally".to_string())
        }

        fn model(&self) -> &str {
            "gated"
        }
    }

    async fn setup(provider: Arc<dyn ChatProvider>) -> (Arc<AppState>, ControllerHandle) {
        let state = Arc::new(AppState::new(
            Arc::new(MemoryStorage::new()),
            Arc::new(ChatGateway::new(provider)),
        ));
        let user = UserIdentity {
            email: "ada@example.com".into(),
            name: "Ada".into(),
            id: "1".into(),
        };
        let token = state.start_login(user).await.unwrap();
        let handle = state.controller(&token).await.unwrap();
        (state, handle)
    }

    async fn submit(
        state: &Arc<AppState>,
        handle: &ControllerHandle,
        content: &str,
    ) -> HandlerResult<Json<SubmitResponse>> {
        submit_message_handler(
            State(state.clone()),
            Extension(handle.clone()),
            Json(SubmitRequest {
                content: content.to_string(),
            }),
        )
        .await
    }

    #[tokio::test]
    async fn submit_returns_reply_and_updated_workspace() {
        let (state, handle) =
            setup(Arc::new(ScriptedProvider { reply: Some("Hello!") })).await;

        let Json(response) = submit(&state, &handle, "hi").await.unwrap();

        assert_eq!(response.reply, Some(ChatMessage::assistant("Hello!")));
        assert_eq!(
            response.workspace.messages,
            vec![ChatMessage::user("hi"), ChatMessage::assistant("Hello!")]
        );
        assert_eq!(response.workspace.sessions[0].title, "hi");
        assert!(!response.workspace.is_loading);
    }

    #[tokio::test]
    async fn provider_outage_shows_fallback_in_workspace() {
        let (state, handle) = setup(Arc::new(ScriptedProvider { reply: None })).await;

        let Json(response) = submit(&state, &handle, "hi").await.unwrap();

        assert_eq!(response.workspace.messages[1].content, FALLBACK_TEXT);
    }

    #[tokio::test]
    async fn empty_submit_changes_nothing() {
        let (state, handle) = setup(Arc::new(ScriptedProvider { reply: Some("x") })).await;

        let Json(response) = submit(&state, &handle, "   ").await.unwrap();

        assert_eq!(response.reply, None);
        assert!(response.workspace.messages.is_empty());
    }

    #[tokio::test]
    async fn concurrent_submit_is_rejected_while_loading() {
        let gated = Arc::new(GatedProvider {
            entered: Notify::new(),
            release: Notify::new(),
        });
        let (state, handle) = setup(gated.clone()).await;

        let first = tokio::spawn({
            let state = state.clone();
            let handle = handle.clone();
            async move { submit(&state, &handle, "first").await }
        });
        gated.entered.notified().await;

        let Json(view) = get_workspace_handler(Extension(handle.clone())).await;
        assert!(view.is_loading);
        assert_eq!(view.messages, vec![ChatMessage::user("first")]);

        let second = submit(&state, &handle, "second").await;
        assert!(matches!(second, Err((StatusCode::CONFLICT, _))));

        gated.release.notify_one();
        let Json(done) = tokio::time::timeout(Duration::from_secs(5), first)
            .await
            .unwrap()
            .unwrap()
            .unwrap();
        assert_eq!(done.workspace.messages.len(), 2);
        assert!(!done.workspace.is_loading);
    }

    #[tokio::test]
    async fn dropped_request_still_records_reply_and_frees_controller() {
        let gated = Arc::new(GatedProvider {
            entered: Notify::new(),
            release: Notify::new(),
        });
        let (state, handle) = setup(gated.clone()).await;

        let request = tokio::spawn({
            let state = state.clone();
            let handle = handle.clone();
            async move { submit(&state, &handle, "first").await }
        });
        gated.entered.notified().await;
        request.abort();
        assert!(request.await.unwrap_err().is_cancelled());

        gated.release.notify_one();
        let settled = tokio::time::timeout(Duration::from_secs(5), async {
            loop {
                let Json(view) = get_workspace_handler(Extension(handle.clone())).await;
                if !view.is_loading {
                    return view;
                }
                tokio::task::yield_now().await;
            }
        })
        .await
        .unwrap();
        assert_eq!(
            settled.messages,
            vec![ChatMessage::user("first"), ChatMessage::assistant("finally")]
        );

        gated.release.notify_one();
        let Json(response) = submit(&state, &handle, "again").await.unwrap();
        assert_eq!(response.reply, Some(ChatMessage::assistant("finally")));
        assert_eq!(response.workspace.messages.len(), 4);
    }

    #[tokio::test]
    async fn session_routes_keep_one_session_alive() {
        let (_, handle) = setup(Arc::new(ScriptedProvider { reply: Some("x") })).await;

        let created = create_session_handler(Extension(handle.clone()))
            .await
            .unwrap()
            .into_response();
        assert_eq!(created.status(), StatusCode::CREATED);

        let Json(view) = get_workspace_handler(Extension(handle.clone())).await;
        assert_eq!(view.sessions.len(), 2);
        let older = view.sessions[1].id.clone();

        let Json(view) = select_session_handler(Extension(handle.clone()), Path(older.clone()))
            .await
            .unwrap();
        assert_eq!(view.active_session_id.as_deref(), Some(older.as_str()));

        for session in view.sessions {
            delete_session_handler(Extension(handle.clone()), Path(session.id))
                .await
                .unwrap();
        }
        let Json(view) = get_workspace_handler(Extension(handle.clone())).await;
        assert_eq!(view.sessions.len(), 1);

        let missing = delete_session_handler(Extension(handle.clone()), Path("nope".into())).await;
        assert!(matches!(missing, Err((StatusCode::NOT_FOUND, _))));
        let missing = select_session_handler(Extension(handle), Path("nope".into())).await;
        assert!(matches!(missing, Err((StatusCode::NOT_FOUND, _))));
    }

    #[tokio::test]
    async fn sidebar_routes_update_preference() {
        let (_, handle) = setup(Arc::new(ScriptedProvider { reply: Some("x") })).await;

        let Json(view) = set_sidebar_handler(
            Extension(handle.clone()),
            Json(SidebarRequest { open: false }),
        )
        .await
        .unwrap();
        assert!(!view.sidebar_open);

        let Json(view) = toggle_sidebar_handler(Extension(handle)).await.unwrap();
        assert!(view.sidebar_open);
    }

    #[test]
    fn not_found_maps_to_404() {
        let (status, _) = port_failure(PortError::NotFound("Session 1 not found".into()));
        assert_eq!(status, StatusCode::NOT_FOUND);
        let (status, _) = port_failure(PortError::Unexpected("disk full".into()));
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    }
}
