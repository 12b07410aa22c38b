//! services/api/src/web/chat.rs
//!
//! The chat gateway endpoint: a list of messages in, one assistant message out.

use crate::web::protocol::{ChatRequest, ErrorText};
use crate::web::state::AppState;
use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use chat_core::gateway::fallback_reply;
use chat_core::ports::GatewayError;
use chat_core::ChatMessage;
use std::sync::Arc;
use tracing::error;

/// Forward the latest user message to the model.
///
/// Provider failures still answer 200 with the fallback message.
#[utoipa::path(
    post,
    path = "/api/chat",
    request_body = ChatRequest,
    responses(
        (status = 200, description = "Assistant reply (or the fallback apology)", body = ChatMessage),
        (status = 400, description = "No user message in the request", body = ErrorText),
        (status = 500, description = "Request body could not be parsed", body = ChatMessage)
    )
)]
pub async fn chat_handler(State(state): State<Arc<AppState>>, body: Bytes) -> Response {
    let request = match serde_json::from_slice::<ChatRequest>(&body) {
        Ok(request) => request,
        Err(e) => return gateway_error_response(GatewayError::RequestMalformed(e.to_string())),
    };

    match state.chat.reply(&request.messages).await {
        Ok(reply) => (StatusCode::OK, Json(reply)).into_response(),
        Err(e) => gateway_error_response(e),
    }
}

/// Maps a gateway error to its HTTP response.
pub fn gateway_error_response(err: GatewayError) -> Response {
    match &err {
        GatewayError::NoUserMessage => (
            StatusCode::BAD_REQUEST,
            Json(ErrorText {
                text: err.to_string(),
            }),
        )
            .into_response(),
        GatewayError::RequestMalformed(detail) => {
            error!("Request processing error: {}", detail);
            (StatusCode::INTERNAL_SERVER_ERROR, Json(fallback_reply())).into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chat_core::gateway::{ChatGateway, FALLBACK_TEXT};
    use chat_core::ports::{ChatProvider, PortError, PortResult};
    use chat_core::storage::MemoryStorage;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingProvider {
        calls: AtomicUsize,
        fail: bool,
    }

    #[async_trait]
    impl ChatProvider for CountingProvider {
        async fn generate(&self, prompt: &str) -> PortResult<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                Err(PortError::Unexpected("503 from provider".to_string()))
            } else {
                Ok(format!("You said: {}", prompt))
            }
        }

        fn model(&self) -> &str {
            "counting"
        }
    }

    fn state_with(fail: bool) -> (Arc<CountingProvider>, Arc<AppState>) {
        let provider = Arc::new(CountingProvider {
            calls: AtomicUsize::new(0),
            fail,
        });
        let gateway = ChatGateway::new(provider.clone());
        let state = AppState::new(Arc::new(MemoryStorage::new()), Arc::new(gateway));
        (provider, Arc::new(state))
    }

    async fn call(state: Arc<AppState>, body: &str) -> (StatusCode, serde_json::Value) {
        let response = chat_handler(State(state), Bytes::from(body.to_string())).await;
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn replies_with_assistant_message() {
        let (_, state) = state_with(false);
        let (status, body) = call(state, r#"{"messages":[{"role":"user","content":"hi"}]}"#).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            serde_json::json!({"role": "assistant", "content": "You said: hi"})
        );
    }

    #[tokio::test]
    async fn missing_user_message_is_a_client_error() {
        let (provider, state) = state_with(false);
        let (status, body) = call(
            state,
            r#"{"messages":[{"role":"assistant","content":"How can I help?"}]}"#,
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, serde_json::json!({"text": "No user message found"}));
        assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn provider_failure_still_answers_ok_with_fallback() {
        let (_, state) = state_with(true);
        let (status, body) = call(state, r#"{"messages":[{"role":"user","content":"hi"}]}"#).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["content"], FALLBACK_TEXT);
    }

    #[tokio::test]
    async fn malformed_body_is_a_server_error_with_fallback() {
        let (provider, state) = state_with(false);
        let (status, body) = call(state, "{\"messages\": 42").await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["role"], "assistant");
        assert_eq!(body["content"], FALLBACK_TEXT);
        assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn unknown_role_is_treated_as_malformed() {
        let (provider, state) = state_with(false);
        let (status, body) = call(
            state,
            r#"{"messages":[{"role":"system","content":"be terse"},{"role":"user","content":"hi"}]}"#,
        )
        .await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["content"], FALLBACK_TEXT);
        assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
    }
}
