//! crates/chat_core/src/gateway.rs
//!
//! The chat gateway: takes a conversation, forwards its latest user message to the
//! model provider and returns exactly one assistant message.
//!
//! Only the latest user message is sent; earlier turns are not forwarded. Any
//! provider failure is converted into [`fallback_reply`], so callers always get a
//! well-formed message.

use crate::domain::ChatMessage;
use crate::ports::{ChatProvider, ChatService, GatewayError, PortError, PortResult};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

/// The apology shown whenever a reply could not be produced.
pub const FALLBACK_TEXT: &str = "Oppsss something went wrong🥲";

/// The single error-to-message mapping shared by every layer.
pub fn fallback_reply() -> ChatMessage {
    ChatMessage::assistant(FALLBACK_TEXT)
}

/// The last user-authored message by position, ignoring any assistant turns after it.
pub fn last_user_message(messages: &[ChatMessage]) -> Option<&ChatMessage> {
    messages.iter().rev().find(|m| m.is_user())
}

#[derive(Clone)]
pub struct ChatGateway {
    provider: Arc<dyn ChatProvider>,
    timeout: Option<Duration>,
}

impl ChatGateway {
    pub fn new(provider: Arc<dyn ChatProvider>) -> Self {
        Self {
            provider,
            timeout: None,
        }
    }

    /// Bounds every provider call; an expired call counts as a provider failure.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    async fn generate(&self, prompt: &str) -> PortResult<String> {
        match self.timeout {
            Some(limit) => tokio::time::timeout(limit, self.provider.generate(prompt))
                .await
                .map_err(|_| {
                    PortError::Unexpected(format!("provider timed out after {:?}", limit))
                })?,
            None => self.provider.generate(prompt).await,
        }
    }
}

#[async_trait]
impl ChatService for ChatGateway {
    async fn reply(&self, messages: &[ChatMessage]) -> Result<ChatMessage, GatewayError> {
        let prompt = last_user_message(messages).ok_or(GatewayError::NoUserMessage)?;

        info!(
            "Forwarding user message ({} chars) to model {}",
            prompt.content.chars().count(),
            self.provider.model()
        );
        match self.generate(&prompt.content).await {
            Ok(text) => Ok(ChatMessage::assistant(text)),
            Err(e) => {
                error!("Provider call failed: {}", e);
                Ok(fallback_reply())
            }
        }
    }
}
