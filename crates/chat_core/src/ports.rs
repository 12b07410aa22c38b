//! crates/chat_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, keeping the core
//! independent of the model provider and of the storage backend.

use async_trait::async_trait;
use crate::domain::ChatMessage;

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (e.g., database, network).
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

/// Failures the chat gateway reports to its caller.
///
/// Provider failures never surface here: the gateway turns them into the
/// fallback reply instead.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GatewayError {
    #[error("No user message found")]
    NoUserMessage,
    #[error("Malformed chat request: {0}")]
    RequestMalformed(String),
}

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

#[async_trait]
pub trait ChatProvider: Send + Sync {
    /// Generates one complete reply for a single text prompt.
    async fn generate(&self, prompt: &str) -> PortResult<String>;

    /// The model the provider talks to, for logging.
    fn model(&self) -> &str;
}

#[async_trait]
pub trait ChatService: Send + Sync {
    /// Produces exactly one assistant message for a conversation.
    async fn reply(&self, messages: &[ChatMessage]) -> Result<ChatMessage, GatewayError>;
}

/// Durable string storage, shaped like browser local storage.
#[async_trait]
pub trait KeyValueStorage: Send + Sync {
    async fn get_item(&self, key: &str) -> PortResult<Option<String>>;

    async fn set_item(&self, key: &str, value: &str) -> PortResult<()>;
}
