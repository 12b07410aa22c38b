//! services/api/src/adapters/gemini_llm.rs
//!
//! This module contains the adapter for the chat model.
//! It implements the `ChatProvider` port from the `core` crate by calling Gemini
//! through its OpenAI-compatible chat-completions endpoint.

use async_openai::{
    config::OpenAIConfig,
    error::OpenAIError,
    types::chat::{
        ChatCompletionRequestMessage, ChatCompletionRequestUserMessage,
        ChatCompletionRequestUserMessageContent, CreateChatCompletionRequest,
    },
    Client,
};
use async_trait::async_trait;
use chat_core::ports::{ChatProvider, PortError, PortResult};

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements `ChatProvider` using an OpenAI-compatible LLM.
#[derive(Clone)]
pub struct GeminiChatAdapter {
    client: Client<OpenAIConfig>,
    model: String,
}

impl GeminiChatAdapter {
    /// Creates a new `GeminiChatAdapter` from an already configured client.
    pub fn new(client: Client<OpenAIConfig>, model: String) -> Self {
        Self { client, model }
    }

    /// Creates a client pointed at `base_url` and wraps it.
    pub fn connect(api_key: &str, base_url: &str, model: String) -> Self {
        let config = OpenAIConfig::new()
            .with_api_key(api_key)
            .with_api_base(base_url);
        Self::new(Client::with_config(config), model)
    }

    /// The single-prompt request sent for every user turn.
    fn build_request(&self, prompt: &str) -> CreateChatCompletionRequest {
        CreateChatCompletionRequest {
            model: self.model.clone(),
            messages: vec![ChatCompletionRequestMessage::User(
                ChatCompletionRequestUserMessage {
                    content: ChatCompletionRequestUserMessageContent::Text(prompt.to_string()),
                    name: None,
                },
            )],
            ..Default::default()
        }
    }
}

//=========================================================================================
// `ChatProvider` Trait Implementation
//=========================================================================================

#[async_trait]
impl ChatProvider for GeminiChatAdapter {
    /// Generates a complete reply to a single user prompt; no history is sent.
    async fn generate(&self, prompt: &str) -> PortResult<String> {
        let request = self.build_request(prompt);

        // Call the API and manually map the error if it occurs, which respects the orphan rule.
        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e: OpenAIError| PortError::Unexpected(e.to_string()))?;

        // Extract the text content from the first choice in the response.
        if let Some(choice) = response.choices.into_iter().next() {
            if let Some(content) = choice.message.content {
                Ok(content)
            } else {
                Err(PortError::Unexpected(
                    "Chat model response contained no text content.".to_string(),
                ))
            }
        } else {
            Err(PortError::Unexpected(
                "Chat model returned no choices in its response.".to_string(),
            ))
        }
    }

    fn model(&self) -> &str {
        &self.model
    }
}
