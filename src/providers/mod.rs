/*!
 * Provider implementations for chat-completion translation services.
 *
 * This module contains the client side of the translation oracle:
 * - `openai`: OpenAI-compatible chat completions (OpenAI, LM Studio, Ollama `/v1`)
 * - `mock`: scripted replies for tests
 */

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

use crate::errors::ProviderError;

/// Role of the system instruction message
pub const ROLE_SYSTEM: &str = "system";
/// Role of the message carrying the chunk to translate
pub const ROLE_USER: &str = "user";
/// Role providers normally answer with
pub const ROLE_ASSISTANT: &str = "assistant";

/// Chat message object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Role of the message sender (system, user or assistant)
    pub role: String,
    /// Content of the message
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(ROLE_SYSTEM, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(ROLE_USER, content)
    }
}

/// Chat completion request, serialized as the OpenAI wire body
#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    /// Model name to use for generation
    pub model: String,
    /// Sampling temperature
    pub temperature: f32,
    /// Messages of the conversation, oldest first
    pub messages: Vec<ChatMessage>,
    /// Always false, replies are read in one piece
    pub stream: bool,
}

impl ChatRequest {
    /// Create a non-streaming chat request
    pub fn new(model: impl Into<String>, temperature: f32, messages: Vec<ChatMessage>) -> Self {
        Self {
            model: model.into(),
            temperature,
            messages,
            stream: false,
        }
    }

    /// Content of the last user message, if any
    pub fn last_user_content(&self) -> Option<&str> {
        self.messages
            .iter()
            .rev()
            .find(|m| m.role == ROLE_USER)
            .map(|m| m.content.as_str())
    }
}

/// The single message a provider answers with
#[derive(Debug, Clone, PartialEq)]
pub struct ChatResponse {
    /// Reply message including the role the provider reported
    pub message: ChatMessage,
}

impl ChatResponse {
    pub fn new(role: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            message: ChatMessage::new(role, content),
        }
    }

    pub fn role(&self) -> &str {
        &self.message.role
    }

    pub fn content(&self) -> &str {
        &self.message.content
    }
}

/// Common trait for all chat providers
///
/// The trait is object safe so the translator can hold any provider behind
/// `Arc<dyn Provider>` and tests can swap in the mock.
#[async_trait]
pub trait Provider: Send + Sync + Debug {
    /// Complete a chat request
    ///
    /// # Arguments
    /// * `request` - Model, temperature and ordered messages
    ///
    /// # Returns
    /// * `Result<ChatResponse, ProviderError>` - The reply message or a transport/API error
    async fn complete(&self, request: ChatRequest) -> Result<ChatResponse, ProviderError>;

    /// Test the connection to the provider
    ///
    /// # Returns
    /// * `Result<(), ProviderError>` - Ok if the service answered
    async fn test_connection(&self, model: &str) -> Result<(), ProviderError>;
}

pub mod mock;
pub mod openai;
