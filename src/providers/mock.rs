/*!
 * Mock provider implementation for testing.
 *
 * This module provides a provider that answers without any network:
 * - `MockProvider::echo()` - replies with the user message unchanged
 * - `MockProvider::failing()` - always fails with an API error
 * - `with_replies(..)` - scripted replies served first, in order
 *
 * Every request is recorded so tests can inspect what was sent.
 */

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::errors::ProviderError;
use crate::providers::{ChatRequest, ChatResponse, Provider, ROLE_ASSISTANT};

/// Behavior once the scripted replies run out
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MockBehavior {
    /// Reply with the last user message
    Echo,
    /// Always fail with a server error
    Failing,
    /// Reply with an empty message
    Empty,
}

/// Mock provider for testing translation behavior
#[derive(Debug)]
pub struct MockProvider {
    /// Fallback behavior
    behavior: MockBehavior,
    /// Replies served before the fallback, front first
    replies: Arc<Mutex<VecDeque<String>>>,
    /// Every request received, in order
    requests: Arc<Mutex<Vec<ChatRequest>>>,
    /// Request counter shared between clones
    request_count: Arc<AtomicUsize>,
    /// Connection checks received, shared between clones
    connection_checks: Arc<AtomicUsize>,
    /// Role reported on replies
    reply_role: String,
    /// Custom transformation applied to the user message in echo mode
    custom_response: Option<fn(&str) -> String>,
}

impl MockProvider {
    /// Create a new mock provider with the specified behavior
    pub fn new(behavior: MockBehavior) -> Self {
        Self {
            behavior,
            replies: Arc::new(Mutex::new(VecDeque::new())),
            requests: Arc::new(Mutex::new(Vec::new())),
            request_count: Arc::new(AtomicUsize::new(0)),
            connection_checks: Arc::new(AtomicUsize::new(0)),
            reply_role: ROLE_ASSISTANT.to_string(),
            custom_response: None,
        }
    }

    /// Mock that echoes the user message back
    pub fn echo() -> Self {
        Self::new(MockBehavior::Echo)
    }

    /// Mock that always errors
    pub fn failing() -> Self {
        Self::new(MockBehavior::Failing)
    }

    /// Mock that answers with empty content
    pub fn empty() -> Self {
        Self::new(MockBehavior::Empty)
    }

    /// Queue scripted replies served before the fallback behavior
    pub fn with_replies<I, S>(self, replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.replies.lock().extend(replies.into_iter().map(Into::into));
        self
    }

    /// Set the role reported on replies
    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.reply_role = role.into();
        self
    }

    /// Transform the user message in echo mode
    pub fn with_custom_response(mut self, generator: fn(&str) -> String) -> Self {
        self.custom_response = Some(generator);
        self
    }

    /// Number of requests received so far
    pub fn request_count(&self) -> usize {
        self.request_count.load(Ordering::SeqCst)
    }

    /// Number of `test_connection` calls so far
    pub fn connection_checks(&self) -> usize {
        self.connection_checks.load(Ordering::SeqCst)
    }

    /// Copy of every request received so far
    pub fn requests(&self) -> Vec<ChatRequest> {
        self.requests.lock().clone()
    }
}

impl Clone for MockProvider {
    fn clone(&self) -> Self {
        Self {
            behavior: self.behavior,
            replies: Arc::clone(&self.replies),
            requests: Arc::clone(&self.requests),
            request_count: Arc::clone(&self.request_count),
            connection_checks: Arc::clone(&self.connection_checks),
            reply_role: self.reply_role.clone(),
            custom_response: self.custom_response,
        }
    }
}

#[async_trait]
impl Provider for MockProvider {
    async fn complete(&self, request: ChatRequest) -> Result<ChatResponse, ProviderError> {
        self.request_count.fetch_add(1, Ordering::SeqCst);
        let user_content = request.last_user_content().unwrap_or_default().to_string();
        self.requests.lock().push(request);

        if let Some(reply) = self.replies.lock().pop_front() {
            return Ok(ChatResponse::new(self.reply_role.clone(), reply));
        }

        match self.behavior {
            MockBehavior::Echo => {
                let text = match self.custom_response {
                    Some(generator) => generator(&user_content),
                    None => user_content,
                };
                Ok(ChatResponse::new(self.reply_role.clone(), text))
            }
            MockBehavior::Failing => Err(ProviderError::ApiError {
                message: "Simulated provider failure".to_string(),
                status_code: 500,
            }),
            MockBehavior::Empty => Ok(ChatResponse::new(self.reply_role.clone(), String::new())),
        }
    }

    async fn test_connection(&self, _model: &str) -> Result<(), ProviderError> {
        self.connection_checks.fetch_add(1, Ordering::SeqCst);
        match self.behavior {
            MockBehavior::Failing => Err(ProviderError::ConnectionError(
                "Simulated connection failure".to_string(),
            )),
            _ => Ok(()),
        }
    }
}
