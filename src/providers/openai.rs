/*!
 * OpenAI-compatible chat completions client.
 *
 * Talks to any server exposing `POST {endpoint}/chat/completions`: OpenAI
 * itself, LM Studio and Ollama's `/v1` compatibility layer.
 */

use async_trait::async_trait;
use log::{debug, error, warn};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::time::Duration;
use url::Url;

use crate::errors::ProviderError;
use crate::providers::{ChatMessage, ChatRequest, ChatResponse, Provider, ROLE_ASSISTANT};

/// OpenAI-compatible client
#[derive(Debug)]
pub struct OpenAI {
    /// HTTP client for API requests
    client: Client,
    /// API key for bearer authentication, empty for local servers
    api_key: String,
    /// Base URL, without trailing slash
    endpoint: String,
    /// Maximum number of retry attempts on transport and 5xx failures
    max_retries: u32,
    /// Base backoff time in milliseconds, doubled after every attempt
    backoff_base_ms: u64,
}

/// Completion body returned by the API
#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<CompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    message: CompletionMessage,
}

/// Reply message; some local servers leave out the role
#[derive(Debug, Deserialize)]
struct CompletionMessage {
    #[serde(default)]
    role: Option<String>,
    #[serde(default)]
    content: Option<String>,
}

impl OpenAI {
    /// Create a new client
    ///
    /// # Arguments
    /// * `endpoint` - Base URL such as `https://api.openai.com/v1`
    /// * `api_key` - Bearer token, may be empty
    /// * `timeout_secs` - Per-request timeout
    pub fn new(
        endpoint: impl AsRef<str>,
        api_key: impl Into<String>,
        timeout_secs: u64,
    ) -> Result<Self, ProviderError> {
        let endpoint = endpoint.as_ref().trim();
        let parsed = Url::parse(endpoint)
            .map_err(|e| ProviderError::ConnectionError(format!("Invalid endpoint '{}': {}", endpoint, e)))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ProviderError::ConnectionError(format!(
                "Unsupported endpoint scheme '{}' in {}",
                parsed.scheme(),
                endpoint
            )));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs.max(1)))
            .build()
            .map_err(|e| ProviderError::ConnectionError(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_key: api_key.into(),
            endpoint: endpoint.trim_end_matches('/').to_string(),
            max_retries: 3,
            backoff_base_ms: 1000,
        })
    }

    /// Set transport retry behaviour
    pub fn with_retry(mut self, max_retries: u32, backoff_base_ms: u64) -> Self {
        self.max_retries = max_retries;
        self.backoff_base_ms = backoff_base_ms;
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.endpoint)
    }

    /// Send one request without retrying
    async fn send_once(&self, request: &ChatRequest) -> Result<ChatResponse, ProviderError> {
        let mut builder = self.client.post(self.completions_url()).json(request);
        if !self.api_key.is_empty() {
            builder = builder.bearer_auth(&self.api_key);
        }

        let response = builder.send().await.map_err(|e| {
            if e.is_connect() || e.is_timeout() {
                ProviderError::ConnectionError(e.to_string())
            } else {
                ProviderError::RequestFailed(e.to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to get error response text".to_string());
            if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
                return Err(ProviderError::AuthenticationError(message));
            }
            return Err(ProviderError::ApiError {
                status_code: status.as_u16(),
                message,
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| ProviderError::RequestFailed(e.to_string()))?;
        parse_completion(&body)
    }
}

/// Extract the first choice of a completion body
fn parse_completion(body: &str) -> Result<ChatResponse, ProviderError> {
    let parsed: CompletionResponse = serde_json::from_str(body).map_err(|e| {
        let preview: String = body.chars().take(500).collect();
        ProviderError::ParseError(format!("{} (body: {})", e, preview))
    })?;

    let choice = parsed
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| ProviderError::ParseError("Response contains no choices".to_string()))?;

    Ok(ChatResponse {
        message: ChatMessage::new(
            choice.message.role.unwrap_or_else(|| ROLE_ASSISTANT.to_string()),
            choice.message.content.unwrap_or_default(),
        ),
    })
}

/// Whether a failure is worth another attempt
fn is_retryable(error: &ProviderError) -> bool {
    match error {
        ProviderError::ConnectionError(_) | ProviderError::RequestFailed(_) => true,
        ProviderError::ApiError { status_code, .. } => *status_code >= 500,
        ProviderError::ParseError(_) | ProviderError::AuthenticationError(_) => false,
    }
}

#[async_trait]
impl Provider for OpenAI {
    async fn complete(&self, request: ChatRequest) -> Result<ChatResponse, ProviderError> {
        let mut attempt = 0;

        loop {
            debug!(
                "Chat request to {} ({} messages, attempt {}/{})",
                self.completions_url(),
                request.messages.len(),
                attempt + 1,
                self.max_retries + 1
            );

            match self.send_once(&request).await {
                Ok(response) => return Ok(response),
                Err(e) if is_retryable(&e) && attempt < self.max_retries => {
                    warn!("Chat request failed: {} - attempt {}/{}", e, attempt + 1, self.max_retries + 1);
                    let backoff_ms = self.backoff_base_ms.saturating_mul(1u64 << attempt.min(16));
                    tokio::time::sleep(Duration::from_millis(backoff_ms)).await;
                    attempt += 1;
                }
                Err(e) => {
                    error!("Chat request failed: {}", e);
                    return Err(e);
                }
            }
        }
    }

    async fn test_connection(&self, model: &str) -> Result<(), ProviderError> {
        let request = ChatRequest::new(model, 0.0, vec![ChatMessage::user("Hello")]);
        self.send_once(&request).await.map(|_| ())
    }
}
