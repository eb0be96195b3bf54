/*!
 * Chunk translation with structural retry.
 *
 * A chunk goes through `PREPARED -> SENT -> VALIDATING` and ends either
 * `ACCEPTED` or back in `SENT` after a short pause:
 * - chunks without visible text are accepted as-is, the provider is never called
 * - an image-count mismatch is retried up to `max_image_retries` times, then tolerated
 * - a reply that lost its `<div>` wrapper is always retried, unless a cap is set
 *
 * Provider errors are not retried here; the client already retried the transport.
 */

use log::{debug, warn};
use std::sync::Arc;
use std::time::Duration;

use crate::app_config::TranslationConfig;
use crate::errors::{ProviderError, TranslationError};
use crate::markup::classifier::TagClassifier;
use crate::providers::openai::OpenAI;
use crate::providers::{ChatMessage, ChatRequest, Provider};
use crate::validation::StructureValidator;

use super::window::ConversationWindow;

/// Knobs of the retry loop
#[derive(Debug, Clone)]
pub struct TranslatorSettings {
    /// Model name sent with every request
    pub model: String,
    /// Sampling temperature
    pub temperature: f32,
    /// Pause before resending a rejected reply
    pub retry_delay: Duration,
    /// Image-count mismatches retried before the reply is accepted anyway
    pub max_image_retries: u32,
    /// Wrapper mismatches retried before failing; `None` retries forever
    pub max_wrapper_retries: Option<u32>,
}

impl Default for TranslatorSettings {
    fn default() -> Self {
        Self {
            model: String::new(),
            temperature: 1.1,
            retry_delay: Duration::from_millis(10),
            max_image_retries: 5,
            max_wrapper_retries: None,
        }
    }
}

impl TranslatorSettings {
    pub fn from_config(config: &TranslationConfig) -> Self {
        Self {
            model: config.get_model(),
            temperature: config.common.temperature,
            retry_delay: Duration::from_millis(config.common.retry_delay_ms),
            max_image_retries: config.common.max_image_retries,
            max_wrapper_retries: config.common.max_wrapper_retries,
        }
    }
}

/// Result of translating one chunk
#[derive(Debug, Clone)]
pub struct ChunkOutcome {
    /// Translated chunk with the wrapper removed
    pub text: String,
    /// Window to pass to the next chunk
    pub window: ConversationWindow,
    /// Provider calls made for this chunk
    pub attempts: u32,
    /// Retries caused by image-count mismatches
    pub image_retries: u32,
    /// Retries caused by a missing wrapper
    pub wrapper_retries: u32,
}

impl ChunkOutcome {
    /// Whether the chunk was passed through without calling the provider
    pub fn skipped(&self) -> bool {
        self.attempts == 0
    }
}

/// Translates chunks through a provider, one at a time
#[derive(Debug, Clone)]
pub struct ChunkTranslator {
    // @field: Chat provider
    provider: Arc<dyn Provider>,
    // @field: Retry loop settings
    settings: TranslatorSettings,
    // @field: System instruction sent with every chunk
    system_prompt: String,
}

impl ChunkTranslator {
    pub fn new(provider: Arc<dyn Provider>, settings: TranslatorSettings, system_prompt: impl Into<String>) -> Self {
        Self {
            provider,
            settings,
            system_prompt: system_prompt.into(),
        }
    }

    /// Build the OpenAI-compatible client described by the config
    pub fn from_config(config: &TranslationConfig, system_prompt: impl Into<String>) -> Result<Self, ProviderError> {
        let client = OpenAI::new(config.get_endpoint(), config.get_api_key(), config.get_timeout_secs())?
            .with_retry(config.common.retry_count, config.common.retry_backoff_ms);

        debug!(
            "Using {} at {} with model {}",
            config.provider.display_name(),
            client.endpoint(),
            config.get_model()
        );

        Ok(Self::new(Arc::new(client), TranslatorSettings::from_config(config), system_prompt))
    }

    pub fn settings(&self) -> &TranslatorSettings {
        &self.settings
    }

    pub fn provider(&self) -> &Arc<dyn Provider> {
        &self.provider
    }

    /// Translate one chunk, taking the window by value and returning the next one
    ///
    /// # Arguments
    /// * `chunk` - Preprocessed chapter slice
    /// * `window` - Exchanges carried over from earlier chunks of the chapter
    ///
    /// # Returns
    /// * `ChunkOutcome` with the de-wrapped text and the advanced window
    pub async fn translate_chunk(
        &self,
        chunk: &str,
        window: ConversationWindow,
    ) -> Result<ChunkOutcome, TranslationError> {
        if !TagClassifier::has_visible_text(chunk) {
            debug!("Chunk has no visible text, passing through");
            return Ok(ChunkOutcome {
                text: chunk.to_string(),
                window,
                attempts: 0,
                image_retries: 0,
                wrapper_retries: 0,
            });
        }

        let wrapped = StructureValidator::wrap(chunk);
        let mut messages = window.messages().to_vec();
        messages.push(ChatMessage::system(self.system_prompt.as_str()));
        messages.push(ChatMessage::user(wrapped.as_str()));
        let request = ChatRequest::new(self.settings.model.as_str(), self.settings.temperature, messages);

        let mut attempts = 0u32;
        let mut image_retries = 0u32;
        let mut wrapper_retries = 0u32;

        loop {
            attempts += 1;
            let response = self.provider.complete(request.clone()).await?;
            let check = StructureValidator::validate(&wrapped, response.content());

            if !check.images_match() && image_retries < self.settings.max_image_retries {
                image_retries += 1;
                warn!(
                    "Image count changed ({} -> {}), retry {}/{}",
                    check.source_images, check.reply_images, image_retries, self.settings.max_image_retries
                );
                tokio::time::sleep(self.settings.retry_delay).await;
                continue;
            }

            if !check.wrapper_intact {
                wrapper_retries += 1;
                if let Some(cap) = self.settings.max_wrapper_retries {
                    if wrapper_retries > cap {
                        return Err(TranslationError::WrapperRetriesExhausted { attempts });
                    }
                }
                warn!("Reply lost its wrapper element, retry {}", wrapper_retries);
                tokio::time::sleep(self.settings.retry_delay).await;
                continue;
            }

            if !check.images_match() {
                warn!(
                    "Accepting reply with {} of {} images after {} retries",
                    check.reply_images, check.source_images, image_retries
                );
            }

            debug!("Chunk accepted after {} attempt(s)", attempts);
            return Ok(ChunkOutcome {
                text: StructureValidator::unwrap(response.content()),
                window: window.advance(response.role(), &wrapped),
                attempts,
                image_retries,
                wrapper_retries,
            });
        }
    }
}
