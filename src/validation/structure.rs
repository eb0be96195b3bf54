/*!
 * Structural validation of translated chunks.
 *
 * Each chunk is sent wrapped in a synthetic `<div>` element. A reply is
 * structurally sound when it still starts and ends with that wrapper and
 * carries as many `<img>` tags as the source.
 */

use log::debug;

use crate::markup::classifier::TagClassifier;
use crate::markup::tokenizer::{segments, tokenize};

/// Opening tag of the synthetic wrapper
pub const WRAPPER_OPEN: &str = "<div>";
/// Closing tag of the synthetic wrapper
pub const WRAPPER_CLOSE: &str = "</div>";

/// Structure validation result
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructureValidationResult {
    /// Image tags in the wrapped source
    pub source_images: usize,
    /// Image tags in the reply
    pub reply_images: usize,
    /// Whether the reply's first and last tokens are the wrapper tags
    pub wrapper_intact: bool,
}

impl StructureValidationResult {
    pub fn images_match(&self) -> bool {
        self.source_images == self.reply_images
    }

    /// Check if validation passed (wrapper intact and image counts equal)
    pub fn passed(&self) -> bool {
        self.wrapper_intact && self.images_match()
    }
}

/// Structure validator for wrapped chunk replies
pub struct StructureValidator;

impl StructureValidator {
    /// Wrap a chunk for sending
    pub fn wrap(chunk: &str) -> String {
        let mut wrapped = String::with_capacity(chunk.len() + WRAPPER_OPEN.len() + WRAPPER_CLOSE.len());
        wrapped.push_str(WRAPPER_OPEN);
        wrapped.push_str(chunk);
        wrapped.push_str(WRAPPER_CLOSE);
        wrapped
    }

    /// Number of `<img>` tag tokens; images inside comments are not counted
    pub fn count_images(html: &str) -> usize {
        tokenize(html)
            .iter()
            .filter(|token| token.is_tag() && TagClassifier::is_image_tag(token.text()))
            .count()
    }

    /// Whether the first token is exactly `<div>` and the last exactly `</div>`
    pub fn has_wrapper(reply: &str) -> bool {
        let tokens = tokenize(reply);
        match (tokens.first(), tokens.last()) {
            (Some(first), Some(last)) if tokens.len() >= 2 => {
                first.text() == WRAPPER_OPEN && last.text() == WRAPPER_CLOSE
            }
            _ => false,
        }
    }

    /// Compare a reply against the wrapped source it answers
    ///
    /// # Arguments
    /// * `wrapped_source` - The chunk as sent, wrapper included
    /// * `reply` - The provider's reply
    pub fn validate(wrapped_source: &str, reply: &str) -> StructureValidationResult {
        let result = StructureValidationResult {
            source_images: Self::count_images(wrapped_source),
            reply_images: Self::count_images(reply),
            wrapper_intact: Self::has_wrapper(reply),
        };

        if !result.passed() {
            debug!(
                "Structure check failed: images {}/{}, wrapper intact: {}",
                result.reply_images, result.source_images, result.wrapper_intact
            );
        }

        result
    }

    /// Remove the wrapper from a validated reply.
    ///
    /// Whitespace outside the wrapper is dropped, everything between the
    /// wrapper tags is returned verbatim.
    pub fn unwrap(reply: &str) -> String {
        let parts = segments(reply);
        let first = parts.iter().position(|segment| !segment.trim().is_empty());
        let last = parts.iter().rposition(|segment| !segment.trim().is_empty());

        match (first, last) {
            (Some(first), Some(last)) if first < last => parts[first + 1..last].concat(),
            _ => String::new(),
        }
    }
}
