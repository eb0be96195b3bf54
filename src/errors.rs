/*!
 * Error types for the yaetwai application.
 *
 * This module contains custom error types for different parts of the application,
 * using the thiserror crate for ergonomic error definitions.
 */

use thiserror::Error;

/// Errors that can occur when working with provider APIs
#[derive(Error, Debug)]
pub enum ProviderError {
    /// Error when making an API request fails
    #[error("API request failed: {0}")]
    RequestFailed(String),

    /// Error when parsing an API response fails
    #[error("Failed to parse API response: {0}")]
    ParseError(String),

    /// Error returned by the API itself
    #[error("API responded with error: {status_code} - {message}")]
    ApiError {
        /// HTTP status code
        status_code: u16,
        /// Error message from the API
        message: String
    },

    /// Error establishing or maintaining a connection
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// Error with authentication
    #[error("Authentication error: {0}")]
    AuthenticationError(String),
}

/// Errors raised by the chunker when its output breaks an invariant.
///
/// Both variants indicate a splitter bug rather than bad input and are never retried.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ChunkingError {
    /// Joined chunks no longer reproduce the chapter content
    #[error("Chunk round-trip mismatch: content has {expected} chars, chunks join to {actual}")]
    RoundTrip {
        expected: usize,
        actual: usize,
    },

    /// A chunk is larger than twice the configured maximum
    #[error("Chunk {index} is {size} chars, above the {limit} char guard")]
    OversizedChunk {
        index: usize,
        size: usize,
        limit: usize,
    },
}

/// Errors that can occur during translation
#[derive(Error, Debug)]
pub enum TranslationError {
    /// Error from the provider API
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// The reply kept losing its wrapper element past the configured cap
    #[error("Wrapper tags missing from reply after {attempts} attempts")]
    WrapperRetriesExhausted {
        attempts: u32,
    },
}

/// Errors from reading or writing the EPUB container
#[derive(Error, Debug)]
pub enum EpubError {
    /// Error from the zip layer
    #[error("Archive error: {0}")]
    Archive(String),

    /// Malformed container.xml or package document
    #[error("XML error: {0}")]
    Xml(String),

    /// Required entry not present in the archive
    #[error("Missing entry: {0}")]
    MissingEntry(String),

    /// I/O failure on the container file
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<zip::result::ZipError> for EpubError {
    fn from(error: zip::result::ZipError) -> Self {
        Self::Archive(error.to_string())
    }
}

impl From<quick_xml::Error> for EpubError {
    fn from(error: quick_xml::Error) -> Self {
        Self::Xml(error.to_string())
    }
}

impl From<quick_xml::events::attributes::AttrError> for EpubError {
    fn from(error: quick_xml::events::attributes::AttrError) -> Self {
        Self::Xml(error.to_string())
    }
}

/// Main application error type that wraps all other errors
#[derive(Error, Debug)]
pub enum AppError {
    /// Error from a file operation
    #[error("File error: {0}")]
    File(String),

    /// Invalid or inconsistent configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Error from a provider
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// Error from translation
    #[error("Translation error: {0}")]
    Translation(#[from] TranslationError),

    /// Error from the container layer
    #[error("EPUB error: {0}")]
    Epub(#[from] EpubError),

    /// Any other error
    #[error("Unknown error: {0}")]
    Unknown(String),
}

// Utility functions for error conversion
impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        Self::Unknown(error.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(error: std::io::Error) -> Self {
        Self::File(error.to_string())
    }
}
