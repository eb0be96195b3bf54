/*!
 * Tests for error types and conversions
 */

use yaetwai::{AppError, ChunkingError, EpubError, ProviderError, TranslationError};

/// Provider errors carry status and message
#[test]
fn test_providerError_display_shouldIncludeStatus() {
    let error = ProviderError::ApiError {
        status_code: 429,
        message: "Too many requests".to_string(),
    };
    assert_eq!(error.to_string(), "API responded with error: 429 - Too many requests");
}

/// Errors convert upward through the layers
#[test]
fn test_errorConversion_shouldWrapLowerLayers() {
    let translation: TranslationError = ProviderError::ConnectionError("refused".to_string()).into();
    assert!(matches!(translation, TranslationError::Provider(_)));

    let chunking = ChunkingError::RoundTrip { expected: 10, actual: 9 };
    assert!(chunking.to_string().contains("10 chars"));

    let app: AppError = EpubError::MissingEntry("OEBPS/content.opf".to_string()).into();
    assert_eq!(app.to_string(), "EPUB error: Missing entry: OEBPS/content.opf");

    let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
    let app: AppError = io.into();
    assert!(matches!(app, AppError::File(_)));
}

/// The wrapper cap error names the attempt count
#[test]
fn test_wrapperRetriesExhausted_display_shouldNameAttempts() {
    let error = TranslationError::WrapperRetriesExhausted { attempts: 4 };
    assert_eq!(error.to_string(), "Wrapper tags missing from reply after 4 attempts");
}
