/*!
 * Tests for application configuration functionality
 */

use yaetwai::app_config::{BookAction, Config, LogLevel, TranslationProvider};
use yaetwai::translation::chunker::DEFAULT_MAX_CHUNK_SIZE;

use crate::common;

/// Test default configuration values
#[test]
fn test_default_config_withNoParameters_shouldHaveCorrectDefaults() {
    let config = Config::default();

    assert_eq!(config.translation.provider, TranslationProvider::Ollama);
    assert_eq!(config.translation.get_endpoint(), "http://localhost:11434/v1");
    assert_eq!(config.translation.common.temperature, 1.1);
    assert_eq!(config.translation.common.retry_delay_ms, 10);
    assert_eq!(config.translation.common.max_image_retries, 5);
    assert_eq!(config.translation.common.max_wrapper_retries, None);
    assert_eq!(config.translation.common.max_chunk_size, DEFAULT_MAX_CHUNK_SIZE);
    assert_eq!(config.translation.common.checkpoint_dir, "checkpoint");
    assert_eq!(config.log_level, LogLevel::Info);

    // The sample book is present but never runs by itself
    assert_eq!(config.books.len(), 1);
    assert!(!config.books[0].run);
    assert!(config.validate().is_ok());
}

/// A missing config file is created with defaults
#[test]
fn test_loadOrCreate_withMissingFile_shouldWriteDefaults() {
    let temp_dir = common::create_temp_dir().unwrap();
    let path = temp_dir.path().join("conf.json");

    let config = Config::load_or_create(&path).unwrap();
    assert!(path.exists());

    let reloaded = Config::load_or_create(&path).unwrap();
    assert_eq!(reloaded.books.len(), config.books.len());
    assert_eq!(reloaded.translation.get_model(), config.translation.get_model());
}

/// Per-book keys are read the way they are written in the config file
#[test]
fn test_loadOrCreate_withBookSection_shouldParseAllKeys() {
    let temp_dir = common::create_temp_dir().unwrap();
    let path = temp_dir.path().join("conf.json");
    std::fs::write(
        &path,
        r#"{
            "books": [{
                "run": true,
                "action": "show_chapters",
                "input": "novel.epub",
                "continue": true,
                "test": 2,
                "from_chapter": 3,
                "to_chapter": 5,
                "from_lang": "English",
                "to_lang": "de",
                "promote": ["Translate.", "Keep tags."]
            }],
            "translation": {
                "provider": "lmstudio",
                "available_providers": [],
                "common": { "max_wrapper_retries": 4 }
            },
            "log_level": "debug"
        }"#,
    )
    .unwrap();

    let config = Config::load_or_create(&path).unwrap();
    let book = &config.books[0];

    assert_eq!(book.action().unwrap(), BookAction::ShowChapters);
    assert!(book.resume);
    assert_eq!(book.test, 2);
    assert!(book.chapter_range().contains(3));
    assert!(!book.chapter_range().contains(6));
    assert_eq!(book.system_prompt(), "Translate.\nKeep tags.");
    assert_eq!(book.output_path(), std::path::PathBuf::from("novel.de.epub"));

    assert_eq!(config.translation.provider, TranslationProvider::LMStudio);
    assert_eq!(config.translation.get_endpoint(), "http://localhost:1234/v1");
    assert_eq!(config.translation.common.max_wrapper_retries, Some(4));
    assert_eq!(config.translation.common.max_image_retries, 5);
    assert_eq!(config.log_level, LogLevel::Debug);
    assert!(config.validate().is_ok());
}

/// Runnable books are validated, others are not
#[test]
fn test_validate_withUnknownActionOnRunnableBook_shouldFail() {
    let temp_dir = common::create_temp_dir().unwrap();
    let mut config = common::test_config(temp_dir.path(), "a.epub", "");
    config.books[0].action = "translate_everything".to_string();
    assert!(config.validate().is_err());

    config.books[0].run = false;
    assert!(config.validate().is_ok());
}

/// OpenAI needs an API key
#[test]
fn test_validate_withOpenAiWithoutKey_shouldFail() {
    let mut config = Config::default();
    config.translation.provider = TranslationProvider::OpenAI;
    assert!(config.validate().is_err());

    for provider in config.translation.available_providers.iter_mut() {
        if provider.provider_type == "openai" {
            provider.api_key = "sk-test".to_string();
        }
    }
    assert!(config.validate().is_ok());
}

/// Books are selected by name or by their run flag
#[test]
fn test_selectedBooks_shouldMatchInputOrStem() {
    let temp_dir = common::create_temp_dir().unwrap();
    let mut config = common::test_config(temp_dir.path(), "books/first.epub", "");
    let mut second = config.books[0].clone();
    second.input = "books/second.epub".to_string();
    second.run = false;
    config.books.push(second);

    let runnable: Vec<&str> = config.selected_books(None).iter().map(|b| b.input.as_str()).collect();
    assert_eq!(runnable, vec!["books/first.epub"]);

    let named: Vec<&str> = config.selected_books(Some("second")).iter().map(|b| b.input.as_str()).collect();
    assert_eq!(named, vec!["books/second.epub"]);

    assert!(config.selected_books(Some("third")).is_empty());
}
