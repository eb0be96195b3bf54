/*!
 * Integration tests for the chapter digest and image check actions
 */

use std::sync::Arc;

use yaetwai::app_config::BookAction;
use yaetwai::app_controller::{Controller, DIGEST_CHARS};
use yaetwai::epub::MemoryBookStore;
use yaetwai::providers::mock::MockProvider;

use crate::common;

fn zip_controller(temp_dir: &tempfile::TempDir) -> (Controller, yaetwai::BookConfig) {
    let input = common::create_sample_epub(temp_dir.path(), "sample.epub").unwrap();
    let config = common::test_config(temp_dir.path(), &input.to_string_lossy(), "");
    let book = config.books[0].clone();
    let controller = Controller::with_config(config)
        .with_provider(Arc::new(MockProvider::failing()))
        .with_progress(false);
    (controller, book)
}

/// Every chapter gets a numbered plain-text digest
#[test]
fn test_showChapters_withSampleBook_shouldDigestEachChapter() {
    let temp_dir = common::create_temp_dir().unwrap();
    let (controller, book) = zip_controller(&temp_dir);

    let digests = controller.show_chapters(&book).unwrap();

    assert_eq!(digests.len(), 2);
    assert_eq!(digests[0].number, 1);
    assert_eq!(digests[0].chars, common::CHAPTER_ONE.len());
    assert!(digests[0].text.contains("Chapter One"));
    assert!(digests[0].text.contains("Hello world."));
    assert!(digests[1].text.contains("Dr. Smith arrived."));
    assert!(digests.iter().all(|d| !d.text.lines().any(|line| line.trim().is_empty())));
}

/// Long chapters are cut to the digest size
#[test]
fn test_showChapters_withLongChapter_shouldLimitDigest() {
    let temp_dir = common::create_temp_dir().unwrap();
    let config = common::test_config(temp_dir.path(), "book.epub", "");
    let book = config.books[0].clone();

    let store = Arc::new(MemoryBookStore::new());
    let long = format!("<p>{}</p>", "word ".repeat(200));
    store.insert("book.epub", common::memory_book(&[long.as_str()]));

    let controller = Controller::with_store(config, store).with_progress(false);
    let digests = controller.show_chapters(&book).unwrap();

    assert!(digests[0].text.chars().count() <= DIGEST_CHARS);
    assert!(digests[0].text.starts_with("word word"));
}

/// Only images no chapter mentions are reported
#[test]
fn test_checkError_withOrphanImage_shouldReportIt() {
    let temp_dir = common::create_temp_dir().unwrap();
    let (controller, book) = zip_controller(&temp_dir);

    let unused = controller.check_error(&book).unwrap();
    assert_eq!(unused, vec!["Images/orphan.jpg".to_string()]);
}

/// The subcommand action overrides the configured one
#[tokio::test]
async fn test_run_withActionOverride_shouldNotTranslate() {
    let temp_dir = common::create_temp_dir().unwrap();
    let (controller, _) = zip_controller(&temp_dir);

    controller.run(None, Some(BookAction::ShowChapters)).await.unwrap();
    controller.run(Some("sample"), Some(BookAction::CheckError)).await.unwrap();
    assert!(!temp_dir.path().join("sample.fr.epub").exists());
}

/// An unrecognized action is fatal
#[tokio::test]
async fn test_run_withUnknownAction_shouldFail() {
    let temp_dir = common::create_temp_dir().unwrap();
    let mut config = common::test_config(temp_dir.path(), "book.epub", "");
    config.books[0].action = "publish".to_string();

    let controller = Controller::with_store(config, Arc::new(MemoryBookStore::new())).with_progress(false);
    let error = controller.run(None, None).await.unwrap_err();
    assert!(error.to_string().contains("Unknown action"));
}

/// Asking for a book that is not configured is an error
#[tokio::test]
async fn test_run_withUnknownBookName_shouldFail() {
    let temp_dir = common::create_temp_dir().unwrap();
    let (controller, _) = zip_controller(&temp_dir);
    assert!(controller.run(Some("missing"), None).await.is_err());
}

/// Reading a book that does not exist reports the path
#[test]
fn test_checkError_withMissingFile_shouldNameInput() {
    let temp_dir = common::create_temp_dir().unwrap();
    let config = common::test_config(temp_dir.path(), "nowhere.epub", "");
    let book = config.books[0].clone();

    let controller = Controller::with_config(config);
    let error = controller.check_error(&book).unwrap_err();
    assert!(error.to_string().contains("nowhere.epub"));
}
