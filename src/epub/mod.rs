/*!
 * EPUB container access.
 *
 * A `Book` is the ordered list of chapter documents plus the image items of
 * the manifest. Stores read and write books; `ZipBookStore` works on real
 * files and `MemoryBookStore` keeps books in memory for tests and dry runs.
 */

use parking_lot::Mutex;
use std::collections::HashMap;
use std::fmt::Debug;
use std::path::{Path, PathBuf};

use crate::errors::EpubError;

pub use self::opf::ManifestItem;
pub use self::zip_store::{ArchiveEntry, ZipBookStore};

pub mod opf;
pub mod zip_store;

/// One chapter document
#[derive(Debug, Clone, PartialEq)]
pub struct ChapterItem {
    /// Archive entry path
    pub path: String,
    /// Raw document bytes
    pub content: Vec<u8>,
}

impl ChapterItem {
    pub fn new(path: impl Into<String>, content: impl Into<Vec<u8>>) -> Self {
        Self {
            path: path.into(),
            content: content.into(),
        }
    }

    /// Content decoded as UTF-8, invalid sequences replaced
    pub fn html(&self) -> String {
        String::from_utf8_lossy(&self.content).into_owned()
    }

    pub fn set_html(&mut self, html: &str) {
        self.content = html.as_bytes().to_vec();
    }
}

/// Image item of the manifest
#[derive(Debug, Clone, PartialEq)]
pub struct ImageItem {
    /// Href as written in the manifest
    pub file_name: String,
    /// Archive entry path
    pub path: String,
}

impl ImageItem {
    pub fn new(file_name: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
            path: path.into(),
        }
    }
}

/// An opened book
#[derive(Debug, Clone, Default)]
pub struct Book {
    /// Chapter documents in manifest order
    pub chapters: Vec<ChapterItem>,
    pub images: Vec<ImageItem>,
    // @field: Raw archive entries when read from a zip file
    pub(crate) entries: Vec<ArchiveEntry>,
}

impl Book {
    pub fn new(chapters: Vec<ChapterItem>, images: Vec<ImageItem>) -> Self {
        Self {
            chapters,
            images,
            entries: Vec::new(),
        }
    }

    /// Chapter stored at `path`
    pub fn chapter(&self, path: &str) -> Option<&ChapterItem> {
        self.chapters.iter().find(|c| c.path == path)
    }

    pub fn chapter_count(&self) -> usize {
        self.chapters.len()
    }

    /// Number of archive entries; zero for books not read from a file
    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }
}

/// Reads and writes books
pub trait BookStore: Send + Sync + Debug {
    fn read(&self, path: &Path) -> Result<Book, EpubError>;

    fn write(&self, path: &Path, book: &Book) -> Result<(), EpubError>;
}

/// In-memory store keyed by path
#[derive(Debug, Default)]
pub struct MemoryBookStore {
    books: Mutex<HashMap<PathBuf, Book>>,
}

impl MemoryBookStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, path: impl Into<PathBuf>, book: Book) {
        self.books.lock().insert(path.into(), book);
    }

    pub fn get(&self, path: impl AsRef<Path>) -> Option<Book> {
        self.books.lock().get(path.as_ref()).cloned()
    }
}

impl BookStore for MemoryBookStore {
    fn read(&self, path: &Path) -> Result<Book, EpubError> {
        self.get(path)
            .ok_or_else(|| EpubError::MissingEntry(path.display().to_string()))
    }

    fn write(&self, path: &Path, book: &Book) -> Result<(), EpubError> {
        self.insert(path, book.clone());
        Ok(())
    }
}
