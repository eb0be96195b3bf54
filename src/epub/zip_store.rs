/*!
 * EPUB files on disk.
 *
 * Every archive entry is read with its compression method, timestamp and
 * permissions so the book can be written back unchanged apart from the
 * chapters that were replaced.
 */

use log::{debug, warn};
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::errors::EpubError;

use super::opf::{self, CONTAINER_PATH};
use super::{Book, BookStore, ChapterItem, ImageItem};

/// Entry that must come first and uncompressed
const MIMETYPE_ENTRY: &str = "mimetype";

/// Raw archive entry kept for rewriting
#[derive(Debug, Clone)]
pub struct ArchiveEntry {
    pub name: String,
    pub data: Vec<u8>,
    pub compression: CompressionMethod,
    pub last_modified: zip::DateTime,
    pub unix_mode: Option<u32>,
    pub is_dir: bool,
}

/// Reads and writes zip-packaged EPUB files
#[derive(Debug, Default, Clone)]
pub struct ZipBookStore;

impl ZipBookStore {
    pub fn new() -> Self {
        Self
    }

    fn read_entries(path: &Path) -> Result<Vec<ArchiveEntry>, EpubError> {
        let file = File::open(path)?;
        let mut archive = ZipArchive::new(file)?;
        let mut entries = Vec::with_capacity(archive.len());

        for i in 0..archive.len() {
            let mut entry = archive.by_index(i)?;
            let mut data = Vec::with_capacity(entry.size() as usize);
            entry.read_to_end(&mut data)?;
            entries.push(ArchiveEntry {
                name: entry.name().to_string(),
                data,
                compression: entry.compression(),
                last_modified: entry.last_modified().unwrap_or_default(),
                unix_mode: entry.unix_mode(),
                is_dir: entry.is_dir(),
            });
        }

        Ok(entries)
    }

    /// Locate the package document: container.xml first, any `.opf` otherwise
    fn package_path(entries: &[ArchiveEntry]) -> Result<String, EpubError> {
        if let Some(container) = entries.iter().find(|e| e.name == CONTAINER_PATH) {
            return opf::parse_container(&container.data);
        }

        warn!("{} not found, falling back to the first .opf entry", CONTAINER_PATH);
        entries
            .iter()
            .find(|e| e.name.to_ascii_lowercase().ends_with(".opf"))
            .map(|e| e.name.clone())
            .ok_or_else(|| EpubError::MissingEntry(CONTAINER_PATH.to_string()))
    }
}

impl BookStore for ZipBookStore {
    fn read(&self, path: &Path) -> Result<Book, EpubError> {
        let entries = Self::read_entries(path)?;
        let package_path = Self::package_path(&entries)?;
        let package = entries
            .iter()
            .find(|e| e.name == package_path)
            .ok_or_else(|| EpubError::MissingEntry(package_path.clone()))?;

        let base = opf::base_dir(&package_path);
        let mut chapters = Vec::new();
        let mut images = Vec::new();

        for item in opf::parse_manifest(&package.data)? {
            let entry_path = opf::resolve_href(base, &item.href);
            if item.is_chapter() {
                let entry = entries
                    .iter()
                    .find(|e| e.name == entry_path)
                    .ok_or_else(|| EpubError::MissingEntry(entry_path.clone()))?;
                chapters.push(ChapterItem::new(entry_path, entry.data.clone()));
            } else if item.is_image() {
                images.push(ImageItem::new(item.href.clone(), entry_path));
            }
        }

        debug!(
            "Read {:?}: {} entries, {} chapters, {} images",
            path,
            entries.len(),
            chapters.len(),
            images.len()
        );

        let mut book = Book::new(chapters, images);
        book.entries = entries;
        Ok(book)
    }

    fn write(&self, path: &Path, book: &Book) -> Result<(), EpubError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let file = File::create(path)?;
        let mut writer = ZipWriter::new(file);

        let ordered = book
            .entries
            .iter()
            .filter(|e| e.name == MIMETYPE_ENTRY)
            .chain(book.entries.iter().filter(|e| e.name != MIMETYPE_ENTRY));

        for entry in ordered {
            let compression = if entry.name == MIMETYPE_ENTRY {
                CompressionMethod::Stored
            } else {
                entry.compression
            };
            let mut options = SimpleFileOptions::default()
                .compression_method(compression)
                .last_modified_time(entry.last_modified);
            if let Some(mode) = entry.unix_mode {
                options = options.unix_permissions(mode);
            }

            if entry.is_dir || entry.name.ends_with('/') {
                writer.add_directory(entry.name.as_str(), options)?;
                continue;
            }

            let data = book
                .chapter(&entry.name)
                .map(|chapter| chapter.content.as_slice())
                .unwrap_or(entry.data.as_slice());
            writer.start_file(entry.name.as_str(), options)?;
            writer.write_all(data)?;
        }

        writer.finish()?;
        debug!("Wrote {:?} with {} entries", path, book.entries.len());
        Ok(())
    }
}
