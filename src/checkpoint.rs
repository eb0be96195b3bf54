/*!
 * Checkpoint records and translated chapter files.
 *
 * One JSON record per (book, source language, target language) marks the
 * last translated chunk and keeps the translations of the chapter in
 * progress. Finished chapters are also written as standalone HTML files in
 * the same directory.
 */

use anyhow::{Context, Result};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::file_utils::FileManager;

/// Last completed position of a book translation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CheckpointRecord {
    /// 1-based chapter number
    pub chapter: usize,
    /// 0-based index of the last translated chunk in that chapter
    pub chunk: usize,
    /// Translations of chunks `0..=chunk`
    #[serde(default)]
    pub chunks: Vec<String>,
}

/// Where a chapter picks up on a resumed run
#[derive(Debug, Clone, PartialEq)]
pub enum ResumePoint {
    /// Translate from the first chunk
    Fresh,
    /// Reuse these chunk translations and continue after them
    Chunks(Vec<String>),
    /// The chapter was finished earlier; reuse its HTML
    Chapter(String),
}

/// File layout for one book and language pair
#[derive(Debug, Clone)]
pub struct CheckpointStore {
    // @field: Directory holding records and chapter files
    dir: PathBuf,
    // @field: `<stem>_<from>_<to>` with lowercased languages
    prefix: String,
}

impl CheckpointStore {
    /// Create a store keyed by the input's file stem and the language pair
    pub fn new<P: AsRef<Path>>(dir: P, input: &str, from_lang: &str, to_lang: &str) -> Self {
        let stem = Path::new(input)
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| "book".to_string());

        Self {
            dir: dir.as_ref().to_path_buf(),
            prefix: format!("{}_{}_{}", stem, from_lang.to_lowercase(), to_lang.to_lowercase()),
        }
    }

    /// `<dir>/<stem>_<from>_<to>.json`
    pub fn record_path(&self) -> PathBuf {
        self.dir.join(format!("{}.json", self.prefix))
    }

    /// `<dir>/<stem>_<from>_<to>_cha<N>.html`
    pub fn chapter_path(&self, chapter: usize) -> PathBuf {
        self.dir.join(format!("{}_cha{}.html", self.prefix, chapter))
    }

    /// Read the record; a missing file means no checkpoint
    pub fn read(&self) -> Result<Option<CheckpointRecord>> {
        let path = self.record_path();
        if !FileManager::file_exists(&path) {
            return Ok(None);
        }

        let content = FileManager::read_to_string(&path)?;
        let record: CheckpointRecord = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse checkpoint record: {:?}", path))?;
        Ok(Some(record))
    }

    /// Replace the record on disk
    pub fn write(&self, record: &CheckpointRecord) -> Result<()> {
        let json = serde_json::to_string_pretty(record)
            .context("Failed to serialize checkpoint record")?;
        FileManager::write_atomic(self.record_path(), &json)?;
        debug!("Checkpoint: chapter {} chunk {}", record.chapter, record.chunk);
        Ok(())
    }

    /// Write a finished chapter's HTML and return its path
    pub fn write_chapter(&self, chapter: usize, html: &str) -> Result<PathBuf> {
        let path = self.chapter_path(chapter);
        FileManager::write_to_file(&path, html)?;
        info!("Wrote chapter {} to {:?}", chapter, path);
        Ok(path)
    }

    /// Read a finished chapter's HTML if it was written before
    pub fn read_chapter(&self, chapter: usize) -> Result<Option<String>> {
        let path = self.chapter_path(chapter);
        if !FileManager::file_exists(&path) {
            return Ok(None);
        }
        FileManager::read_to_string(&path).map(Some)
    }

    /// Decide where chapter `chapter` with `chunk_count` chunks starts.
    ///
    /// Saved chunks are reused only when the record points at this chapter
    /// and is internally consistent. A record pointing at a later chapter
    /// means this one finished, so its chapter file is reused if present.
    pub fn resume_point(&self, chapter: usize, chunk_count: usize) -> Result<ResumePoint> {
        let Some(record) = self.read()? else {
            return Ok(ResumePoint::Fresh);
        };

        if record.chapter == chapter {
            let saved = record.chunks.len();
            if saved == record.chunk + 1 && saved <= chunk_count {
                info!("Resuming chapter {} after chunk {}/{}", chapter, saved, chunk_count);
                return Ok(ResumePoint::Chunks(record.chunks));
            }
            debug!(
                "Ignoring checkpoint for chapter {}: {} saved chunks, index {}, {} chunks now",
                chapter, saved, record.chunk, chunk_count
            );
        } else if record.chapter > chapter {
            if let Some(html) = self.read_chapter(chapter)? {
                info!("Reusing finished chapter {} from {:?}", chapter, self.chapter_path(chapter));
                return Ok(ResumePoint::Chapter(html));
            }
        }

        Ok(ResumePoint::Fresh)
    }
}
