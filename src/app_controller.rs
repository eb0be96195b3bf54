use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, error, info, warn};
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::app_config::{BookAction, BookConfig, Config};
use crate::checkpoint::{CheckpointRecord, CheckpointStore, ResumePoint};
use crate::epub::{Book, BookStore, ZipBookStore};
use crate::markup::{repair_document_tail, strip_cosmetic_tags};
use crate::providers::Provider;
use crate::translation::{
    ChunkOutcome, ChunkTranslator, Chunker, ConversationWindow, TranslatorSettings, check_chunk_sizes,
    truncate_for_test,
};

// @module: Application controller for book processing

/// Characters of plain text shown per chapter by `show_chapters`
pub const DIGEST_CHARS: usize = 250;

/// Line width used when rendering chapters to plain text
const DIGEST_WIDTH: usize = 10_000;

/// Plain-text summary of one chapter
#[derive(Debug, Clone, PartialEq)]
pub struct ChapterDigest {
    /// 1-based chapter number
    pub number: usize,
    /// Size of the chapter document in bytes
    pub chars: usize,
    pub text: String,
}

/// Counters collected while translating a book
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BookSummary {
    pub chapters_translated: usize,
    pub chapters_skipped: usize,
    pub chapters_reused: usize,
    pub chunks_translated: usize,
    pub chunks_passed_through: usize,
    pub chunks_resumed: usize,
    pub image_retries: u32,
    pub wrapper_retries: u32,
}

impl BookSummary {
    fn record(&mut self, outcome: &ChunkOutcome) {
        if outcome.skipped() {
            self.chunks_passed_through += 1;
        } else {
            self.chunks_translated += 1;
        }
        self.image_retries += outcome.image_retries;
        self.wrapper_retries += outcome.wrapper_retries;
    }
}

/// Main application controller
#[derive(Debug)]
pub struct Controller {
    // @field: App configuration
    config: Config,
    // @field: Container reader/writer
    store: Arc<dyn BookStore>,
    // @field: Provider replacing the configured client, used by tests
    provider: Option<Arc<dyn Provider>>,
    // @field: Draw per-chapter progress bars
    show_progress: bool,
}

impl Controller {
    /// Controller over zip files on disk
    pub fn with_config(config: Config) -> Self {
        Self::with_store(config, Arc::new(ZipBookStore::new()))
    }

    // @method: Controller over a custom container store
    pub fn with_store(config: Config, store: Arc<dyn BookStore>) -> Self {
        Self {
            config,
            store,
            provider: None,
            show_progress: true,
        }
    }

    /// Use this provider instead of building one from the config
    pub fn with_provider(mut self, provider: Arc<dyn Provider>) -> Self {
        self.provider = Some(provider);
        self
    }

    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Run the selected books.
    ///
    /// # Arguments
    /// * `book_name` - Input path or stem of one book; `None` runs every book with `run: true`
    /// * `action` - Overrides each book's configured action
    pub async fn run(&self, book_name: Option<&str>, action: Option<BookAction>) -> Result<()> {
        let books = self.config.selected_books(book_name);
        if books.is_empty() {
            match book_name {
                Some(name) => return Err(anyhow::anyhow!("No book named {} in the configuration", name)),
                None => {
                    warn!("No book has run enabled, nothing to do");
                    return Ok(());
                }
            }
        }

        for book in books {
            let action = match action {
                Some(action) => action,
                None => book.action()?,
            };
            self.run_book(book, action).await?;
        }

        Ok(())
    }

    /// Dispatch one book to its action
    pub async fn run_book(&self, book: &BookConfig, action: BookAction) -> Result<()> {
        info!("{}: {}", action, book.input);
        let start_time = Instant::now();

        match action {
            BookAction::Translate => {
                let summary = self.translate_book(book).await?;
                info!(
                    "Translated {} chapter(s), {} chunk(s), {} resumed, {} passed through",
                    summary.chapters_translated,
                    summary.chunks_translated,
                    summary.chunks_resumed,
                    summary.chunks_passed_through
                );
                if summary.image_retries > 0 || summary.wrapper_retries > 0 {
                    warn!(
                        "Structural retries: {} image, {} wrapper",
                        summary.image_retries, summary.wrapper_retries
                    );
                }
            }
            BookAction::ShowChapters => {
                self.show_chapters(book)?;
            }
            BookAction::CheckError => {
                let unused = self.check_error(book)?;
                if unused.is_empty() {
                    info!("Every image is referenced by a chapter");
                }
            }
        }

        info!("Done in {}", Self::format_duration(start_time.elapsed()));
        Ok(())
    }

    /// Translate every chapter in range and write the output container.
    ///
    /// Chapters are processed in order; each translated chunk is checkpointed
    /// and each finished chapter is also written as a standalone HTML file.
    pub async fn translate_book(&self, book: &BookConfig) -> Result<BookSummary> {
        let input = Path::new(&book.input);
        let mut document = self
            .store
            .read(input)
            .with_context(|| format!("Failed to read book: {}", book.input))?;

        let range = book.chapter_range();
        let total = document.chapter_count();

        let translator = self.translator_for(book)?;
        if (1..=total).any(|number| range.contains(number)) {
            if let Err(e) = translator.provider().test_connection(&translator.settings().model).await {
                warn!("Provider connection test failed: {}", e);
            }
        } else {
            info!("No chapter of {} falls in the configured range", book.input);
        }

        let common = &self.config.translation.common;
        let chunker = Chunker::new(common.max_chunk_size);
        let checkpoints = CheckpointStore::new(&common.checkpoint_dir, &book.input, &book.from_lang, &book.to_lang);
        let mut summary = BookSummary::default();

        info!(
            "Translating {} chapter(s) of {} from {} to {} with {}",
            total,
            book.input,
            book.from_lang,
            book.to_lang,
            translator.settings().model
        );

        for (index, chapter) in document.chapters.iter_mut().enumerate() {
            let number = index + 1;
            if !range.contains(number) {
                debug!("Chapter {}/{} outside range, passing through", number, total);
                summary.chapters_skipped += 1;
                continue;
            }

            let raw = chapter.html();
            let translated = self
                .translate_chapter(&translator, &chunker, &checkpoints, book, number, total, &raw, &mut summary)
                .await
                .with_context(|| format!("Failed to translate chapter {} ({})", number, chapter.path))?;

            let repaired = repair_document_tail(&raw, &translated);
            chapter.set_html(&repaired);
            checkpoints.write_chapter(number, &repaired)?;
            summary.chapters_translated += 1;
        }

        let output = book.output_path();
        self.store
            .write(&output, &document)
            .with_context(|| format!("Failed to write book: {}", output.display()))?;
        info!("Success: {}", output.display());

        Ok(summary)
    }

    #[allow(clippy::too_many_arguments)]
    async fn translate_chapter(
        &self,
        translator: &ChunkTranslator,
        chunker: &Chunker,
        checkpoints: &CheckpointStore,
        book: &BookConfig,
        number: usize,
        total: usize,
        raw: &str,
        summary: &mut BookSummary,
    ) -> Result<String> {
        let content = strip_cosmetic_tags(raw);
        let chunks = chunker.chunk(&content)?;
        check_chunk_sizes(&chunks, chunker.max_chunk_size())?;
        let chunks = truncate_for_test(chunks, book.test);

        let mut translated: Vec<String> = Vec::with_capacity(chunks.len());
        if book.resume {
            match checkpoints.resume_point(number, chunks.len())? {
                ResumePoint::Chapter(html) => {
                    summary.chapters_reused += 1;
                    return Ok(html);
                }
                ResumePoint::Chunks(saved) => {
                    summary.chunks_resumed += saved.len();
                    translated = saved;
                }
                ResumePoint::Fresh => {}
            }
        }

        info!(
            "Chapter {}/{}: {} chunk(s), {} chars",
            number,
            total,
            chunks.len(),
            content.chars().count()
        );

        let progress = self.progress_bar(chunks.len(), number, total);
        progress.set_position(translated.len() as u64);

        let mut window = ConversationWindow::new();
        for (index, chunk) in chunks.iter().enumerate().skip(translated.len()) {
            let outcome = translator
                .translate_chunk(chunk, window)
                .await
                .with_context(|| format!("Chunk {}/{}", index + 1, chunks.len()))?;

            summary.record(&outcome);
            window = outcome.window;
            translated.push(outcome.text);

            checkpoints.write(&CheckpointRecord {
                chapter: number,
                chunk: index,
                chunks: translated.clone(),
            })?;
            progress.inc(1);
        }

        progress.finish_and_clear();
        Ok(translated.concat())
    }

    /// Log and return a plain-text digest of every chapter
    pub fn show_chapters(&self, book: &BookConfig) -> Result<Vec<ChapterDigest>> {
        let document = self.read_book(book)?;
        let total = document.chapter_count();
        let mut digests = Vec::with_capacity(total);

        for (index, chapter) in document.chapters.iter().enumerate() {
            let number = index + 1;
            let text = match html2text::from_read(chapter.content.as_slice(), DIGEST_WIDTH) {
                Ok(text) => Self::digest(&text),
                Err(e) => {
                    warn!("Chapter {} could not be rendered as text: {}", number, e);
                    String::new()
                }
            };

            info!("chapter {}/{} (chars: {})", number, total, chapter.content.len());
            info!("{}", text);

            digests.push(ChapterDigest {
                number,
                chars: chapter.content.len(),
                text,
            });
        }

        Ok(digests)
    }

    /// Image file names that no chapter document mentions
    pub fn check_error(&self, book: &BookConfig) -> Result<Vec<String>> {
        let document = self.read_book(book)?;
        let chapters: Vec<String> = document.chapters.iter().map(|c| c.html()).collect();

        let unused: Vec<String> = document
            .images
            .iter()
            .filter(|image| !chapters.iter().any(|html| html.contains(image.file_name.as_str())))
            .map(|image| image.file_name.clone())
            .collect();

        for file_name in &unused {
            error!("Image not referenced by any chapter: {}", file_name);
        }
        info!("{} of {} image(s) unreferenced", unused.len(), document.images.len());

        Ok(unused)
    }

    fn read_book(&self, book: &BookConfig) -> Result<Book> {
        self.store
            .read(Path::new(&book.input))
            .with_context(|| format!("Failed to read book: {}", book.input))
    }

    fn translator_for(&self, book: &BookConfig) -> Result<ChunkTranslator> {
        let translation = &self.config.translation;
        match &self.provider {
            Some(provider) => Ok(ChunkTranslator::new(
                Arc::clone(provider),
                TranslatorSettings::from_config(translation),
                book.system_prompt(),
            )),
            None => ChunkTranslator::from_config(translation, book.system_prompt())
                .context("Failed to create the translation provider"),
        }
    }

    fn progress_bar(&self, len: usize, chapter: usize, total: usize) -> ProgressBar {
        if !self.show_progress {
            return ProgressBar::hidden();
        }

        let progress_bar = ProgressBar::new(len as u64);
        let style = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} chunks ({percent}%) {msg} {eta}")
            .or_else(|_| ProgressStyle::default_bar().template("{spinner} [{elapsed_precise}] [{bar:40}] {pos}/{len} ({percent}%) {msg}"))
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        progress_bar.set_style(style.progress_chars("█▓▒░"));
        progress_bar.set_message(format!("chapter {}/{}", chapter, total));
        progress_bar
    }

    /// First characters of the rendered text, lines trimmed and blank lines dropped
    fn digest(text: &str) -> String {
        let head: String = text.chars().take(DIGEST_CHARS).collect();
        head.lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .collect::<Vec<_>>()
            .join("\n")
    }

    // Format duration in a human-readable format
    fn format_duration(duration: Duration) -> String {
        let total_seconds = duration.as_secs();
        let hours = total_seconds / 3600;
        let minutes = (total_seconds % 3600) / 60;
        let seconds = total_seconds % 60;

        if hours > 0 {
            format!("{}h {}m {}s", hours, minutes, seconds)
        } else if minutes > 0 {
            format!("{}m {}s", minutes, seconds)
        } else {
            format!("{}.{:03}s", seconds, duration.subsec_millis())
        }
    }
}
