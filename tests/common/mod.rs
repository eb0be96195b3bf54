/*!
 * Common test utilities for the yaetwai test suite
 */

use anyhow::Result;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use yaetwai::app_config::{BookConfig, Config};
use yaetwai::epub::{Book, ChapterItem, ImageItem};

pub const CONTAINER_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<container version="1.0" xmlns="urn:oasis:names:tc:opendocument:xmlns:container">
  <rootfiles>
    <rootfile full-path="OEBPS/content.opf" media-type="application/oebps-package+xml"/>
  </rootfiles>
</container>"#;

pub const CONTENT_OPF: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<package xmlns="http://www.idpf.org/2007/opf" version="3.0" unique-identifier="id">
  <metadata xmlns:dc="http://purl.org/dc/elements/1.1/">
    <dc:title>Sample</dc:title>
  </metadata>
  <manifest>
    <item id="nav" href="nav.xhtml" media-type="application/xhtml+xml" properties="nav"/>
    <item id="c1" href="Text/ch1.xhtml" media-type="application/xhtml+xml"/>
    <item id="c2" href="Text/ch2.xhtml" media-type="application/xhtml+xml"/>
    <item id="cover" href="Images/cover.png" media-type="image/png"/>
    <item id="orphan" href="Images/orphan.jpg" media-type="image/jpeg"/>
    <item id="css" href="style.css" media-type="text/css"/>
  </manifest>
  <spine>
    <itemref idref="c1"/>
    <itemref idref="c2"/>
  </spine>
</package>"#;

pub const CHAPTER_ONE: &str = "<html><body><h1>Chapter One</h1><p>Hello world. <i>It is</i> a test.</p><img src=\"../Images/cover.png\"/></body></html>";

pub const CHAPTER_TWO: &str = "<html><body><p>Second chapter. Dr. Smith arrived.</p></body></html>";

pub const NAV_XHTML: &str = "<html><body><nav><ol><li>One</li></ol></nav></body></html>";

/// Routes library logs to the test output; safe to call from every test
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Creates a temporary directory for test files
pub fn create_temp_dir() -> Result<TempDir> {
    Ok(TempDir::new()?)
}

/// Writes a two-chapter EPUB with one referenced and one unreferenced image
pub fn create_sample_epub(dir: &Path, file_name: &str) -> Result<PathBuf> {
    let path = dir.join(file_name);
    let mut writer = ZipWriter::new(File::create(&path)?);
    let stored = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);
    let deflated = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    writer.start_file("mimetype", stored)?;
    writer.write_all(b"application/epub+zip")?;
    writer.add_directory("META-INF/", deflated)?;
    writer.start_file("META-INF/container.xml", deflated)?;
    writer.write_all(CONTAINER_XML.as_bytes())?;
    writer.start_file("OEBPS/content.opf", deflated)?;
    writer.write_all(CONTENT_OPF.as_bytes())?;
    writer.start_file("OEBPS/nav.xhtml", deflated)?;
    writer.write_all(NAV_XHTML.as_bytes())?;
    writer.start_file("OEBPS/Text/ch1.xhtml", deflated)?;
    writer.write_all(CHAPTER_ONE.as_bytes())?;
    writer.start_file("OEBPS/Text/ch2.xhtml", deflated)?;
    writer.write_all(CHAPTER_TWO.as_bytes())?;
    writer.start_file("OEBPS/Images/cover.png", stored)?;
    writer.write_all(&[0x89, b'P', b'N', b'G'])?;
    writer.start_file("OEBPS/Images/orphan.jpg", stored)?;
    writer.write_all(&[0xFF, 0xD8, 0xFF])?;
    writer.start_file("OEBPS/style.css", deflated)?;
    writer.write_all(b"p { margin: 0; }")?;
    writer.finish()?;

    Ok(path)
}

/// In-memory book with the given chapter documents
pub fn memory_book(chapters: &[&str]) -> Book {
    let chapters = chapters
        .iter()
        .enumerate()
        .map(|(i, html)| ChapterItem::new(format!("OEBPS/Text/ch{}.xhtml", i + 1), *html))
        .collect();
    Book::new(chapters, vec![ImageItem::new("Images/cover.png", "OEBPS/Images/cover.png")])
}

/// Config with one translate book and checkpoints under `dir`
pub fn test_config(dir: &Path, input: &str, output: &str) -> Config {
    let mut book = BookConfig::new(input, "en", "fr");
    book.output = output.to_string();

    let mut config = Config::default();
    config.books = vec![book];
    config.translation.common.retry_delay_ms = 0;
    config.translation.common.checkpoint_dir = dir.join("checkpoint").to_string_lossy().to_string();
    config
}
