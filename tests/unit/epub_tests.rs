/*!
 * Tests for reading and writing EPUB containers
 */

use std::fs::File;
use std::io::Read;
use zip::{CompressionMethod, ZipArchive};

use yaetwai::EpubError;
use yaetwai::epub::{BookStore, ZipBookStore};

use crate::common;

/// Chapters come from the manifest in order, without the navigation document
#[test]
fn test_read_withSampleBook_shouldListChaptersAndImages() {
    let temp_dir = common::create_temp_dir().unwrap();
    let path = common::create_sample_epub(temp_dir.path(), "sample.epub").unwrap();

    let book = ZipBookStore::new().read(&path).unwrap();

    let chapters: Vec<&str> = book.chapters.iter().map(|c| c.path.as_str()).collect();
    assert_eq!(chapters, vec!["OEBPS/Text/ch1.xhtml", "OEBPS/Text/ch2.xhtml"]);
    assert_eq!(book.chapters[0].html(), common::CHAPTER_ONE);

    let images: Vec<&str> = book.images.iter().map(|i| i.file_name.as_str()).collect();
    assert_eq!(images, vec!["Images/cover.png", "Images/orphan.jpg"]);
    assert_eq!(book.images[0].path, "OEBPS/Images/cover.png");
    assert_eq!(book.entry_count(), 10);
}

/// Writing keeps every entry and replaces only chapter bytes
#[test]
fn test_write_withReplacedChapter_shouldKeepOtherEntries() {
    let temp_dir = common::create_temp_dir().unwrap();
    let input = common::create_sample_epub(temp_dir.path(), "sample.epub").unwrap();
    let output = temp_dir.path().join("out").join("sample.fr.epub");

    let store = ZipBookStore::new();
    let mut book = store.read(&input).unwrap();
    book.chapters[1].set_html("<html><body><p>Deuxième chapitre.</p></body></html>");
    store.write(&output, &book).unwrap();

    let mut archive = ZipArchive::new(File::open(&output).unwrap()).unwrap();
    assert_eq!(archive.len(), 10);

    {
        let first = archive.by_index(0).unwrap();
        assert_eq!(first.name(), "mimetype");
        assert_eq!(first.compression(), CompressionMethod::Stored);
    }

    let mut chapter = String::new();
    archive
        .by_name("OEBPS/Text/ch2.xhtml")
        .unwrap()
        .read_to_string(&mut chapter)
        .unwrap();
    assert_eq!(chapter, "<html><body><p>Deuxième chapitre.</p></body></html>");

    let mut css = String::new();
    archive.by_name("OEBPS/style.css").unwrap().read_to_string(&mut css).unwrap();
    assert_eq!(css, "p { margin: 0; }");

    let reread = store.read(&output).unwrap();
    assert_eq!(reread.chapters[0].html(), common::CHAPTER_ONE);
    assert_eq!(reread.images.len(), 2);
}

/// A manifest entry without archive data is an error
#[test]
fn test_read_withMissingChapterEntry_shouldFail() {
    use std::io::Write;
    use zip::ZipWriter;
    use zip::write::SimpleFileOptions;

    let temp_dir = common::create_temp_dir().unwrap();
    let path = temp_dir.path().join("broken.epub");
    let mut writer = ZipWriter::new(File::create(&path).unwrap());
    let options = SimpleFileOptions::default();
    writer.start_file("META-INF/container.xml", options).unwrap();
    writer.write_all(common::CONTAINER_XML.as_bytes()).unwrap();
    writer.start_file("OEBPS/content.opf", options).unwrap();
    writer.write_all(common::CONTENT_OPF.as_bytes()).unwrap();
    writer.finish().unwrap();

    match ZipBookStore::new().read(&path) {
        Err(EpubError::MissingEntry(name)) => assert_eq!(name, "OEBPS/Text/ch1.xhtml"),
        other => panic!("expected a missing entry, got {:?}", other.map(|b| b.chapter_count())),
    }
}

/// A file that is not a zip archive is rejected
#[test]
fn test_read_withPlainFile_shouldReturnArchiveError() {
    let temp_dir = common::create_temp_dir().unwrap();
    let path = temp_dir.path().join("plain.epub");
    std::fs::write(&path, "not a zip").unwrap();

    assert!(matches!(ZipBookStore::new().read(&path), Err(EpubError::Archive(_))));
}

/// Manifest hrefs are percent-decoded before the archive lookup
#[test]
fn test_read_withEscapedHref_shouldFindDecodedEntry() {
    use std::io::Write;
    use zip::ZipWriter;
    use zip::write::SimpleFileOptions;

    let temp_dir = common::create_temp_dir().unwrap();
    let path = temp_dir.path().join("spaced.epub");
    let opf = common::CONTENT_OPF
        .replace("Text/ch1.xhtml", "Text/chapter%201.xhtml")
        .replace("Images/cover.png", "Images/cover%20art.png");

    let mut writer = ZipWriter::new(File::create(&path).unwrap());
    let options = SimpleFileOptions::default();
    writer.start_file("mimetype", options.compression_method(CompressionMethod::Stored)).unwrap();
    writer.write_all(b"application/epub+zip").unwrap();
    writer.start_file("META-INF/container.xml", options).unwrap();
    writer.write_all(common::CONTAINER_XML.as_bytes()).unwrap();
    writer.start_file("OEBPS/content.opf", options).unwrap();
    writer.write_all(opf.as_bytes()).unwrap();
    writer.start_file("OEBPS/Text/chapter 1.xhtml", options).unwrap();
    writer.write_all(common::CHAPTER_ONE.as_bytes()).unwrap();
    writer.start_file("OEBPS/Text/ch2.xhtml", options).unwrap();
    writer.write_all(common::CHAPTER_TWO.as_bytes()).unwrap();
    writer.finish().unwrap();

    let book = ZipBookStore::new().read(&path).unwrap();

    assert_eq!(book.chapters[0].path, "OEBPS/Text/chapter 1.xhtml");
    assert_eq!(book.chapters[0].html(), common::CHAPTER_ONE);
    assert_eq!(book.images[0].path, "OEBPS/Images/cover art.png");
    assert_eq!(book.images[0].file_name, "Images/cover%20art.png");
}
