/*!
 * Container and package document parsing.
 *
 * `META-INF/container.xml` names the package document (OPF); its manifest
 * lists every item of the book with a media type. Element names are matched
 * on their local part so prefixed (`opf:item`) documents work too.
 */

use percent_encoding::percent_decode_str;
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

use crate::errors::EpubError;

/// Path of the container document inside the archive
pub const CONTAINER_PATH: &str = "META-INF/container.xml";

/// One `<item>` of the manifest
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ManifestItem {
    pub id: String,
    /// As written in the OPF, relative to the OPF directory
    pub href: String,
    pub media_type: String,
    pub properties: String,
}

impl ManifestItem {
    /// XHTML or HTML content document, excluding the navigation document
    pub fn is_chapter(&self) -> bool {
        let media_type = self.media_type.to_ascii_lowercase();
        (media_type == "application/xhtml+xml" || media_type == "text/html")
            && !self.properties.split_whitespace().any(|p| p == "nav")
    }

    pub fn is_image(&self) -> bool {
        self.media_type.to_ascii_lowercase().starts_with("image/")
    }
}

/// Attribute lookup by local name, unescaped
fn attribute(start: &BytesStart<'_>, name: &[u8]) -> Result<Option<String>, EpubError> {
    for attr in start.attributes() {
        let attr = attr?;
        if attr.key.local_name().as_ref() == name {
            return Ok(Some(attr.unescape_value()?.into_owned()));
        }
    }
    Ok(None)
}

/// `full-path` of the first `<rootfile>` in container.xml
pub fn parse_container(xml: &[u8]) -> Result<String, EpubError> {
    let mut reader = Reader::from_reader(xml);
    reader.config_mut().trim_text(true);
    let mut buf = Vec::new();

    loop {
        buf.clear();
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) | Event::Empty(e) if e.local_name().as_ref() == b"rootfile" => {
                if let Some(path) = attribute(&e, b"full-path")? {
                    return Ok(path);
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Err(EpubError::Xml(format!("No rootfile in {}", CONTAINER_PATH)))
}

/// Manifest items in document order
pub fn parse_manifest(xml: &[u8]) -> Result<Vec<ManifestItem>, EpubError> {
    let mut reader = Reader::from_reader(xml);
    reader.config_mut().trim_text(true);
    let mut buf = Vec::new();
    let mut items = Vec::new();
    let mut in_manifest = false;

    loop {
        buf.clear();
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) if e.local_name().as_ref() == b"manifest" => in_manifest = true,
            Event::End(e) if e.local_name().as_ref() == b"manifest" => in_manifest = false,
            Event::Start(e) | Event::Empty(e) if in_manifest && e.local_name().as_ref() == b"item" => {
                items.push(ManifestItem {
                    id: attribute(&e, b"id")?.unwrap_or_default(),
                    href: attribute(&e, b"href")?.unwrap_or_default(),
                    media_type: attribute(&e, b"media-type")?.unwrap_or_default(),
                    properties: attribute(&e, b"properties")?.unwrap_or_default(),
                });
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(items)
}

/// Directory part of an archive path, with trailing slash; empty at the root
pub fn base_dir(path: &str) -> &str {
    match path.rfind('/') {
        Some(pos) => &path[..=pos],
        None => "",
    }
}

/// Resolve a manifest href against the OPF directory into an archive path.
///
/// Fragments are dropped, percent escapes decoded and `.`/`..` segments
/// collapsed.
pub fn resolve_href(base: &str, href: &str) -> String {
    let href = href.split('#').next().unwrap_or_default();
    let href = percent_decode_str(href).decode_utf8_lossy();
    let mut parts: Vec<&str> = base.split('/').filter(|p| !p.is_empty()).collect();

    for part in href.split('/') {
        match part {
            "" | "." => {}
            ".." => {
                parts.pop();
            }
            other => parts.push(other),
        }
    }

    parts.join("/")
}
