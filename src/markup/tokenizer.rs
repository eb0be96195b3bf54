/*!
 * Tag tokenizer for chapter HTML.
 *
 * Splits an HTML string into an ordered stream of tag, comment and content
 * units. Two views are exposed:
 * - `segments`: the raw, untrimmed pieces; concatenating them gives back the input
 * - `tokenize`: the trimmed view with whitespace-only pieces dropped
 *
 * Malformed markup never fails: a stray `<` without a closing `>` becomes its
 * own tag unit running to the end of the input.
 */

use once_cell::sync::Lazy;
use regex::Regex;

/// Comment, tag, unterminated tag, or a run of text
static SEGMENT_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)<!--.*?-->|<[^>]+>|<[^>]*|[^<]+").expect("Invalid segment regex")
});

/// Elements that never take a closing tag
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param",
    "source", "track", "wbr",
];

/// Kind of a token in the tokenized stream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// Any `<...>` run that is not a comment
    Tag,
    /// `<!-- ... -->`
    Comment,
    /// Text between tags
    Content,
}

/// An atomic unit of tokenized HTML
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    kind: TokenKind,
    text: String,
}

impl Token {
    /// Build a token from a raw segment, trimming surrounding whitespace
    pub fn from_segment(segment: &str) -> Self {
        let text = segment.trim();
        let kind = if text.starts_with("<!--") {
            TokenKind::Comment
        } else if text.starts_with('<') {
            TokenKind::Tag
        } else {
            TokenKind::Content
        };

        Self {
            kind,
            text: text.to_string(),
        }
    }

    pub fn kind(&self) -> TokenKind {
        self.kind
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn is_tag(&self) -> bool {
        self.kind == TokenKind::Tag
    }

    pub fn is_comment(&self) -> bool {
        self.kind == TokenKind::Comment
    }

    pub fn is_content(&self) -> bool {
        self.kind == TokenKind::Content
    }

    /// Whether this is a `</name>` tag
    pub fn is_closing(&self) -> bool {
        self.is_tag() && self.text.starts_with("</")
    }

    /// Whether this tag closes itself, either `<x/>` or a void element like `<br>`
    pub fn is_self_contained(&self) -> bool {
        if !self.is_tag() || self.is_closing() {
            return false;
        }
        if self.text.starts_with("<!") || self.text.starts_with("<?") || self.text.ends_with("/>") {
            return true;
        }
        self.tag_name()
            .map(|name| VOID_ELEMENTS.contains(&name.as_str()))
            .unwrap_or(false)
    }

    /// Lowercased element name of a tag token
    pub fn tag_name(&self) -> Option<String> {
        if !self.is_tag() {
            return None;
        }
        let name: String = self.text
            .trim_start_matches('<')
            .trim_start_matches('/')
            .chars()
            .take_while(|c| !c.is_whitespace() && *c != '/' && *c != '>')
            .collect();

        if name.is_empty() {
            None
        } else {
            Some(name.to_lowercase())
        }
    }
}

/// Raw segments of the input; `segments(html).concat() == html`
pub fn segments(html: &str) -> Vec<&str> {
    SEGMENT_REGEX.find_iter(html).map(|m| m.as_str()).collect()
}

/// Trimmed tokens with whitespace-only segments dropped
pub fn tokenize(html: &str) -> Vec<Token> {
    segments(html)
        .into_iter()
        .filter(|segment| !segment.trim().is_empty())
        .map(Token::from_segment)
        .collect()
}

/// Concatenate token texts without separators
pub fn join_tokens(tokens: &[Token]) -> String {
    tokens.iter().map(Token::text).collect()
}

/// Group top-level elements into tag-content units.
///
/// Each group runs from an open tag through its matching close tag, nested
/// same-name elements included. Top-level content, comments and void tags form
/// their own groups. Unclosed elements are flushed as-is at the end.
pub fn group_tags(html: &str) -> Vec<String> {
    let mut groups = Vec::new();
    let mut open_names: Vec<String> = Vec::new();
    let mut current = String::new();

    for token in tokenize(html) {
        if open_names.is_empty() {
            if !token.is_tag() || token.is_self_contained() || token.is_closing() {
                groups.push(token.text().to_string());
                continue;
            }
        }

        current.push_str(token.text());

        if token.is_closing() {
            if let Some(name) = token.tag_name() {
                if let Some(pos) = open_names.iter().rposition(|open| *open == name) {
                    open_names.truncate(pos);
                }
            }
        } else if token.is_tag() && !token.is_self_contained() {
            if let Some(name) = token.tag_name() {
                open_names.push(name);
            }
        }

        if open_names.is_empty() {
            groups.push(std::mem::take(&mut current));
        }
    }

    if !current.is_empty() {
        groups.push(current);
    }

    groups
}
