/*!
 * Predicates over single tokens.
 *
 * Every check here looks at one token's text in isolation and never at its
 * neighbours. Tag names are matched case-insensitively.
 */

use once_cell::sync::Lazy;
use regex::Regex;

use super::tokenizer::segments;

static IMG_TAG_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^<img\b").expect("Invalid img tag regex")
});

static SPAN_OPEN_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^<span\b[^>]*>?$").expect("Invalid span open regex")
});

static SPAN_CLOSE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^</span\s*>$").expect("Invalid span close regex")
});

/// Any `id=` attribute, quoted or not, possibly empty
static ID_ATTR_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\sid\s*=").expect("Invalid id attribute regex")
});

static ENTITY_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"&(#[0-9]+|#[xX][0-9a-fA-F]+|[A-Za-z]+);").expect("Invalid entity regex")
});

/// Stateless classification of tokenized HTML
pub struct TagClassifier;

impl TagClassifier {
    /// `<img ...>` in any case
    pub fn is_image_tag(token: &str) -> bool {
        IMG_TAG_REGEX.is_match(token)
    }

    /// Exactly `<i>` or `</i>`, no attributes
    pub fn is_italic_tag(token: &str) -> bool {
        token.eq_ignore_ascii_case("<i>") || token.eq_ignore_ascii_case("</i>")
    }

    /// Exactly `<tt>` or `</tt>`, no attributes
    pub fn is_teletype_tag(token: &str) -> bool {
        token.eq_ignore_ascii_case("<tt>") || token.eq_ignore_ascii_case("</tt>")
    }

    /// A `<span>` without an `id` attribute, or any `</span>`.
    ///
    /// The close tag cannot know whether its opener carried an id, so every
    /// `</span>` counts as anonymous.
    pub fn is_anonymous_span(token: &str) -> bool {
        if SPAN_CLOSE_REGEX.is_match(token) {
            return true;
        }
        SPAN_OPEN_REGEX.is_match(token) && !ID_ATTR_REGEX.is_match(token)
    }

    /// A `<span>` open tag with an `id` attribute.
    ///
    /// Exact complement of `is_anonymous_span` over span openers, so every
    /// opener is either stripped or kept with a synthetic close.
    pub fn is_identified_span(token: &str) -> bool {
        SPAN_OPEN_REGEX.is_match(token) && ID_ATTR_REGEX.is_match(token)
    }

    /// Tags dropped before chunking because they only carry styling
    pub fn is_cosmetic(token: &str) -> bool {
        Self::is_italic_tag(token) || Self::is_teletype_tag(token) || Self::is_anonymous_span(token)
    }

    /// Whether the markup renders any non-whitespace text
    pub fn has_visible_text(html: &str) -> bool {
        !Self::visible_text(html).trim().is_empty()
    }

    /// Text outside of tags and comments, with character references decoded
    pub fn visible_text(html: &str) -> String {
        segments(html)
            .into_iter()
            .filter(|segment| !segment.starts_with('<'))
            .map(decode_entities)
            .collect()
    }
}

/// Decode numeric references and the named ones that matter for whitespace checks.
/// Unknown names are left untouched.
fn decode_entities(text: &str) -> String {
    ENTITY_REGEX
        .replace_all(text, |caps: &regex::Captures| {
            let body = &caps[1];
            let decoded = if let Some(hex) = body.strip_prefix("#x").or_else(|| body.strip_prefix("#X")) {
                u32::from_str_radix(hex, 16).ok().and_then(char::from_u32)
            } else if let Some(dec) = body.strip_prefix('#') {
                dec.parse::<u32>().ok().and_then(char::from_u32)
            } else {
                match body {
                    "nbsp" => Some('\u{a0}'),
                    "ensp" => Some('\u{2002}'),
                    "emsp" => Some('\u{2003}'),
                    "thinsp" => Some('\u{2009}'),
                    "amp" => Some('&'),
                    "lt" => Some('<'),
                    "gt" => Some('>'),
                    "quot" => Some('"'),
                    "apos" => Some('\''),
                    _ => None,
                }
            };
            decoded
                .map(String::from)
                .unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}
