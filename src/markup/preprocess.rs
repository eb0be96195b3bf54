/*!
 * Cosmetic tag stripping applied to a chapter before chunking.
 */

use log::debug;

use super::classifier::TagClassifier;
use super::tokenizer::segments;

/// Synthetic close emitted after every kept `<span id=...>`
const SPAN_CLOSE: &str = "</span>";

/// Remove italic, teletype and anonymous span tags from chapter HTML.
///
/// Identified spans (`<span id="...">`) are page or note anchors and are kept,
/// but their `</span>` is indistinguishable from an anonymous one and gets
/// dropped, so an empty `</span>` is written right after the opener instead.
/// Whitespace between segments is preserved.
pub fn strip_cosmetic_tags(html: &str) -> String {
    let mut output = String::with_capacity(html.len());
    let mut removed = 0usize;

    for segment in segments(html) {
        let token = segment.trim();
        if TagClassifier::is_cosmetic(token) {
            removed += 1;
            continue;
        }

        output.push_str(segment);
        if TagClassifier::is_identified_span(token) {
            output.push_str(SPAN_CLOSE);
        }
    }

    debug!("Stripped {} cosmetic tags", removed);
    output
}
