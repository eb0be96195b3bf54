/*!
 * Post-translation fixes for a finished chapter.
 */

const DOCUMENT_END: &str = "</html>";
const BODY_END: &str = "</body>";

/// Restore the document tail of a translated chapter.
///
/// Only applies when the source chapter ended its document with `</html>`:
/// code fences or quote runs the provider put around the reply are trimmed,
/// any `</body>`/`</html>` it moved or duplicated are removed, and the pair is
/// appended once at the very end.
pub fn repair_document_tail(raw_html: &str, translated_html: &str) -> String {
    if !raw_html.contains(DOCUMENT_END) {
        return translated_html.to_string();
    }

    let trimmed = translated_html
        .trim()
        .trim_matches(|c| c == '\'' || c == '`')
        .trim();

    let mut repaired = trimmed.replace(BODY_END, "").replace(DOCUMENT_END, "");
    repaired.push_str(BODY_END);
    repaired.push_str(DOCUMENT_END);
    repaired
}
