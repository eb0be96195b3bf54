/*!
 * Sentence and paragraph chunking of preprocessed chapter content.
 *
 * Content is cut into sentences first and sentences are packed greedily into
 * chunks of at most `max_chunk_size` characters. A sentence that is larger
 * than the limit on its own falls back to packing raw markup segments.
 *
 * Every cut is lossless: joining the chunks gives back the input exactly,
 * and that is checked before chunks are handed out.
 */

use std::collections::HashSet;

use log::{debug, warn};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::errors::ChunkingError;
use crate::markup::tokenizer::segments;

/// Default chunk limit in characters
pub const DEFAULT_MAX_CHUNK_SIZE: usize = 5500;

/// Abbreviations whose trailing dot does not end a sentence
static ABBREVIATION_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:vs|dr|mr|mrs|ms|prof|inc|ltd|jr|sr|etc|e\.g|i\.e)\.")
        .expect("Invalid abbreviation regex")
});

static WHITESPACE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\s+").expect("Invalid whitespace regex")
});

/// Characters that terminate a sentence when followed by whitespace
const SENTENCE_TERMINATORS: &[char] = &['.', '?', '!'];

fn char_len(text: &str) -> usize {
    text.chars().count()
}

/// Split content into sentences without dropping a single byte.
///
/// A sentence ends at a whitespace run that follows `.`, `?` or `!`, unless
/// the dot closes a known abbreviation or a single-letter initial. The
/// whitespace run opens the following sentence. Only whitespace in text
/// content is considered, never whitespace inside a tag or comment.
pub fn split_sentences(content: &str) -> Vec<&str> {
    let protected: HashSet<usize> = ABBREVIATION_REGEX
        .find_iter(content)
        .map(|m| m.end())
        .collect();

    let mut sentences = Vec::new();
    let mut start = 0usize;
    let mut offset = 0usize;

    for segment in segments(content) {
        let segment_start = offset;
        offset += segment.len();

        if segment.starts_with('<') {
            continue;
        }

        for run in WHITESPACE_REGEX.find_iter(segment) {
            let cut = segment_start + run.start();
            if cut > start && is_sentence_end(content, cut, &protected) {
                sentences.push(&content[start..cut]);
                start = cut;
            }
        }
    }

    if start < content.len() {
        sentences.push(&content[start..]);
    }

    sentences
}

/// Whether the text just before byte offset `cut` closes a sentence
fn is_sentence_end(content: &str, cut: usize, protected: &HashSet<usize>) -> bool {
    let mut before = content[..cut].chars().rev();
    let Some(last) = before.next() else {
        return false;
    };
    if !SENTENCE_TERMINATORS.contains(&last) {
        return false;
    }
    if protected.contains(&cut) {
        return false;
    }

    // Initials: a lone letter followed by a dot, as in "J. R. R. Tolkien"
    if last == '.' {
        if let Some(letter) = before.next() {
            if letter.is_ascii_alphabetic() {
                let is_initial = match before.next() {
                    None => true,
                    Some(prev) => !(prev.is_alphanumeric() || prev == '_'),
                };
                if is_initial {
                    return false;
                }
            }
        }
    }

    true
}

/// Packs preprocessed chapter content into bounded chunks
#[derive(Debug, Clone)]
pub struct Chunker {
    // @field: Upper bound on a chunk in characters
    max_chunk_size: usize,
}

impl Default for Chunker {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_CHUNK_SIZE)
    }
}

impl Chunker {
    /// Create a chunker; a zero limit is raised to one
    pub fn new(max_chunk_size: usize) -> Self {
        Self {
            max_chunk_size: max_chunk_size.max(1),
        }
    }

    pub fn max_chunk_size(&self) -> usize {
        self.max_chunk_size
    }

    /// Cut content into chunks, verifying that they join back to the input
    pub fn chunk(&self, content: &str) -> Result<Vec<String>, ChunkingError> {
        let mut chunks = Vec::new();
        let mut current = String::new();
        let mut current_len = 0usize;

        for sentence in split_sentences(content) {
            let sentence_len = char_len(sentence);

            if sentence_len > self.max_chunk_size {
                debug!(
                    "Sentence of {} chars exceeds {} char limit, packing by segment",
                    sentence_len, self.max_chunk_size
                );
                flush(&mut chunks, &mut current, &mut current_len);
                chunks.extend(self.pack_segments(sentence));
                continue;
            }

            if current_len + sentence_len > self.max_chunk_size {
                flush(&mut chunks, &mut current, &mut current_len);
            }
            current.push_str(sentence);
            current_len += sentence_len;
        }
        flush(&mut chunks, &mut current, &mut current_len);

        let joined = chunks.concat();
        if joined != content {
            return Err(ChunkingError::RoundTrip {
                expected: char_len(content),
                actual: char_len(&joined),
            });
        }

        debug!("Chunked {} chars into {} chunks", char_len(content), chunks.len());
        Ok(chunks)
    }

    /// Greedy packing of raw markup segments.
    ///
    /// A segment joins the running group only if the group is empty or stays
    /// within the limit, so an oversized segment always stands alone.
    fn pack_segments(&self, sentence: &str) -> Vec<String> {
        let mut groups = Vec::new();
        let mut current = String::new();
        let mut current_len = 0usize;

        for segment in segments(sentence) {
            let segment_len = char_len(segment);
            if current_len > 0 && current_len + segment_len > self.max_chunk_size {
                flush(&mut groups, &mut current, &mut current_len);
            }
            if segment_len > self.max_chunk_size {
                warn!(
                    "Markup segment of {} chars cannot be split below the {} char limit",
                    segment_len, self.max_chunk_size
                );
            }
            current.push_str(segment);
            current_len += segment_len;
        }
        flush(&mut groups, &mut current, &mut current_len);

        groups
    }
}

fn flush(chunks: &mut Vec<String>, current: &mut String, current_len: &mut usize) {
    if !current.is_empty() {
        chunks.push(std::mem::take(current));
    }
    *current_len = 0;
}

/// Reject chunk lists containing a chunk above twice the limit
pub fn check_chunk_sizes(chunks: &[String], max_chunk_size: usize) -> Result<(), ChunkingError> {
    let limit = max_chunk_size.saturating_mul(2);
    for (index, chunk) in chunks.iter().enumerate() {
        let size = char_len(chunk);
        if size > limit {
            return Err(ChunkingError::OversizedChunk { index, size, limit });
        }
    }
    Ok(())
}

/// Keep only the first `items` chunks for a test run; zero keeps everything
pub fn truncate_for_test(mut chunks: Vec<String>, items: usize) -> Vec<String> {
    if items > 0 && chunks.len() > items {
        debug!("Test run: keeping {} of {} chunks", items, chunks.len());
        chunks.truncate(items);
    }
    chunks
}
