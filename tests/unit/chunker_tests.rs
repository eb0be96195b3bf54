/*!
 * Tests for sentence splitting and chunking of chapter content
 */

use yaetwai::ChunkingError;
use yaetwai::markup::{segments, strip_cosmetic_tags, tokenize};
use yaetwai::translation::{Chunker, check_chunk_sizes, split_sentences};

const CHAPTER: &str = "<html><body>\n<h1 class=\"title\">Part One</h1>\n\
<p>Mr. Jones met Dr. Watson at 5 p.m. and asked, \"Is it true?\" It was!</p>\n\
<p><span>They walked</span> to <i>Baker Street</i>. J. R. Hartley followed, etc. Nobody noticed.</p>\n\
<p><img src=\"../Images/map.png\" alt=\"Map. Old.\"/> The map showed three roads. One led north.</p>\n\
</body></html>";

/// Abbreviation inside a wrapped chunk does not end the sentence
#[test]
fn test_splitSentences_withWrappedDoctorAbbreviation_shouldSplitOnce() {
    let sentences = split_sentences("<div><p>Hello Dr. Smith. How are you?</p></div>");
    assert_eq!(sentences, vec!["<div><p>Hello Dr. Smith.", " How are you?</p></div>"]);
    assert_eq!(sentences.concat(), "<div><p>Hello Dr. Smith. How are you?</p></div>");
}

/// A sentence above 6000 characters goes through segment packing and round-trips
#[test]
fn test_chunk_withOversizedSentence_shouldUseSegmentFallback() {
    let words: Vec<String> = (0..420).map(|i| format!("w{:04}", i)).collect();
    let sentence = format!("<p>{}</p>", words.join(" <b>x</b> "));
    assert!(sentence.chars().count() > 6000);
    assert_eq!(split_sentences(&sentence).len(), 1);

    let chunker = Chunker::default();
    let chunks = chunker.chunk(&sentence).unwrap();

    assert!(chunks.len() > 1);
    assert_eq!(chunks.concat(), sentence);
    for chunk in &chunks {
        assert!(chunk.chars().count() <= chunker.max_chunk_size());
    }
    assert!(check_chunk_sizes(&chunks, chunker.max_chunk_size()).is_ok());
}

/// Joining chunks gives back the content for any limit
#[test]
fn test_chunk_withAnyLimit_shouldRoundTrip() {
    let content = strip_cosmetic_tags(CHAPTER);
    for max in [1, 2, 7, 16, 40, 64, 128, 1000, 5500] {
        let chunks = Chunker::new(max).chunk(&content).unwrap();
        assert_eq!(chunks.concat(), content, "round trip failed for limit {}", max);
        assert!(chunks.iter().all(|chunk| !chunk.is_empty()));
    }
}

/// Chunks above the limit are single markup segments
#[test]
fn test_chunk_overLimitChunks_shouldBeSingleSegments() {
    let content = strip_cosmetic_tags(CHAPTER);
    let chunks = Chunker::new(20).chunk(&content).unwrap();

    for chunk in chunks.iter().filter(|chunk| chunk.chars().count() > 20) {
        assert_eq!(segments(chunk).len(), 1, "oversized chunk {:?} has several segments", chunk);
    }
}

/// No chunk boundary falls inside a tag
#[test]
fn test_chunk_shouldNeverSplitTags() {
    let content = strip_cosmetic_tags(CHAPTER);
    let chunks = Chunker::new(30).chunk(&content).unwrap();

    let tags_in_chunks: usize = chunks
        .iter()
        .map(|chunk| tokenize(chunk).iter().filter(|t| t.is_tag()).count())
        .sum();
    let tags_in_content = tokenize(&content).iter().filter(|t| t.is_tag()).count();
    assert_eq!(tags_in_chunks, tags_in_content);
}

/// The oversize guard reports index and size
#[test]
fn test_checkChunkSizes_withHugeImageTag_shouldReportChunk() {
    let content = format!("<p>Hi</p><img src=\"{}.png\"/>", "a".repeat(40));
    let chunker = Chunker::new(5);
    let chunks = chunker.chunk(&content).unwrap();

    match check_chunk_sizes(&chunks, chunker.max_chunk_size()) {
        Err(ChunkingError::OversizedChunk { index, limit, .. }) => {
            assert_eq!(limit, 10);
            assert!(chunks[index].starts_with("<img"));
        }
        other => panic!("expected an oversized chunk, got {:?}", other),
    }
}
