/*!
 * Translation of chapter content through AI chat providers.
 *
 * This module contains the chunk-level pipeline. It is split into several
 * submodules:
 *
 * - `chunker`: sentence and segment based chunking with a round-trip check
 * - `coordinator`: per-chunk request, validation and retry loop
 * - `window`: conversation history carried between chunks
 */

// Re-export main types for easier usage
pub use self::chunker::{Chunker, check_chunk_sizes, split_sentences, truncate_for_test};
pub use self::coordinator::{ChunkOutcome, ChunkTranslator, TranslatorSettings};
pub use self::window::ConversationWindow;

// Submodules
pub mod chunker;
pub mod coordinator;
pub mod window;
