/*!
 * HTML markup handling for chapter documents.
 *
 * - `tokenizer`: tag/comment/content tokenization and tag grouping
 * - `classifier`: predicates over single tokens
 * - `preprocess`: cosmetic tag stripping before chunking
 * - `repair`: document tail repair after translation
 */

pub mod classifier;
pub mod preprocess;
pub mod repair;
pub mod tokenizer;

// Re-export main types
pub use classifier::TagClassifier;
pub use preprocess::strip_cosmetic_tags;
pub use repair::repair_document_tail;
pub use tokenizer::{Token, TokenKind, group_tags, join_tokens, segments, tokenize};
