/*!
 * Validation of translated chunks.
 *
 * - `structure`: wrapper and image-count checks on provider replies
 */

pub mod structure;

// Re-export main types
pub use structure::{StructureValidationResult, StructureValidator, WRAPPER_CLOSE, WRAPPER_OPEN};
