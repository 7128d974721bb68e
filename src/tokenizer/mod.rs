//! Text tokenization strategies.
//!
//! The index works with any [`Tokenizer`] implementation; the bundled
//! [`WordTokenizer`] is a whitespace/punctuation splitter suitable for most
//! text files.

mod word;

pub use word::WordTokenizer;

use crate::models::Token;

/// Strategy trait for converting a text blob into an ordered token sequence.
///
/// Implementations must uphold the guarantees the index relies on:
///
/// - line numbers are 1-based and non-decreasing across the returned sequence
/// - empty lines emit no tokens but still advance the line count
/// - every token's `value` is non-empty after the tokenizer's own trimming
pub trait Tokenizer: Send + Sync {
    /// Tokenize the given text. Empty or whitespace-only input yields an
    /// empty sequence.
    fn tokenize(&self, text: &str) -> Vec<Token>;

    /// Name of this tokenizer, for logging
    fn name(&self) -> &str;
}
