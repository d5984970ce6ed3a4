//! Approximate tokenizer
//!
//! Estimates tokens as one per four characters, rounded up. This is the usual
//! rule of thumb for GPT-family BPE vocabularies on English prose; it
//! undercounts CJK text and dense code. Used by [`crate::MockProvider`] and
//! other offline setups; real models count with [`crate::BpeTokenizer`].
//!
//! Truncation cuts on `char` boundaries, so the result is always valid UTF-8
//! and re-counts to at most the requested budget.

use archivist_domain::Tokenizer;

/// Characters assumed per token
pub const DEFAULT_CHARS_PER_TOKEN: usize = 4;

/// Character-ratio token estimator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ApproxTokenizer {
    chars_per_token: usize,
}

impl ApproxTokenizer {
    /// Tokenizer with a custom ratio (clamped to at least 1)
    pub fn new(chars_per_token: usize) -> Self {
        Self {
            chars_per_token: chars_per_token.max(1),
        }
    }

    /// Characters counted as one token
    pub fn chars_per_token(&self) -> usize {
        self.chars_per_token
    }
}

impl Default for ApproxTokenizer {
    fn default() -> Self {
        Self::new(DEFAULT_CHARS_PER_TOKEN)
    }
}

impl Tokenizer for ApproxTokenizer {
    fn count_tokens(&self, text: &str) -> usize {
        text.chars().count().div_ceil(self.chars_per_token)
    }

    fn truncate(&self, text: &str, max_tokens: usize) -> String {
        let max_chars = max_tokens.saturating_mul(self.chars_per_token);
        match text.char_indices().nth(max_chars) {
            Some((byte_index, _)) => text[..byte_index].to_string(),
            None => text.to_string(),
        }
    }
}
