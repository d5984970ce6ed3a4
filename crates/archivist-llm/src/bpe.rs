//! Model-exact tokenizer
//!
//! Wraps the byte-pair encoding the OpenAI model itself uses, so a token
//! budget measured here is the budget the completion service enforces.
//! Models `tiktoken-rs` does not know fall back to `o200k_base`, the
//! encoding of the gpt-4o family.

use crate::LlmError;
use archivist_domain::Tokenizer;
use std::sync::Arc;
use tiktoken_rs::CoreBPE;

/// Tokenizer backed by a model's BPE vocabulary
#[derive(Clone)]
pub struct BpeTokenizer {
    bpe: Arc<CoreBPE>,
}

impl BpeTokenizer {
    /// Encoding used by `model`
    ///
    /// # Errors
    ///
    /// Returns `LlmError::Configuration` if the encoding tables cannot be
    /// loaded.
    pub fn for_model(model: &str) -> Result<Self, LlmError> {
        let bpe = match tiktoken_rs::get_bpe_from_model(model) {
            Ok(bpe) => bpe,
            Err(_) => tiktoken_rs::o200k_base()
                .map_err(|e| LlmError::Configuration(format!("Tokenizer: {}", e)))?,
        };
        Ok(Self { bpe: Arc::new(bpe) })
    }
}

impl std::fmt::Debug for BpeTokenizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BpeTokenizer").finish_non_exhaustive()
    }
}

impl Tokenizer for BpeTokenizer {
    fn count_tokens(&self, text: &str) -> usize {
        self.bpe.encode_ordinary(text).len()
    }

    fn truncate(&self, text: &str, max_tokens: usize) -> String {
        let tokens = self.bpe.encode_ordinary(text);
        if tokens.len() <= max_tokens {
            return text.to_string();
        }

        // A token prefix can end inside a multi-byte character and re-encode
        // differently; shrink until it decodes and fits
        let mut keep = max_tokens;
        while keep > 0 {
            if let Ok(cut) = self.bpe.decode(tokens[..keep].to_vec()) {
                if self.count_tokens(&cut) <= max_tokens {
                    return cut;
                }
            }
            keep -= 1;
        }
        String::new()
    }
}
