//! Character-level encoding.
//!
//! Each Unicode code point maps directly to its scalar value. The id space
//! is unrelated to the byte and BPE id spaces; this tokenizer is a simple
//! baseline sharing only the [`Tokenizer`] capability.

use super::Tokenizer;
use crate::core::TokenId;
use crate::{Result, TokenizerError};

/// Tokenizer mapping each code point to its scalar value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CharTokenizer;

impl CharTokenizer {
    /// Create a new character tokenizer.
    pub fn new() -> Self {
        Self
    }
}

impl Tokenizer for CharTokenizer {
    fn encode(&self, text: &str) -> Result<Vec<TokenId>> {
        Ok(text.chars().map(TokenId::from).collect())
    }

    /// Decode code points back to text.
    ///
    /// Ids that are not Unicode scalar values (surrogates, values above
    /// U+10FFFF) are unknown tokens.
    fn decode(&self, ids: &[TokenId]) -> Result<String> {
        ids.iter()
            .map(|&id| char::from_u32(id).ok_or(TokenizerError::UnknownTokenId(id)))
            .collect()
    }
}
