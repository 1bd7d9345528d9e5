//! Byte-level encoding.
//!
//! Text is represented by its UTF-8 bytes, one token id per byte. This is
//! the base alphabet every BPE vocabulary starts from.

use super::Tokenizer;
use crate::core::vocab::BYTE_VOCAB_SIZE;
use crate::core::TokenId;
use crate::{Result, TokenizerError};

/// Convert text to one id in `0..=255` per UTF-8 byte.
pub fn encode_bytes(text: &str) -> Vec<TokenId> {
    text.bytes().map(TokenId::from).collect()
}

/// Convert byte ids back to text.
///
/// Fails with `UnknownTokenId` for an id above 255 and with `Decode` when the
/// bytes are not valid UTF-8.
pub fn decode_bytes(ids: &[TokenId]) -> Result<String> {
    let bytes = ids
        .iter()
        .map(|&id| u8::try_from(id).map_err(|_| TokenizerError::UnknownTokenId(id)))
        .collect::<Result<Vec<u8>>>()?;

    Ok(String::from_utf8(bytes)?)
}

/// Tokenizer over raw UTF-8 bytes with no merges.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ByteTokenizer;

impl ByteTokenizer {
    /// Number of distinct ids this tokenizer can produce.
    pub const VOCAB_SIZE: usize = BYTE_VOCAB_SIZE;

    /// Create a new byte tokenizer.
    pub fn new() -> Self {
        Self
    }
}

impl Tokenizer for ByteTokenizer {
    fn encode(&self, text: &str) -> Result<Vec<TokenId>> {
        Ok(encode_bytes(text))
    }

    fn decode(&self, ids: &[TokenId]) -> Result<String> {
        decode_bytes(ids)
    }
}
