//! Tokenizer capability and its merge-free variants.
//!
//! This module provides:
//! - the [`Tokenizer`] trait shared by every tokenizer
//! - Byte-level: raw UTF-8 bytes, ids `0..=255`
//! - Character-level: one id per Unicode code point

pub mod byte_level;
pub mod char_level;

pub use byte_level::{decode_bytes, encode_bytes, ByteTokenizer};
pub use char_level::CharTokenizer;

use crate::core::TokenId;
use crate::Result;

/// Reversible mapping between text and token ids.
///
/// Implementations are independent of each other; callers pick one and may
/// use it behind `&dyn Tokenizer`.
pub trait Tokenizer {
    /// Encode text to token ids.
    fn encode(&self, text: &str) -> Result<Vec<TokenId>>;

    /// Decode token ids back to text.
    fn decode(&self, ids: &[TokenId]) -> Result<String>;
}

impl<T: Tokenizer + ?Sized> Tokenizer for &T {
    fn encode(&self, text: &str) -> Result<Vec<TokenId>> {
        (**self).encode(text)
    }

    fn decode(&self, ids: &[TokenId]) -> Result<String> {
        (**self).decode(ids)
    }
}
