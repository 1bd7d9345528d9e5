//! Vocabulary storage and lookup.
//!
//! The vocabulary maps every token ID to the byte string it stands for.
//! IDs are dense: `0..=255` are the single raw bytes, and each learned merge
//! appends one entry that is the concatenation of its two operands.

use crate::core::merges::TokenId;
use crate::error::{Result, TokenizerError};
use serde::{Deserialize, Serialize};

/// Number of reserved single-byte token IDs.
pub const BYTE_VOCAB_SIZE: usize = 256;

/// Dense token ID -> byte string table.
///
/// Serializes as a list of byte strings indexed by ID. Deserialization goes
/// through [`Vocabulary::from_entries`], so the byte alphabet is always
/// present.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Vec<u8>>", into = "Vec<Vec<u8>>")]
pub struct Vocabulary {
    entries: Vec<Vec<u8>>,
}

impl Vocabulary {
    /// Create the base vocabulary holding all 256 single-byte entries.
    pub fn bytes() -> Self {
        Self::with_capacity(BYTE_VOCAB_SIZE)
    }

    /// Create the base vocabulary with room for `capacity` entries in total.
    pub fn with_capacity(capacity: usize) -> Self {
        let mut entries = Vec::with_capacity(capacity.max(BYTE_VOCAB_SIZE));
        entries.extend((0..=u8::MAX).map(|b| vec![b]));
        Self { entries }
    }

    /// Build a vocabulary from raw entries indexed by token ID.
    ///
    /// Only the base byte entries are checked here; merged entries are
    /// validated against their merge rules by `BpeParams::from_parts`.
    pub fn from_entries(entries: Vec<Vec<u8>>) -> Result<Self> {
        if entries.len() < BYTE_VOCAB_SIZE {
            return Err(TokenizerError::InvalidMerge(format!(
                "vocabulary has {} entries, the byte alphabet needs {}",
                entries.len(),
                BYTE_VOCAB_SIZE
            )));
        }

        for (byte, entry) in entries.iter().take(BYTE_VOCAB_SIZE).enumerate() {
            if entry.as_slice() != [byte as u8] {
                return Err(TokenizerError::InvalidMerge(format!(
                    "vocabulary entry {} must be the single byte {:#04x}",
                    byte, byte
                )));
            }
        }

        Ok(Self { entries })
    }

    /// Append the concatenation of entries `left` and `right`.
    ///
    /// Returns the ID assigned to the new entry.
    pub fn push_merge(&mut self, left: TokenId, right: TokenId) -> Result<TokenId> {
        let id = TokenId::try_from(self.entries.len()).map_err(|_| {
            TokenizerError::InvalidArgument("vocabulary exceeds the u32 id space".to_string())
        })?;

        let left = self.get(left).ok_or(TokenizerError::UnknownTokenId(left))?;
        let right = self.get(right).ok_or(TokenizerError::UnknownTokenId(right))?;

        let mut merged = Vec::with_capacity(left.len() + right.len());
        merged.extend_from_slice(left);
        merged.extend_from_slice(right);
        self.entries.push(merged);

        Ok(id)
    }

    /// Get the byte string for an ID.
    #[inline]
    pub fn get(&self, id: TokenId) -> Option<&[u8]> {
        self.entries.get(id as usize).map(Vec::as_slice)
    }

    /// Get the size of the vocabulary.
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the vocabulary has no entries.
    ///
    /// Every constructor installs the byte alphabet, so this is never true.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over `(id, bytes)` in ID order.
    pub fn iter(&self) -> impl ExactSizeIterator<Item = (TokenId, &[u8])> + '_ {
        self.entries
            .iter()
            .enumerate()
            .map(|(id, bytes)| (id as TokenId, bytes.as_slice()))
    }

    /// Concatenate the byte strings of `ids`.
    pub fn concat(&self, ids: &[TokenId]) -> Result<Vec<u8>> {
        let mut bytes = Vec::with_capacity(ids.len() * 2);
        for &id in ids {
            let token = self.get(id).ok_or(TokenizerError::UnknownTokenId(id))?;
            bytes.extend_from_slice(token);
        }
        Ok(bytes)
    }
}

impl TryFrom<Vec<Vec<u8>>> for Vocabulary {
    type Error = TokenizerError;

    fn try_from(entries: Vec<Vec<u8>>) -> Result<Self> {
        Self::from_entries(entries)
    }
}

impl From<Vocabulary> for Vec<Vec<u8>> {
    fn from(vocab: Vocabulary) -> Self {
        vocab.entries
    }
}

impl Default for Vocabulary {
    fn default() -> Self {
        Self::bytes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_byte_alphabet() {
        let vocab = Vocabulary::bytes();
        assert_eq!(vocab.len(), 256);
        assert_eq!(vocab.get(0), Some(&[0u8][..]));
        assert_eq!(vocab.get(b'a' as TokenId), Some(&b"a"[..]));
        assert_eq!(vocab.get(255), Some(&[255u8][..]));
        assert_eq!(vocab.get(256), None);
    }

    #[test]
    fn test_push_merge() {
        let mut vocab = Vocabulary::bytes();
        let he = vocab.push_merge(b'h' as TokenId, b'e' as TokenId).unwrap();
        let hel = vocab.push_merge(he, b'l' as TokenId).unwrap();

        assert_eq!(he, 256);
        assert_eq!(hel, 257);
        assert_eq!(vocab.get(he), Some(&b"he"[..]));
        assert_eq!(vocab.get(hel), Some(&b"hel"[..]));
        assert_eq!(vocab.len(), 258);
    }

    #[test]
    fn test_push_merge_unknown_operand() {
        let mut vocab = Vocabulary::bytes();
        let err = vocab.push_merge(300, 1).unwrap_err();
        assert!(matches!(err, TokenizerError::UnknownTokenId(300)));
        assert_eq!(vocab.len(), 256);
    }

    #[test]
    fn test_concat() {
        let mut vocab = Vocabulary::bytes();
        let ab = vocab.push_merge(b'a' as TokenId, b'b' as TokenId).unwrap();

        assert_eq!(vocab.concat(&[ab, b'c' as TokenId]).unwrap(), b"abc");
        assert!(matches!(
            vocab.concat(&[ab, 999]),
            Err(TokenizerError::UnknownTokenId(999))
        ));
    }

    #[test]
    fn test_from_entries_checks_byte_alphabet() {
        let mut entries: Vec<Vec<u8>> = (0..=255u8).map(|b| vec![b]).collect();
        assert!(Vocabulary::from_entries(entries.clone()).is_ok());

        entries[10] = vec![11];
        assert!(Vocabulary::from_entries(entries).is_err());
        assert!(Vocabulary::from_entries(vec![vec![0]]).is_err());
    }

    #[test]
    fn test_serde_requires_byte_alphabet() {
        let mut vocab = Vocabulary::bytes();
        vocab.push_merge(b'o' as TokenId, b'k' as TokenId).unwrap();

        let json = serde_json::to_string(&vocab).unwrap();
        let restored: Vocabulary = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, vocab);
        assert!(!restored.is_empty());

        assert!(serde_json::from_str::<Vocabulary>("[]").is_err());
        assert!(serde_json::from_str::<Vocabulary>("[[7]]").is_err());

        // Full length, but id 0 holds the wrong byte
        let mut entries: Vec<Vec<u8>> = (0..=255u8).map(|b| vec![b]).collect();
        entries[0] = vec![7];
        let json = serde_json::to_string(&entries).unwrap();
        assert!(serde_json::from_str::<Vocabulary>(&json).is_err());
    }
}
