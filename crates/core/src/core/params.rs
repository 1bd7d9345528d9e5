//! Trained BPE parameters.
//!
//! `BpeParams` bundles the vocabulary and the ordered merge rules produced
//! by training. It has no mutators: once built it is only read.

use crate::core::merges::{MergeRule, MergeRules, TokenId};
use crate::core::vocab::{Vocabulary, BYTE_VOCAB_SIZE};
use crate::error::{Result, TokenizerError};
use serde::{Deserialize, Serialize};

/// The trained artifact: vocabulary plus merge rules in learned order.
///
/// Invariants, checked by [`BpeParams::from_parts`]:
/// - the vocabulary holds the 256 single bytes at ids `0..=255`;
/// - it holds exactly one further entry per merge rule;
/// - rule `i` produces id `256 + i` from operands defined before it;
/// - `vocab[256 + i] == vocab[a] ++ vocab[b]` for rule `(a, b)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawParams")]
pub struct BpeParams {
    vocab: Vocabulary,
    merges: MergeRules,
}

#[derive(Deserialize)]
struct RawParams {
    vocab: Vocabulary,
    merges: MergeRules,
}

impl TryFrom<RawParams> for BpeParams {
    type Error = TokenizerError;

    fn try_from(raw: RawParams) -> Result<Self> {
        Self::from_parts(raw.vocab, raw.merges)
    }
}

impl BpeParams {
    /// Parameters with the byte alphabet and no merges.
    pub fn untrained() -> Self {
        Self {
            vocab: Vocabulary::bytes(),
            merges: MergeRules::new(),
        }
    }

    /// Assemble parameters from a vocabulary and merge rules, validating
    /// that they describe the same merges.
    pub fn from_parts(vocab: Vocabulary, merges: MergeRules) -> Result<Self> {
        let expected = BYTE_VOCAB_SIZE + merges.len();
        if vocab.len() != expected {
            return Err(TokenizerError::InvalidMerge(format!(
                "vocabulary has {} entries but {} merges require {}",
                vocab.len(),
                merges.len(),
                expected
            )));
        }

        let base = Vocabulary::bytes();
        for (id, bytes) in vocab.iter().take(BYTE_VOCAB_SIZE) {
            if base.get(id) != Some(bytes) {
                return Err(TokenizerError::InvalidMerge(format!(
                    "vocabulary entry {} is not the single byte {:#04x}",
                    id, id
                )));
            }
        }

        for &MergeRule { pair: (a, b), id } in merges.iter() {
            if a >= id || b >= id {
                return Err(TokenizerError::InvalidMerge(format!(
                    "merge ({}, {}) -> {} uses an operand learned later",
                    a, b, id
                )));
            }

            let (left, right, merged) = match (vocab.get(a), vocab.get(b), vocab.get(id)) {
                (Some(l), Some(r), Some(m)) => (l, r, m),
                _ => {
                    return Err(TokenizerError::InvalidMerge(format!(
                        "merge ({}, {}) -> {} refers to a missing vocabulary entry",
                        a, b, id
                    )))
                }
            };

            if merged.len() != left.len() + right.len()
                || !merged.starts_with(left)
                || !merged.ends_with(right)
            {
                return Err(TokenizerError::InvalidMerge(format!(
                    "vocabulary entry {} is not the concatenation of {} and {}",
                    id, a, b
                )));
            }
        }

        Ok(Self { vocab, merges })
    }

    /// The id -> bytes table.
    #[inline]
    pub fn vocab(&self) -> &Vocabulary {
        &self.vocab
    }

    /// The merge rules in learned order.
    #[inline]
    pub fn merges(&self) -> &MergeRules {
        &self.merges
    }

    /// Total number of token ids, bytes included.
    #[inline]
    pub fn vocab_size(&self) -> usize {
        self.vocab.len()
    }

    /// Number of learned merges.
    #[inline]
    pub fn num_merges(&self) -> usize {
        self.merges.len()
    }

    /// Byte string of a single token.
    #[inline]
    pub fn token_bytes(&self, id: TokenId) -> Option<&[u8]> {
        self.vocab.get(id)
    }

    /// Split the bundle back into its parts.
    pub fn into_parts(self) -> (Vocabulary, MergeRules) {
        (self.vocab, self.merges)
    }
}

impl Default for BpeParams {
    fn default() -> Self {
        Self::untrained()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_parts() -> (Vocabulary, MergeRules) {
        let mut vocab = Vocabulary::bytes();
        let mut merges = MergeRules::new();

        let ab = vocab.push_merge(b'a' as TokenId, b'b' as TokenId).unwrap();
        merges.push((b'a' as TokenId, b'b' as TokenId), ab).unwrap();
        let abc = vocab.push_merge(ab, b'c' as TokenId).unwrap();
        merges.push((ab, b'c' as TokenId), abc).unwrap();

        (vocab, merges)
    }

    #[test]
    fn test_untrained() {
        let params = BpeParams::untrained();
        assert_eq!(params.vocab_size(), 256);
        assert_eq!(params.num_merges(), 0);
    }

    #[test]
    fn test_from_parts_valid() {
        let (vocab, merges) = sample_parts();
        let params = BpeParams::from_parts(vocab, merges).unwrap();

        assert_eq!(params.vocab_size(), 258);
        assert_eq!(params.num_merges(), 2);
        assert_eq!(params.token_bytes(257), Some(&b"abc"[..]));
    }

    #[test]
    fn test_from_parts_rejects_size_mismatch() {
        let (_, merges) = sample_parts();
        let err = BpeParams::from_parts(Vocabulary::bytes(), merges).unwrap_err();
        assert!(matches!(err, TokenizerError::InvalidMerge(_)));
    }

    #[test]
    fn test_from_parts_rejects_wrong_concatenation() {
        let mut vocab = Vocabulary::bytes();
        let mut merges = MergeRules::new();

        // Entry 256 holds "ba" while the rule claims (a, b)
        vocab.push_merge(b'b' as TokenId, b'a' as TokenId).unwrap();
        merges.push((b'a' as TokenId, b'b' as TokenId), 256).unwrap();

        assert!(BpeParams::from_parts(vocab, merges).is_err());
    }

    #[test]
    fn test_from_parts_rejects_forward_reference() {
        let mut vocab = Vocabulary::bytes();
        let mut merges = MergeRules::new();

        vocab.push_merge(b'a' as TokenId, b'a' as TokenId).unwrap();
        merges.push((256, 1), 256).unwrap();

        assert!(BpeParams::from_parts(vocab, merges).is_err());
    }

    #[test]
    fn test_serde_roundtrip_validates() {
        let (vocab, merges) = sample_parts();
        let params = BpeParams::from_parts(vocab, merges).unwrap();

        let json = serde_json::to_string(&params).unwrap();
        let restored: BpeParams = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, params);

        // Drop the last vocabulary entry: the merges no longer line up
        let mut value: serde_json::Value = serde_json::from_str(&json).unwrap();
        value["vocab"].as_array_mut().unwrap().pop();
        assert!(serde_json::from_value::<BpeParams>(value).is_err());
    }
}
