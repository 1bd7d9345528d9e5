//! Main tokenizer implementation.
//!
//! This module provides `BpeTokenizer`, which owns trained parameters and
//! encodes text by replaying the merge rules in the order they were learned.

use bytepair_core::{
    encode_bytes, merge_in_place, BpeParams, Result, TokenId, Tokenizer, Vocabulary,
};
use bytepair_training::{BpeTrainer, TrainingConfig};
use log::debug;
use rayon::prelude::*;

/// Byte-level BPE tokenizer.
///
/// Immutable once built: encoding and decoding only read the parameters, so a
/// tokenizer can be shared across threads freely.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BpeTokenizer {
    /// Trained vocabulary and merge rules
    params: BpeParams,
}

impl BpeTokenizer {
    /// Create a tokenizer from trained parameters.
    pub fn new(params: BpeParams) -> Self {
        Self { params }
    }

    /// Tokenizer with no merges; behaves like the byte tokenizer.
    pub fn untrained() -> Self {
        Self::new(BpeParams::untrained())
    }

    /// Train on `text`, learning up to `num_merges` merges.
    pub fn train(text: &str, num_merges: usize) -> Result<Self> {
        Self::train_with_config(text, TrainingConfig::new(num_merges))
    }

    /// Train on `text` with a full training configuration.
    pub fn train_with_config(text: &str, config: TrainingConfig) -> Result<Self> {
        let params = BpeTrainer::new(config).train(text)?;
        debug!(
            "built tokenizer with {} merges ({} ids)",
            params.num_merges(),
            params.vocab_size()
        );
        Ok(Self::new(params))
    }

    /// The trained parameters.
    #[inline]
    pub fn params(&self) -> &BpeParams {
        &self.params
    }

    /// The id -> bytes table.
    #[inline]
    pub fn vocab(&self) -> &Vocabulary {
        self.params.vocab()
    }

    /// Total number of token ids, bytes included.
    #[inline]
    pub fn vocab_size(&self) -> usize {
        self.params.vocab_size()
    }

    /// Byte string of a single token.
    #[inline]
    pub fn token_bytes(&self, id: TokenId) -> Option<&[u8]> {
        self.params.token_bytes(id)
    }

    /// Encode text into token ids.
    ///
    /// Starts from the UTF-8 bytes and applies every merge rule in learned
    /// order, each one across the whole current sequence. A later rule whose
    /// operand only appears because of an earlier rule therefore still fires.
    pub fn encode(&self, text: &str) -> Vec<TokenId> {
        let mut ids = encode_bytes(text);

        for rule in self.params.merges() {
            if ids.len() < 2 {
                break;
            }
            merge_in_place(&mut ids, rule.pair, rule.id);
        }

        ids
    }

    /// Encode a batch of texts (parallelized), preserving input order.
    pub fn encode_batch<S>(&self, texts: &[S]) -> Vec<Vec<TokenId>>
    where
        S: AsRef<str> + Sync,
    {
        texts
            .par_iter()
            .map(|text| self.encode(text.as_ref()))
            .collect()
    }

    /// Decode token ids into the raw byte string they stand for.
    ///
    /// Fails with `UnknownTokenId` for an id outside the vocabulary. The
    /// bytes are not checked for UTF-8 validity.
    pub fn decode_raw(&self, ids: &[TokenId]) -> Result<Vec<u8>> {
        self.params.vocab().concat(ids)
    }

    /// Decode token ids back to text.
    ///
    /// Fails with `UnknownTokenId` for an id outside the vocabulary and with
    /// `Decode` when the concatenated bytes are not valid UTF-8, which can
    /// happen for a slice of ids that splits a multi-byte character.
    pub fn decode(&self, ids: &[TokenId]) -> Result<String> {
        let bytes = self.decode_raw(ids)?;
        Ok(String::from_utf8(bytes)?)
    }

    /// Decode token ids, replacing invalid UTF-8 with U+FFFD.
    ///
    /// Unknown ids are still an error.
    pub fn decode_lossy(&self, ids: &[TokenId]) -> Result<String> {
        let bytes = self.decode_raw(ids)?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}

impl From<BpeParams> for BpeTokenizer {
    fn from(params: BpeParams) -> Self {
        Self::new(params)
    }
}

impl Tokenizer for BpeTokenizer {
    fn encode(&self, text: &str) -> Result<Vec<TokenId>> {
        Ok(BpeTokenizer::encode(self, text))
    }

    fn decode(&self, ids: &[TokenId]) -> Result<String> {
        BpeTokenizer::decode(self, ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytepair_core::{ByteTokenizer, MergeRules, TokenizerError};

    const CORPUS: &str = "hug pug pun bun hugs hug pug hugging";

    /// Parameters with `ab -> 256` then `(256, c) -> 257`.
    fn chained_params() -> BpeParams {
        let (a, b, c) = (b'a' as TokenId, b'b' as TokenId, b'c' as TokenId);
        let mut vocab = Vocabulary::bytes();
        let mut merges = MergeRules::new();

        let ab = vocab.push_merge(a, b).unwrap();
        merges.push((a, b), ab).unwrap();
        let abc = vocab.push_merge(ab, c).unwrap();
        merges.push((ab, c), abc).unwrap();

        BpeParams::from_parts(vocab, merges).unwrap()
    }

    #[test]
    fn test_untrained_matches_byte_tokenizer() {
        let tokenizer = BpeTokenizer::untrained();
        let text = "plain bytes ✓";

        assert_eq!(tokenizer.vocab_size(), 256);
        assert_eq!(
            tokenizer.encode(text),
            Tokenizer::encode(&ByteTokenizer, text).unwrap()
        );
    }

    #[test]
    fn test_encode_replays_in_order() {
        let tokenizer = BpeTokenizer::new(chained_params());

        assert_eq!(tokenizer.encode("abc"), vec![257]);
        assert_eq!(tokenizer.encode("abcab"), vec![257, 256]);
        assert_eq!(tokenizer.encode("acb"), vec![97, 99, 98]);
    }

    #[test]
    fn test_encode_short_inputs() {
        let tokenizer = BpeTokenizer::new(chained_params());

        assert!(tokenizer.encode("").is_empty());
        assert_eq!(tokenizer.encode("a"), vec![97]);
    }

    #[test]
    fn test_roundtrip_trained() {
        let tokenizer = BpeTokenizer::train(CORPUS, 30).unwrap();

        for text in [CORPUS, "", "hug", "unseen text ü", "bugs hugging pugs"] {
            let ids = tokenizer.encode(text);
            assert_eq!(tokenizer.decode(&ids).unwrap(), text);
        }
    }

    #[test]
    fn test_training_text_compresses() {
        let tokenizer = BpeTokenizer::train(CORPUS, 30).unwrap();
        assert!(tokenizer.encode(CORPUS).len() < CORPUS.len());
    }

    #[test]
    fn test_decode_unknown_id() {
        let tokenizer = BpeTokenizer::new(chained_params());
        let err = tokenizer.decode(&[97, 258]).unwrap_err();
        assert!(matches!(err, TokenizerError::UnknownTokenId(258)));
    }

    #[test]
    fn test_decode_partial_character() {
        let tokenizer = BpeTokenizer::untrained();
        let ids = tokenizer.encode("é");

        assert!(matches!(
            tokenizer.decode(&ids[..1]),
            Err(TokenizerError::Decode(_))
        ));
        assert_eq!(tokenizer.decode_lossy(&ids[..1]).unwrap(), "\u{fffd}");
        assert_eq!(tokenizer.decode_raw(&ids[..1]).unwrap(), vec![0xc3]);
    }

    #[test]
    fn test_encode_batch_preserves_order() {
        let tokenizer = BpeTokenizer::train(CORPUS, 10).unwrap();
        let texts = ["hug", "pun", "", "hugging bun"];

        let batch = tokenizer.encode_batch(&texts);
        let single: Vec<_> = texts.iter().map(|t| tokenizer.encode(t)).collect();
        assert_eq!(batch, single);
    }

    #[test]
    fn test_from_params() {
        let tokenizer: BpeTokenizer = chained_params().into();
        assert_eq!(tokenizer.vocab_size(), 258);
        assert_eq!(tokenizer.token_bytes(257), Some(&b"abc"[..]));
    }
}
