//! Merge rule management for BPE.
//!
//! This module provides the ordered merge rule set learned during training
//! and the merge applicator shared by training and encoding. Merge rules are
//! stored using token IDs rather than byte strings for fast comparison.

use crate::core::vocab::BYTE_VOCAB_SIZE;
use crate::error::{Result, TokenizerError};
use ahash::AHashMap;
use serde::{Deserialize, Serialize};

/// Identifier of a raw byte (`0..=255`) or a learned merged unit (`>= 256`).
pub type TokenId = u32;

/// A pair of adjacent token IDs that can be merged.
pub type Pair = (TokenId, TokenId);

/// Replace every non-overlapping occurrence of `pair` in `ids` with `new_id`.
///
/// The scan runs left to right in a single pass: when `ids[i]` and
/// `ids[i + 1]` equal the pair, `new_id` is emitted and both elements are
/// consumed. A run `a a a a` merged on `(a, a)` therefore becomes `m m`,
/// never `a m a`.
pub fn merge(ids: &[TokenId], pair: Pair, new_id: TokenId) -> Vec<TokenId> {
    let mut merged = Vec::with_capacity(ids.len());
    let mut i = 0;

    while i < ids.len() {
        if i + 1 < ids.len() && ids[i] == pair.0 && ids[i + 1] == pair.1 {
            merged.push(new_id);
            i += 2;
        } else {
            merged.push(ids[i]);
            i += 1;
        }
    }

    merged
}

/// In-place variant of [`merge`].
///
/// Compacts `ids` without allocating and returns the number of
/// replacements made.
pub fn merge_in_place(ids: &mut Vec<TokenId>, pair: Pair, new_id: TokenId) -> usize {
    let len = ids.len();
    let mut read = 0;
    let mut write = 0;
    let mut replaced = 0;

    while read < len {
        if read + 1 < len && ids[read] == pair.0 && ids[read + 1] == pair.1 {
            ids[write] = new_id;
            read += 2;
            replaced += 1;
        } else {
            ids[write] = ids[read];
            read += 1;
        }
        write += 1;
    }

    ids.truncate(write);
    replaced
}

/// A single learned merge: `pair` is replaced by `id`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeRule {
    pub pair: Pair,
    pub id: TokenId,
}

/// Ordered collection of BPE merge rules with O(1) lookup.
///
/// Insertion order is the replay order used by encoding: the rule at rank
/// `r` always produces id `256 + r`. Rules are only ever appended.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<MergeRule>", into = "Vec<MergeRule>")]
pub struct MergeRules {
    /// Rules in the order they were learned
    rules: Vec<MergeRule>,
    /// Pair -> rank (index into `rules`)
    index: AHashMap<Pair, usize>,
}

impl MergeRules {
    /// Create a new empty collection of merge rules.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new collection with capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            rules: Vec::with_capacity(capacity),
            index: AHashMap::with_capacity(capacity),
        }
    }

    /// Append a merge rule.
    ///
    /// The pair must not already have a rule and `new_id` must be the next
    /// id in sequence (`256 + len()`).
    pub fn push(&mut self, pair: Pair, new_id: TokenId) -> Result<()> {
        if let Some(&rank) = self.index.get(&pair) {
            return Err(TokenizerError::InvalidMerge(format!(
                "pair {:?} already merged into {}",
                pair, self.rules[rank].id
            )));
        }

        let expected = self.next_id();
        if new_id != expected {
            return Err(TokenizerError::InvalidMerge(format!(
                "merge of {:?} assigned id {}, expected {}",
                pair, new_id, expected
            )));
        }

        self.index.insert(pair, self.rules.len());
        self.rules.push(MergeRule { pair, id: new_id });
        Ok(())
    }

    /// The id the next appended rule must receive.
    #[inline]
    pub fn next_id(&self) -> TokenId {
        (BYTE_VOCAB_SIZE + self.rules.len()) as TokenId
    }

    /// Get the id produced by merging `pair`, if a rule exists.
    #[inline]
    pub fn get(&self, pair: Pair) -> Option<TokenId> {
        self.index.get(&pair).map(|&rank| self.rules[rank].id)
    }

    /// Iterate over the rules in the order they were learned.
    pub fn iter(&self) -> impl ExactSizeIterator<Item = &MergeRule> + '_ {
        self.rules.iter()
    }

    /// Get the number of merge rules.
    #[inline]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Check if there are no merge rules.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Build merge rules from `(pair, id)` records in learned order.
    pub fn from_rules(rules: impl IntoIterator<Item = MergeRule>) -> Result<Self> {
        let mut merges = Self::new();
        for rule in rules {
            merges.push(rule.pair, rule.id)?;
        }
        Ok(merges)
    }
}

impl TryFrom<Vec<MergeRule>> for MergeRules {
    type Error = TokenizerError;

    fn try_from(rules: Vec<MergeRule>) -> Result<Self> {
        Self::from_rules(rules)
    }
}

impl From<MergeRules> for Vec<MergeRule> {
    fn from(merges: MergeRules) -> Self {
        merges.rules
    }
}

impl<'a> IntoIterator for &'a MergeRules {
    type Item = &'a MergeRule;
    type IntoIter = std::slice::Iter<'a, MergeRule>;

    fn into_iter(self) -> Self::IntoIter {
        self.rules.iter()
    }
}

/// Statistics about merge rules.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeStats {
    /// Number of merge rules
    pub count: usize,
    /// Lowest id produced by a rule
    pub first_id: Option<TokenId>,
    /// Highest id produced by a rule
    pub last_id: Option<TokenId>,
    /// Number of rules whose operands are both raw bytes
    pub byte_pairs: usize,
}

impl MergeRules {
    /// Get statistics about the merge rules.
    pub fn stats(&self) -> MergeStats {
        let byte_limit = BYTE_VOCAB_SIZE as TokenId;

        MergeStats {
            count: self.len(),
            first_id: self.rules.first().map(|r| r.id),
            last_id: self.rules.last().map(|r| r.id),
            byte_pairs: self
                .rules
                .iter()
                .filter(|r| r.pair.0 < byte_limit && r.pair.1 < byte_limit)
                .count(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_repeated_run() {
        assert_eq!(merge(&[5, 5, 5, 5], (5, 5), 99), vec![99, 99]);
        assert_eq!(merge(&[5, 5, 5], (5, 5), 99), vec![99, 5]);
    }

    #[test]
    fn test_merge_tail_pair() {
        assert_eq!(merge(&[1, 2, 3], (2, 3), 9), vec![1, 9]);
    }

    #[test]
    fn test_merge_alternating() {
        assert_eq!(merge(&[1, 2, 1, 2], (1, 2), 9), vec![9, 9]);
    }

    #[test]
    fn test_merge_no_match_and_empty() {
        assert_eq!(merge(&[1, 2, 3], (3, 1), 9), vec![1, 2, 3]);
        assert!(merge(&[], (1, 2), 9).is_empty());
        assert_eq!(merge(&[1], (1, 1), 9), vec![1]);
    }

    #[test]
    fn test_merge_in_place_matches_merge() {
        let cases: [(&[TokenId], Pair); 4] = [
            (&[5, 5, 5, 5, 5], (5, 5)),
            (&[1, 2, 3, 1, 2], (1, 2)),
            (&[7, 8, 7, 8, 8], (8, 7)),
            (&[4], (4, 4)),
        ];

        for (ids, pair) in cases {
            let mut in_place = ids.to_vec();
            let replaced = merge_in_place(&mut in_place, pair, 300);
            let expected = merge(ids, pair, 300);
            assert_eq!(in_place, expected);
            assert_eq!(replaced, ids.len() - expected.len());
        }
    }

    #[test]
    fn test_push_and_get() {
        let mut rules = MergeRules::new();
        rules.push((104, 105), 256).unwrap();
        rules.push((256, 33), 257).unwrap();

        assert_eq!(rules.get((104, 105)), Some(256));
        assert_eq!(rules.get((256, 33)), Some(257));
        assert_eq!(rules.get((1, 2)), None);
        assert_eq!(rules.next_id(), 258);
    }

    #[test]
    fn test_push_rejects_duplicate_pair() {
        let mut rules = MergeRules::new();
        rules.push((1, 2), 256).unwrap();
        let err = rules.push((1, 2), 257).unwrap_err();
        assert!(matches!(err, TokenizerError::InvalidMerge(_)));
        assert_eq!(rules.len(), 1);
    }

    #[test]
    fn test_push_rejects_out_of_order_id() {
        let mut rules = MergeRules::new();
        let err = rules.push((1, 2), 300).unwrap_err();
        assert!(matches!(err, TokenizerError::InvalidMerge(_)));
        assert!(rules.is_empty());
    }

    #[test]
    fn test_iter_preserves_learned_order() {
        let mut rules = MergeRules::new();
        rules.push((9, 9), 256).unwrap();
        rules.push((1, 1), 257).unwrap();
        rules.push((256, 256), 258).unwrap();

        let pairs: Vec<Pair> = rules.iter().map(|r| r.pair).collect();
        assert_eq!(pairs, vec![(9, 9), (1, 1), (256, 256)]);
    }

    #[test]
    fn test_stats() {
        let mut rules = MergeRules::new();
        assert_eq!(rules.stats(), MergeStats::default());

        rules.push((0, 1), 256).unwrap();
        rules.push((1, 2), 257).unwrap();
        rules.push((256, 2), 258).unwrap();

        let stats = rules.stats();
        assert_eq!(stats.count, 3);
        assert_eq!(stats.first_id, Some(256));
        assert_eq!(stats.last_id, Some(258));
        assert_eq!(stats.byte_pairs, 2);
    }

    #[test]
    fn test_serde_keeps_order_and_validates() {
        let mut rules = MergeRules::new();
        rules.push((3, 4), 256).unwrap();
        rules.push((1, 2), 257).unwrap();

        let json = serde_json::to_string(&rules).unwrap();
        let restored: MergeRules = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, rules);

        let bad = r#"[{"pair":[1,2],"id":256},{"pair":[1,2],"id":257}]"#;
        assert!(serde_json::from_str::<MergeRules>(bad).is_err());
    }
}
