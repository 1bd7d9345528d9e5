//! Pair counting for BPE training.
//!
//! This module provides counting of adjacent token pair frequencies over
//! the training sequence, with support for parallel processing, and the
//! merge step that reports how those counts change.

use ahash::AHashMap;
use bytepair_core::{encode_bytes, merge_in_place, Pair, TokenId};
use log::trace;
use rayon::prelude::*;

/// Minimum number of windows handed to a single rayon task.
const PARALLEL_MIN_WINDOWS: usize = 4096;

/// Counter for BPE pair frequencies over one token sequence.
#[derive(Debug, Clone, Default)]
pub struct PairCounter {
    /// The current, partially merged token sequence
    ids: Vec<TokenId>,
}

impl PairCounter {
    /// Create a counter over an existing token sequence.
    pub fn new(ids: Vec<TokenId>) -> Self {
        Self { ids }
    }

    /// Create a counter over the UTF-8 bytes of `text`.
    pub fn from_text(text: &str) -> Self {
        Self::new(encode_bytes(text))
    }

    /// Count all pairs, in parallel if requested.
    pub fn count_pairs(&self, parallel: bool) -> AHashMap<Pair, u64> {
        let counts = if parallel {
            self.count_pairs_parallel()
        } else {
            self.count_pairs_sequential()
        };
        trace!(
            "counted {} distinct pairs over {} tokens",
            counts.len(),
            self.ids.len()
        );
        counts
    }

    /// Count all pairs sequentially.
    ///
    /// Every window of two adjacent tokens is counted once, so overlapping
    /// occurrences such as the two `(a, a)` in `a a a` both count.
    pub fn count_pairs_sequential(&self) -> AHashMap<Pair, u64> {
        let mut pair_counts: AHashMap<Pair, u64> = AHashMap::new();

        for window in self.ids.windows(2) {
            *pair_counts.entry((window[0], window[1])).or_insert(0) += 1;
        }

        pair_counts
    }

    /// Count all pairs in parallel.
    ///
    /// Shards of the window sequence are counted independently and reduced
    /// into one map; the result equals [`count_pairs_sequential`].
    ///
    /// [`count_pairs_sequential`]: PairCounter::count_pairs_sequential
    pub fn count_pairs_parallel(&self) -> AHashMap<Pair, u64> {
        self.ids
            .par_windows(2)
            .with_min_len(PARALLEL_MIN_WINDOWS)
            .fold(AHashMap::new, |mut acc: AHashMap<Pair, u64>, window| {
                *acc.entry((window[0], window[1])).or_insert(0) += 1;
                acc
            })
            .reduce(AHashMap::new, |acc, pair_counts| {
                if acc.len() < pair_counts.len() {
                    return merge_counts(pair_counts, acc);
                }
                merge_counts(acc, pair_counts)
            })
    }

    /// Merge a pair across the sequence without tracking count changes.
    ///
    /// Returns the number of replacements.
    pub fn apply_merge(&mut self, pair: Pair, new_token_id: TokenId) -> usize {
        merge_in_place(&mut self.ids, pair, new_token_id)
    }

    /// Merge a pair across the sequence (mutates it in place).
    ///
    /// Returns the changes to pair counts as (pair, delta) tuples. Applying
    /// every delta to the counts of the old sequence yields exactly the
    /// counts of the new one. The sequence is compacted without
    /// reallocating, as in `merge_in_place`.
    pub fn merge_pair(&mut self, pair: Pair, new_token_id: TokenId) -> Vec<(Pair, i64)> {
        let (a, b) = pair;
        let n = self.ids.len();
        let mut changes: Vec<(Pair, i64)> = Vec::new();
        if n < 2 {
            return changes;
        }

        let mut read = 0;
        let mut write = 0;

        while read < n {
            if read + 1 < n && self.ids[read] == a && self.ids[read + 1] == b {
                // The left neighbour is read from the compacted prefix so that
                // a preceding merge in the same pass is already accounted for.
                if write > 0 {
                    let left = self.ids[write - 1];
                    changes.push(((left, a), -1));
                    changes.push(((left, new_token_id), 1));
                }
                changes.push((pair, -1));
                if let Some(&right) = self.ids.get(read + 2) {
                    changes.push(((b, right), -1));
                    changes.push(((new_token_id, right), 1));
                }

                self.ids[write] = new_token_id;
                read += 2;
            } else {
                self.ids[write] = self.ids[read];
                read += 1;
            }
            write += 1;
        }

        self.ids.truncate(write);
        changes
    }

    /// The current token sequence.
    pub fn ids(&self) -> &[TokenId] {
        &self.ids
    }

    /// Length of the current token sequence.
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Check if the sequence is empty.
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

fn merge_counts(
    mut into: AHashMap<Pair, u64>,
    from: AHashMap<Pair, u64>,
) -> AHashMap<Pair, u64> {
    for (pair, count) in from {
        *into.entry(pair).or_insert(0) += count;
    }
    into
}

/// Pick the pair to merge next.
///
/// The highest count wins; among equal counts the lexicographically
/// smallest `(a, b)` wins, so the choice never depends on map iteration
/// order.
pub fn most_frequent(pair_counts: &AHashMap<Pair, u64>) -> Option<(Pair, u64)> {
    pair_counts
        .iter()
        .filter(|(_, count)| **count > 0)
        .max_by(|(pair_a, count_a), (pair_b, count_b)| {
            count_a.cmp(count_b).then_with(|| pair_b.cmp(pair_a))
        })
        .map(|(&pair, &count)| (pair, count))
}
