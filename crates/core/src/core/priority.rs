//! Priority queue for BPE merge candidates.
//!
//! This module provides the max-heap used by incremental training to find
//! the most frequent pair without rescanning the whole pair histogram.

use crate::core::merges::Pair;
use ahash::AHashMap;
use dary_heap::OctonaryHeap;
use std::cmp::Ordering;

/// Heap size below which stale entries are never compacted away.
const COMPACT_MIN_ENTRIES: usize = 1024;

/// A merge candidate during BPE training.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MergeCandidate {
    /// The pair of token IDs to merge
    pub pair: Pair,
    /// The frequency/count of this pair
    pub count: u64,
}

impl MergeCandidate {
    /// Create a new merge candidate.
    pub fn new(pair: Pair, count: u64) -> Self {
        Self { pair, count }
    }
}

// Higher count wins; on equal counts the lexicographically smaller pair wins.
impl Ord for MergeCandidate {
    fn cmp(&self, other: &Self) -> Ordering {
        self.count
            .cmp(&other.count)
            .then_with(|| other.pair.cmp(&self.pair))
    }
}

impl PartialOrd for MergeCandidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Priority queue for BPE merge operations.
///
/// Uses an 8-ary heap for better cache locality than a binary heap. Entries
/// are invalidated lazily: a popped candidate is only returned if its count
/// still matches the pair's current count. Once stale entries outnumber live
/// ones the heap is rebuilt from the live counts.
pub struct PairPriorityQueue {
    /// The heap storing merge candidates
    heap: OctonaryHeap<MergeCandidate>,
    /// Track current counts to detect stale entries
    current_counts: AHashMap<Pair, u64>,
}

impl PairPriorityQueue {
    /// Create a new priority queue with the given capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            heap: OctonaryHeap::with_capacity(capacity),
            current_counts: AHashMap::with_capacity(capacity),
        }
    }

    /// Create a new empty priority queue.
    pub fn new() -> Self {
        Self {
            heap: OctonaryHeap::new(),
            current_counts: AHashMap::new(),
        }
    }

    /// Build a queue from a complete pair histogram.
    pub fn from_counts<'a>(counts: impl IntoIterator<Item = (&'a Pair, &'a u64)>) -> Self {
        let counts = counts.into_iter();
        let mut queue = Self::with_capacity(counts.size_hint().0);
        for (&pair, &count) in counts {
            queue.update(pair, count);
        }
        queue
    }

    /// Pop the highest priority merge candidate.
    ///
    /// Returns None if the queue is empty or only contains stale entries.
    pub fn pop(&mut self) -> Option<MergeCandidate> {
        while let Some(candidate) = self.heap.pop() {
            if self.current_counts.get(&candidate.pair) == Some(&candidate.count) {
                self.current_counts.remove(&candidate.pair);
                return Some(candidate);
            }
        }
        None
    }

    /// Set the count for a pair.
    ///
    /// Any earlier entry for the pair becomes stale. A count of zero removes
    /// the pair from consideration.
    pub fn update(&mut self, pair: Pair, new_count: u64) {
        if new_count == 0 {
            self.current_counts.remove(&pair);
        } else {
            self.current_counts.insert(pair, new_count);
            self.heap.push(MergeCandidate::new(pair, new_count));
        }

        if self.heap.len() > COMPACT_MIN_ENTRIES
            && self.heap.len() > 2 * self.current_counts.len()
        {
            self.compact();
        }
    }

    /// Drop every stale entry by rebuilding the heap from the live counts.
    fn compact(&mut self) {
        let live: Vec<MergeCandidate> = self
            .current_counts
            .iter()
            .map(|(&pair, &count)| MergeCandidate::new(pair, count))
            .collect();
        self.heap = OctonaryHeap::from(live);
    }
}

impl Default for PairPriorityQueue {
    fn default() -> Self {
        Self::new()
    }
}
