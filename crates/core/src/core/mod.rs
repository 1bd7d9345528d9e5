//! Core BPE data structures.
//!
//! This module contains the token id space, the ordered merge rules with the
//! merge applicator, the vocabulary, the trained parameter bundle, and the
//! priority queue used by incremental training.

pub mod merges;
pub mod params;
pub mod priority;
pub mod vocab;

pub use merges::{merge, merge_in_place, MergeRule, MergeRules, MergeStats, Pair, TokenId};
pub use params::BpeParams;
pub use priority::{MergeCandidate, PairPriorityQueue};
pub use vocab::{Vocabulary, BYTE_VOCAB_SIZE};
