//! Training infrastructure for BPE tokenizers.
//!
//! This module provides pair counting and the trainer that learns merge
//! rules from text.

pub mod counter;
pub mod trainer;

pub use counter::{most_frequent, PairCounter};
pub use trainer::{
    train, BpeTrainer, CountingStrategy, StopReason, TrainingConfig, TrainingReport, MAX_MERGES,
};
