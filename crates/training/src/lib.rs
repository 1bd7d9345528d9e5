//! Bytepair-training - BPE training infrastructure
//!
//! This crate learns BPE merge rules from a training text over the raw
//! UTF-8 byte alphabet.
//!
//! # Features
//!
//! - Pair frequency counting with optional parallel processing
//! - Full recount or incremental count maintenance, with identical results
//! - Deterministic tie-breaking, so the same text always trains the same merges
//!
//! # Example
//!
//! ```rust
//! use bytepair_training::{BpeTrainer, CountingStrategy, TrainingConfig};
//!
//! let config = TrainingConfig::new(3).strategy(CountingStrategy::Incremental);
//! let (params, report) = BpeTrainer::new(config).train_with_report("aaabdaaabac")?;
//!
//! assert_eq!(params.vocab_size(), 259);
//! assert_eq!(report.learned, 3);
//! # Ok::<(), bytepair_training::TokenizerError>(())
//! ```

pub use bytepair_core::{BpeParams, Result, TokenizerError};

// Training infrastructure
pub mod training;
pub use training::{
    most_frequent, train, BpeTrainer, CountingStrategy, PairCounter, StopReason, TrainingConfig,
    TrainingReport, MAX_MERGES,
};
