//! Bytepair-tokenizer - High-level tokenizer API
//!
//! This crate ties the byte codec, the trainer and the merge rules together
//! into a tokenizer that can be trained on text and then used to encode and
//! decode.
//!
//! # Features
//!
//! - Training on a single text with a configurable number of merges
//! - Encoding by replaying merges in learned order
//! - Strict, lossy and raw decoding
//! - Character- and byte-level baselines behind the same `Tokenizer` trait
//!
//! # Example
//!
//! ```rust
//! use bytepair_tokenizer::BpeTokenizer;
//!
//! let tokenizer = BpeTokenizer::train("low lower lowest", 5)?;
//!
//! let ids = tokenizer.encode("lowest");
//! assert!(ids.len() < "lowest".len());
//! assert_eq!(tokenizer.decode(&ids)?, "lowest");
//! # Ok::<(), bytepair_tokenizer::TokenizerError>(())
//! ```

// Re-export core types
pub use bytepair_core::{
    decode_bytes, encode_bytes, BpeParams, ByteTokenizer, CharTokenizer, MergeRule, MergeRules,
    Pair, Result, TokenId, Tokenizer, TokenizerError, Vocabulary, BYTE_VOCAB_SIZE,
};

// Re-export training types
pub use bytepair_training::{
    train, BpeTrainer, CountingStrategy, StopReason, TrainingConfig, TrainingReport,
};

// Tokenizer API
pub mod tokenizer;
pub use tokenizer::BpeTokenizer;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
