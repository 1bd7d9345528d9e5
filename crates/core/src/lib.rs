//! Bytepair-core - Core byte-level BPE data structures
//!
//! This crate provides the fundamental data structures for byte-pair
//! encoding (BPE), independent of how merges are learned.
//!
//! # Features
//!
//! - Byte codec between text and raw UTF-8 byte ids
//! - Single-pass, non-overlapping merge applicator
//! - Ordered merge rules and a dense id -> bytes vocabulary
//! - Validated, read-only `BpeParams` bundle
//! - The `Tokenizer` trait with byte- and character-level variants
//!
//! # Example
//!
//! ```rust
//! use bytepair_core::{merge, ByteTokenizer, Tokenizer};
//!
//! let tokenizer = ByteTokenizer;
//! let ids = tokenizer.encode("aaab")?;
//! assert_eq!(merge(&ids, (97, 97), 256), vec![256, 97, 98]);
//! assert_eq!(tokenizer.decode(&ids)?, "aaab");
//! # Ok::<(), bytepair_core::TokenizerError>(())
//! ```

pub mod error;
pub use error::{Result, TokenizerError};

// Core BPE data structures
pub mod core;
pub use self::core::{
    merge, merge_in_place, BpeParams, MergeCandidate, MergeRule, MergeRules, MergeStats, Pair,
    PairPriorityQueue, TokenId, Vocabulary, BYTE_VOCAB_SIZE,
};

// Tokenizer capability and merge-free variants
pub mod encoding;
pub use encoding::{decode_bytes, encode_bytes, ByteTokenizer, CharTokenizer, Tokenizer};
