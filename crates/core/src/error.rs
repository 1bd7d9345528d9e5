//! Error types for the BPE tokenizer library.

use crate::core::TokenId;
use std::string::FromUtf8Error;
use thiserror::Error;

/// Main error type for the tokenizer library.
#[derive(Error, Debug)]
pub enum TokenizerError {
    /// An argument was outside the range the operation accepts
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Decoded bytes are not valid UTF-8
    #[error("Invalid UTF-8 sequence during decoding: {0}")]
    Decode(#[from] FromUtf8Error),

    /// Unknown token ID
    #[error("Unknown token ID: {0}")]
    UnknownTokenId(TokenId),

    /// Invalid merge rule or parameter bundle
    #[error("Invalid merge rule: {0}")]
    InvalidMerge(String),
}

/// Result type alias for tokenizer operations.
pub type Result<T> = std::result::Result<T, TokenizerError>;
