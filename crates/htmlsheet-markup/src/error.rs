//! Markup error types

use thiserror::Error;

/// Result type for markup operations
pub type MarkupResult<T> = std::result::Result<T, MarkupError>;

/// Errors raised while building or querying a document
#[derive(Debug, Error)]
pub enum MarkupError {
    /// Input is not valid UTF-8
    #[error("Input is not valid UTF-8: {0}")]
    Encoding(#[from] std::str::Utf8Error),

    /// The tokenizer could not make sense of the input
    #[error("Malformed markup at byte {position}: {message}")]
    Syntax { position: usize, message: String },

    /// A query path that does not follow the `./a/b`, `.//a` grammar
    #[error("Invalid path '{path}': {reason}")]
    InvalidPath { path: String, reason: String },
}
