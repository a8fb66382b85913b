//! Error types for htmlsheet

use std::path::PathBuf;

use htmlsheet_markup::MarkupError;
use htmlsheet_xlsx::XlsxError;
use thiserror::Error;

/// Result type alias using [`ConvertError`]
pub type Result<T> = std::result::Result<T, ConvertError>;

/// Fatal conversion errors
///
/// Conditions with a sensible default (a bad declaration, a missing image,
/// an unparsable typed value) are logged instead and never reach this type.
#[derive(Debug, Error)]
pub enum ConvertError {
    /// The input markup could not be parsed at all
    #[error("Failed to parse markup: {0}")]
    Markup(#[from] MarkupError),

    /// Document-level failure, including column objects used before
    /// allocation or allocated twice
    #[error("Document error: {0}")]
    Core(#[from] htmlsheet_core::Error),

    /// A sheet could not be created or renamed for a table
    #[error("Failed to allocate sheet '{name}': {source}")]
    SheetAllocation {
        name: String,
        #[source]
        source: htmlsheet_core::Error,
    },

    /// Serializing or reopening the destination failed
    #[error("Checkpoint of '{}' failed: {source}", path.display())]
    Checkpoint {
        path: PathBuf,
        #[source]
        source: XlsxError,
    },

    /// Reading the input file failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Option values that cannot drive a run
    #[error("Invalid configuration: {0}")]
    Config(String),
}
