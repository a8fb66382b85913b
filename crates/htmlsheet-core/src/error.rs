//! Errors raised by the document model

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Something the workbook or one of its sheets refused to do
#[derive(Debug, Error)]
pub enum Error {
    #[error("'{0}' is not a cell reference")]
    BadReference(String),

    #[error("'{0}' is not a cell range")]
    BadRange(String),

    /// Row index and the last addressable row
    #[error("row {0} is past the last sheet row {1}")]
    RowLimit(u32, u32),

    /// Column index and the last addressable column
    #[error("column {0} is past the last sheet column {1}")]
    ColumnLimit(u16, u16),

    /// Requested index and the number of sheets
    #[error("no sheet at index {0}, workbook has {1}")]
    NoSuchSheet(usize, usize),

    #[error("'{0}' cannot be used as a sheet name")]
    BadSheetName(String),

    #[error("a sheet named '{0}' already exists")]
    SheetNameTaken(String),

    /// Handle that was never returned by this workbook's registry
    #[error("style handle {0} is not registered")]
    UnknownStyle(u32),

    #[error("column {0} was used before it was allocated")]
    ColumnNotAllocated(u16),

    #[error("column {0} was allocated twice")]
    ColumnAllocatedTwice(u16),

    /// Range that intersects a region already merged on the sheet
    #[error("{0} overlaps a merged region")]
    MergeOverlap(String),
}
