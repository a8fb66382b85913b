//! Errors raised while writing or reopening a package

use thiserror::Error;

pub type XlsxResult<T> = std::result::Result<T, XlsxError>;

#[derive(Debug, Error)]
pub enum XlsxError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("archive error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    /// The archive is not a spreadsheet package, or the workbook cannot be
    /// written as one
    #[error("not a spreadsheet package: {0}")]
    NotAPackage(String),

    #[error("package part '{0}' is missing")]
    MissingPart(String),

    /// A part exists but its content does not map back onto a workbook
    #[error("malformed package content: {0}")]
    Malformed(String),

    #[error(transparent)]
    Core(#[from] htmlsheet_core::Error),
}
