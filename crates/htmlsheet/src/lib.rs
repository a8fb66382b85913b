//! # htmlsheet
//!
//! Convert HTML tables into a multi-sheet XLSX workbook.
//!
//! Every `<table>` becomes one sheet. Inline `style` declarations are parsed
//! into a [`StyleModel`], mapped onto workbook styles (font, fill, border,
//! alignment, column width, row height) and `colspan` becomes a merged
//! range. Body rows are written in batches; between batches the workbook
//! can be checkpointed to disk and dropped so memory stays bounded for very
//! large tables.
//!
//! ## Pipeline
//!
//! - [`StyleParser`] - declaration string to [`StyleModel`]
//! - [`StyleMapper`] - [`StyleModel`] to registered, deduplicated styles
//! - [`TableWalker`] - header and body rows into the live document
//! - [`BatchMaterializer`] - batches, checkpoints and the final write
//! - [`SheetAllocator`] - one uniquely named sheet per table
//!
//! ## Example
//!
//! ```rust,no_run
//! use htmlsheet::{convert_html, ConvertOptions};
//!
//! let html = r#"<table data-name="Results">
//!     <thead><tr><th style="width: 200px">Name</th><th>Score</th></tr></thead>
//!     <tr><td>Alice</td><td style="value-type: float">95</td></tr>
//! </table>"#;
//!
//! let report = convert_html(html, "results.xlsx", &ConvertOptions::default()).unwrap();
//! println!("{} rows in {} sheet(s)", report.rows, report.tables);
//! ```

pub mod allocator;
pub mod config;
pub mod error;
pub mod mapper;
pub mod materializer;
pub mod parser;
pub mod style;
pub mod walker;

pub use allocator::SheetAllocator;
pub use config::{CheckpointPolicy, ConvertOptions};
pub use error::{ConvertError, Result};
pub use mapper::{LiveDocument, StyleCache, StyleMapper};
pub use materializer::{BatchMaterializer, RunReport};
pub use parser::StyleParser;
pub use style::{StyleModel, TextAlign, ValueType};
pub use walker::{CellContent, ImageRef, Row, RowCell, SheetContext, TableRows, TableWalker};

pub use htmlsheet_markup::Document;

use std::path::Path;
use std::time::Instant;

/// Convert every table in `html` into the workbook at `output`
pub fn convert_html<P: AsRef<Path>>(
    html: &str,
    output: P,
    options: &ConvertOptions,
) -> Result<RunReport> {
    options.validate()?;

    let started = Instant::now();
    let document = Document::parse(html)?;
    let tables = document.root().select(".//table")?;
    log::debug!(
        "parsed markup in {:.3}s, {} table(s) found",
        started.elapsed().as_secs_f64(),
        tables.len()
    );

    BatchMaterializer::new(output, options.clone()).run(&tables, options.batch_size)
}

/// Convert an HTML file, which must be UTF-8
pub fn convert_file<P: AsRef<Path>, Q: AsRef<Path>>(
    input: P,
    output: Q,
    options: &ConvertOptions,
) -> Result<RunReport> {
    let bytes = std::fs::read(input.as_ref())?;
    let html = std::str::from_utf8(&bytes).map_err(htmlsheet_markup::MarkupError::from)?;
    convert_html(html, output, options)
}
