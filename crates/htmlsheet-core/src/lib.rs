//! # htmlsheet-core
//!
//! The document htmlsheet renders tables into. A [`Workbook`] owns its
//! sheets and one [`StyleRegistry`]; cells and allocated columns refer to
//! registered styles by [`StyleId`]. A [`Worksheet`] also keeps custom row
//! heights, merged ranges and anchored pictures.
//!
//! ## Example
//!
//! ```rust
//! use htmlsheet_core::{CellValue, Style, Workbook};
//!
//! let mut workbook = Workbook::new();
//! let bold = workbook.register_style(Style::new().bold(true));
//!
//! let sheet = workbook.worksheet_mut(0).unwrap();
//! sheet.set_cell_value_at(0, 0, "Name").unwrap();
//! sheet.set_cell_style_at(0, 0, bold).unwrap();
//! sheet.set_cell_value_at(1, 0, CellValue::Number(95.0)).unwrap();
//! ```

pub mod cell;
pub mod column;
pub mod error;
pub mod picture;
pub mod style;
pub mod workbook;
pub mod worksheet;

pub use cell::{Cell, CellAddress, CellRange, CellValue};
pub use column::Column;
pub use error::{Error, Result};
pub use picture::{Picture, PictureFormat};
pub use workbook::{Workbook, INVALID_SHEET_NAME_CHARS};
pub use worksheet::Worksheet;

pub use style::{
    Alignment, BorderEdge, BorderLineStyle, BorderStyle, Color, FillStyle, FontStyle,
    HorizontalAlignment, Side, Style, StyleId, StyleRegistry, VerticalAlignment, DEFAULT_FONT_NAME,
    DEFAULT_FONT_SIZE,
};

/// Sheet size limits of the XLSX format
pub const MAX_ROWS: u32 = 1_048_576;
pub const MAX_COLS: u16 = 16_384;
pub const MAX_SHEET_NAME_LEN: usize = 31;
/// Longest text a cell can hold, in characters
pub const MAX_CELL_TEXT_LEN: usize = 32_767;

/// Height in points of a row without a custom height
pub const DEFAULT_ROW_HEIGHT: f64 = 15.0;
/// Width in characters written for allocated columns that set none
pub const DEFAULT_COLUMN_WIDTH: f64 = 8.43;
