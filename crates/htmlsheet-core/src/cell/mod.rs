//! Cells, their values and their A1-style coordinates

mod address;
mod value;

pub use address::{CellAddress, CellRange};
pub use value::CellValue;

use crate::style::StyleId;

/// One stored cell
///
/// A cell with no style handle renders with the workbook default style.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Cell {
    pub value: CellValue,
    pub style: Option<StyleId>,
}
