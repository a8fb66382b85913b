//! A single sheet

use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

use crate::cell::{Cell, CellAddress, CellRange, CellValue};
use crate::column::Column;
use crate::error::{Error, Result};
use crate::picture::Picture;
use crate::style::StyleId;
use crate::{MAX_COLS, MAX_ROWS};

/// One tab of a workbook
///
/// Cells are sparse, grouped by row. Row heights live beside the cells so a
/// row may have a height and no cells. Column objects exist only after
/// [`allocate_column`](Self::allocate_column).
#[derive(Debug, Clone)]
pub struct Worksheet {
    name: String,
    rows: BTreeMap<u32, BTreeMap<u16, Cell>>,
    columns: BTreeMap<u16, Column>,
    /// Points
    row_heights: BTreeMap<u32, f64>,
    merged_regions: Vec<CellRange>,
    pictures: Vec<Picture>,
}

impl Worksheet {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            rows: BTreeMap::new(),
            columns: BTreeMap::new(),
            row_heights: BTreeMap::new(),
            merged_regions: Vec::new(),
            pictures: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Unchecked; [`Workbook::rename_sheet`](crate::Workbook::rename_sheet)
    /// validates the name first
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// False once anything at all was put on the sheet
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
            && self.columns.is_empty()
            && self.row_heights.is_empty()
            && self.merged_regions.is_empty()
            && self.pictures.is_empty()
    }

    // === Cells ===

    pub fn cell_at(&self, row: u32, col: u16) -> Option<&Cell> {
        self.rows.get(&row)?.get(&col)
    }

    /// Value at an A1 reference; unset cells read as [`CellValue::Empty`]
    pub fn get_value(&self, reference: &str) -> Result<CellValue> {
        let at = CellAddress::parse(reference)?;
        Ok(self.get_value_at(at.row, at.col))
    }

    pub fn get_value_at(&self, row: u32, col: u16) -> CellValue {
        self.cell_at(row, col)
            .map(|cell| cell.value.clone())
            .unwrap_or_default()
    }

    pub fn cell_style_at(&self, row: u32, col: u16) -> Option<StyleId> {
        self.cell_at(row, col)?.style
    }

    pub fn set_cell_value(&mut self, reference: &str, value: impl Into<CellValue>) -> Result<()> {
        let at = CellAddress::parse(reference)?;
        self.set_cell_value_at(at.row, at.col, value)
    }

    /// Replace the value; a style already on the cell stays
    pub fn set_cell_value_at(
        &mut self,
        row: u32,
        col: u16,
        value: impl Into<CellValue>,
    ) -> Result<()> {
        self.slot(row, col)?.value = value.into();
        Ok(())
    }

    /// Replace the style; the value stays
    pub fn set_cell_style_at(&mut self, row: u32, col: u16, style: StyleId) -> Result<()> {
        self.slot(row, col)?.style = Some(style);
        Ok(())
    }

    /// Every stored cell as `(row, col, cell)`, row-major
    pub fn iter_cells(&self) -> impl Iterator<Item = (u32, u16, &Cell)> {
        self.rows
            .iter()
            .flat_map(|(&row, cells)| cells.iter().map(move |(&col, cell)| (row, col, cell)))
    }

    /// Bounding box of the stored cells
    pub fn used_range(&self) -> Option<CellRange> {
        let first_row = *self.rows.keys().next()?;
        let last_row = *self.rows.keys().next_back()?;
        let first_col = self.rows.values().filter_map(|r| r.keys().next()).min()?;
        let last_col = self.rows.values().filter_map(|r| r.keys().next_back()).max()?;
        Some(CellRange::spanning(first_row, *first_col, last_row, *last_col))
    }

    fn slot(&mut self, row: u32, col: u16) -> Result<&mut Cell> {
        check_position(row, col)?;
        Ok(self.rows.entry(row).or_default().entry(col).or_default())
    }

    // === Rows ===

    /// Rows holding at least one cell, top to bottom
    pub fn rows(&self) -> impl Iterator<Item = (u32, &BTreeMap<u16, Cell>)> {
        self.rows.iter().map(|(&row, cells)| (row, cells))
    }

    pub fn row_cells(&self, row: u32) -> Option<&BTreeMap<u16, Cell>> {
        self.rows.get(&row)
    }

    pub fn custom_row_height(&self, row: u32) -> Option<f64> {
        self.row_heights.get(&row).copied()
    }

    pub fn custom_row_heights(&self) -> &BTreeMap<u32, f64> {
        &self.row_heights
    }

    /// Give `row` a custom height in points
    pub fn set_row_height(&mut self, row: u32, height: f64) -> Result<()> {
        check_position(row, 0)?;
        self.row_heights.insert(row, height);
        Ok(())
    }

    // === Columns ===

    pub fn column(&self, index: u16) -> Option<&Column> {
        self.columns.get(&index)
    }

    /// An allocated column; fails with [`Error::ColumnNotAllocated`] otherwise
    pub fn column_mut(&mut self, index: u16) -> Result<&mut Column> {
        self.columns
            .get_mut(&index)
            .ok_or(Error::ColumnNotAllocated(index))
    }

    /// Create the column object at `index`; each index can be allocated once
    pub fn allocate_column(&mut self, index: u16) -> Result<&mut Column> {
        check_position(0, index)?;
        match self.columns.entry(index) {
            Entry::Occupied(_) => Err(Error::ColumnAllocatedTwice(index)),
            Entry::Vacant(slot) => Ok(slot.insert(Column::new(index))),
        }
    }

    /// Allocated columns, left to right
    pub fn columns(&self) -> impl Iterator<Item = &Column> {
        self.columns.values()
    }

    pub fn column_width(&self, index: u16) -> Option<f64> {
        self.column(index)?.width
    }

    // === Merges and pictures ===

    pub fn merged_regions(&self) -> &[CellRange] {
        &self.merged_regions
    }

    /// Record a merged range; ranges on one sheet never overlap
    pub fn merge_cells(&mut self, range: &CellRange) -> Result<()> {
        if self.merged_regions.iter().any(|merged| merged.overlaps(range)) {
            return Err(Error::MergeOverlap(range.to_string()));
        }
        self.merged_regions.push(*range);
        Ok(())
    }

    pub fn add_picture(&mut self, picture: Picture) -> Result<()> {
        check_position(picture.row, picture.col)?;
        self.pictures.push(picture);
        Ok(())
    }

    /// In the order they were added
    pub fn pictures(&self) -> &[Picture] {
        &self.pictures
    }
}

fn check_position(row: u32, col: u16) -> Result<()> {
    if row >= MAX_ROWS {
        Err(Error::RowLimit(row, MAX_ROWS - 1))
    } else if col >= MAX_COLS {
        Err(Error::ColumnLimit(col, MAX_COLS - 1))
    } else {
        Ok(())
    }
}
