//! A1-style cell references

use std::fmt;

use crate::error::{Error, Result};
use crate::{MAX_COLS, MAX_ROWS};

/// Zero-based coordinates of one cell, shown as `B3` and friends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CellAddress {
    pub row: u32,
    pub col: u16,
}

impl CellAddress {
    pub fn new(row: u32, col: u16) -> Self {
        Self { row, col }
    }

    /// Read a reference such as `C12` or `$B$2`
    ///
    /// ```
    /// use htmlsheet_core::CellAddress;
    ///
    /// let addr = CellAddress::parse("B3").unwrap();
    /// assert_eq!((addr.row, addr.col), (2, 1));
    /// ```
    pub fn parse(text: &str) -> Result<Self> {
        let reference: String = text.trim().chars().filter(|&c| c != '$').collect();
        let digits_at = reference
            .find(|c: char| c.is_ascii_digit())
            .unwrap_or(reference.len());
        let (letters, digits) = reference.split_at(digits_at);

        let bad = || Error::BadReference(text.to_string());
        if letters.is_empty() || !letters.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(bad());
        }
        let row = match digits.parse::<u32>() {
            Ok(n) if n >= 1 => n - 1,
            _ => return Err(bad()),
        };
        if row >= MAX_ROWS {
            return Err(Error::RowLimit(row, MAX_ROWS - 1));
        }
        Ok(Self::new(row, column_index(letters)?))
    }
}

/// Bijective base-26: `A` is 0, `Z` is 25, `AA` is 26
fn column_index(letters: &str) -> Result<u16> {
    let mut number: u32 = 0;
    for b in letters.bytes() {
        number = number * 26 + u32::from(b.to_ascii_uppercase() - b'A') + 1;
        if number > u32::from(MAX_COLS) {
            return Err(Error::ColumnLimit(u16::MAX, MAX_COLS - 1));
        }
    }
    Ok((number - 1) as u16)
}

fn column_name(col: u16) -> String {
    let mut letters = Vec::new();
    let mut rest = u32::from(col) + 1;
    while rest > 0 {
        rest -= 1;
        letters.push(b'A' + (rest % 26) as u8);
        rest /= 26;
    }
    letters.iter().rev().map(|&b| b as char).collect()
}

impl fmt::Display for CellAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", column_name(self.col), self.row + 1)
    }
}

/// Rectangle of cells with `start` top-left and `end` bottom-right, both
/// included
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CellRange {
    pub start: CellAddress,
    pub end: CellAddress,
}

impl CellRange {
    /// The rectangle between two corners given in any order
    pub fn spanning(row_a: u32, col_a: u16, row_b: u32, col_b: u16) -> Self {
        Self {
            start: CellAddress::new(row_a.min(row_b), col_a.min(col_b)),
            end: CellAddress::new(row_a.max(row_b), col_a.max(col_b)),
        }
    }

    /// Read `A1:C1`; a lone reference is a one-cell range
    pub fn parse(text: &str) -> Result<Self> {
        let (first, last) = text.split_once(':').unwrap_or((text, text));
        match (CellAddress::parse(first), CellAddress::parse(last)) {
            (Ok(a), Ok(b)) => Ok(Self::spanning(a.row, a.col, b.row, b.col)),
            _ => Err(Error::BadRange(text.trim().to_string())),
        }
    }

    pub fn overlaps(&self, other: &CellRange) -> bool {
        let rows = self.start.row <= other.end.row && other.start.row <= self.end.row;
        let cols = self.start.col <= other.end.col && other.start.col <= self.end.col;
        rows && cols
    }
}

impl fmt::Display for CellRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.start, self.end)
    }
}
