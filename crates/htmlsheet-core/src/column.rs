//! Explicit column objects

use crate::style::StyleId;

/// A column the sheet has allocated
///
/// Width and style can only be set on columns obtained from
/// [`Worksheet::allocate_column`](crate::Worksheet::allocate_column); other
/// columns render at the default width with no column style.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    /// 0-based
    pub index: u16,
    /// Width in characters
    pub width: Option<f64>,
    pub style: Option<StyleId>,
}

impl Column {
    pub fn new(index: u16) -> Self {
        Self {
            index,
            width: None,
            style: None,
        }
    }
}
