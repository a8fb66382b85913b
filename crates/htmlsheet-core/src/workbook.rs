//! The document: sheets in tab order plus one shared style registry

use crate::error::{Error, Result};
use crate::style::{Style, StyleId, StyleRegistry};
use crate::worksheet::Worksheet;
use crate::MAX_SHEET_NAME_LEN;

/// Characters a sheet name may not contain
pub const INVALID_SHEET_NAME_CHARS: &[char] = &[':', '\\', '/', '?', '*', '[', ']'];

/// Sheets and the styles their cells and columns refer to
///
/// Style handles are only meaningful within the workbook that issued them.
#[derive(Debug, Clone)]
pub struct Workbook {
    sheets: Vec<Worksheet>,
    styles: StyleRegistry,
}

impl Default for Workbook {
    fn default() -> Self {
        Self::new()
    }
}

impl Workbook {
    /// A workbook holding a single blank "Sheet1"
    pub fn new() -> Self {
        let mut workbook = Self::without_sheets();
        workbook.sheets.push(Worksheet::new("Sheet1"));
        workbook
    }

    /// A workbook to be filled sheet by sheet, as when loading a file
    pub fn without_sheets() -> Self {
        Self {
            sheets: Vec::new(),
            styles: StyleRegistry::new(),
        }
    }

    /// Register `style`, returning the existing handle for an equal style
    pub fn register_style(&mut self, style: Style) -> StyleId {
        self.styles.register(style)
    }

    pub fn style(&self, id: StyleId) -> Option<&Style> {
        self.styles.get(id)
    }

    pub fn styles(&self) -> &StyleRegistry {
        &self.styles
    }

    /// Swap in a registry read from disk
    ///
    /// Handles already stored in cells are not remapped.
    pub fn set_styles(&mut self, styles: StyleRegistry) {
        self.styles = styles;
    }

    pub fn sheet_count(&self) -> usize {
        self.sheets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sheets.is_empty()
    }

    pub fn worksheet(&self, index: usize) -> Option<&Worksheet> {
        self.sheets.get(index)
    }

    pub fn worksheet_mut(&mut self, index: usize) -> Option<&mut Worksheet> {
        self.sheets.get_mut(index)
    }

    pub fn worksheets(&self) -> impl Iterator<Item = &Worksheet> {
        self.sheets.iter()
    }

    /// Whether another sheet already uses `name`, ignoring case
    ///
    /// The sheet at `ignoring` is skipped, so a sheet may be renamed to a
    /// different casing of its own name.
    pub fn name_taken(&self, name: &str, ignoring: Option<usize>) -> bool {
        let wanted = name.to_lowercase();
        self.sheets
            .iter()
            .enumerate()
            .any(|(i, sheet)| Some(i) != ignoring && sheet.name().to_lowercase() == wanted)
    }

    /// Append a blank sheet and return its index
    pub fn add_sheet(&mut self, name: &str) -> Result<usize> {
        self.push_sheet(Worksheet::new(name))
    }

    /// Append a populated sheet and return its index
    pub fn push_sheet(&mut self, sheet: Worksheet) -> Result<usize> {
        self.check_name(sheet.name(), None)?;
        self.sheets.push(sheet);
        Ok(self.sheets.len() - 1)
    }

    pub fn rename_sheet(&mut self, index: usize, name: &str) -> Result<()> {
        if index >= self.sheets.len() {
            return Err(Error::NoSuchSheet(index, self.sheets.len()));
        }
        self.check_name(name, Some(index))?;
        self.sheets[index].set_name(name);
        Ok(())
    }

    fn check_name(&self, name: &str, ignoring: Option<usize>) -> Result<()> {
        let acceptable = !name.is_empty()
            && name.chars().count() <= MAX_SHEET_NAME_LEN
            && !name.contains(INVALID_SHEET_NAME_CHARS);
        if !acceptable {
            return Err(Error::BadSheetName(name.into()));
        }
        if self.name_taken(name, ignoring) {
            return Err(Error::SheetNameTaken(name.into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_workbook() {
        let wb = Workbook::new();
        assert_eq!(wb.sheet_count(), 1);
        assert_eq!(wb.worksheet(0).unwrap().name(), "Sheet1");
        assert_eq!(wb.styles().len(), 1);
        assert!(Workbook::without_sheets().is_empty());
    }

    #[test]
    fn test_add_sheets_in_order() {
        let mut wb = Workbook::new();
        assert_eq!(wb.add_sheet("Data").unwrap(), 1);
        assert_eq!(wb.add_sheet("More").unwrap(), 2);
        let names: Vec<&str> = wb.worksheets().map(|ws| ws.name()).collect();
        assert_eq!(names, ["Sheet1", "Data", "More"]);
    }

    #[test]
    fn test_names_compare_without_case() {
        let mut wb = Workbook::new();
        assert!(matches!(wb.add_sheet("SHEET1"), Err(Error::SheetNameTaken(_))));
        assert!(wb.name_taken("sheet1", None));
        assert!(!wb.name_taken("sheet1", Some(0)));
    }

    #[test]
    fn test_rejected_names() {
        let mut wb = Workbook::new();
        for name in ["", "Sheet/1", "Sheet:1", "Sheet[1]", "a?b", "x*"] {
            assert!(
                matches!(wb.add_sheet(name), Err(Error::BadSheetName(_))),
                "{name:?}"
            );
        }

        let long_name = "A".repeat(MAX_SHEET_NAME_LEN + 1);
        assert!(wb.add_sheet(&long_name).is_err());
        let max_name = "é".repeat(MAX_SHEET_NAME_LEN);
        assert!(wb.add_sheet(&max_name).is_ok());
    }

    #[test]
    fn test_rename_sheet() {
        let mut wb = Workbook::new();
        wb.add_sheet("Other").unwrap();

        wb.rename_sheet(0, "sheet1").unwrap();
        assert_eq!(wb.worksheet(0).unwrap().name(), "sheet1");
        assert!(wb.rename_sheet(0, "other").is_err());
        assert!(matches!(wb.rename_sheet(5, "X"), Err(Error::NoSuchSheet(5, 2))));
    }

    #[test]
    fn test_register_style() {
        let mut wb = Workbook::new();
        let id = wb.register_style(Style::new().bold(true));
        assert_eq!(id, StyleId(1));
        assert_eq!(wb.register_style(Style::new().bold(true)), id);
        assert!(wb.style(id).unwrap().font.bold);
        assert!(wb.style(StyleId(2)).is_none());
    }
}
