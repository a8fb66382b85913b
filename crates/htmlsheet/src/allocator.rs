//! Sheet naming and allocation for tables

use htmlsheet_core::{Workbook, INVALID_SHEET_NAME_CHARS, MAX_SHEET_NAME_LEN};
use htmlsheet_markup::Element;

use crate::error::{ConvertError, Result};
use crate::walker::SheetContext;

/// Assigns one sheet per table
///
/// The first table takes over the workbook's initial sheet; every later
/// table gets a new one.
#[derive(Debug, Clone, Copy, Default)]
pub struct SheetAllocator;

impl SheetAllocator {
    pub fn new() -> Self {
        Self
    }

    /// Declared name of a table, or `DataSheet {index}` when it has none
    pub fn name_for(&self, table: Element<'_>, index: usize) -> String {
        let declared = ["data-name", "name"]
            .iter()
            .filter_map(|attr| table.attr(attr))
            .map(str::trim)
            .find(|name| !name.is_empty());

        match declared {
            Some(name) => name.to_string(),
            None => {
                let name = format!("DataSheet {}", index);
                log::warn!("table {} has no data-name; using '{}'", index, name);
                name
            }
        }
    }

    /// Create or rename the sheet for table `index` and return its context
    pub fn allocate(
        &self,
        workbook: &mut Workbook,
        table: Element<'_>,
        index: usize,
    ) -> Result<SheetContext> {
        let requested = self.name_for(table, index);
        self.allocate_named(workbook, &requested, index)
    }

    pub(crate) fn allocate_named(
        &self,
        workbook: &mut Workbook,
        requested: &str,
        index: usize,
    ) -> Result<SheetContext> {
        let reuse_first = index == 0 && workbook.sheet_count() > 0;
        let replacing = reuse_first.then_some(0);
        let name = unique_name(workbook, &sanitize(requested), replacing);

        let allocation = if reuse_first {
            workbook.rename_sheet(0, &name).map(|()| 0)
        } else {
            workbook.add_sheet(&name)
        };
        let sheet = allocation.map_err(|source| ConvertError::SheetAllocation {
            name: name.clone(),
            source,
        })?;

        log::debug!("table {} -> sheet {} '{}'", index, sheet, name);
        Ok(SheetContext::new(sheet, name))
    }
}

/// Replace characters sheet names cannot hold and cut to the length limit
pub fn sanitize(name: &str) -> String {
    let mut cleaned: String = name
        .chars()
        .map(|c| if INVALID_SHEET_NAME_CHARS.contains(&c) { '_' } else { c })
        .collect();
    if cleaned != name {
        log::warn!("sheet name '{}' has invalid characters; using '{}'", name, cleaned);
    }
    if cleaned.chars().count() > MAX_SHEET_NAME_LEN {
        let truncated: String = cleaned.chars().take(MAX_SHEET_NAME_LEN).collect();
        log::warn!("sheet name '{}' truncated to '{}'", cleaned, truncated);
        cleaned = truncated;
    }
    if cleaned.trim().is_empty() {
        cleaned = "Sheet".to_string();
    }
    cleaned
}

/// Suffix ` (2)`, ` (3)`, ... until the name is free
///
/// `replacing` is a sheet about to be renamed, whose current name does not
/// count as taken.
fn unique_name(workbook: &Workbook, name: &str, replacing: Option<usize>) -> String {
    let taken = |candidate: &str| workbook.name_taken(candidate, replacing);

    if !taken(name) {
        return name.to_string();
    }
    let mut n = 2usize;
    loop {
        let suffix = format!(" ({})", n);
        let keep = MAX_SHEET_NAME_LEN.saturating_sub(suffix.chars().count());
        let base: String = name.chars().take(keep).collect();
        let candidate = format!("{}{}", base, suffix);
        if !taken(&candidate) {
            log::warn!("sheet name '{}' already used; using '{}'", name, candidate);
            return candidate;
        }
        n += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use htmlsheet_markup::Document;
    use pretty_assertions::assert_eq;

    fn names(workbook: &Workbook) -> Vec<String> {
        workbook.worksheets().map(|ws| ws.name().to_string()).collect()
    }

    #[test]
    fn test_name_for_prefers_data_name() {
        let doc = Document::parse(
            r#"<table data-name="Results" name="ignored"></table><table name=" Plain "></table><table data-name="  "></table>"#,
        )
        .unwrap();
        let tables = doc.root().select(".//table").unwrap();
        let allocator = SheetAllocator::new();
        assert_eq!(allocator.name_for(tables[0], 0), "Results");
        assert_eq!(allocator.name_for(tables[1], 1), "Plain");
        assert_eq!(allocator.name_for(tables[2], 2), "DataSheet 2");
    }

    #[test]
    fn test_first_table_renames_default_sheet() {
        let mut workbook = Workbook::new();
        let allocator = SheetAllocator::new();

        let first = allocator.allocate_named(&mut workbook, "Summary", 0).unwrap();
        let second = allocator.allocate_named(&mut workbook, "Details", 1).unwrap();

        assert_eq!(first.sheet, 0);
        assert_eq!(second.sheet, 1);
        assert_eq!(names(&workbook), vec!["Summary", "Details"]);
    }

    #[test]
    fn test_first_table_may_keep_default_name() {
        let mut workbook = Workbook::new();
        let ctx = SheetAllocator::new()
            .allocate_named(&mut workbook, "sheet1", 0)
            .unwrap();
        assert_eq!(ctx.name, "sheet1");
        assert_eq!(workbook.sheet_count(), 1);
    }

    #[test]
    fn test_duplicates_get_suffixes() {
        let mut workbook = Workbook::new();
        let allocator = SheetAllocator::new();
        allocator.allocate_named(&mut workbook, "Data", 0).unwrap();
        allocator.allocate_named(&mut workbook, "data", 1).unwrap();
        allocator.allocate_named(&mut workbook, "Data", 2).unwrap();
        assert_eq!(names(&workbook), vec!["Data", "data (2)", "Data (3)"]);
    }

    #[test]
    fn test_sanitize() {
        assert_eq!(sanitize("Q1/Q2: [draft]?"), "Q1_Q2_ _draft__");
        let long = "x".repeat(40);
        assert_eq!(sanitize(&long).chars().count(), MAX_SHEET_NAME_LEN);
        assert_eq!(sanitize("   "), "Sheet");
    }

    #[test]
    fn test_suffix_respects_length_limit() {
        let mut workbook = Workbook::new();
        let allocator = SheetAllocator::new();
        let long = "y".repeat(31);
        allocator.allocate_named(&mut workbook, &long, 0).unwrap();
        let ctx = allocator.allocate_named(&mut workbook, &long, 1).unwrap();
        assert_eq!(ctx.name.chars().count(), MAX_SHEET_NAME_LEN);
        assert!(ctx.name.ends_with(" (2)"));
    }
}
