//! Walking table elements into the live document
//!
//! A `<tr>` is read into a [`Row`], written, and dropped before the next
//! row is read. Header-tagged cells come first in a row, then data cells;
//! the column cursor advances by one per cell whatever the cell spans.

use std::path::{Path, PathBuf};

use htmlsheet_core::{CellValue, Picture, PictureFormat, MAX_CELL_TEXT_LEN, MAX_COLS};
use htmlsheet_markup::Element;
use image::ImageFormat;

use crate::config::ConvertOptions;
use crate::error::Result;
use crate::mapper::{LiveDocument, StyleMapper};
use crate::parser::StyleParser;
use crate::style::{StyleModel, ValueType};

/// Per-sheet progress carried across batches
#[derive(Debug, Clone, PartialEq)]
pub struct SheetContext {
    /// Index of the sheet in the workbook
    pub sheet: usize,
    pub name: String,
    /// 0-based row the next `<tr>` is written to
    pub next_row: u32,
}

impl SheetContext {
    pub fn new<S: Into<String>>(sheet: usize, name: S) -> Self {
        Self {
            sheet,
            name: name.into(),
            next_row: 0,
        }
    }
}

/// An `<img>` found in a cell
#[derive(Debug, Clone, PartialEq)]
pub struct ImageRef {
    pub src: String,
    pub alt: String,
}

/// What a cell contributes besides its style
#[derive(Debug, Clone, PartialEq)]
pub enum CellContent {
    /// Blank text; nothing is written
    Empty,
    /// Trimmed text content
    Text(String),
    /// Embedded images, preferred over text
    Images(Vec<ImageRef>),
}

/// One cell of a row
#[derive(Debug, Clone, PartialEq)]
pub struct RowCell {
    pub col: u16,
    pub content: CellContent,
    pub style: StyleModel,
    /// Header-tagged cells also style their column
    pub header: bool,
}

/// One `<tr>` ready to be written
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    pub index: u32,
    pub cells: Vec<RowCell>,
    /// Present only when the `<tr>` has a `style` attribute
    pub style: Option<StyleModel>,
}

/// Header and body rows of one table
#[derive(Debug, Clone)]
pub struct TableRows<'a> {
    pub header: Vec<Element<'a>>,
    pub body: Vec<Element<'a>>,
}

impl<'a> TableRows<'a> {
    /// Split a table's rows: `thead` rows are the header, direct, `tbody`
    /// and `tfoot` rows form the body in document order
    pub fn collect(table: Element<'a>) -> Result<Self> {
        let header = table.select("./thead/tr")?;
        let mut body = table.select("./tr")?;
        body.extend(table.select("./tbody/tr")?);
        body.extend(table.select("./tfoot/tr")?);
        body.sort_by_key(|row| row.id());
        Ok(Self { header, body })
    }

    pub fn len(&self) -> usize {
        self.header.len() + self.body.len()
    }

    pub fn is_empty(&self) -> bool {
        self.header.is_empty() && self.body.is_empty()
    }
}

/// Writes table rows into a live document
#[derive(Debug, Clone)]
pub struct TableWalker {
    parser: StyleParser,
    mapper: StyleMapper,
    image_base_dir: Option<PathBuf>,
}

impl Default for TableWalker {
    fn default() -> Self {
        Self::new(&ConvertOptions::default())
    }
}

impl TableWalker {
    pub fn new(options: &ConvertOptions) -> Self {
        Self {
            parser: StyleParser::from_options(options),
            mapper: StyleMapper::from_options(options),
            image_base_dir: options.image_base_dir.clone(),
        }
    }

    pub fn parser(&self) -> &StyleParser {
        &self.parser
    }

    pub fn mapper(&self) -> &StyleMapper {
        &self.mapper
    }

    /// Write every header row
    pub fn process_header(
        &self,
        doc: &mut LiveDocument,
        ctx: &mut SheetContext,
        rows: &[Element<'_>],
    ) -> Result<usize> {
        for tr in rows {
            self.process_row(doc, ctx, *tr)?;
        }
        Ok(rows.len())
    }

    /// Write body rows `[offset, offset + count)`, clipped to the rows
    /// available; returns how many were written
    pub fn process_body_batch(
        &self,
        doc: &mut LiveDocument,
        ctx: &mut SheetContext,
        rows: &[Element<'_>],
        offset: usize,
        count: usize,
    ) -> Result<usize> {
        if offset >= rows.len() {
            return Ok(0);
        }
        let end = offset.saturating_add(count).min(rows.len());
        for tr in &rows[offset..end] {
            self.process_row(doc, ctx, *tr)?;
        }
        Ok(end - offset)
    }

    fn process_row(
        &self,
        doc: &mut LiveDocument,
        ctx: &mut SheetContext,
        tr: Element<'_>,
    ) -> Result<()> {
        let row = self.read_row(tr, ctx.next_row)?;
        self.write_row(doc, ctx.sheet, &row)?;
        ctx.next_row += 1;
        Ok(())
    }

    /// Build the [`Row`] for a `<tr>` at sheet row `index`
    pub fn read_row(&self, tr: Element<'_>, index: u32) -> Result<Row> {
        let header_cells = tr.select("./th")?;
        let data_cells = tr.select("./td")?;

        let mut cells = Vec::with_capacity(header_cells.len() + data_cells.len());
        let tagged = header_cells
            .into_iter()
            .map(|el| (el, true))
            .chain(data_cells.into_iter().map(|el| (el, false)));

        for (col, (el, header)) in tagged.enumerate() {
            let Some(col) = u16::try_from(col).ok().filter(|&c| c < MAX_COLS) else {
                log::warn!(
                    "row {} has more cells than a sheet has columns; rest dropped",
                    index + 1
                );
                break;
            };
            cells.push(self.read_cell(el, col, header)?);
        }

        Ok(Row {
            index,
            cells,
            style: tr.attr("style").map(|s| self.parser.parse(s)),
        })
    }

    fn read_cell(&self, el: Element<'_>, col: u16, header: bool) -> Result<RowCell> {
        let mut style = self.parser.parse_attr(el.attr("style"));
        if let Some(span) = el.attr("colspan") {
            match span.trim().parse::<u32>() {
                Ok(span) => style = style.with_colspan(span),
                Err(_) => log::trace!("ignoring colspan '{}'", span),
            }
        }

        let images: Vec<ImageRef> = el
            .select(".//img")?
            .into_iter()
            .map(|img| ImageRef {
                src: img.attr("src").unwrap_or_default().trim().to_string(),
                alt: img.attr("alt").unwrap_or_default().to_string(),
            })
            .collect();

        let content = if !images.is_empty() {
            CellContent::Images(images)
        } else {
            let text = el.text();
            let text = text.trim();
            if text.is_empty() {
                CellContent::Empty
            } else {
                CellContent::Text(text.to_string())
            }
        };

        Ok(RowCell {
            col,
            content,
            style,
            header,
        })
    }

    /// Write a row's cells, then its row style
    pub fn write_row(&self, doc: &mut LiveDocument, sheet: usize, row: &Row) -> Result<()> {
        for cell in &row.cells {
            self.write_cell(doc, sheet, row.index, cell)?;
        }

        let Some(row_style) = &row.style else {
            return Ok(());
        };
        self.mapper.apply_row(doc, sheet, row.index, row_style)?;
        for cell in &row.cells {
            let inherited = cell.style.inherit(row_style);
            if inherited != cell.style {
                let handle = self.mapper.register(doc, &inherited);
                self.mapper.apply_cell(doc, sheet, row.index, cell.col, handle)?;
            }
        }
        Ok(())
    }

    fn write_cell(
        &self,
        doc: &mut LiveDocument,
        sheet: usize,
        row: u32,
        cell: &RowCell,
    ) -> Result<()> {
        match &cell.content {
            CellContent::Empty => {}
            CellContent::Text(text) => {
                let value = typed_value(text, cell.style.value_type);
                doc.sheet_mut(sheet)?.set_cell_value_at(row, cell.col, value)?;
            }
            CellContent::Images(images) => {
                for img in images {
                    match self.load_picture(img, row, cell.col) {
                        Some(picture) => doc.sheet_mut(sheet)?.add_picture(picture)?,
                        None if !img.alt.is_empty() => {
                            doc.sheet_mut(sheet)?
                                .set_cell_value_at(row, cell.col, truncate(&img.alt))?;
                        }
                        None => {}
                    }
                }
            }
        }

        if cell.header {
            self.mapper.apply_column(doc, sheet, cell.col, &cell.style)?;
        }
        let handle = self.mapper.register(doc, &cell.style);
        self.mapper.apply_cell(doc, sheet, row, cell.col, handle)?;
        self.mapper.merge(doc, sheet, row, cell.col, cell.style.colspan)
    }

    fn resolve_image_path(&self, src: &str) -> PathBuf {
        let src = src.strip_prefix("file://").unwrap_or(src);
        let path = Path::new(src);
        match &self.image_base_dir {
            Some(base) if path.is_relative() => base.join(path),
            _ => path.to_path_buf(),
        }
    }

    /// Read and sniff an image; `None` when it cannot be embedded
    fn load_picture(&self, img: &ImageRef, row: u32, col: u16) -> Option<Picture> {
        if img.src.is_empty() {
            log::warn!("image without src at ({}, {}); using alt text", row, col);
            return None;
        }
        let path = self.resolve_image_path(&img.src);
        let data = match std::fs::read(&path) {
            Ok(data) => data,
            Err(err) => {
                log::warn!(
                    "image '{}' not available ({}); using alt text",
                    path.display(),
                    err
                );
                return None;
            }
        };

        let format = match image::guess_format(&data) {
            Ok(ImageFormat::Png) => PictureFormat::Png,
            Ok(ImageFormat::Jpeg) => PictureFormat::Jpeg,
            Ok(ImageFormat::Gif) => PictureFormat::Gif,
            Ok(other) => {
                log::warn!(
                    "image '{}' is {:?}, which cannot be embedded",
                    path.display(),
                    other
                );
                return None;
            }
            Err(err) => {
                log::warn!("image '{}' is not a known image: {}", path.display(), err);
                return None;
            }
        };

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| format!("image.{}", format.extension()));
        Some(Picture::new(row, col, name, data, format))
    }
}

/// Type raw text as declared, falling back to the text itself
pub fn typed_value(text: &str, value_type: ValueType) -> CellValue {
    match value_type {
        ValueType::String => truncate(text),
        ValueType::Float => match parse_float(text) {
            Some(n) => CellValue::Number(n),
            None => {
                log::warn!("'{}' is not a number; written as text", text);
                truncate(text)
            }
        },
        ValueType::Bool => match parse_bool(text) {
            Some(b) => CellValue::Boolean(b),
            None => {
                log::warn!("'{}' is not a boolean; written as text", text);
                truncate(text)
            }
        },
    }
}

fn parse_float(text: &str) -> Option<f64> {
    let compact: String = text.chars().filter(|c| !c.is_whitespace()).collect();
    let parsed = compact.parse::<f64>().ok().or_else(|| {
        // Decimal comma, as in "95,5"
        if compact.matches(',').count() == 1 && !compact.contains('.') {
            compact.replace(',', ".").parse::<f64>().ok()
        } else {
            None
        }
    });
    parsed.filter(|n| n.is_finite())
}

fn parse_bool(text: &str) -> Option<bool> {
    match text.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "1" => Some(true),
        "false" | "no" | "0" => Some(false),
        _ => None,
    }
}

fn truncate(text: &str) -> CellValue {
    match text.char_indices().nth(MAX_CELL_TEXT_LEN) {
        Some((cut, _)) => {
            log::warn!(
                "cell text of {} characters truncated to {}",
                text.chars().count(),
                MAX_CELL_TEXT_LEN
            );
            CellValue::string(&text[..cut])
        }
        None => CellValue::string(text),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use htmlsheet_core::HorizontalAlignment;
    use htmlsheet_markup::Document;
    use pretty_assertions::assert_eq;

    fn table(doc: &Document) -> Element<'_> {
        doc.root().select(".//table").unwrap()[0]
    }

    #[test]
    fn test_table_rows_split() {
        let doc = Document::parse(
            "<table><thead><tr><th>h</th></tr></thead>\
             <tr><td>a</td></tr><tbody><tr><td>b</td></tr></tbody>\
             <tr><td>c</td></tr><tfoot><tr><td>f</td></tr></tfoot></table>",
        )
        .unwrap();
        let rows = TableRows::collect(table(&doc)).unwrap();
        assert_eq!(rows.header.len(), 1);
        let body: Vec<String> = rows.body.iter().map(|r| r.text()).collect();
        assert_eq!(body, vec!["a", "b", "c", "f"]);
        assert_eq!(rows.len(), 5);
    }

    #[test]
    fn test_read_row_cursor_and_colspan() {
        let doc = Document::parse(
            r#"<table><tr style="height: 300px"><th>k</th><td colspan="3">wide</td><td> next </td><td>  </td></tr></table>"#,
        )
        .unwrap();
        let tr = table(&doc).select("./tr").unwrap()[0];
        let row = TableWalker::default().read_row(tr, 4).unwrap();

        assert_eq!(row.index, 4);
        let cols: Vec<u16> = row.cells.iter().map(|c| c.col).collect();
        assert_eq!(cols, vec![0, 1, 2, 3]);
        assert!(row.cells[0].header);
        assert!(!row.cells[1].header);
        assert_eq!(row.cells[1].style.colspan, 3);
        assert_eq!(row.cells[2].content, CellContent::Text("next".into()));
        assert_eq!(row.cells[3].content, CellContent::Empty);
        assert_eq!(row.style.as_ref().map(|s| s.height), Some(30.0));
    }

    #[test]
    fn test_header_cells_precede_data_cells() {
        let doc = Document::parse("<table><tr><td>d1</td><th>h1</th><td>d2</td></tr></table>")
            .unwrap();
        let tr = table(&doc).select("./tr").unwrap()[0];
        let row = TableWalker::default().read_row(tr, 0).unwrap();
        let contents: Vec<&CellContent> = row.cells.iter().map(|c| &c.content).collect();
        assert_eq!(
            contents,
            vec![
                &CellContent::Text("h1".into()),
                &CellContent::Text("d1".into()),
                &CellContent::Text("d2".into()),
            ]
        );
    }

    #[test]
    fn test_body_batch_clips() {
        let doc = Document::parse(
            "<table><tr><td>1</td></tr><tr><td>2</td></tr><tr><td>3</td></tr></table>",
        )
        .unwrap();
        let rows = TableRows::collect(table(&doc)).unwrap();
        let walker = TableWalker::default();
        let mut live = LiveDocument::new();
        let mut ctx = SheetContext::new(0, "Sheet1");

        let mut batch = |offset| {
            walker
                .process_body_batch(&mut live, &mut ctx, &rows.body, offset, 2)
                .unwrap()
        };
        assert_eq!(batch(0), 2);
        assert_eq!(batch(2), 1);
        assert_eq!(batch(4), 0);
        assert_eq!(ctx.next_row, 3);

        let sheet = live.workbook().worksheet(0).unwrap();
        assert_eq!(sheet.get_value_at(2, 0), CellValue::string("3"));
    }

    #[test]
    fn test_every_cell_gets_a_style() {
        let doc = Document::parse("<table><tr><td>plain</td><td></td></tr></table>").unwrap();
        let rows = TableRows::collect(table(&doc)).unwrap();
        let walker = TableWalker::default();
        let mut live = LiveDocument::new();
        let mut ctx = SheetContext::new(0, "Sheet1");
        walker.process_body_batch(&mut live, &mut ctx, &rows.body, 0, 10).unwrap();

        let sheet = live.workbook().worksheet(0).unwrap();
        let a = sheet.cell_style_at(0, 0).unwrap();
        assert_eq!(sheet.cell_style_at(0, 1), Some(a));
        let style = live.workbook().style(a).unwrap();
        assert_eq!(style.font.size, 11.0);
        assert!(!style.fill.is_none());
    }

    #[test]
    fn test_row_style_propagates_to_cells() {
        let doc = Document::parse(
            r#"<table><tr style="text-align: center; border-style: solid"><td>a</td><td style="text-align: left">b</td></tr></table>"#,
        )
        .unwrap();
        let rows = TableRows::collect(table(&doc)).unwrap();
        let walker = TableWalker::default();
        let mut live = LiveDocument::new();
        let mut ctx = SheetContext::new(0, "Sheet1");
        walker.process_body_batch(&mut live, &mut ctx, &rows.body, 0, 1).unwrap();

        let wb = live.workbook();
        let sheet = wb.worksheet(0).unwrap();
        let a = wb.style(sheet.cell_style_at(0, 0).unwrap()).unwrap();
        let b = wb.style(sheet.cell_style_at(0, 1).unwrap()).unwrap();
        assert_eq!(a.alignment.horizontal, HorizontalAlignment::Center);
        assert_eq!(b.alignment.horizontal, HorizontalAlignment::Left);
        assert!(!a.border.is_empty());
        assert!(!b.border.is_empty());
        assert_eq!(sheet.custom_row_height(0), Some(15.0));
    }

    #[test]
    fn test_missing_image_falls_back_to_alt() {
        let doc = Document::parse(
            r#"<table><tr><td>caption<img src="/definitely/missing.png" alt="Logo"></td></tr></table>"#,
        )
        .unwrap();
        let rows = TableRows::collect(table(&doc)).unwrap();
        let walker = TableWalker::default();
        let mut live = LiveDocument::new();
        let mut ctx = SheetContext::new(0, "Sheet1");
        walker.process_body_batch(&mut live, &mut ctx, &rows.body, 0, 1).unwrap();

        let sheet = live.workbook().worksheet(0).unwrap();
        assert_eq!(sheet.get_value_at(0, 0), CellValue::string("Logo"));
        assert!(sheet.pictures().is_empty());
    }

    #[test]
    fn test_typed_values() {
        assert_eq!(typed_value("95", ValueType::Float), CellValue::Number(95.0));
        assert_eq!(typed_value("1 234,5", ValueType::Float), CellValue::Number(1234.5));
        assert_eq!(typed_value("n/a", ValueType::Float), CellValue::string("n/a"));
        assert_eq!(typed_value("NaN", ValueType::Float), CellValue::string("NaN"));
        assert_eq!(typed_value("inf", ValueType::Float), CellValue::string("inf"));
        assert_eq!(typed_value("Yes", ValueType::Bool), CellValue::Boolean(true));
        assert_eq!(typed_value("0", ValueType::Bool), CellValue::Boolean(false));
        assert_eq!(typed_value("maybe", ValueType::Bool), CellValue::string("maybe"));
        assert_eq!(typed_value("95", ValueType::String), CellValue::string("95"));
    }

    #[test]
    fn test_long_text_truncated() {
        let long = "é".repeat(MAX_CELL_TEXT_LEN + 10);
        match typed_value(&long, ValueType::String) {
            CellValue::String(s) => assert_eq!(s.chars().count(), MAX_CELL_TEXT_LEN),
            other => panic!("expected string, got {:?}", other),
        }
    }

    #[test]
    fn test_resolve_image_path() {
        let walker = TableWalker::new(&ConvertOptions::default().with_image_base_dir("/assets"));
        assert_eq!(walker.resolve_image_path("logo.png"), PathBuf::from("/assets/logo.png"));
        assert_eq!(walker.resolve_image_path("/abs/logo.png"), PathBuf::from("/abs/logo.png"));
        assert_eq!(walker.resolve_image_path("file:///abs/x.gif"), PathBuf::from("/abs/x.gif"));
    }
}
