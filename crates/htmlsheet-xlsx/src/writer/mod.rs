//! Serializing a [`Workbook`] into an XLSX package
//!
//! Parts are rendered to strings and stored in a fresh archive in one pass:
//! content types, package and workbook relationships, the workbook, the
//! shared stylesheet, then each sheet followed by its drawing and media.

mod drawing;

use std::collections::BTreeSet;
use std::fs::File;
use std::io::{Seek, Write};
use std::path::Path;

use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::error::{XlsxError, XlsxResult};
use crate::{encode_xstring, escape_xml};
use crate::styles::XlsxStyleTable;
use htmlsheet_core::{CellAddress, CellValue, Column, Workbook, Worksheet, DEFAULT_COLUMN_WIDTH};

use self::drawing::DrawingPlan;

const XML_DECL: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#;
const MAIN_NS: &str = "http://schemas.openxmlformats.org/spreadsheetml/2006/main";
const DOC_REL_NS: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
const PKG_REL_NS: &str = "http://schemas.openxmlformats.org/package/2006/relationships";
const CT_PREFIX: &str = "application/vnd.openxmlformats-officedocument";

/// Archive being filled one part at a time
pub(super) struct Package<W: Write + Seek> {
    zip: ZipWriter<W>,
}

impl<W: Write + Seek> Package<W> {
    fn new(writer: W) -> Self {
        Self {
            zip: ZipWriter::new(writer),
        }
    }

    /// Store an XML part, deflated
    pub(super) fn xml(&mut self, name: &str, body: &str) -> XlsxResult<()> {
        self.zip.start_file(name, SimpleFileOptions::default())?;
        self.zip.write_all(body.as_bytes())?;
        Ok(())
    }

    /// Store bytes that are already compressed, such as PNG or JPEG data
    pub(super) fn stored(&mut self, name: &str, bytes: &[u8]) -> XlsxResult<()> {
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);
        self.zip.start_file(name, options)?;
        self.zip.write_all(bytes)?;
        Ok(())
    }

    fn finish(self) -> XlsxResult<()> {
        self.zip.finish()?;
        Ok(())
    }
}

/// A `.rels` part under construction; ids are assigned `rId1`, `rId2`, ...
#[derive(Debug, Default)]
pub(super) struct Relationships {
    entries: Vec<(String, String)>,
}

impl Relationships {
    /// Add a relationship of `kind` (the last segment of its type URI)
    pub(super) fn push(&mut self, kind: &str, target: impl Into<String>) -> usize {
        self.entries.push((kind.to_string(), target.into()));
        self.entries.len()
    }

    pub(super) fn to_xml(&self) -> String {
        let mut xml = format!("{XML_DECL}\n<Relationships xmlns=\"{PKG_REL_NS}\">");
        for (i, (kind, target)) in self.entries.iter().enumerate() {
            xml.push_str(&format!(
                "\n  <Relationship Id=\"rId{}\" Type=\"{DOC_REL_NS}/{kind}\" Target=\"{target}\"/>",
                i + 1
            ));
        }
        xml.push_str("\n</Relationships>");
        xml
    }
}

/// Stateless XLSX serializer
pub struct XlsxWriter;

impl XlsxWriter {
    /// Create or truncate `path` and write the package to it
    pub fn write_file<P: AsRef<Path>>(workbook: &Workbook, path: P) -> XlsxResult<()> {
        let path = path.as_ref();
        log::debug!("writing workbook to {}", path.display());
        Self::write(workbook, File::create(path)?)
    }

    pub fn write<W: Write + Seek>(workbook: &Workbook, writer: W) -> XlsxResult<()> {
        if workbook.is_empty() {
            return Err(XlsxError::NotAPackage(
                "a workbook needs at least one worksheet".into(),
            ));
        }

        let styles = XlsxStyleTable::build(workbook);
        let drawings = DrawingPlan::build(workbook);
        let mut package = Package::new(writer);

        package.xml("[Content_Types].xml", &content_types(workbook, &drawings))?;

        let mut root = Relationships::default();
        root.push("officeDocument", "xl/workbook.xml");
        package.xml("_rels/.rels", &root.to_xml())?;

        let mut book = Relationships::default();
        for n in 1..=workbook.sheet_count() {
            book.push("worksheet", format!("worksheets/sheet{n}.xml"));
        }
        book.push("styles", "styles.xml");
        package.xml("xl/_rels/workbook.xml.rels", &book.to_xml())?;
        package.xml("xl/workbook.xml", &workbook_xml(workbook))?;
        package.xml("xl/styles.xml", &styles.to_styles_xml())?;

        for (i, sheet) in workbook.worksheets().enumerate() {
            let drawing = drawings.for_sheet(i);
            let name = format!("xl/worksheets/sheet{}.xml", i + 1);
            package.xml(&name, &sheet_xml(sheet, &styles, drawing.is_some()))?;
            if let Some(drawing) = drawing {
                drawing::write_parts(&mut package, i, sheet, drawing)?;
            }
        }

        package.finish()
    }
}

fn content_types(workbook: &Workbook, drawings: &DrawingPlan) -> String {
    let mut xml = format!(
        "{XML_DECL}\n<Types xmlns=\"http://schemas.openxmlformats.org/package/2006/content-types\">\
         \n  <Default Extension=\"rels\" ContentType=\"application/vnd.openxmlformats-package.relationships+xml\"/>\
         \n  <Default Extension=\"xml\" ContentType=\"application/xml\"/>"
    );

    let media: BTreeSet<(&str, &str)> = workbook
        .worksheets()
        .flat_map(|ws| ws.pictures())
        .map(|p| (p.format.extension(), p.format.content_type()))
        .collect();
    for (extension, mime) in media {
        xml.push_str(&format!(
            "\n  <Default Extension=\"{extension}\" ContentType=\"{mime}\"/>"
        ));
    }

    let mut overrides = vec![
        ("/xl/workbook.xml".to_string(), "spreadsheetml.sheet.main"),
        ("/xl/styles.xml".to_string(), "spreadsheetml.styles"),
    ];
    for n in 1..=workbook.sheet_count() {
        overrides.push((format!("/xl/worksheets/sheet{n}.xml"), "spreadsheetml.worksheet"));
    }
    for n in drawings.drawing_numbers() {
        overrides.push((format!("/xl/drawings/drawing{n}.xml"), "drawing"));
    }
    for (part, kind) in overrides {
        xml.push_str(&format!(
            "\n  <Override PartName=\"{part}\" ContentType=\"{CT_PREFIX}.{kind}+xml\"/>"
        ));
    }

    xml.push_str("\n</Types>");
    xml
}

fn workbook_xml(workbook: &Workbook) -> String {
    let mut xml = format!(
        "{XML_DECL}\n<workbook xmlns=\"{MAIN_NS}\" xmlns:r=\"{DOC_REL_NS}\">\n  <sheets>"
    );
    for (i, sheet) in workbook.worksheets().enumerate() {
        let n = i + 1;
        xml.push_str(&format!(
            "\n    <sheet name=\"{}\" sheetId=\"{n}\" r:id=\"rId{n}\"/>",
            escape_xml(sheet.name())
        ));
    }
    xml.push_str("\n  </sheets>\n</workbook>");
    xml
}

/// Worksheet elements must appear in schema order: dimension, cols,
/// sheetData, mergeCells, drawing
fn sheet_xml(sheet: &Worksheet, styles: &XlsxStyleTable, has_drawing: bool) -> String {
    let mut xml = format!("{XML_DECL}\n<worksheet xmlns=\"{MAIN_NS}\" xmlns:r=\"{DOC_REL_NS}\">");

    if let Some(range) = sheet.used_range() {
        xml.push_str(&format!("\n  <dimension ref=\"{range}\"/>"));
    }

    let columns: Vec<&Column> = sheet.columns().collect();
    if !columns.is_empty() {
        xml.push_str("\n  <cols>");
        for column in columns {
            xml.push_str(&col_element(column, styles));
        }
        xml.push_str("\n  </cols>");
    }

    xml.push_str("\n  <sheetData>");
    let mut rows: BTreeSet<u32> = sheet.rows().map(|(r, _)| r).collect();
    rows.extend(sheet.custom_row_heights().keys().copied());
    for row in rows {
        let height = sheet
            .custom_row_height(row)
            .map(|h| format!(" ht=\"{h}\" customHeight=\"1\""))
            .unwrap_or_default();
        let cells: String = sheet
            .row_cells(row)
            .into_iter()
            .flatten()
            .filter_map(|(&col, cell)| {
                let xf = cell.style.map_or(0, |id| styles.xf_id_for(id));
                cell_element(CellAddress::new(row, col), &cell.value, xf)
            })
            .collect();

        let r = row + 1;
        if cells.is_empty() {
            xml.push_str(&format!("\n    <row r=\"{r}\"{height}/>"));
        } else {
            xml.push_str(&format!("\n    <row r=\"{r}\"{height}>{cells}\n    </row>"));
        }
    }
    xml.push_str("\n  </sheetData>");

    let merged = sheet.merged_regions();
    if !merged.is_empty() {
        xml.push_str(&format!("\n  <mergeCells count=\"{}\">", merged.len()));
        for range in merged {
            xml.push_str(&format!("<mergeCell ref=\"{range}\"/>"));
        }
        xml.push_str("</mergeCells>");
    }

    if has_drawing {
        xml.push_str("\n  <drawing r:id=\"rId1\"/>");
    }
    xml.push_str("\n</worksheet>");
    xml
}

fn col_element(column: &Column, styles: &XlsxStyleTable) -> String {
    let n = column.index + 1;
    let width = match column.width {
        Some(w) => format!(" width=\"{w}\" customWidth=\"1\""),
        None => format!(" width=\"{DEFAULT_COLUMN_WIDTH}\""),
    };
    let style = match column.style.map(|id| styles.xf_id_for(id)) {
        Some(xf) if xf != 0 => format!(" style=\"{xf}\""),
        _ => String::new(),
    };
    format!("\n    <col min=\"{n}\" max=\"{n}\"{width}{style}/>")
}

/// `None` for a cell with neither content nor a non-default style
fn cell_element(at: CellAddress, value: &CellValue, xf: u32) -> Option<String> {
    let s = if xf != 0 {
        format!(" s=\"{xf}\"")
    } else {
        String::new()
    };
    let element = match value {
        CellValue::Empty if xf == 0 => return None,
        CellValue::Empty => format!("<c r=\"{at}\"{s}/>"),
        CellValue::Number(n) => format!("<c r=\"{at}\"{s}><v>{n}</v></c>"),
        CellValue::Boolean(b) => format!("<c r=\"{at}\"{s} t=\"b\"><v>{}</v></c>", u8::from(*b)),
        CellValue::String(text) => {
            let edges_blank =
                text.starts_with(char::is_whitespace) || text.ends_with(char::is_whitespace);
            let space = if edges_blank || text.contains('\n') {
                " xml:space=\"preserve\""
            } else {
                ""
            };
            format!(
                "<c r=\"{at}\"{s} t=\"inlineStr\"><is><t{space}>{}</t></is></c>",
                escape_xml(&encode_xstring(text))
            )
        }
    };
    Some(format!("\n      {element}"))
}
