//! Loading an XLSX package back into a [`Workbook`]
//!
//! Only what the writer emits is understood: inline strings, numbers,
//! booleans, one `cellXfs` table, explicit columns, custom row heights,
//! merged ranges and drawings of anchored pictures. Anything else in a
//! part is skipped.

mod drawing;

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader, Read, Seek};
use std::path::Path;

use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;
use zip::ZipArchive;

use crate::error::{XlsxError, XlsxResult};
use crate::{decode_xstring, parse_bool_attr};
use crate::styles::read_styles_xml;
use htmlsheet_core::style::{Style, StyleId, StyleRegistry};
use htmlsheet_core::{CellAddress, CellRange, CellValue, Workbook, Worksheet};

/// Stateless XLSX loader
///
/// `cellXfs` entries become registry entries in order, so a cell written
/// with xf `n` reads back with `StyleId(n)` and handles survive a save and
/// reload unchanged.
pub struct XlsxReader;

impl XlsxReader {
    pub fn read_file<P: AsRef<Path>>(path: P) -> XlsxResult<Workbook> {
        let path = path.as_ref();
        log::debug!("reading workbook from {}", path.display());
        Self::read(File::open(path)?)
    }

    pub fn read<R: Read + Seek>(reader: R) -> XlsxResult<Workbook> {
        let mut archive = ZipArchive::new(reader)?;
        if !archive.file_names().any(|name| name == "[Content_Types].xml") {
            return Err(XlsxError::NotAPackage(
                "no [Content_Types].xml in the archive".into(),
            ));
        }

        let styles = match archive.by_name("xl/styles.xml") {
            Ok(part) => read_styles_xml(part)?,
            Err(_) => vec![Style::default()],
        };
        let style_count = styles.len() as u32;

        let sheets = Self::sheet_entries(&mut archive)?;
        let parts = Self::sheet_parts(&mut archive)?;

        let mut workbook = Workbook::without_sheets();
        workbook.set_styles(StyleRegistry::from_styles(styles));

        for (name, rel_id) in sheets {
            let Some(path) = parts.get(&rel_id) else {
                log::warn!("sheet '{}' has no worksheet part, skipping", name);
                continue;
            };
            let mut worksheet = Worksheet::new(name);
            Self::read_worksheet(&mut archive, path, &mut worksheet, style_count)?;
            drawing::read_sheet_pictures(&mut archive, path, &mut worksheet)?;
            workbook.push_sheet(worksheet)?;
        }

        if workbook.is_empty() {
            workbook.add_sheet("Sheet1")?;
        }
        Ok(workbook)
    }

    /// `(name, relationship id)` of every `<sheet>` in tab order
    fn sheet_entries<R: Read + Seek>(
        archive: &mut ZipArchive<R>,
    ) -> XlsxResult<Vec<(String, String)>> {
        let mut xml = open_part(archive, "xl/workbook.xml")
            .ok_or_else(|| XlsxError::MissingPart("xl/workbook.xml".into()))?;

        let mut sheets = Vec::new();
        each_element(&mut xml, b"sheet", |e| {
            if let (Some(name), Some(id)) = (attr_string(e, b"name"), attr_string(e, b"r:id")) {
                sheets.push((name, id));
            }
        })?;
        Ok(sheets)
    }

    /// Worksheet part path by relationship id
    fn sheet_parts<R: Read + Seek>(
        archive: &mut ZipArchive<R>,
    ) -> XlsxResult<HashMap<String, String>> {
        const RELS: &str = "xl/_rels/workbook.xml.rels";
        let rels = read_relationships(archive, RELS)?
            .ok_or_else(|| XlsxError::MissingPart(RELS.into()))?;

        Ok(rels
            .into_iter()
            .filter(|rel| rel.rel_type.ends_with("/worksheet"))
            .map(|rel| (rel.id, resolve_part("xl", &rel.target)))
            .collect())
    }

    fn read_worksheet<R: Read + Seek>(
        archive: &mut ZipArchive<R>,
        path: &str,
        worksheet: &mut Worksheet,
        style_count: u32,
    ) -> XlsxResult<()> {
        let mut xml_reader =
            open_part(archive, path).ok_or_else(|| XlsxError::MissingPart(path.to_string()))?;
        // Cell text keeps its edge whitespace
        xml_reader.trim_text(false);

        let mut buf = Vec::new();

        let mut cell: Option<PendingCell> = None;
        let mut in_value = false;
        let mut in_inline_text = false;

        loop {
            match xml_reader.read_event_into(&mut buf) {
                Ok(Event::Start(e)) => match e.name().as_ref() {
                    b"row" => Self::read_row_attrs(&e, worksheet)?,
                    b"col" => Self::read_col(&e, worksheet, style_count)?,
                    b"c" => cell = Some(PendingCell::from_attrs(&e)),
                    b"v" if cell.is_some() => in_value = true,
                    b"t" if cell.is_some() => in_inline_text = true,
                    b"mergeCell" => Self::read_merge(&e, worksheet)?,
                    _ => {}
                },
                Ok(Event::Empty(e)) => match e.name().as_ref() {
                    b"row" => Self::read_row_attrs(&e, worksheet)?,
                    b"col" => Self::read_col(&e, worksheet, style_count)?,
                    // Style-only cell
                    b"c" => PendingCell::from_attrs(&e).apply(worksheet, style_count)?,
                    b"mergeCell" => Self::read_merge(&e, worksheet)?,
                    _ => {}
                },
                Ok(Event::End(e)) => match e.name().as_ref() {
                    b"c" => {
                        if let Some(pending) = cell.take() {
                            pending.apply(worksheet, style_count)?;
                        }
                    }
                    b"v" => in_value = false,
                    b"t" => in_inline_text = false,
                    _ => {}
                },
                Ok(Event::Text(e)) if in_value || in_inline_text => {
                    if let (Some(pending), Ok(text)) = (cell.as_mut(), e.unescape()) {
                        pending.text.push_str(&text);
                    }
                }
                Ok(Event::Eof) => break,
                Err(e) => return Err(XlsxError::Xml(e)),
                _ => {}
            }
            buf.clear();
        }

        Ok(())
    }

    fn read_row_attrs(e: &BytesStart<'_>, worksheet: &mut Worksheet) -> XlsxResult<()> {
        let row_num = attr_string(e, b"r").and_then(|s| s.parse::<u32>().ok());
        let ht = attr_string(e, b"ht").and_then(|s| s.parse::<f64>().ok());
        let custom_height = attr_string(e, b"customHeight").map_or(false, |s| parse_bool_attr(&s));

        if let (Some(r), Some(h), true) = (row_num, ht, custom_height) {
            // 1-based to 0-based
            worksheet.set_row_height(r.saturating_sub(1), h)?;
        }
        Ok(())
    }

    fn read_col(e: &BytesStart<'_>, worksheet: &mut Worksheet, style_count: u32) -> XlsxResult<()> {
        let min = attr_string(e, b"min").and_then(|s| s.parse::<u16>().ok());
        let max = attr_string(e, b"max").and_then(|s| s.parse::<u16>().ok());
        let (Some(min), Some(max)) = (min, max) else {
            return Err(XlsxError::Malformed("column entry without min/max".into()));
        };

        let custom_width = attr_string(e, b"customWidth").map_or(false, |s| parse_bool_attr(&s));
        let width = attr_string(e, b"width")
            .and_then(|s| s.parse::<f64>().ok())
            .filter(|_| custom_width);
        let style = match attr_string(e, b"style").and_then(|s| s.parse::<u32>().ok()) {
            Some(0) | None => None,
            Some(s) => Some(style_id(s, style_count)?),
        };

        for n in min.max(1)..=max {
            let column = worksheet.allocate_column(n - 1)?;
            column.width = width;
            column.style = style;
        }
        Ok(())
    }

    fn read_merge(e: &BytesStart<'_>, worksheet: &mut Worksheet) -> XlsxResult<()> {
        if let Some(r) = attr_string(e, b"ref") {
            let range = CellRange::parse(&r).map_err(|err| {
                XlsxError::Malformed(format!("merge range '{}': {}", r, err))
            })?;
            worksheet.merge_cells(&range)?;
        }
        Ok(())
    }
}

/// A `<c>` element whose value text is still arriving
#[derive(Debug, Default)]
struct PendingCell {
    reference: Option<String>,
    cell_type: Option<String>,
    style: Option<u32>,
    text: String,
}

impl PendingCell {
    fn from_attrs(e: &BytesStart<'_>) -> Self {
        Self {
            reference: attr_string(e, b"r"),
            cell_type: attr_string(e, b"t"),
            style: attr_string(e, b"s").and_then(|s| s.parse::<u32>().ok()),
            text: String::new(),
        }
    }

    fn apply(self, worksheet: &mut Worksheet, style_count: u32) -> XlsxResult<()> {
        let Some(cell_ref) = self.reference else {
            return Err(XlsxError::Malformed("cell without a reference".into()));
        };
        let addr = CellAddress::parse(&cell_ref).map_err(|e| {
            XlsxError::Malformed(format!("cell reference '{}': {}", cell_ref, e))
        })?;

        let has_text = !self.text.is_empty() || self.cell_type.as_deref() == Some("inlineStr");
        if has_text {
            let value = match self.cell_type.as_deref() {
                Some("b") => CellValue::Boolean(parse_bool_attr(&self.text)),
                Some("inlineStr") | Some("str") => {
                    CellValue::String(decode_xstring(&self.text).into_owned())
                }
                None | Some("n") => match self.text.parse::<f64>() {
                    Ok(n) => CellValue::Number(n),
                    Err(_) => CellValue::String(self.text),
                },
                // Shared strings and errors are never written by this crate
                Some(_) => CellValue::String(self.text),
            };
            worksheet.set_cell_value_at(addr.row, addr.col, value)?;
        }

        if let Some(s) = self.style.filter(|&s| s != 0) {
            worksheet.set_cell_style_at(addr.row, addr.col, style_id(s, style_count)?)?;
        }

        Ok(())
    }
}

fn style_id(xf: u32, style_count: u32) -> XlsxResult<StyleId> {
    if xf >= style_count {
        return Err(XlsxError::Malformed(format!(
            "style index {} beyond the {} registered styles",
            xf, style_count
        )));
    }
    Ok(StyleId(xf))
}

pub(crate) fn attr_string(e: &BytesStart<'_>, key: &[u8]) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|a| a.key.as_ref() == key)
        .and_then(|a| a.unescape_value().ok().map(|v| v.into_owned()))
}

/// One `<Relationship>` entry
#[derive(Debug, Clone)]
pub(crate) struct Relationship {
    pub id: String,
    pub rel_type: String,
    pub target: String,
}

/// Open an XML part for event reading; `None` when the archive lacks it
pub(crate) fn open_part<'a, R: Read + Seek>(
    archive: &'a mut ZipArchive<R>,
    path: &str,
) -> Option<Reader<BufReader<impl Read + 'a>>> {
    let part = archive.by_name(path).ok()?;
    let mut reader = Reader::from_reader(BufReader::new(part));
    reader.trim_text(true);
    Some(reader)
}

/// Call `visit` for every `<tag>` element, open or self-closing, in
/// document order
pub(crate) fn each_element<B: BufRead>(
    reader: &mut Reader<B>,
    tag: &[u8],
    mut visit: impl FnMut(&BytesStart<'_>),
) -> XlsxResult<()> {
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) | Event::Empty(e) if e.local_name().as_ref() == tag => visit(&e),
            Event::Eof => return Ok(()),
            _ => {}
        }
        buf.clear();
    }
}

/// Entries of a `.rels` part; `None` when the part does not exist
pub(crate) fn read_relationships<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    path: &str,
) -> XlsxResult<Option<Vec<Relationship>>> {
    let Some(mut xml) = open_part(archive, path) else {
        return Ok(None);
    };

    let mut rels = Vec::new();
    each_element(&mut xml, b"Relationship", |e| {
        let fields = (
            attr_string(e, b"Id"),
            attr_string(e, b"Type"),
            attr_string(e, b"Target"),
        );
        if let (Some(id), Some(rel_type), Some(target)) = fields {
            rels.push(Relationship {
                id,
                rel_type,
                target,
            });
        }
    })?;
    Ok(Some(rels))
}

/// Resolve a relationship target against the folder of its source part
pub(crate) fn resolve_part(base_dir: &str, target: &str) -> String {
    if let Some(absolute) = target.strip_prefix('/') {
        return absolute.to_string();
    }

    let mut segments: Vec<&str> = base_dir.split('/').filter(|s| !s.is_empty()).collect();
    for segment in target.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            s => segments.push(s),
        }
    }
    segments.join("/")
}
