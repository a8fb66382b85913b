//! The `styles.xml` part
//!
//! Writing flattens the workbook registry into the font, fill and border
//! tables plus one `cellXfs` entry per distinct style. Reading rebuilds
//! complete [`Style`] values from those tables in `cellXfs` order.

use std::collections::HashMap;
use std::hash::Hash;
use std::io::{BufReader, Read};

use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;

use crate::error::{XlsxError, XlsxResult};
use crate::{escape_xml, parse_bool_attr};
use htmlsheet_core::style::{
    Alignment, BorderEdge, BorderLineStyle, BorderStyle, Color, FillStyle, FontStyle,
    HorizontalAlignment, Side, Style, StyleId, VerticalAlignment,
};
use htmlsheet_core::Workbook;

/// Distinct values in first-seen order
#[derive(Debug)]
struct Interner<T> {
    items: Vec<T>,
    ids: HashMap<T, u32>,
}

impl<T: Clone + Eq + Hash> Interner<T> {
    fn new() -> Self {
        Self {
            items: Vec::new(),
            ids: HashMap::new(),
        }
    }

    fn starting_with(first: T) -> Self {
        let mut interner = Self::new();
        interner.id(&first);
        interner
    }

    fn id(&mut self, item: &T) -> u32 {
        if let Some(&id) = self.ids.get(item) {
            return id;
        }
        let id = self.items.len() as u32;
        self.items.push(item.clone());
        self.ids.insert(item.clone(), id);
        id
    }
}

/// Registry handles mapped onto `cellXfs` indices for one write
#[derive(Debug)]
pub(crate) struct XlsxStyleTable {
    /// `cellXfs` entries; entry 0 is the default style
    xfs: Interner<Style>,
    /// Indexed by handle
    xf_of_handle: Vec<u32>,
}

impl XlsxStyleTable {
    pub(crate) fn build(workbook: &Workbook) -> Self {
        let mut xfs = Interner::starting_with(Style::default());
        let xf_of_handle = workbook
            .styles()
            .iter()
            .map(|(id, style)| {
                // Handle 0 stays on xf 0 even when a loaded registry changed it
                if id == StyleId::DEFAULT {
                    0
                } else {
                    xfs.id(style)
                }
            })
            .collect();
        Self { xfs, xf_of_handle }
    }

    pub(crate) fn xf_id_for(&self, style: StyleId) -> u32 {
        self.xf_of_handle
            .get(style.index() as usize)
            .copied()
            .unwrap_or(0)
    }

    pub(crate) fn to_styles_xml(&self) -> String {
        let mut fonts = Interner::starting_with(FontStyle::default());
        let mut borders = Interner::starting_with(BorderStyle::default());
        // Fill 0 (none) and fill 1 (gray125) are reserved
        let mut solid_fills: Interner<Color> = Interner::new();

        let mut cell_xfs = String::new();
        for style in &self.xfs.items {
            let font = fonts.id(&style.font);
            let fill = style.fill.color().map_or(0, |color| 2 + solid_fills.id(&color));
            let border = borders.id(&style.border);
            cell_xfs.push_str("\n    ");
            cell_xfs.push_str(&write_xf(style, font, fill, border));
        }

        let mut xml = String::from(
            "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\n\
             <styleSheet xmlns=\"http://schemas.openxmlformats.org/spreadsheetml/2006/main\">",
        );
        push_table(&mut xml, "fonts", fonts.items.iter().map(write_font));

        let fills = ["none", "gray125"]
            .map(|pattern| format!("<fill><patternFill patternType=\"{pattern}\"/></fill>"))
            .into_iter()
            .chain(solid_fills.items.iter().map(write_solid_fill));
        push_table(&mut xml, "fills", fills);
        push_table(&mut xml, "borders", borders.items.iter().map(write_border));

        xml.push_str(
            "\n  <cellStyleXfs count=\"1\"><xf numFmtId=\"0\" fontId=\"0\" fillId=\"0\" borderId=\"0\"/></cellStyleXfs>",
        );
        xml.push_str(&format!(
            "\n  <cellXfs count=\"{}\">{cell_xfs}\n  </cellXfs>",
            self.xfs.items.len()
        ));
        xml.push_str(
            "\n  <cellStyles count=\"1\"><cellStyle name=\"Normal\" xfId=\"0\" builtinId=\"0\"/></cellStyles>\
             \n  <dxfs count=\"0\"/>\
             \n  <tableStyles count=\"0\"/>\
             \n</styleSheet>",
        );
        xml
    }
}

/// `<name count="n">` followed by one line per entry
fn push_table(xml: &mut String, name: &str, entries: impl Iterator<Item = String>) {
    let entries: Vec<String> = entries.collect();
    xml.push_str(&format!("\n  <{name} count=\"{}\">", entries.len()));
    for entry in entries {
        xml.push_str("\n    ");
        xml.push_str(&entry);
    }
    xml.push_str(&format!("\n  </{name}>"));
}

fn write_color(tag: &str, color: &Color) -> String {
    match color.to_argb_hex() {
        Some(argb) => format!("<{tag} rgb=\"{argb}\"/>"),
        None => format!("<{tag} indexed=\"64\"/>"),
    }
}

fn write_font(font: &FontStyle) -> String {
    format!(
        "<font>{}<sz val=\"{}\"/><name val=\"{}\"/></font>",
        if font.bold { "<b/>" } else { "" },
        font.size,
        escape_xml(&font.name)
    )
}

fn write_solid_fill(color: &Color) -> String {
    format!(
        "<fill><patternFill patternType=\"solid\">{}<bgColor indexed=\"64\"/></patternFill></fill>",
        write_color("fgColor", color)
    )
}

fn write_border(border: &BorderStyle) -> String {
    let mut s = String::from("<border>");
    for side in Side::ALL {
        let tag = side.tag();
        match border.edge(side) {
            Some(edge) if edge.style != BorderLineStyle::None => s.push_str(&format!(
                "<{tag} style=\"{}\">{}</{tag}>",
                edge.style.as_str(),
                write_color("color", &edge.color)
            )),
            _ => s.push_str(&format!("<{tag}/>")),
        }
    }
    s.push_str("<diagonal/></border>");
    s
}

/// Attributes that differ from the default alignment
fn alignment_attrs(alignment: &Alignment) -> String {
    let default = Alignment::default();
    let mut attrs = String::new();
    if alignment.horizontal != default.horizontal {
        attrs.push_str(&format!(" horizontal=\"{}\"", alignment.horizontal.as_str()));
    }
    if alignment.vertical != default.vertical {
        attrs.push_str(&format!(" vertical=\"{}\"", alignment.vertical.as_str()));
    }
    if alignment.wrap_text {
        attrs.push_str(" wrapText=\"1\"");
    }
    attrs
}

fn write_xf(style: &Style, font: u32, fill: u32, border: u32) -> String {
    let applies = [
        ("applyFont", style.font != FontStyle::default()),
        ("applyFill", !style.fill.is_none()),
        ("applyBorder", !style.border.is_empty()),
        ("applyAlignment", !style.alignment.is_default()),
    ];
    let flags: String = applies
        .iter()
        .filter(|(_, on)| *on)
        .map(|(name, _)| format!(" {name}=\"1\""))
        .collect();

    let open = format!(
        "<xf numFmtId=\"0\" fontId=\"{font}\" fillId=\"{fill}\" borderId=\"{border}\" xfId=\"0\"{flags}"
    );
    if style.alignment.is_default() {
        format!("{open}/>")
    } else {
        format!("{open}><alignment{}/></xf>", alignment_attrs(&style.alignment))
    }
}

// === Reading ===

#[derive(Debug, Clone, Copy)]
struct XfRef {
    font_id: u32,
    fill_id: u32,
    border_id: u32,
    alignment: Alignment,
}

/// Component tables and cellXfs collected while streaming styles.xml
#[derive(Debug, Default)]
struct StylesParser {
    fonts: Vec<FontStyle>,
    fills: Vec<FillStyle>,
    borders: Vec<BorderStyle>,
    cell_xfs: Vec<Style>,

    font: Option<FontStyle>,
    fill: Option<(bool, Color)>,
    border: Option<BorderStyle>,
    edge: Option<Side>,
    xf: Option<XfRef>,
    in_cell_xfs: bool,
    in_dxfs: bool,
}

impl StylesParser {
    fn open(&mut self, e: &BytesStart<'_>) {
        let name = e.name();
        let name = name.as_ref();

        // Differential formats reuse the component tags; cells never point at them
        if self.in_dxfs {
            return;
        }

        match name {
            b"dxfs" => self.in_dxfs = true,
            b"cellXfs" => self.in_cell_xfs = true,
            b"font" => self.font = Some(FontStyle::default()),
            b"b" => {
                if let Some(font) = self.font.as_mut() {
                    font.bold = attr_value(e, b"val").map_or(true, |v| parse_bool_attr(&v));
                }
            }
            b"sz" => {
                if let Some(font) = self.font.as_mut() {
                    if let Some(size) = attr_value(e, b"val").and_then(|v| v.parse().ok()) {
                        font.size = size;
                    }
                }
            }
            b"name" => {
                if let Some(font) = self.font.as_mut() {
                    if let Some(v) = attr_value(e, b"val") {
                        font.name = v;
                    }
                }
            }
            b"color" => {
                let color = parse_color_attrs(e);
                if let (Some(border), Some(edge)) = (self.border.as_mut(), self.edge) {
                    if let Some(slot) = border.edge_mut(edge).as_mut() {
                        slot.color = color;
                    }
                }
            }
            b"fill" => self.fill = Some((false, Color::Auto)),
            b"patternFill" => {
                if let Some(fill) = self.fill.as_mut() {
                    fill.0 = attr_value(e, b"patternType").as_deref() == Some("solid");
                }
            }
            b"fgColor" => {
                if let Some(fill) = self.fill.as_mut() {
                    fill.1 = parse_color_attrs(e);
                }
            }
            b"border" => self.border = Some(BorderStyle::default()),
            b"left" | b"right" | b"top" | b"bottom" => {
                let Some(edge) = Side::from_tag(name) else {
                    return;
                };
                if let Some(border) = self.border.as_mut() {
                    self.edge = Some(edge);
                    let style = attr_value(e, b"style")
                        .and_then(|v| v.parse::<BorderLineStyle>().ok())
                        .unwrap_or_default();
                    if style != BorderLineStyle::None {
                        // Color is refined by a nested <color>
                        *border.edge_mut(edge) = Some(BorderEdge::new(style, Color::Auto));
                    }
                }
            }
            b"xf" if self.in_cell_xfs => {
                let id = |key: &[u8]| {
                    attr_value(e, key)
                        .and_then(|v| v.parse::<u32>().ok())
                        .unwrap_or(0)
                };
                self.xf = Some(XfRef {
                    font_id: id(b"fontId"),
                    fill_id: id(b"fillId"),
                    border_id: id(b"borderId"),
                    alignment: Alignment::default(),
                });
            }
            b"alignment" => {
                if let Some(xf) = self.xf.as_mut() {
                    let al = &mut xf.alignment;
                    for attr in e.attributes().flatten() {
                        let Ok(val) = attr.unescape_value() else {
                            continue;
                        };
                        match attr.key.as_ref() {
                            b"horizontal" => {
                                if let Ok(h) = val.parse::<HorizontalAlignment>() {
                                    al.horizontal = h;
                                }
                            }
                            b"vertical" => {
                                if let Ok(v) = val.parse::<VerticalAlignment>() {
                                    al.vertical = v;
                                }
                            }
                            b"wrapText" => al.wrap_text = parse_bool_attr(&val),
                            _ => {}
                        }
                    }
                }
            }
            _ => {}
        }
    }

    fn close(&mut self, name: &[u8]) {
        if self.in_dxfs {
            if name == b"dxfs" {
                self.in_dxfs = false;
            }
            return;
        }

        match name {
            b"font" => {
                if let Some(font) = self.font.take() {
                    self.fonts.push(font);
                }
            }
            b"fill" => {
                if let Some((solid, color)) = self.fill.take() {
                    self.fills.push(if solid {
                        FillStyle::Solid(color)
                    } else {
                        FillStyle::None
                    });
                }
            }
            b"left" | b"right" | b"top" | b"bottom" => self.edge = None,
            b"border" => {
                if let Some(border) = self.border.take() {
                    self.borders.push(border);
                }
                self.edge = None;
            }
            b"xf" => {
                if let Some(xf) = self.xf.take() {
                    let style = Style {
                        font: self
                            .fonts
                            .get(xf.font_id as usize)
                            .cloned()
                            .unwrap_or_default(),
                        fill: self.fills.get(xf.fill_id as usize).copied().unwrap_or_default(),
                        border: self
                            .borders
                            .get(xf.border_id as usize)
                            .copied()
                            .unwrap_or_default(),
                        alignment: xf.alignment,
                    };
                    self.cell_xfs.push(style);
                }
            }
            b"cellXfs" => self.in_cell_xfs = false,
            _ => {}
        }
    }
}

/// Read the cellXfs table of styles.xml, in xf order
pub(crate) fn read_styles_xml<R: Read>(reader: R) -> XlsxResult<Vec<Style>> {
    let mut xml_reader = Reader::from_reader(BufReader::new(reader));
    xml_reader.trim_text(true);

    let mut buf = Vec::new();
    let mut parser = StylesParser::default();

    loop {
        match xml_reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => parser.open(&e),
            Ok(Event::Empty(e)) => {
                parser.open(&e);
                parser.close(e.name().as_ref());
            }
            Ok(Event::End(e)) => parser.close(e.name().as_ref()),
            Ok(Event::Eof) => break,
            Err(e) => return Err(XlsxError::Xml(e)),
            _ => {}
        }
        buf.clear();
    }

    if parser.cell_xfs.is_empty() {
        return Ok(vec![Style::default()]);
    }
    Ok(parser.cell_xfs)
}

fn attr_value(e: &BytesStart<'_>, key: &[u8]) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|a| a.key.as_ref() == key)
        .and_then(|a| a.unescape_value().ok().map(|v| v.into_owned()))
}

/// Colors come back as RGB when an `rgb` attribute is present; indexed,
/// theme and auto colors all collapse to [`Color::Auto`].
fn parse_color_attrs(e: &BytesStart<'_>) -> Color {
    attr_value(e, b"rgb")
        .and_then(|rgb| Color::from_hex(&rgb))
        .unwrap_or(Color::Auto)
}
