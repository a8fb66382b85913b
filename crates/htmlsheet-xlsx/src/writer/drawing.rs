//! Drawing parts for anchored pictures
//!
//! Each worksheet with pictures gets one `xl/drawings/drawingN.xml`, a
//! relationship from the sheet to it, and one media part per picture.

use std::io::{Seek, Write};

use super::{Package, Relationships};
use crate::error::XlsxResult;
use crate::escape_xml;
use htmlsheet_core::{Picture, Workbook, Worksheet};

/// Part numbering for one worksheet's drawing
#[derive(Debug, Clone)]
pub(super) struct SheetDrawing {
    /// N in drawingN.xml
    pub number: usize,
    /// N in imageN.ext, one per picture in sheet order
    pub media: Vec<usize>,
}

/// Drawing numbers for every worksheet, computed before any part is written
#[derive(Debug, Default)]
pub(super) struct DrawingPlan {
    sheets: Vec<Option<SheetDrawing>>,
}

impl DrawingPlan {
    pub(super) fn build(workbook: &Workbook) -> Self {
        let mut next_drawing = 1;
        let mut next_media = 1;
        let sheets = workbook
            .worksheets()
            .map(|ws| {
                if ws.pictures().is_empty() {
                    return None;
                }
                let media = (next_media..next_media + ws.pictures().len()).collect();
                next_media += ws.pictures().len();
                let drawing = SheetDrawing {
                    number: next_drawing,
                    media,
                };
                next_drawing += 1;
                Some(drawing)
            })
            .collect();
        Self { sheets }
    }

    pub(super) fn for_sheet(&self, index: usize) -> Option<&SheetDrawing> {
        self.sheets.get(index).and_then(|d| d.as_ref())
    }

    pub(super) fn drawing_numbers(&self) -> impl Iterator<Item = usize> + '_ {
        self.sheets.iter().flatten().map(|d| d.number)
    }
}

/// Store the sheet's relationship to its drawing, the drawing, the
/// drawing's relationships and one media part per picture
pub(super) fn write_parts<W: Write + Seek>(
    package: &mut Package<W>,
    sheet_index: usize,
    sheet: &Worksheet,
    drawing: &SheetDrawing,
) -> XlsxResult<()> {
    let number = drawing.number;

    let mut sheet_rels = Relationships::default();
    sheet_rels.push("drawing", format!("../drawings/drawing{number}.xml"));
    package.xml(
        &format!("xl/worksheets/_rels/sheet{}.xml.rels", sheet_index + 1),
        &sheet_rels.to_xml(),
    )?;

    let mut anchors = String::new();
    let mut media_rels = Relationships::default();
    for (picture, media) in sheet.pictures().iter().zip(&drawing.media) {
        let extension = picture.format.extension();
        let rid = media_rels.push("image", format!("../media/image{media}.{extension}"));
        anchors.push_str(&anchor_xml(picture, rid));
    }

    package.xml(
        &format!("xl/drawings/drawing{number}.xml"),
        &format!(
            "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\n\
             <xdr:wsDr xmlns:xdr=\"{XDR_NS}\" xmlns:a=\"{A_NS}\" xmlns:r=\"{R_NS}\">{anchors}\n</xdr:wsDr>"
        ),
    )?;
    package.xml(
        &format!("xl/drawings/_rels/drawing{number}.xml.rels"),
        &media_rels.to_xml(),
    )?;

    for (picture, media) in sheet.pictures().iter().zip(&drawing.media) {
        let name = format!("xl/media/image{}.{}", media, picture.format.extension());
        package.stored(&name, &picture.data)?;
    }
    Ok(())
}

const XDR_NS: &str = "http://schemas.openxmlformats.org/drawingml/2006/spreadsheetDrawing";
const A_NS: &str = "http://schemas.openxmlformats.org/drawingml/2006/main";
const R_NS: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";

/// One picture anchored over the single cell it was placed in
fn anchor_xml(picture: &Picture, rid: usize) -> String {
    let (col, row) = (picture.col, picture.row);
    format!(
        r#"
  <xdr:twoCellAnchor editAs="oneCell">
    <xdr:from><xdr:col>{col}</xdr:col><xdr:colOff>0</xdr:colOff><xdr:row>{row}</xdr:row><xdr:rowOff>0</xdr:rowOff></xdr:from>
    <xdr:to><xdr:col>{col_end}</xdr:col><xdr:colOff>0</xdr:colOff><xdr:row>{row_end}</xdr:row><xdr:rowOff>0</xdr:rowOff></xdr:to>
    <xdr:pic>
      <xdr:nvPicPr><xdr:cNvPr id="{id}" name="{name}"/><xdr:cNvPicPr><a:picLocks noChangeAspect="1"/></xdr:cNvPicPr></xdr:nvPicPr>
      <xdr:blipFill><a:blip r:embed="rId{rid}"/><a:stretch><a:fillRect/></a:stretch></xdr:blipFill>
      <xdr:spPr><a:prstGeom prst="rect"><a:avLst/></a:prstGeom></xdr:spPr>
    </xdr:pic>
    <xdr:clientData/>
  </xdr:twoCellAnchor>"#,
        col_end = col + 1,
        row_end = row + 1,
        id = rid + 1,
        name = escape_xml(&picture.name),
    )
}
