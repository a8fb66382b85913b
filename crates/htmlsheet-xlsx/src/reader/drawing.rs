//! Reading pictures back from drawing parts

use std::io::{Read, Seek};

use quick_xml::events::Event;
use zip::ZipArchive;

use super::{attr_string, open_part, read_relationships, resolve_part};
use crate::error::{XlsxError, XlsxResult};
use htmlsheet_core::{Picture, PictureFormat, Worksheet};

/// Anchor data collected from one `<xdr:twoCellAnchor>` or `<xdr:oneCellAnchor>`
#[derive(Debug, Default)]
struct Anchor {
    row: u32,
    col: u16,
    name: String,
    embed: Option<String>,
}

/// Load every picture referenced by the drawing of `sheet_path`
pub(super) fn read_sheet_pictures<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    sheet_path: &str,
    worksheet: &mut Worksheet,
) -> XlsxResult<()> {
    let (sheet_dir, sheet_file) = split_part(sheet_path);
    let rels_path = format!("{}/_rels/{}.rels", sheet_dir, sheet_file);

    let Some(rels) = read_relationships(archive, &rels_path)? else {
        return Ok(());
    };

    for rel in rels.iter().filter(|r| r.rel_type.ends_with("/drawing")) {
        let drawing_path = resolve_part(sheet_dir, &rel.target);
        let anchors = read_anchors(archive, &drawing_path)?;
        if anchors.is_empty() {
            continue;
        }

        let (drawing_dir, drawing_file) = split_part(&drawing_path);
        let drawing_rels_path = format!("{}/_rels/{}.rels", drawing_dir, drawing_file);
        let media_rels = read_relationships(archive, &drawing_rels_path)?.unwrap_or_default();

        for anchor in anchors {
            let Some(embed) = anchor.embed.as_deref() else {
                continue;
            };
            let Some(media) = media_rels.iter().find(|r| r.id == embed) else {
                log::warn!("picture '{}' points at missing relationship {}", anchor.name, embed);
                continue;
            };

            let media_path = resolve_part(drawing_dir, &media.target);
            let extension = media_path.rsplit('.').next().unwrap_or_default();
            let Some(format) = PictureFormat::from_extension(extension) else {
                log::warn!("skipping picture with unsupported media part {}", media_path);
                continue;
            };

            let mut data = Vec::new();
            archive
                .by_name(&media_path)
                .map_err(|_| XlsxError::MissingPart(media_path.clone()))?
                .read_to_end(&mut data)?;

            worksheet.add_picture(Picture::new(
                anchor.row,
                anchor.col,
                anchor.name,
                data,
                format,
            ))?;
        }
    }

    Ok(())
}

fn read_anchors<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    path: &str,
) -> XlsxResult<Vec<Anchor>> {
    let mut xml_reader =
        open_part(archive, path).ok_or_else(|| XlsxError::MissingPart(path.to_string()))?;

    let mut buf = Vec::new();
    let mut anchors = Vec::new();
    let mut current: Option<Anchor> = None;
    let mut in_from = false;
    let mut field: Option<&'static str> = None;

    loop {
        match xml_reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) => match e.local_name().as_ref() {
                b"twoCellAnchor" | b"oneCellAnchor" => current = Some(Anchor::default()),
                b"from" => in_from = true,
                b"col" if in_from => field = Some("col"),
                b"row" if in_from => field = Some("row"),
                b"cNvPr" => {
                    if let (Some(anchor), Some(name)) = (current.as_mut(), attr_string(&e, b"name"))
                    {
                        anchor.name = name;
                    }
                }
                b"blip" => {
                    if let Some(anchor) = current.as_mut() {
                        anchor.embed = attr_string(&e, b"r:embed");
                    }
                }
                _ => {}
            },
            Ok(Event::Text(t)) => {
                if let (Some(anchor), Some(which)) = (current.as_mut(), field) {
                    let text = t.unescape().unwrap_or_default();
                    match which {
                        "col" => anchor.col = text.trim().parse().unwrap_or(0),
                        _ => anchor.row = text.trim().parse().unwrap_or(0),
                    }
                }
            }
            Ok(Event::End(e)) => match e.local_name().as_ref() {
                b"twoCellAnchor" | b"oneCellAnchor" => {
                    if let Some(anchor) = current.take() {
                        anchors.push(anchor);
                    }
                }
                b"from" => in_from = false,
                b"col" | b"row" => field = None,
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => return Err(XlsxError::Xml(e)),
            _ => {}
        }
        buf.clear();
    }

    Ok(anchors)
}

/// Split "dir/file" into ("dir", "file")
fn split_part(path: &str) -> (&str, &str) {
    match path.rsplit_once('/') {
        Some((dir, file)) => (dir, file),
        None => ("", path),
    }
}
