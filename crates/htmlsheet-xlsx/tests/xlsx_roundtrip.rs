//! End-to-end tests for XLSX roundtrip (build -> save -> read -> verify)

use std::io::Cursor;

use htmlsheet_core::{
    BorderLineStyle, BorderStyle, CellRange, CellValue, Color, HorizontalAlignment, Picture,
    PictureFormat, Style, StyleId, VerticalAlignment, Workbook,
};
use htmlsheet_xlsx::{XlsxReader, XlsxWriter};
use pretty_assertions::assert_eq;

fn roundtrip(wb: &Workbook) -> Workbook {
    let mut buf = Vec::new();
    XlsxWriter::write(wb, Cursor::new(&mut buf)).unwrap();
    XlsxReader::read(Cursor::new(&buf)).unwrap()
}

/// Smallest valid PNG: 1x1 transparent pixel
const PNG_1X1: &[u8] = &[
    0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x48, 0x44,
    0x52, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x08, 0x06, 0x00, 0x00, 0x00, 0x1F,
    0x15, 0xC4, 0x89, 0x00, 0x00, 0x00, 0x0A, 0x49, 0x44, 0x41, 0x54, 0x78, 0x9C, 0x63, 0x00,
    0x01, 0x00, 0x00, 0x05, 0x00, 0x01, 0x0D, 0x0A, 0x2D, 0xB4, 0x00, 0x00, 0x00, 0x00, 0x49,
    0x45, 0x4E, 0x44, 0xAE, 0x42, 0x60, 0x82,
];

#[test]
fn test_roundtrip_values() {
    let mut wb = Workbook::new();
    let sheet = wb.worksheet_mut(0).unwrap();
    sheet.set_cell_value("A1", "Name").unwrap();
    sheet.set_cell_value("B1", 95.5).unwrap();
    sheet.set_cell_value("C1", true).unwrap();
    sheet.set_cell_value("A2", "Tom & \"Jerry\" <3").unwrap();
    sheet.set_cell_value("B2", "two\nlines").unwrap();

    let wb2 = roundtrip(&wb);
    let sheet2 = wb2.worksheet(0).unwrap();

    assert_eq!(sheet2.get_value("A1").unwrap(), CellValue::string("Name"));
    assert_eq!(sheet2.get_value("B1").unwrap(), CellValue::Number(95.5));
    assert_eq!(sheet2.get_value("C1").unwrap(), CellValue::Boolean(true));
    assert_eq!(
        sheet2.get_value("A2").unwrap(),
        CellValue::string("Tom & \"Jerry\" <3")
    );
    assert_eq!(sheet2.get_value("B2").unwrap(), CellValue::string("two\nlines"));
}

#[test]
fn test_roundtrip_awkward_text() {
    let texts = [
        "a\u{1}b",
        "bell\u{7} and null\u{0}",
        "  padded  ",
        "   ",
        "cr\r\nlf",
        "literal _x0041_ stays",
    ];
    let mut wb = Workbook::new();
    let sheet = wb.worksheet_mut(0).unwrap();
    for (row, text) in texts.iter().enumerate() {
        sheet.set_cell_value_at(row as u32, 0, *text).unwrap();
    }

    let wb2 = roundtrip(&wb);
    let sheet2 = wb2.worksheet(0).unwrap();
    for (row, text) in texts.iter().enumerate() {
        assert_eq!(sheet2.get_value_at(row as u32, 0), CellValue::string(*text));
    }
}

#[test]
fn test_roundtrip_styles_keep_handles() {
    let mut wb = Workbook::new();
    let header = Style::new()
        .bold(true)
        .font_size(16.0)
        .fill_color(Color::rgb(0xCC, 0xE5, 0xFF))
        .border(BorderStyle::all(BorderLineStyle::Thin, Color::BLACK))
        .horizontal_alignment(HorizontalAlignment::Center)
        .vertical_alignment(VerticalAlignment::Center)
        .wrap_text(true);
    let id = wb.register_style(header.clone());

    let sheet = wb.worksheet_mut(0).unwrap();
    sheet.set_cell_value_at(0, 0, "Header").unwrap();
    sheet.set_cell_style_at(0, 0, id).unwrap();
    // Style without a value survives too
    sheet.set_cell_style_at(0, 1, id).unwrap();

    let wb2 = roundtrip(&wb);
    let sheet2 = wb2.worksheet(0).unwrap();

    let read_id = sheet2.cell_style_at(0, 0).expect("A1 should keep its style");
    assert_eq!(wb2.style(read_id), Some(&header));
    assert_eq!(sheet2.cell_style_at(0, 1), Some(read_id));
    assert_eq!(sheet2.get_value_at(0, 1), CellValue::Empty);
}

#[test]
fn test_roundtrip_is_stable_across_reopen() {
    let mut wb = Workbook::new();
    let a = wb.register_style(Style::new().bold(true));
    let b = wb.register_style(Style::new().fill_color(Color::rgb(1, 2, 3)));
    let sheet = wb.worksheet_mut(0).unwrap();
    sheet.set_cell_style_at(0, 0, a).unwrap();
    sheet.set_cell_style_at(1, 0, b).unwrap();

    let once = roundtrip(&wb);
    let twice = roundtrip(&once);

    assert_eq!(once.styles().len(), twice.styles().len());
    let ws1 = once.worksheet(0).unwrap();
    let ws2 = twice.worksheet(0).unwrap();
    for row in 0..2 {
        let s1 = ws1.cell_style_at(row, 0).and_then(|id| once.style(id));
        let s2 = ws2.cell_style_at(row, 0).and_then(|id| twice.style(id));
        assert_eq!(s1, s2);
    }
}

#[test]
fn test_roundtrip_columns_and_rows() {
    let mut wb = Workbook::new();
    let col_style = wb.register_style(
        Style::new().horizontal_alignment(HorizontalAlignment::Right),
    );
    let sheet = wb.worksheet_mut(0).unwrap();
    {
        let column = sheet.allocate_column(2).unwrap();
        column.width = Some(18.0);
        column.style = Some(col_style);
    }
    sheet.allocate_column(4).unwrap();
    sheet.set_row_height(0, 15.0).unwrap();
    sheet.set_row_height(5, 42.0).unwrap();

    let wb2 = roundtrip(&wb);
    let sheet2 = wb2.worksheet(0).unwrap();

    let column = sheet2.column(2).expect("column C allocated");
    assert_eq!(column.width, Some(18.0));
    let style = column.style.and_then(|id| wb2.style(id)).unwrap();
    assert_eq!(style.alignment.horizontal, HorizontalAlignment::Right);

    let plain = sheet2.column(4).expect("column E allocated");
    assert_eq!(plain.width, None);
    assert_eq!(plain.style, None);
    assert!(sheet2.column(3).is_none());

    assert_eq!(sheet2.custom_row_height(0), Some(15.0));
    assert_eq!(sheet2.custom_row_height(5), Some(42.0));
    assert_eq!(sheet2.custom_row_height(1), None);
}

#[test]
fn test_roundtrip_merged_cells() {
    let mut wb = Workbook::new();
    let sheet = wb.worksheet_mut(0).unwrap();
    sheet.set_cell_value("A1", "Merged").unwrap();
    sheet.merge_cells(&CellRange::parse("A1:C1").unwrap()).unwrap();
    sheet.merge_cells(&CellRange::parse("B3:B4").unwrap()).unwrap();

    let wb2 = roundtrip(&wb);
    let merged: Vec<String> = wb2
        .worksheet(0)
        .unwrap()
        .merged_regions()
        .iter()
        .map(|r| r.to_string())
        .collect();
    assert_eq!(merged, vec!["A1:C1".to_string(), "B3:B4".to_string()]);
}

#[test]
fn test_roundtrip_multiple_sheets_with_pictures() {
    let mut wb = Workbook::new();
    wb.rename_sheet(0, "Summary").unwrap();
    wb.add_sheet("Details").unwrap();
    wb.add_sheet("Photos").unwrap();

    wb.worksheet_mut(0)
        .unwrap()
        .add_picture(Picture::new(1, 1, "logo.png", PNG_1X1.to_vec(), PictureFormat::Png))
        .unwrap();
    let photos = wb.worksheet_mut(2).unwrap();
    photos
        .add_picture(Picture::new(0, 0, "a.png", PNG_1X1.to_vec(), PictureFormat::Png))
        .unwrap();
    photos
        .add_picture(Picture::new(4, 3, "b.png", PNG_1X1.to_vec(), PictureFormat::Png))
        .unwrap();

    let wb2 = roundtrip(&wb);
    let names: Vec<&str> = wb2.worksheets().map(|ws| ws.name()).collect();
    assert_eq!(names, vec!["Summary", "Details", "Photos"]);

    let summary = wb2.worksheet(0).unwrap().pictures();
    assert_eq!(summary.len(), 1);
    assert_eq!((summary[0].row, summary[0].col), (1, 1));
    assert_eq!(summary[0].name, "logo.png");
    assert_eq!(summary[0].data, PNG_1X1);
    assert_eq!(summary[0].format, PictureFormat::Png);

    assert!(wb2.worksheet(1).unwrap().pictures().is_empty());

    let photos = wb2.worksheet(2).unwrap().pictures();
    assert_eq!(photos.len(), 2);
    assert_eq!((photos[1].row, photos[1].col), (4, 3));
}

#[test]
fn test_write_file_and_read_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out.xlsx");

    let mut wb = Workbook::new();
    wb.worksheet_mut(0)
        .unwrap()
        .set_cell_value("A1", 1.0)
        .unwrap();
    XlsxWriter::write_file(&wb, &path).unwrap();

    let wb2 = XlsxReader::read_file(&path).unwrap();
    assert_eq!(
        wb2.worksheet(0).unwrap().get_value("A1").unwrap(),
        CellValue::Number(1.0)
    );
    assert_eq!(wb2.styles().get(StyleId::DEFAULT), Some(&Style::default()));
}
