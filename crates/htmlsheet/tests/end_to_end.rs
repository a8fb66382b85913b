//! End-to-end conversion tests (HTML -> xlsx file -> read back -> verify)

use htmlsheet::{convert_html, CheckpointPolicy, ConvertOptions};
use htmlsheet_core::{
    BorderLineStyle, CellValue, Color, FillStyle, HorizontalAlignment, PictureFormat, Side,
    VerticalAlignment, Workbook,
};
use htmlsheet_xlsx::XlsxReader;
use pretty_assertions::assert_eq;

/// Smallest valid PNG: 1x1 transparent pixel
const PNG_1X1: &[u8] = &[
    0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x48, 0x44,
    0x52, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x08, 0x06, 0x00, 0x00, 0x00, 0x1F,
    0x15, 0xC4, 0x89, 0x00, 0x00, 0x00, 0x0A, 0x49, 0x44, 0x41, 0x54, 0x78, 0x9C, 0x63, 0x00,
    0x01, 0x00, 0x00, 0x05, 0x00, 0x01, 0x0D, 0x0A, 0x2D, 0xB4, 0x00, 0x00, 0x00, 0x00, 0x49,
    0x45, 0x4E, 0x44, 0xAE, 0x42, 0x60, 0x82,
];

fn convert(html: &str, options: &ConvertOptions) -> (Workbook, tempfile::TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out.xlsx");
    convert_html(html, &path, options).unwrap();
    let workbook = XlsxReader::read_file(&path).unwrap();
    (workbook, dir)
}

#[test]
fn test_results_scenario() {
    let html = r#"<html><body>
        <table name="Results">
            <thead><tr><th>Name</th><th>Score</th></tr></thead>
            <tbody><tr><td>Alice</td><td style="value-type: float">95</td></tr></tbody>
        </table>
    </body></html>"#;
    let options = ConvertOptions::default().with_batch_size(1);
    let (workbook, _dir) = convert(html, &options);

    assert_eq!(workbook.sheet_count(), 1);
    let sheet = workbook.worksheet(0).unwrap();
    assert_eq!(sheet.name(), "Results");
    assert_eq!(sheet.get_value("A1").unwrap(), CellValue::string("Name"));
    assert_eq!(sheet.get_value("B1").unwrap(), CellValue::string("Score"));
    assert_eq!(sheet.get_value("A2").unwrap(), CellValue::string("Alice"));
    assert_eq!(sheet.get_value("B2").unwrap(), CellValue::Number(95.0));
}

#[test]
fn test_colspan_width_alignment_border() {
    let html = r#"<table data-name="Wide">
        <thead><tr>
            <th colspan="3" style="width:300px;text-align:center;border-style:solid">Title</th>
            <th>Next</th>
        </tr></thead>
    </table>"#;
    let (workbook, _dir) = convert(html, &ConvertOptions::default());
    let sheet = workbook.worksheet(0).unwrap();

    let width = sheet.column_width(0).unwrap();
    assert!((width - 45.0).abs() < 1e-6, "width was {}", width);

    let style = workbook.style(sheet.cell_style_at(0, 0).unwrap()).unwrap();
    assert_eq!(style.alignment.horizontal, HorizontalAlignment::Center);
    assert_eq!(style.alignment.vertical, VerticalAlignment::Center);
    for side in Side::ALL {
        assert_eq!(
            style.border.edge(side).map(|e| e.style),
            Some(BorderLineStyle::Thin)
        );
    }

    let merged: Vec<String> = sheet.merged_regions().iter().map(|r| r.to_string()).collect();
    assert_eq!(merged, vec!["A1:C1".to_string()]);
    // The cursor moved one column, not three
    assert_eq!(sheet.get_value("B1").unwrap(), CellValue::string("Next"));
}

#[test]
fn test_multiple_tables_get_sheets_in_order() {
    let html = r#"
        <table data-name="First"><tr><td>1</td></tr></table>
        <table><tr><td>2</td></tr></table>
        <table data-name="First"><tr><td>3</td></tr></table>
        <table data-name="a/b"><tr><td>4</td></tr></table>
    "#;
    let options = ConvertOptions::default().with_batch_size(1);
    let (workbook, _dir) = convert(html, &options);

    let names: Vec<&str> = workbook.worksheets().map(|ws| ws.name()).collect();
    assert_eq!(names, vec!["First", "DataSheet 1", "First (2)", "a_b"]);
    for (i, expected) in ["1", "2", "3", "4"].into_iter().enumerate() {
        let value = workbook.worksheet(i).unwrap().get_value_at(0, 0);
        assert_eq!(value, CellValue::string(expected));
    }
}

#[test]
fn test_styles_survive_checkpoints() {
    let html = r#"<table data-name="S">
        <tr><td style="font-weight: bold; background-color: #ffcc00; font-size: 14px">a</td></tr>
        <tr><td style="font-weight: bold; background-color: #ffcc00; font-size: 14px">b</td></tr>
        <tr><td>c</td></tr>
    </table>"#;
    let options = ConvertOptions::default().with_batch_size(1);
    let (workbook, _dir) = convert(html, &options);
    let sheet = workbook.worksheet(0).unwrap();

    let a = sheet.cell_style_at(0, 0).unwrap();
    let b = sheet.cell_style_at(1, 0).unwrap();
    // Equal styles registered in different batches share one handle
    assert_eq!(a, b);

    let style = workbook.style(a).unwrap();
    assert!(style.font.bold);
    assert_eq!(style.font.size, 14.0);
    assert_eq!(style.fill, FillStyle::solid(Color::rgb(0xFF, 0xCC, 0x00)));

    let plain = workbook.style(sheet.cell_style_at(2, 0).unwrap()).unwrap();
    assert_eq!(plain.fill, FillStyle::solid(Color::WHITE));
    assert_eq!(plain.font.size, 11.0);
}

#[test]
fn test_row_heights() {
    let html = r#"<table>
        <tr style="height: 300px"><td>tall</td></tr>
        <tr style="text-align: right"><td>default</td></tr>
        <tr><td>untouched</td></tr>
    </table>"#;
    let (workbook, _dir) = convert(html, &ConvertOptions::default());
    let sheet = workbook.worksheet(0).unwrap();
    assert_eq!(sheet.custom_row_height(0), Some(30.0));
    assert_eq!(sheet.custom_row_height(1), Some(15.0));
    assert_eq!(sheet.custom_row_height(2), None);
}

#[test]
fn test_images_embedded_or_replaced_by_alt() {
    let assets = tempfile::tempdir().unwrap();
    std::fs::write(assets.path().join("logo.png"), PNG_1X1).unwrap();
    std::fs::write(assets.path().join("notes.txt"), b"plain text").unwrap();

    let html = r#"<table data-name="Pics"><tr>
        <td><img src="logo.png" alt="Logo"></td>
        <td><img src="missing.png" alt="Missing"></td>
        <td><img src="notes.txt" alt="Not an image"></td>
    </tr></table>"#;
    let options = ConvertOptions::default().with_image_base_dir(assets.path());
    let (workbook, _dir) = convert(html, &options);
    let sheet = workbook.worksheet(0).unwrap();

    let pictures = sheet.pictures();
    assert_eq!(pictures.len(), 1);
    assert_eq!((pictures[0].row, pictures[0].col), (0, 0));
    assert_eq!(pictures[0].format, PictureFormat::Png);
    assert_eq!(pictures[0].data, PNG_1X1);
    assert_eq!(sheet.get_value_at(0, 0), CellValue::Empty);

    assert_eq!(sheet.get_value_at(0, 1), CellValue::string("Missing"));
    assert_eq!(sheet.get_value_at(0, 2), CellValue::string("Not an image"));
}

#[test]
fn test_hold_open_matches_every_batch() {
    let html = r#"<table data-name="P">
        <thead><tr><th style="width: 100px">K</th><th>V</th></tr></thead>
        <tr><td>a</td><td style="value-type: bool">true</td></tr>
        <tr><td colspan="2" style="text-align: center">both</td></tr>
    </table>"#;
    let every = ConvertOptions::default().with_batch_size(1);
    let hold = every.clone().with_checkpoint(CheckpointPolicy::HoldOpen);

    let (a, _da) = convert(html, &every);
    let (b, _db) = convert(html, &hold);

    let sheet_a = a.worksheet(0).unwrap();
    let sheet_b = b.worksheet(0).unwrap();
    let cells_a: Vec<_> = sheet_a
        .iter_cells()
        .map(|(r, c, cell)| (r, c, cell.value.clone(), cell.style.and_then(|id| a.style(id))))
        .collect();
    let cells_b: Vec<_> = sheet_b
        .iter_cells()
        .map(|(r, c, cell)| (r, c, cell.value.clone(), cell.style.and_then(|id| b.style(id))))
        .collect();
    assert_eq!(cells_a, cells_b);
    assert_eq!(sheet_a.get_value_at(1, 1), CellValue::Boolean(true));
    assert_eq!(sheet_a.merged_regions(), sheet_b.merged_regions());
}

#[test]
fn test_invalid_options_rejected_before_writing() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out.xlsx");
    let options = ConvertOptions::default().with_batch_size(0);
    let err = convert_html("<table></table>", &path, &options).unwrap_err();
    assert!(matches!(err, htmlsheet::ConvertError::Config(_)));
    assert!(!path.exists());
}
