//! Property tests for style parsing and batch boundaries

use htmlsheet::{convert_html, ConvertOptions, StyleParser};
use htmlsheet_core::Workbook;
use htmlsheet_xlsx::XlsxReader;
use proptest::prelude::*;

fn snapshot(workbook: &Workbook) -> Vec<String> {
    let mut out = Vec::new();
    for ws in workbook.worksheets() {
        out.push(format!("sheet {}", ws.name()));
        for (row, col, cell) in ws.iter_cells() {
            let style = cell.style.and_then(|id| workbook.style(id));
            out.push(format!("{} {} {:?} {:?}", row, col, cell.value, style));
        }
        for column in ws.columns() {
            let style = column.style.and_then(|id| workbook.style(id));
            out.push(format!("col {:?} {:?}", column.width, style));
        }
        for (row, height) in ws.custom_row_heights() {
            out.push(format!("row {} {}", row, height));
        }
        for region in ws.merged_regions() {
            out.push(format!("merge {}", region));
        }
    }
    out
}

fn table_html(rows: &[(String, u8, bool)]) -> String {
    let mut html = String::from(
        r#"<table data-name="Data"><thead><tr><th style="width: 120px">Key</th><th>Value</th></tr></thead><tbody>"#,
    );
    for (text, span, bold) in rows {
        let weight = if *bold { "font-weight: bold" } else { "" };
        html.push_str(&format!(
            r#"<tr style="height: 50px"><td colspan="{}" style="{}">{}</td><td style="value-type: float">{}</td></tr>"#,
            span,
            weight,
            text,
            text.len()
        ));
    }
    html.push_str("</tbody></table>");
    html
}

fn convert_with_batch(html: &str, batch_size: usize) -> Vec<String> {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out.xlsx");
    let options = ConvertOptions::default().with_batch_size(batch_size);
    convert_html(html, &path, &options).unwrap();
    snapshot(&XlsxReader::read_file(&path).unwrap())
}

proptest! {
    #[test]
    fn unknown_declarations_are_ignored(
        base in "(width: [0-9]{1,3}px; )?(text-align: (left|right|center); )?(font-weight: bold)?",
        key in "x-[a-z]{1,8}",
        value in "[a-z0-9 #]{0,12}",
    ) {
        let parser = StyleParser::default();
        let with_unknown = format!("{}; {}: {}", base, key, value);
        prop_assert_eq!(parser.parse(&base), parser.parse(&with_unknown));
    }

    #[test]
    fn parse_never_panics(s in "\\PC*") {
        let _ = StyleParser::default().parse(&s);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(12))]

    #[test]
    fn batch_size_does_not_change_output(
        rows in prop::collection::vec(("[a-z]{1,6}", 1u8..3, any::<bool>()), 1..8),
        batch_size in 1usize..5,
    ) {
        let html = table_html(&rows);
        let whole = convert_with_batch(&html, rows.len());
        let split = convert_with_batch(&html, batch_size);
        prop_assert_eq!(whole, split);
    }
}
