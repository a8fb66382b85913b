//! # htmlsheet-xlsx
//!
//! Saves an htmlsheet [`Workbook`](htmlsheet_core::Workbook) as an XLSX
//! package and loads it back.
//!
//! Reading restores everything writing emits: values, style handles,
//! column objects, custom row heights, merged ranges and pictures. A
//! conversion can therefore drop its document after a checkpoint and carry
//! on from the file.

use std::borrow::Cow;

pub mod error;
pub mod reader;
pub mod writer;

mod styles;

pub use error::{XlsxError, XlsxResult};
pub use reader::XlsxReader;
pub use writer::XlsxWriter;

/// Escape text for element content and double-quoted attributes
pub(crate) fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

/// Characters XML 1.0 cannot carry, plus CR which parsers fold into LF
fn needs_xstring_escape(c: char) -> bool {
    matches!(c, '\u{0}'..='\u{8}' | '\u{b}' | '\u{c}' | '\r' | '\u{e}'..='\u{1f}' | '\u{fffe}' | '\u{ffff}')
}

/// Whether `text` starts with `_xHHHH`
fn starts_with_hex_marker(text: &str) -> bool {
    let b = text.as_bytes();
    b.len() >= 6 && b[0] == b'_' && b[1] == b'x' && b[2..6].iter().all(u8::is_ascii_hexdigit)
}

/// Whether `text` starts with an `_xHHHH_` escape
fn starts_with_xstring_escape(text: &str) -> bool {
    starts_with_hex_marker(text) && text.as_bytes().get(6) == Some(&b'_')
}

/// An underscore at the start of `text` would be read as an escape once
/// encoded; the next character may itself turn into `_xHHHH_`
fn underscore_reads_as_escape(text: &str) -> bool {
    starts_with_hex_marker(text)
        && text[6..]
            .chars()
            .next()
            .is_some_and(|next| next == '_' || needs_xstring_escape(next))
}

/// Encode cell text as `ST_Xstring`: forbidden characters become `_xHHHH_`,
/// and an underscore that would read as an escape becomes `_x005F_`
pub(crate) fn encode_xstring(text: &str) -> Cow<'_, str> {
    if !text.contains(|c: char| c == '_' || needs_xstring_escape(c)) {
        return Cow::Borrowed(text);
    }
    let mut out = String::with_capacity(text.len() + 8);
    for (i, c) in text.char_indices() {
        if needs_xstring_escape(c) {
            out.push_str(&format!("_x{:04X}_", u32::from(c)));
        } else if c == '_' && underscore_reads_as_escape(&text[i..]) {
            out.push_str("_x005F_");
        } else {
            out.push(c);
        }
    }
    Cow::Owned(out)
}

/// Reverse of [`encode_xstring`]; hex digits are case-insensitive
pub(crate) fn decode_xstring(text: &str) -> Cow<'_, str> {
    if !text.contains("_x") {
        return Cow::Borrowed(text);
    }
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(at) = rest.find('_') {
        out.push_str(&rest[..at]);
        rest = &rest[at..];
        let decoded = starts_with_xstring_escape(rest)
            .then(|| u32::from_str_radix(&rest[2..6], 16).ok())
            .flatten()
            .and_then(char::from_u32);
        match decoded {
            Some(c) => {
                out.push(c);
                rest = &rest[7..];
            }
            None => {
                out.push('_');
                rest = &rest[1..];
            }
        }
    }
    out.push_str(rest);
    Cow::Owned(out)
}

/// `xsd:boolean` as used by attributes like `bold` and `customHeight`
pub(crate) fn parse_bool_attr(value: &str) -> bool {
    matches!(value.trim(), "1" | "true" | "TRUE" | "True")
}
