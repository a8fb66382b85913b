//! Inline declaration parsing
//!
//! Turns the content of a `style` attribute into a [`StyleModel`]. Parsing
//! never fails: unknown keys are ignored and a malformed declaration is
//! skipped on its own.

use std::collections::HashMap;

use lazy_regex::regex_captures;
use once_cell::sync::Lazy;

use crate::config::ConvertOptions;
use crate::style::{StyleModel, TextAlign, ValueType};

/// Keyword that turns on text wrapping
const BREAK_WORD: &str = "break-word";

/// Keyword that turns on cell borders
const SOLID: &str = "solid";

/// Named colors accepted for backgrounds
static NAMED_COLORS: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("black", "000000"),
        ("white", "FFFFFF"),
        ("red", "FF0000"),
        ("green", "008000"),
        ("lime", "00FF00"),
        ("blue", "0000FF"),
        ("yellow", "FFFF00"),
        ("cyan", "00FFFF"),
        ("aqua", "00FFFF"),
        ("magenta", "FF00FF"),
        ("fuchsia", "FF00FF"),
        ("silver", "C0C0C0"),
        ("gray", "808080"),
        ("grey", "808080"),
        ("lightgray", "D3D3D3"),
        ("lightgrey", "D3D3D3"),
        ("darkgray", "A9A9A9"),
        ("darkgrey", "A9A9A9"),
        ("maroon", "800000"),
        ("olive", "808000"),
        ("purple", "800080"),
        ("teal", "008080"),
        ("navy", "000080"),
        ("orange", "FFA500"),
        ("pink", "FFC0CB"),
        ("lightblue", "ADD8E6"),
        ("lightgreen", "90EE90"),
        ("lightyellow", "FFFFE0"),
        ("beige", "F5F5DC"),
        ("wheat", "F5DEB3"),
        ("lavender", "E6E6FA"),
        ("salmon", "FA8072"),
        ("gold", "FFD700"),
        ("khaki", "F0E68C"),
    ])
});

/// Candidates for one size axis, resolved by precedence rather than
/// declaration order
#[derive(Debug, Default)]
struct SizeCandidates {
    exact: Option<f64>,
    min: Option<f64>,
    max: Option<f64>,
}

impl SizeCandidates {
    fn resolve(&self) -> Option<f64> {
        self.exact.or(self.min).or(self.max)
    }
}

/// Parser for inline declarations
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StyleParser {
    width_multiplier: f64,
    height_multiplier: f64,
}

impl Default for StyleParser {
    fn default() -> Self {
        Self::new(0.15, 0.10)
    }
}

impl StyleParser {
    /// Create a parser converting pixels with the given multipliers
    pub fn new(width_multiplier: f64, height_multiplier: f64) -> Self {
        Self {
            width_multiplier,
            height_multiplier,
        }
    }

    pub fn from_options(options: &ConvertOptions) -> Self {
        Self::new(options.width_multiplier, options.height_multiplier)
    }

    /// Parse an optional attribute value; `None` yields the default model
    pub fn parse_attr(&self, declarations: Option<&str>) -> StyleModel {
        declarations
            .map(|d| self.parse(d))
            .unwrap_or_default()
    }

    /// Parse a `key: value; key: value` list
    pub fn parse(&self, declarations: &str) -> StyleModel {
        let mut model = StyleModel::default();
        let mut width = SizeCandidates::default();
        let mut height = SizeCandidates::default();

        for declaration in declarations.split(';') {
            let declaration = declaration.trim();
            if declaration.is_empty() {
                continue;
            }
            let Some((key, value)) = declaration.split_once(':') else {
                log::trace!("skipping declaration without ':' in '{}'", declaration);
                continue;
            };
            let key = key.trim().to_ascii_lowercase();
            let value = strip_important(value.trim());

            match key.as_str() {
                "text-align" => model.text_align = TextAlign::parse(value),
                "vertical-align" => model.vertical_align = value.to_ascii_lowercase(),
                "word-wrap" | "overflow-wrap" => {
                    model.word_wrap = value.eq_ignore_ascii_case(BREAK_WORD)
                }
                "border-style" | "border-inheritance-type" => {
                    model.border_enabled = value.eq_ignore_ascii_case(SOLID)
                }
                "font-weight" => model.bold = value.to_ascii_lowercase().contains("bold"),
                "font-size" => {
                    if let Some(size) = parse_size(&key, value) {
                        model.font_size_pt = size;
                    }
                }
                "width" => width.exact = parse_size(&key, value),
                "min-width" => width.min = parse_size(&key, value),
                "max-width" => width.max = parse_size(&key, value),
                "height" => height.exact = parse_size(&key, value),
                "min-height" => height.min = parse_size(&key, value),
                "max-height" => height.max = parse_size(&key, value),
                "background-color" | "background" => match parse_color(value) {
                    Some(hex) => model.background_color = hex,
                    None => log::trace!("skipping unrecognized color '{}'", value),
                },
                "value-type" => match value.parse::<ValueType>() {
                    Ok(value_type) => model.value_type = value_type,
                    Err(err) => log::trace!("skipping value-type: {}", err),
                },
                _ => {}
            }
        }

        if let Some(px) = width.resolve() {
            model.width = px * self.width_multiplier;
        }
        if let Some(px) = height.resolve() {
            model.height = px * self.height_multiplier;
        }
        model
    }
}

fn strip_important(value: &str) -> &str {
    match value.len().checked_sub("!important".len()) {
        Some(at) if value.is_char_boundary(at) && value[at..].eq_ignore_ascii_case("!important") => {
            value[..at].trim_end()
        }
        _ => value,
    }
}

/// Leading number of a value, with any unit suffix dropped
pub(crate) fn parse_number(value: &str) -> Option<f64> {
    let (_, number) = regex_captures!(r"^\s*([+-]?(?:\d+\.?\d*|\.\d+)(?:[eE][+-]?\d+)?)", value)?;
    number.parse::<f64>().ok().filter(|n| n.is_finite())
}

fn parse_size(key: &str, value: &str) -> Option<f64> {
    match parse_number(value) {
        // `-0` counts as zero
        Some(n) if n >= 0.0 => Some(n.abs()),
        Some(n) => {
            log::trace!("skipping negative {} {}", key, n);
            None
        }
        None => {
            log::trace!("skipping unparsable {} '{}'", key, value);
            None
        }
    }
}

/// Normalize a color to uppercase `RRGGBB`
///
/// `transparent` and `none` clear the background. For the `background`
/// shorthand the first token that is a color wins.
fn parse_color(value: &str) -> Option<String> {
    let value = value.trim().to_ascii_lowercase();
    if value == "transparent" || value == "none" || value == "inherit" || value == "initial" {
        return Some(String::new());
    }
    if let Some((_, r, g, b)) = regex_captures!(
        r"^rgba?\(\s*(\d{1,3})\s*,\s*(\d{1,3})\s*,\s*(\d{1,3})\s*(?:,\s*[\d.]+\s*)?\)",
        &value
    ) {
        let channel = |s: &str| s.parse::<u16>().ok().map(|c| c.min(255));
        return Some(format!(
            "{:02X}{:02X}{:02X}",
            channel(r)?,
            channel(g)?,
            channel(b)?
        ));
    }
    value.split_whitespace().find_map(color_token)
}

fn color_token(token: &str) -> Option<String> {
    if let Some(hex) = NAMED_COLORS.get(token) {
        return Some((*hex).to_string());
    }
    let hex = token.strip_prefix('#').unwrap_or(token);
    if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    match hex.len() {
        3 => Some(hex.chars().flat_map(|c| [c, c]).collect::<String>().to_ascii_uppercase()),
        6 => Some(hex.to_ascii_uppercase()),
        _ => None,
    }
}
