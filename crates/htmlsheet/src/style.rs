//! Structured form of an inline declaration string

use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

/// Horizontal text alignment as declared
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum TextAlign {
    /// Not declared
    #[default]
    None,
    Left,
    Right,
    Center,
    Justify,
    /// Any other keyword, kept verbatim
    Other(String),
}

impl TextAlign {
    pub fn parse(value: &str) -> Self {
        let value = value.trim();
        match value.to_ascii_lowercase().as_str() {
            "" => TextAlign::None,
            "left" | "start" => TextAlign::Left,
            "right" | "end" => TextAlign::Right,
            "center" => TextAlign::Center,
            "justify" => TextAlign::Justify,
            _ => TextAlign::Other(value.to_string()),
        }
    }

    pub fn is_set(&self) -> bool {
        !matches!(self, TextAlign::None)
    }
}

/// How cell text is typed before it is written
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ValueType {
    #[default]
    String,
    Float,
    Bool,
}

impl FromStr for ValueType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "string" | "text" => Ok(ValueType::String),
            "float" | "number" | "numeric" => Ok(ValueType::Float),
            "bool" | "boolean" => Ok(ValueType::Bool),
            other => Err(format!("unknown value type '{}'", other)),
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ValueType::String => "string",
            ValueType::Float => "float",
            ValueType::Bool => "bool",
        })
    }
}

/// Presentational settings of one element
///
/// Always total: an element without declarations has the default model,
/// never an absent one. Sizes are already converted to spreadsheet units;
/// zero means unset.
#[derive(Debug, Clone, PartialEq)]
pub struct StyleModel {
    pub text_align: TextAlign,
    /// Raw keyword, lowercased; empty means the configured default
    pub vertical_align: String,
    pub word_wrap: bool,
    /// Column width units
    pub width: f64,
    /// Row height units
    pub height: f64,
    pub border_enabled: bool,
    pub font_size_pt: f64,
    pub bold: bool,
    /// Columns spanned; 1 means no merge
    pub colspan: u32,
    /// Uppercase `RRGGBB`, or empty for no declared background
    pub background_color: String,
    pub value_type: ValueType,
}

impl Default for StyleModel {
    fn default() -> Self {
        Self {
            text_align: TextAlign::None,
            vertical_align: String::new(),
            word_wrap: false,
            width: 0.0,
            height: 0.0,
            border_enabled: false,
            font_size_pt: 0.0,
            bold: false,
            colspan: 1,
            background_color: String::new(),
            value_type: ValueType::String,
        }
    }
}

impl StyleModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the span taken from the element's `colspan` attribute
    pub fn with_colspan(mut self, colspan: u32) -> Self {
        self.colspan = colspan.max(1);
        self
    }

    pub fn is_default(&self) -> bool {
        *self == Self::default()
    }

    /// Fill in what a row declares and this cell does not
    ///
    /// Alignment is taken from the row when unset here; border and wrap are
    /// switched on when the row enables them.
    pub fn inherit(&self, row: &StyleModel) -> StyleModel {
        let mut merged = self.clone();
        if !merged.text_align.is_set() {
            merged.text_align = row.text_align.clone();
        }
        if merged.vertical_align.is_empty() {
            merged.vertical_align = row.vertical_align.clone();
        }
        merged.border_enabled |= row.border_enabled;
        merged.word_wrap |= row.word_wrap;
        merged
    }
}

impl Hash for StyleModel {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.text_align.hash(state);
        self.vertical_align.hash(state);
        self.word_wrap.hash(state);
        size_bits(self.width).hash(state);
        size_bits(self.height).hash(state);
        self.border_enabled.hash(state);
        size_bits(self.font_size_pt).hash(state);
        self.bold.hash(state);
        self.colspan.hash(state);
        self.background_color.hash(state);
        self.value_type.hash(state);
    }
}

impl Eq for StyleModel {}

/// Bits of a size with both zeros hashing alike, matching `==`
fn size_bits(size: f64) -> u64 {
    if size == 0.0 {
        0
    } else {
        size.to_bits()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_default_is_total() {
        let model = StyleModel::default();
        assert_eq!(model.colspan, 1);
        assert_eq!(model.text_align, TextAlign::None);
        assert_eq!(model.value_type, ValueType::String);
        assert!(model.is_default());
    }

    #[test]
    fn test_text_align_parse() {
        assert_eq!(TextAlign::parse("CENTER"), TextAlign::Center);
        assert_eq!(TextAlign::parse(" right "), TextAlign::Right);
        assert_eq!(TextAlign::parse(""), TextAlign::None);
        assert_eq!(
            TextAlign::parse("-webkit-center"),
            TextAlign::Other("-webkit-center".into())
        );
    }

    #[test]
    fn test_value_type_aliases() {
        assert_eq!("number".parse(), Ok(ValueType::Float));
        assert_eq!("Boolean".parse(), Ok(ValueType::Bool));
        assert!("date".parse::<ValueType>().is_err());
    }

    #[test]
    fn test_colspan_never_below_one() {
        assert_eq!(StyleModel::new().with_colspan(0).colspan, 1);
        assert_eq!(StyleModel::new().with_colspan(3).colspan, 3);
    }

    #[test]
    fn test_inherit_from_row() {
        let row = StyleModel {
            text_align: TextAlign::Center,
            vertical_align: "top".into(),
            border_enabled: true,
            height: 30.0,
            ..StyleModel::default()
        };
        let cell = StyleModel {
            text_align: TextAlign::Left,
            bold: true,
            ..StyleModel::default()
        };

        let merged = cell.inherit(&row);
        assert_eq!(merged.text_align, TextAlign::Left);
        assert_eq!(merged.vertical_align, "top");
        assert!(merged.border_enabled);
        assert!(merged.bold);
        // Height stays a row property
        assert_eq!(merged.height, 0.0);
    }

    #[test]
    fn test_equal_models_hash_equal() {
        use std::collections::hash_map::DefaultHasher;

        let hash = |m: &StyleModel| {
            let mut h = DefaultHasher::new();
            m.hash(&mut h);
            h.finish()
        };
        let a = StyleModel {
            width: 45.0,
            ..StyleModel::default()
        };
        let b = a.clone();
        assert_eq!(a, b);
        assert_eq!(hash(&a), hash(&b));

        // Both zeros compare equal, so they must hash alike
        let signed = StyleModel {
            width: -0.0,
            height: -0.0,
            font_size_pt: -0.0,
            ..StyleModel::default()
        };
        assert_eq!(signed, StyleModel::default());
        assert_eq!(hash(&signed), hash(&StyleModel::default()));
    }
}
