//! Placement of text inside a cell

use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Alignment {
    pub horizontal: HorizontalAlignment,
    pub vertical: VerticalAlignment,
    pub wrap_text: bool,
}

impl Alignment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_horizontal(mut self, align: HorizontalAlignment) -> Self {
        self.horizontal = align;
        self
    }

    pub fn with_vertical(mut self, align: VerticalAlignment) -> Self {
        self.vertical = align;
        self
    }

    pub fn with_wrap(mut self, wrap: bool) -> Self {
        self.wrap_text = wrap;
        self
    }

    /// Nothing differs from the spreadsheet default, so no `<alignment>`
    /// needs to be written
    pub fn is_default(&self) -> bool {
        *self == Self::default()
    }
}

/// `horizontal` attribute values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum HorizontalAlignment {
    /// Text left, numbers right
    #[default]
    General,
    Left,
    Center,
    Right,
    Justify,
}

const HORIZONTAL_KEYWORDS: [(HorizontalAlignment, &str); 5] = [
    (HorizontalAlignment::General, "general"),
    (HorizontalAlignment::Left, "left"),
    (HorizontalAlignment::Center, "center"),
    (HorizontalAlignment::Right, "right"),
    (HorizontalAlignment::Justify, "justify"),
];

/// `vertical` attribute values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "lowercase")
)]
pub enum VerticalAlignment {
    Top,
    Center,
    /// Spreadsheet default
    #[default]
    Bottom,
}

const VERTICAL_KEYWORDS: [(VerticalAlignment, &str); 3] = [
    (VerticalAlignment::Top, "top"),
    (VerticalAlignment::Center, "center"),
    (VerticalAlignment::Bottom, "bottom"),
];

fn keyword_of<T: PartialEq + Copy>(table: &[(T, &'static str)], value: T) -> &'static str {
    table
        .iter()
        .find(|(v, _)| *v == value)
        .map_or("", |(_, k)| *k)
}

fn value_of<T: Copy>(table: &[(T, &'static str)], keyword: &str, what: &str) -> Result<T, String> {
    let keyword = keyword.trim();
    table
        .iter()
        .find(|(_, k)| k.eq_ignore_ascii_case(keyword))
        .map(|(v, _)| *v)
        .ok_or_else(|| format!("unknown {} alignment '{}'", what, keyword))
}

impl HorizontalAlignment {
    /// Keyword as written in `styles.xml`
    pub fn as_str(&self) -> &'static str {
        keyword_of(&HORIZONTAL_KEYWORDS, *self)
    }
}

impl FromStr for HorizontalAlignment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        value_of(&HORIZONTAL_KEYWORDS, s, "horizontal")
    }
}

impl VerticalAlignment {
    /// Keyword as written in `styles.xml`
    pub fn as_str(&self) -> &'static str {
        keyword_of(&VERTICAL_KEYWORDS, *self)
    }
}

impl FromStr for VerticalAlignment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // "middle" is the markup spelling
        if s.trim().eq_ignore_ascii_case("middle") {
            return Ok(VerticalAlignment::Center);
        }
        value_of(&VERTICAL_KEYWORDS, s, "vertical")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keywords_round_trip() {
        for (align, keyword) in HORIZONTAL_KEYWORDS {
            assert_eq!(align.as_str(), keyword);
            assert_eq!(keyword.parse::<HorizontalAlignment>(), Ok(align));
        }
        for (align, keyword) in VERTICAL_KEYWORDS {
            assert_eq!(align.as_str(), keyword);
            assert_eq!(keyword.parse::<VerticalAlignment>(), Ok(align));
        }
    }

    #[test]
    fn test_parse_is_lenient_about_case_and_middle() {
        assert_eq!(" Center ".parse::<HorizontalAlignment>(), Ok(HorizontalAlignment::Center));
        assert_eq!("MIDDLE".parse::<VerticalAlignment>(), Ok(VerticalAlignment::Center));
        assert!("baseline".parse::<VerticalAlignment>().is_err());
        assert!("fill".parse::<HorizontalAlignment>().is_err());
    }

    #[test]
    fn test_default_alignment() {
        assert!(Alignment::new().is_default());
        assert!(!Alignment::new().with_wrap(true).is_default());
        assert_eq!(Alignment::new().vertical, VerticalAlignment::Bottom);
    }
}
