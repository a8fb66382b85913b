//! Cell borders

use std::str::FromStr;

use super::Color;

/// One side of a cell, in the order SpreadsheetML lists them
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    Left,
    Right,
    Top,
    Bottom,
}

impl Side {
    pub const ALL: [Side; 4] = [Side::Left, Side::Right, Side::Top, Side::Bottom];

    /// Element name inside `<border>`
    pub fn tag(self) -> &'static str {
        match self {
            Side::Left => "left",
            Side::Right => "right",
            Side::Top => "top",
            Side::Bottom => "bottom",
        }
    }

    pub fn from_tag(tag: &[u8]) -> Option<Side> {
        Side::ALL.into_iter().find(|side| side.tag().as_bytes() == tag)
    }
}

/// The four edges of a cell; a missing edge draws nothing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct BorderStyle {
    edges: [Option<BorderEdge>; 4],
}

impl BorderStyle {
    pub fn new() -> Self {
        Self::default()
    }

    /// The same line on every side; `BorderLineStyle::None` gives no border
    pub fn all(line: BorderLineStyle, color: Color) -> Self {
        let edge = (line != BorderLineStyle::None).then_some(BorderEdge::new(line, color));
        Self { edges: [edge; 4] }
    }

    pub fn edge(&self, side: Side) -> Option<BorderEdge> {
        self.edges[side as usize]
    }

    pub fn edge_mut(&mut self, side: Side) -> &mut Option<BorderEdge> {
        &mut self.edges[side as usize]
    }

    pub fn is_empty(&self) -> bool {
        self.edges.iter().all(Option::is_none)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BorderEdge {
    pub style: BorderLineStyle,
    pub color: Color,
}

impl BorderEdge {
    pub fn new(style: BorderLineStyle, color: Color) -> Self {
        Self { style, color }
    }
}

/// Line weights, named by their SpreadsheetML keyword
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum BorderLineStyle {
    #[default]
    None,
    Thin,
    Medium,
    Thick,
    Dashed,
    Dotted,
    Double,
    Hair,
}

const LINE_KEYWORDS: [(BorderLineStyle, &str); 8] = [
    (BorderLineStyle::None, "none"),
    (BorderLineStyle::Thin, "thin"),
    (BorderLineStyle::Medium, "medium"),
    (BorderLineStyle::Thick, "thick"),
    (BorderLineStyle::Dashed, "dashed"),
    (BorderLineStyle::Dotted, "dotted"),
    (BorderLineStyle::Double, "double"),
    (BorderLineStyle::Hair, "hair"),
];

impl BorderLineStyle {
    pub fn as_str(&self) -> &'static str {
        LINE_KEYWORDS[*self as usize].1
    }
}

impl FromStr for BorderLineStyle {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        LINE_KEYWORDS
            .iter()
            .find(|(_, keyword)| keyword.eq_ignore_ascii_case(wanted))
            .map(|(line, _)| *line)
            .ok_or_else(|| format!("unknown border weight '{}'", wanted))
    }
}
