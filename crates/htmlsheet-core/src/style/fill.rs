//! Cell backgrounds

use super::Color;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FillStyle {
    /// Transparent; gridlines show through
    #[default]
    None,
    /// `solid` pattern in one colour
    Solid(Color),
}

impl FillStyle {
    pub fn solid(color: Color) -> Self {
        FillStyle::Solid(color)
    }

    pub fn color(&self) -> Option<Color> {
        match self {
            FillStyle::None => None,
            FillStyle::Solid(color) => Some(*color),
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, FillStyle::None)
    }
}
