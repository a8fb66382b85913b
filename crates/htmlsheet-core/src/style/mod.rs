//! Cell formatting
//!
//! A [`Style`] bundles font, fill, border and alignment. Styles live in the
//! workbook's [`StyleRegistry`]; cells and columns refer to them by
//! [`StyleId`], which is also the style's `cellXfs` position on disk.

mod alignment;
mod border;
mod color;
mod fill;
mod font;
mod registry;

pub use alignment::{Alignment, HorizontalAlignment, VerticalAlignment};
pub use border::{BorderEdge, BorderLineStyle, BorderStyle, Side};
pub use color::Color;
pub use fill::FillStyle;
pub use font::{FontStyle, DEFAULT_FONT_NAME, DEFAULT_FONT_SIZE};
pub use registry::{StyleId, StyleRegistry};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Style {
    pub font: FontStyle,
    pub fill: FillStyle,
    pub border: BorderStyle,
    pub alignment: Alignment,
}

impl Style {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bold(mut self, bold: bool) -> Self {
        self.font.bold = bold;
        self
    }

    /// Font size in points
    pub fn font_size(mut self, size: f64) -> Self {
        self.font.size = size;
        self
    }

    /// Solid background
    pub fn fill_color(mut self, color: Color) -> Self {
        self.fill = FillStyle::Solid(color);
        self
    }

    pub fn border(mut self, border: BorderStyle) -> Self {
        self.border = border;
        self
    }

    pub fn horizontal_alignment(mut self, align: HorizontalAlignment) -> Self {
        self.alignment.horizontal = align;
        self
    }

    pub fn vertical_alignment(mut self, align: VerticalAlignment) -> Self {
        self.alignment.vertical = align;
        self
    }

    pub fn wrap_text(mut self, wrap: bool) -> Self {
        self.alignment.wrap_text = wrap;
        self
    }

    /// Only the alignment part, as used for column styles
    pub fn alignment_only(&self) -> Style {
        Style {
            alignment: self.alignment,
            ..Style::default()
        }
    }
}
