//! Cell fonts

use std::hash::{Hash, Hasher};

/// Typeface written for every font; cells only vary size and weight
pub const DEFAULT_FONT_NAME: &str = "Calibri";

/// Size used when a style does not set one, in points
pub const DEFAULT_FONT_SIZE: f64 = 11.0;

#[derive(Debug, Clone, PartialEq)]
pub struct FontStyle {
    pub name: String,
    /// Points
    pub size: f64,
    pub bold: bool,
}

impl Default for FontStyle {
    fn default() -> Self {
        Self {
            name: DEFAULT_FONT_NAME.to_string(),
            size: DEFAULT_FONT_SIZE,
            bold: false,
        }
    }
}

impl FontStyle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_size(mut self, size: f64) -> Self {
        self.size = size;
        self
    }

    pub fn with_bold(mut self, bold: bool) -> Self {
        self.bold = bold;
        self
    }
}

// Sizes compare by bit pattern so equal fonts always share a style slot
impl Hash for FontStyle {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
        self.size.to_bits().hash(state);
        self.bold.hash(state);
    }
}

impl Eq for FontStyle {}
