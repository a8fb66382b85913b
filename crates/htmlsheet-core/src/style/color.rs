//! Colors as cell styles carry them

/// A fill, border or font color
///
/// `Auto` leaves the choice to the spreadsheet application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Color {
    #[default]
    Auto,
    Rgb(u8, u8, u8),
}

impl Color {
    pub const BLACK: Color = Color::Rgb(0x00, 0x00, 0x00);
    pub const WHITE: Color = Color::Rgb(0xFF, 0xFF, 0xFF);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Color::Rgb(r, g, b)
    }

    /// Parse `#RGB`, `#RRGGBB` or the `AARRGGBB` form SpreadsheetML stores
    ///
    /// The leading `#` is optional and any alpha byte is ignored. Anything
    /// else, including CSS color names, yields `None`.
    pub fn from_hex(text: &str) -> Option<Self> {
        let digits = text.trim().trim_start_matches('#');
        if !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
            return None;
        }
        let byte_at = |at: usize| u8::from_str_radix(&digits[at..at + 2], 16).ok();

        match digits.len() {
            3 => {
                let nibble = |at: usize| {
                    u8::from_str_radix(&digits[at..at + 1], 16)
                        .ok()
                        .map(|n| n * 0x11)
                };
                Some(Color::Rgb(nibble(0)?, nibble(1)?, nibble(2)?))
            }
            6 => Some(Color::Rgb(byte_at(0)?, byte_at(2)?, byte_at(4)?)),
            8 => Some(Color::Rgb(byte_at(2)?, byte_at(4)?, byte_at(6)?)),
            _ => None,
        }
    }

    /// Opaque `FFRRGGBB` as written to `rgb` attributes, `None` for `Auto`
    pub fn to_argb_hex(&self) -> Option<String> {
        match *self {
            Color::Auto => None,
            Color::Rgb(r, g, b) => Some(format!("FF{r:02X}{g:02X}{b:02X}")),
        }
    }
}
