//! What a cell holds

use std::fmt;

/// A cell's content
///
/// Cell text longer than [`MAX_CELL_TEXT_LEN`](crate::MAX_CELL_TEXT_LEN) is
/// truncated before it gets here.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum CellValue {
    #[default]
    Empty,
    Boolean(bool),
    Number(f64),
    String(String),
}

impl CellValue {
    pub fn string(text: impl Into<String>) -> Self {
        Self::String(text.into())
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    pub fn as_bool(&self) -> Option<bool> {
        if let Self::Boolean(flag) = self {
            Some(*flag)
        } else {
            None
        }
    }

    pub fn as_string(&self) -> Option<&str> {
        if let Self::String(text) = self {
            Some(text)
        } else {
            None
        }
    }
}

/// Renders the value the way a spreadsheet would show it unformatted
impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => Ok(()),
            Self::Boolean(true) => f.write_str("TRUE"),
            Self::Boolean(false) => f.write_str("FALSE"),
            Self::Number(n) => fmt::Display::fmt(n, f),
            Self::String(text) => f.write_str(text),
        }
    }
}

macro_rules! cell_value_from {
    ($($source:ty => |$v:ident| $build:expr;)*) => {
        $(
            impl From<$source> for CellValue {
                fn from($v: $source) -> Self {
                    $build
                }
            }
        )*
    };
}

cell_value_from! {
    bool => |v| Self::Boolean(v);
    f64 => |v| Self::Number(v);
    i64 => |v| Self::Number(v as f64);
    String => |v| Self::String(v);
    &str => |v| Self::String(v.to_owned());
}
