//! Pictures anchored to a cell

use std::fmt;

/// Raster formats that can be embedded in a worksheet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PictureFormat {
    Png,
    Jpeg,
    Gif,
}

impl PictureFormat {
    /// File extension used for the media part
    pub fn extension(&self) -> &'static str {
        match self {
            PictureFormat::Png => "png",
            PictureFormat::Jpeg => "jpeg",
            PictureFormat::Gif => "gif",
        }
    }

    /// MIME type for the content-types manifest
    pub fn content_type(&self) -> &'static str {
        match self {
            PictureFormat::Png => "image/png",
            PictureFormat::Jpeg => "image/jpeg",
            PictureFormat::Gif => "image/gif",
        }
    }

    /// Look up a format by file extension (case-insensitive)
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "png" => Some(PictureFormat::Png),
            "jpg" | "jpeg" => Some(PictureFormat::Jpeg),
            "gif" => Some(PictureFormat::Gif),
            _ => None,
        }
    }
}

impl fmt::Display for PictureFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// An image whose top-left corner is anchored at a cell
#[derive(Clone, PartialEq)]
pub struct Picture {
    /// Anchor row (0-based)
    pub row: u32,
    /// Anchor column (0-based)
    pub col: u16,
    /// Display name (usually the source file name)
    pub name: String,
    /// Encoded image bytes
    pub data: Vec<u8>,
    /// Encoding of `data`
    pub format: PictureFormat,
}

impl Picture {
    /// Create a picture anchored at (row, col)
    pub fn new<S: Into<String>>(
        row: u32,
        col: u16,
        name: S,
        data: Vec<u8>,
        format: PictureFormat,
    ) -> Self {
        Self {
            row,
            col,
            name: name.into(),
            data,
            format,
        }
    }
}

impl fmt::Debug for Picture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Picture")
            .field("row", &self.row)
            .field("col", &self.col)
            .field("name", &self.name)
            .field("bytes", &self.data.len())
            .field("format", &self.format)
            .finish()
    }
}
