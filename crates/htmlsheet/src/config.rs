//! Conversion options

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use htmlsheet_core::{BorderLineStyle, Color, VerticalAlignment};

use crate::error::{ConvertError, Result};

/// When the output document is written to disk during a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "kebab-case")
)]
pub enum CheckpointPolicy {
    /// Serialize, release and reopen the document after every batch
    #[default]
    EveryBatch,
    /// Keep the document in memory and serialize once at the end
    HoldOpen,
}

impl CheckpointPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            CheckpointPolicy::EveryBatch => "every-batch",
            CheckpointPolicy::HoldOpen => "hold-open",
        }
    }
}

impl FromStr for CheckpointPolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "every-batch" | "every_batch" | "everybatch" => Ok(CheckpointPolicy::EveryBatch),
            "hold-open" | "hold_open" | "holdopen" => Ok(CheckpointPolicy::HoldOpen),
            other => Err(format!(
                "unknown checkpoint policy '{}' (expected every-batch or hold-open)",
                other
            )),
        }
    }
}

impl fmt::Display for CheckpointPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Options for a conversion run
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(default)
)]
pub struct ConvertOptions {
    /// Pixels to column-width units (default: 0.15)
    pub width_multiplier: f64,
    /// Pixels to row-height units (default: 0.10)
    pub height_multiplier: f64,
    /// Body rows processed per batch (default: 10000)
    pub batch_size: usize,
    /// Checkpoint behavior between batches
    pub checkpoint: CheckpointPolicy,
    /// Height used by row styles that declare none (default: 15)
    pub default_row_height: f64,
    /// Font size used when a cell declares none (default: 11)
    pub default_font_size: f64,
    /// Line style for enabled borders
    pub border_weight: BorderLineStyle,
    /// Vertical alignment used when a cell declares none
    pub vertical_align_default: VerticalAlignment,
    /// Hex fill used when a cell declares no background (default: FFFFFF)
    pub default_background: String,
    /// Directory that relative image paths resolve against
    pub image_base_dir: Option<PathBuf>,
    /// Delete the destination if a run fails after it was checkpointed
    pub remove_partial_on_error: bool,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            width_multiplier: 0.15,
            height_multiplier: 0.10,
            batch_size: 10_000,
            checkpoint: CheckpointPolicy::EveryBatch,
            default_row_height: htmlsheet_core::DEFAULT_ROW_HEIGHT,
            default_font_size: htmlsheet_core::DEFAULT_FONT_SIZE,
            border_weight: BorderLineStyle::Thin,
            vertical_align_default: VerticalAlignment::Center,
            default_background: "FFFFFF".to_string(),
            image_base_dir: None,
            remove_partial_on_error: false,
        }
    }
}

impl ConvertOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_width_multiplier(mut self, multiplier: f64) -> Self {
        self.width_multiplier = multiplier;
        self
    }

    pub fn with_height_multiplier(mut self, multiplier: f64) -> Self {
        self.height_multiplier = multiplier;
        self
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn with_checkpoint(mut self, policy: CheckpointPolicy) -> Self {
        self.checkpoint = policy;
        self
    }

    pub fn with_default_row_height(mut self, height: f64) -> Self {
        self.default_row_height = height;
        self
    }

    pub fn with_default_font_size(mut self, size: f64) -> Self {
        self.default_font_size = size;
        self
    }

    pub fn with_border_weight(mut self, weight: BorderLineStyle) -> Self {
        self.border_weight = weight;
        self
    }

    pub fn with_vertical_align_default(mut self, align: VerticalAlignment) -> Self {
        self.vertical_align_default = align;
        self
    }

    pub fn with_default_background<S: Into<String>>(mut self, hex: S) -> Self {
        self.default_background = hex.into();
        self
    }

    pub fn with_image_base_dir<P: Into<PathBuf>>(mut self, dir: P) -> Self {
        self.image_base_dir = Some(dir.into());
        self
    }

    pub fn with_remove_partial_on_error(mut self, remove: bool) -> Self {
        self.remove_partial_on_error = remove;
        self
    }

    /// The default fill color, parsed
    pub fn default_background_color(&self) -> Option<Color> {
        Color::from_hex(&self.default_background)
    }

    /// Reject values no run can work with
    pub fn validate(&self) -> Result<()> {
        if self.batch_size == 0 {
            return Err(ConvertError::Config("batch size must be at least 1".into()));
        }
        for (name, value) in [
            ("width multiplier", self.width_multiplier),
            ("height multiplier", self.height_multiplier),
            ("default row height", self.default_row_height),
            ("default font size", self.default_font_size),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(ConvertError::Config(format!(
                    "{} must be a positive number, got {}",
                    name, value
                )));
            }
        }
        if self.default_background_color().is_none() {
            return Err(ConvertError::Config(format!(
                "default background '{}' is not a hex color",
                self.default_background
            )));
        }
        Ok(())
    }
}
