//! Mapping style models onto registered workbook styles
//!
//! [`StyleMapper`] builds a typed [`Style`] descriptor from a [`StyleModel`]
//! and applies it to cells, columns, rows and merged ranges of the live
//! document. Registration goes through a [`StyleCache`] so equal
//! descriptors share one handle.

use std::hash::{Hash, Hasher};

use ahash::{AHashMap, AHashSet};
use htmlsheet_core::{
    Alignment, BorderStyle, CellRange, Color, Error as CoreError, FillStyle, FontStyle,
    HorizontalAlignment, Style, StyleId, StyleRegistry, VerticalAlignment, Workbook, Worksheet,
    MAX_COLS,
};

use crate::config::ConvertOptions;
use crate::error::Result;
use crate::style::{StyleModel, TextAlign};

/// Key for style lookup (hash-based)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct StyleKey(u64);

impl StyleKey {
    fn from_style(style: &Style) -> Self {
        let mut hasher = ahash::AHasher::default();
        style.hash(&mut hasher);
        StyleKey(hasher.finish())
    }
}

/// Deduplicating index over a workbook's style registry
///
/// Descriptors are indexed by hash. Style models get a handle of their own:
/// two models that differ in any field, even one that leaves the descriptor
/// unchanged, never share a handle. A model first looks for an equal
/// descriptor no other model has claimed, so a reopened document reuses its
/// entries instead of growing.
///
/// Only valid for the registry it was built against; a reopened document
/// needs a fresh cache.
#[derive(Debug, Default)]
pub struct StyleCache {
    descriptors: AHashMap<StyleKey, Vec<StyleId>>,
    models: AHashMap<StyleModel, StyleId>,
    claimed: AHashSet<StyleId>,
}

impl StyleCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Index every style already present
    pub fn rebuild(registry: &StyleRegistry) -> Self {
        let mut cache = Self::new();
        for (id, style) in registry.iter() {
            cache
                .descriptors
                .entry(StyleKey::from_style(style))
                .or_default()
                .push(id);
        }
        cache
    }

    /// Return the handle of an equal style, registering it if needed
    pub fn get_or_register(&mut self, workbook: &mut Workbook, style: Style) -> StyleId {
        let key = StyleKey::from_style(&style);
        let existing = self
            .descriptors
            .get(&key)
            .into_iter()
            .flatten()
            // Verify it's actually the same (hash collision check)
            .find(|&&id| workbook.style(id) == Some(&style))
            .copied();
        existing.unwrap_or_else(|| self.insert(workbook, key, style))
    }

    /// Handle for `model`, whose descriptor is `style`
    pub fn get_or_register_model(
        &mut self,
        workbook: &mut Workbook,
        model: &StyleModel,
        style: Style,
    ) -> StyleId {
        if let Some(&id) = self.models.get(model) {
            return id;
        }

        let key = StyleKey::from_style(&style);
        let unclaimed = self
            .descriptors
            .get(&key)
            .into_iter()
            .flatten()
            .find(|&&id| !self.claimed.contains(&id) && workbook.style(id) == Some(&style))
            .copied();
        let id = unclaimed.unwrap_or_else(|| self.insert(workbook, key, style));

        self.claimed.insert(id);
        self.models.insert(model.clone(), id);
        id
    }

    fn insert(&mut self, workbook: &mut Workbook, key: StyleKey, style: Style) -> StyleId {
        let id = workbook.register_style(style);
        self.descriptors.entry(key).or_default().push(id);
        id
    }

    /// Number of distinct styles seen
    pub fn len(&self) -> usize {
        self.descriptors.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }
}

/// The open output document together with its style cache
#[derive(Debug)]
pub struct LiveDocument {
    workbook: Workbook,
    styles: StyleCache,
}

impl Default for LiveDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl LiveDocument {
    /// A fresh document with one default sheet
    pub fn new() -> Self {
        Self::from_workbook(Workbook::new())
    }

    /// Adopt a workbook, indexing the styles it already has
    pub fn from_workbook(workbook: Workbook) -> Self {
        let styles = StyleCache::rebuild(workbook.styles());
        Self { workbook, styles }
    }

    pub fn workbook(&self) -> &Workbook {
        &self.workbook
    }

    pub fn workbook_mut(&mut self) -> &mut Workbook {
        &mut self.workbook
    }

    pub fn into_workbook(self) -> Workbook {
        self.workbook
    }

    pub fn register_style(&mut self, style: Style) -> StyleId {
        self.styles.get_or_register(&mut self.workbook, style)
    }

    /// Register `style` as the descriptor of `model`
    pub fn register_model(&mut self, model: &StyleModel, style: Style) -> StyleId {
        self.styles
            .get_or_register_model(&mut self.workbook, model, style)
    }

    pub fn style_cache(&self) -> &StyleCache {
        &self.styles
    }

    pub fn sheet_mut(&mut self, index: usize) -> Result<&mut Worksheet> {
        let count = self.workbook.sheet_count();
        self.workbook
            .worksheet_mut(index)
            .ok_or_else(|| CoreError::NoSuchSheet(index, count).into())
    }
}

/// Translates style models into workbook formatting
#[derive(Debug, Clone, PartialEq)]
pub struct StyleMapper {
    default_font_size: f64,
    default_row_height: f64,
    border_weight: htmlsheet_core::BorderLineStyle,
    vertical_default: VerticalAlignment,
    default_background: Color,
}

impl Default for StyleMapper {
    fn default() -> Self {
        Self::from_options(&ConvertOptions::default())
    }
}

impl StyleMapper {
    pub fn from_options(options: &ConvertOptions) -> Self {
        Self {
            default_font_size: options.default_font_size,
            default_row_height: options.default_row_height,
            border_weight: options.border_weight,
            vertical_default: options.vertical_align_default,
            default_background: options.default_background_color().unwrap_or(Color::WHITE),
        }
    }

    /// Full cell descriptor: font, fill, border and alignment
    pub fn cell_style(&self, model: &StyleModel) -> Style {
        let size = if model.font_size_pt > 0.0 {
            model.font_size_pt
        } else {
            self.default_font_size
        };
        let fill_color =
            Color::from_hex(&model.background_color).unwrap_or(self.default_background);
        let border = if model.border_enabled {
            BorderStyle::all(self.border_weight, Color::BLACK)
        } else {
            BorderStyle::new()
        };

        Style {
            font: FontStyle::new().with_size(size).with_bold(model.bold),
            fill: FillStyle::solid(fill_color),
            border,
            alignment: self.alignment(model),
        }
    }

    /// Column descriptor: alignment only
    pub fn column_style(&self, model: &StyleModel) -> Style {
        self.cell_style(model).alignment_only()
    }

    fn alignment(&self, model: &StyleModel) -> Alignment {
        let horizontal = match &model.text_align {
            TextAlign::Left => HorizontalAlignment::Left,
            TextAlign::Right => HorizontalAlignment::Right,
            TextAlign::Center => HorizontalAlignment::Center,
            TextAlign::Justify => HorizontalAlignment::Justify,
            TextAlign::None | TextAlign::Other(_) => HorizontalAlignment::General,
        };
        let vertical = match model.vertical_align.as_str() {
            "top" | "text-top" => VerticalAlignment::Top,
            "middle" | "center" => VerticalAlignment::Center,
            "bottom" | "baseline" | "text-bottom" => VerticalAlignment::Bottom,
            _ => self.vertical_default,
        };
        Alignment::new()
            .with_horizontal(horizontal)
            .with_vertical(vertical)
            .with_wrap(model.word_wrap)
    }

    /// Register the cell descriptor of `model`
    ///
    /// Equal models get the same handle; models differing in any field get
    /// different handles.
    pub fn register(&self, doc: &mut LiveDocument, model: &StyleModel) -> StyleId {
        doc.register_model(model, self.cell_style(model))
    }

    /// Point a cell at a registered style
    ///
    /// A failed write is reported and the cell keeps its previous style.
    pub fn apply_cell(
        &self,
        doc: &mut LiveDocument,
        sheet: usize,
        row: u32,
        col: u16,
        handle: StyleId,
    ) -> Result<()> {
        if let Err(err) = doc.sheet_mut(sheet)?.set_cell_style_at(row, col, handle) {
            log::warn!("could not style cell ({}, {}): {}", row, col, err);
        }
        Ok(())
    }

    /// Set width and alignment style on a column, allocating it first
    /// when it does not exist yet
    pub fn apply_column(
        &self,
        doc: &mut LiveDocument,
        sheet: usize,
        col: u16,
        model: &StyleModel,
    ) -> Result<()> {
        let handle = doc.register_style(self.column_style(model));
        let worksheet = doc.sheet_mut(sheet)?;
        if worksheet.column(col).is_none() {
            worksheet.allocate_column(col)?;
        }
        let column = worksheet.column_mut(col)?;
        if model.width > 0.0 {
            column.width = Some(model.width);
        }
        column.style = Some(handle);
        Ok(())
    }

    /// Set a row's height, falling back to the default row height
    pub fn apply_row(
        &self,
        doc: &mut LiveDocument,
        sheet: usize,
        row: u32,
        model: &StyleModel,
    ) -> Result<()> {
        let height = if model.height > 0.0 {
            model.height
        } else {
            self.default_row_height
        };
        doc.sheet_mut(sheet)?.set_row_height(row, height)?;
        Ok(())
    }

    /// Merge `colspan` columns to the right of the anchor
    ///
    /// No-op for `colspan <= 1`. A range overlapping an existing merge is
    /// reported and skipped.
    pub fn merge(
        &self,
        doc: &mut LiveDocument,
        sheet: usize,
        row: u32,
        col: u16,
        colspan: u32,
    ) -> Result<()> {
        if colspan <= 1 {
            return Ok(());
        }
        let span = u16::try_from(colspan - 1).unwrap_or(u16::MAX);
        let end_col = col.saturating_add(span).min(MAX_COLS - 1);
        if end_col == col {
            return Ok(());
        }
        let range = CellRange::spanning(row, col, row, end_col);
        match doc.sheet_mut(sheet)?.merge_cells(&range) {
            Ok(()) => Ok(()),
            Err(CoreError::MergeOverlap(range)) => {
                log::warn!("skipping merge {} overlapping an existing merged range", range);
                Ok(())
            }
            Err(err) => Err(err.into()),
        }
    }
}
