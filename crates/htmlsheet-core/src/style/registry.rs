//! Workbook-wide style registry

use super::Style;
use crate::error::{Error, Result};

/// Handle to a style registered in a [`StyleRegistry`]
///
/// Index 0 always refers to the default style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct StyleId(pub u32);

impl StyleId {
    /// The default style
    pub const DEFAULT: StyleId = StyleId(0);

    /// Position of this style in the registry
    pub fn index(self) -> u32 {
        self.0
    }
}

/// Append-only store of styles owned by a workbook
///
/// Registering never looks for an existing equal style; callers that want
/// deduplication keep their own cache keyed on the style.
#[derive(Debug, Clone)]
pub struct StyleRegistry {
    /// All registered styles (index 0 is default)
    styles: Vec<Style>,
}

impl StyleRegistry {
    /// Create a registry holding only the default style
    pub fn new() -> Self {
        let mut styles = Vec::with_capacity(64);
        styles.push(Style::default());
        Self { styles }
    }

    /// Rebuild a registry from styles in handle order
    ///
    /// An empty list yields a registry with just the default style.
    pub fn from_styles(styles: Vec<Style>) -> Self {
        if styles.is_empty() {
            return Self::new();
        }
        Self { styles }
    }

    /// Register a style and return its handle
    pub fn register(&mut self, style: Style) -> StyleId {
        let id = StyleId(self.styles.len() as u32);
        self.styles.push(style);
        id
    }

    /// Get a style by handle
    pub fn get(&self, id: StyleId) -> Option<&Style> {
        self.styles.get(id.0 as usize)
    }

    /// Get a style by handle, failing for handles this registry never issued
    pub fn resolve(&self, id: StyleId) -> Result<&Style> {
        self.get(id).ok_or(Error::UnknownStyle(id.0))
    }

    /// Number of styles, default included
    pub fn len(&self) -> usize {
        self.styles.len()
    }

    /// True when only the default style is present
    pub fn is_empty(&self) -> bool {
        self.styles.len() <= 1
    }

    /// Iterate over all styles with their handles
    pub fn iter(&self) -> impl Iterator<Item = (StyleId, &Style)> {
        self.styles
            .iter()
            .enumerate()
            .map(|(i, s)| (StyleId(i as u32), s))
    }
}

impl Default for StyleRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_style() {
        let registry = StyleRegistry::new();
        assert_eq!(registry.len(), 1);
        assert!(registry.is_empty());
        assert_eq!(registry.get(StyleId::DEFAULT), Some(&Style::default()));
    }

    #[test]
    fn test_register_appends() {
        let mut registry = StyleRegistry::new();
        let a = registry.register(Style::new().bold(true));
        let b = registry.register(Style::new().bold(true));

        assert_eq!(a, StyleId(1));
        assert_eq!(b, StyleId(2));
        assert_eq!(registry.len(), 3);
    }

    #[test]
    fn test_resolve_unknown() {
        let registry = StyleRegistry::new();
        assert!(matches!(
            registry.resolve(StyleId(7)),
            Err(Error::UnknownStyle(7))
        ));
    }
}
