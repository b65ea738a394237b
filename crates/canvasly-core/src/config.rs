//! Store configuration.

use kurbo::Vec2;

/// Storage key the canvas is persisted under.
pub const DEFAULT_STORAGE_KEY: &str = "canvas-storage";

/// Tool active on a fresh canvas.
pub const DEFAULT_TOOL: &str = "select";

/// Offset applied to both axes when duplicating an element.
pub const DUPLICATE_OFFSET: f64 = 20.0;

/// Maximum number of history entries kept by default.
pub const MAX_UNDO_HISTORY: usize = 50;

/// Tunables for [`CanvasStore`](crate::CanvasStore).
#[derive(Debug, Clone, PartialEq)]
pub struct StoreConfig {
    /// Key used for the persisted canvas.
    pub storage_key: String,
    /// Shift applied to duplicated elements.
    pub duplicate_offset: Vec2,
    /// Maximum number of history entries kept; `None` keeps everything.
    pub max_history: Option<usize>,
    /// Tool used when nothing was persisted.
    pub default_tool: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            duplicate_offset: Vec2::new(DUPLICATE_OFFSET, DUPLICATE_OFFSET),
            max_history: Some(MAX_UNDO_HISTORY),
            default_tool: DEFAULT_TOOL.to_string(),
        }
    }
}

impl StoreConfig {
    pub fn with_storage_key(mut self, key: impl Into<String>) -> Self {
        self.storage_key = key.into();
        self
    }

    pub fn with_duplicate_offset(mut self, offset: Vec2) -> Self {
        self.duplicate_offset = offset;
        self
    }

    pub fn with_max_history(mut self, max_history: usize) -> Self {
        self.max_history = Some(max_history);
        self
    }

    /// Keep every history entry.
    pub fn with_unbounded_history(mut self) -> Self {
        self.max_history = None;
        self
    }

    pub fn with_default_tool(mut self, tool: impl Into<String>) -> Self {
        self.default_tool = tool.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_history_is_capped() {
        assert_eq!(StoreConfig::default().max_history, Some(MAX_UNDO_HISTORY));
        assert_eq!(StoreConfig::default().with_unbounded_history().max_history, None);
    }
}
