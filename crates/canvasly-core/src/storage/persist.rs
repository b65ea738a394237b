//! Save-on-change and load-at-start for the canvas store.
//!
//! The durable subset is the canvas snapshot plus the active tool, written
//! as one flat JSON object under a fixed key.

use crate::config::DEFAULT_TOOL;
use crate::state::CanvasState;
use crate::storage::{KeyValueStore, StorageResult};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

fn default_tool() -> String {
    DEFAULT_TOOL.to_string()
}

/// The persisted form of the store:
/// `{ elements, selectedElementId, history, historyIndex, activeTool }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedCanvas {
    #[serde(flatten)]
    pub canvas: CanvasState,
    #[serde(default = "default_tool")]
    pub active_tool: String,
}

impl Default for PersistedCanvas {
    fn default() -> Self {
        Self {
            canvas: CanvasState::default(),
            active_tool: default_tool(),
        }
    }
}

/// Borrowed twin of [`PersistedCanvas`] so saving doesn't clone the state.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PersistedCanvasRef<'a> {
    #[serde(flatten)]
    canvas: &'a CanvasState,
    active_tool: &'a str,
}

/// Reads and writes the store's durable state through a [`KeyValueStore`].
pub struct CanvasPersistence<S: KeyValueStore> {
    /// Storage backend.
    storage: Arc<S>,
    /// Key the canvas lives under.
    key: String,
    /// Writes that failed since construction.
    failed_writes: usize,
}

impl<S: KeyValueStore> CanvasPersistence<S> {
    /// Create a persistence hook writing under `key`.
    pub fn new(storage: Arc<S>, key: impl Into<String>) -> Self {
        Self {
            storage,
            key: key.into(),
            failed_writes: 0,
        }
    }

    /// Read the persisted canvas, if any.
    pub fn load(&self) -> StorageResult<Option<PersistedCanvas>> {
        match self.storage.get(&self.key)? {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    /// Write the canvas and active tool.
    pub fn save(&self, canvas: &CanvasState, active_tool: &str) -> StorageResult<()> {
        let json = serde_json::to_string(&PersistedCanvasRef {
            canvas,
            active_tool,
        })?;
        self.storage.set(&self.key, &json)
    }

    /// Write the canvas, logging instead of returning a failure.
    ///
    /// Returns true if the write succeeded.
    pub fn save_or_log(&mut self, canvas: &CanvasState, active_tool: &str) -> bool {
        match self.save(canvas, active_tool) {
            Ok(()) => true,
            Err(e) => {
                self.failed_writes += 1;
                log::warn!("Failed to persist canvas under '{}': {}", self.key, e);
                false
            }
        }
    }

    /// Delete the persisted canvas.
    pub fn clear(&self) -> StorageResult<()> {
        self.storage.remove(&self.key)
    }

    /// Number of writes that failed since construction.
    pub fn failed_writes(&self) -> usize {
        self.failed_writes
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Get a reference to the storage backend.
    pub fn storage(&self) -> &Arc<S> {
        &self.storage
    }
}
