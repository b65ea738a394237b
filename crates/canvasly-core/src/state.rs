//! Canvas snapshot and the read-only view handed to collaborators.

use crate::element::{dedupe_by_id, CanvasElement, ElementId};
use crate::history::{History, HistoryEntry};
use serde::{Deserialize, Serialize};

/// The authoritative canvas snapshot: elements in paint order (back to
/// front), the selection id and the undo history.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanvasState {
    #[serde(default)]
    pub elements: Vec<CanvasElement>,
    // Omitted when nothing is selected; a missing key reads back as none.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_element_id: Option<ElementId>,
    #[serde(flatten)]
    pub history: History,
}

impl CanvasState {
    /// Create an empty canvas.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get an element by id.
    pub fn element(&self, id: &str) -> Option<&CanvasElement> {
        self.elements.iter().find(|element| element.id == id)
    }

    /// Position of an element in paint order.
    pub fn position(&self, id: &str) -> Option<usize> {
        self.elements.iter().position(|element| element.id == id)
    }

    /// The selected element, resolved from the selection id.
    pub fn selected_element(&self) -> Option<&CanvasElement> {
        self.selected_element_id
            .as_deref()
            .and_then(|id| self.element(id))
    }

    /// Check if the canvas has no elements.
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Copy the element list and selection into a history entry.
    pub fn snapshot(&self) -> HistoryEntry {
        HistoryEntry {
            elements: self.elements.clone(),
            selected_element_id: self.selected_element_id.clone(),
        }
    }

    /// Replace the element list and selection with a history entry.
    pub fn restore(&mut self, entry: HistoryEntry) {
        self.elements = entry.elements;
        self.selected_element_id = entry.selected_element_id;
    }

    /// Repair a snapshot that came from outside the store.
    ///
    /// Keeps the first element for each id, drops a selection pointing at no
    /// element, and clamps the history cursor. Returns true if anything
    /// changed.
    pub fn normalize(&mut self) -> bool {
        let mut changed = false;

        let dropped = dedupe_by_id(&mut self.elements);
        if dropped > 0 {
            log::warn!("Dropped {} element(s) with duplicate ids", dropped);
            changed = true;
        }

        if self.selected_element_id.is_some() && self.selected_element().is_none() {
            self.selected_element_id = None;
            changed = true;
        }

        self.history.normalize() || changed
    }
}

/// Read-only snapshot of the store, passed to observers and views.
#[derive(Debug, Clone, Copy)]
pub struct CanvasView<'a> {
    /// Elements in paint order (back to front).
    pub elements: &'a [CanvasElement],
    pub selected_element: Option<&'a CanvasElement>,
    pub can_undo: bool,
    pub can_redo: bool,
    pub active_tool: &'a str,
}

impl<'a> CanvasView<'a> {
    pub fn new(state: &'a CanvasState, active_tool: &'a str) -> Self {
        Self {
            elements: &state.elements,
            selected_element: state.selected_element(),
            can_undo: state.history.can_undo(),
            can_redo: state.history.can_redo(),
            active_tool,
        }
    }

    /// Element ids in paint order.
    pub fn element_ids(&self) -> Vec<&'a str> {
        self.elements.iter().map(|element| element.id.as_str()).collect()
    }
}
