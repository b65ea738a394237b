//! The canvas edit store.
//!
//! Owns the element list, selection, undo history and active tool. Every
//! command is applied synchronously; after each committed change the
//! durable state is written to storage and observers are notified.
//! Commands on unknown ids are silent no-ops.

use crate::config::StoreConfig;
use crate::element::{new_element_id, CanvasElement, ElementId, ElementPatch};
use crate::state::{CanvasState, CanvasView};
use crate::storage::{CanvasPersistence, KeyValueStore};
use kurbo::Point;
use std::fmt;
use std::sync::Arc;

/// Handle returned by [`CanvasStore::subscribe`].
pub type SubscriptionId = u64;

type Listener = Box<dyn FnMut(&CanvasView<'_>)>;

/// Canvas editing state with linear undo/redo and persistence.
pub struct CanvasStore<S: KeyValueStore> {
    state: CanvasState,
    active_tool: String,
    config: StoreConfig,
    persistence: CanvasPersistence<S>,
    listeners: Vec<(SubscriptionId, Listener)>,
    next_subscription: SubscriptionId,
}

impl<S: KeyValueStore> fmt::Debug for CanvasStore<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CanvasStore")
            .field("state", &self.state)
            .field("active_tool", &self.active_tool)
            .field("config", &self.config)
            .field("listeners", &format!("<{} listeners>", self.listeners.len()))
            .finish()
    }
}

impl<S: KeyValueStore> CanvasStore<S> {
    /// Open the store with the default configuration.
    pub fn new(storage: Arc<S>) -> Self {
        Self::with_config(storage, StoreConfig::default())
    }

    /// Open the store, restoring whatever was persisted under the
    /// configured key. Missing or unreadable data starts an empty canvas.
    pub fn with_config(storage: Arc<S>, config: StoreConfig) -> Self {
        let persistence = CanvasPersistence::new(storage, config.storage_key.clone());

        let (state, active_tool) = match persistence.load() {
            Ok(Some(persisted)) => {
                let mut state = persisted.canvas;
                state.normalize();
                log::info!(
                    "Restored canvas from '{}': {} element(s), {} history entries",
                    persistence.key(),
                    state.elements.len(),
                    state.history.len()
                );
                (state, persisted.active_tool)
            }
            Ok(None) => {
                log::debug!("No canvas under '{}', starting empty", persistence.key());
                (CanvasState::new(), config.default_tool.clone())
            }
            Err(e) => {
                log::warn!(
                    "Failed to restore canvas from '{}', starting empty: {}",
                    persistence.key(),
                    e
                );
                (CanvasState::new(), config.default_tool.clone())
            }
        };

        Self {
            state,
            active_tool,
            config,
            persistence,
            listeners: Vec::new(),
            next_subscription: 0,
        }
    }

    // --- Reads ---

    /// Elements in paint order (back to front).
    pub fn elements(&self) -> &[CanvasElement] {
        &self.state.elements
    }

    /// Get an element by id.
    pub fn element(&self, id: &str) -> Option<&CanvasElement> {
        self.state.element(id)
    }

    pub fn selected_element(&self) -> Option<&CanvasElement> {
        self.state.selected_element()
    }

    pub fn selected_element_id(&self) -> Option<&str> {
        self.state.selected_element_id.as_deref()
    }

    /// Check if undo is available.
    pub fn can_undo(&self) -> bool {
        self.state.history.can_undo()
    }

    /// Check if redo is available.
    pub fn can_redo(&self) -> bool {
        self.state.history.can_redo()
    }

    pub fn active_tool(&self) -> &str {
        &self.active_tool
    }

    /// The full snapshot, including history.
    pub fn canvas_state(&self) -> &CanvasState {
        &self.state
    }

    /// Read-only view of the current state.
    pub fn view(&self) -> CanvasView<'_> {
        CanvasView::new(&self.state, &self.active_tool)
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Number of storage writes that failed since the store was opened.
    pub fn failed_writes(&self) -> usize {
        self.persistence.failed_writes()
    }

    /// Get a reference to the storage backend.
    pub fn storage(&self) -> &Arc<S> {
        self.persistence.storage()
    }

    /// Ids of elements under a point, front to back.
    pub fn elements_at_point(&self, point: Point, tolerance: f64) -> Vec<&str> {
        self.state
            .elements
            .iter()
            .rev()
            .filter(|element| element.hit_test(point, tolerance))
            .map(|element| element.id.as_str())
            .collect()
    }

    /// The topmost element under a point.
    pub fn element_at(&self, point: Point, tolerance: f64) -> Option<&CanvasElement> {
        self.state
            .elements
            .iter()
            .rev()
            .find(|element| element.hit_test(point, tolerance))
    }

    // --- Element commands ---

    /// Append an element on top and select it.
    ///
    /// An element whose id is already on the canvas is ignored.
    pub fn add_element(&mut self, element: CanvasElement) -> bool {
        if self.state.element(&element.id).is_some() {
            log::warn!("Ignoring add of element with duplicate id '{}'", element.id);
            return false;
        }

        log::debug!("Adding {} element '{}'", element.kind.as_str(), element.id);
        self.begin_change();
        self.state.selected_element_id = Some(element.id.clone());
        self.state.elements.push(element);
        self.commit_change();
        true
    }

    /// Merge `patch` into the element with `id`.
    pub fn update_element(&mut self, id: &str, patch: &ElementPatch) -> bool {
        let Some(index) = self.state.position(id) else {
            log::debug!("Ignoring update of unknown element '{}'", id);
            return false;
        };

        self.begin_change();
        patch.apply_to(&mut self.state.elements[index]);
        self.commit_change();
        true
    }

    /// Remove the element with `id`. The selection is always cleared.
    pub fn delete_element(&mut self, id: &str) -> bool {
        let Some(index) = self.state.position(id) else {
            log::debug!("Ignoring delete of unknown element '{}'", id);
            return false;
        };

        self.begin_change();
        self.state.elements.remove(index);
        self.state.selected_element_id = None;
        self.commit_change();
        true
    }

    /// Copy the element with `id` under a fresh id, shifted by the
    /// configured offset, on top of the stack. The copy becomes selected.
    ///
    /// Returns the new element's id.
    pub fn duplicate_element(&mut self, id: &str) -> Option<ElementId> {
        let Some(original) = self.state.element(id) else {
            log::debug!("Ignoring duplicate of unknown element '{}'", id);
            return None;
        };

        let mut new_id = new_element_id();
        while self.state.element(&new_id).is_some() {
            new_id = new_element_id();
        }
        let copy = original.duplicate(new_id.clone(), self.config.duplicate_offset);

        log::debug!("Duplicating element '{}' as '{}'", id, new_id);
        self.begin_change();
        self.state.elements.push(copy);
        self.state.selected_element_id = Some(new_id.clone());
        self.commit_change();
        Some(new_id)
    }

    // --- Selection ---

    /// Select an element, or clear the selection with `None`.
    /// An element that is not on the canvas clears the selection.
    pub fn select_element(&mut self, element: Option<&CanvasElement>) {
        match element {
            Some(element) => {
                self.select_element_by_id(&element.id);
            }
            None => self.clear_selection(),
        }
    }

    /// Select the element with `id`. An unknown id clears the selection.
    pub fn select_element_by_id(&mut self, id: &str) -> bool {
        let found = self.state.element(id).is_some();
        self.state.selected_element_id = found.then(|| id.to_string());
        self.changed();
        found
    }

    pub fn clear_selection(&mut self) {
        self.state.selected_element_id = None;
        self.changed();
    }

    // --- Layer order ---

    /// Bring an element to the front (topmost).
    pub fn move_element_to_front(&mut self, id: &str) -> bool {
        let Some(index) = self.state.position(id) else {
            return false;
        };
        if index + 1 == self.state.elements.len() {
            return false;
        }

        self.begin_change();
        let element = self.state.elements.remove(index);
        self.state.elements.push(element);
        self.commit_change();
        true
    }

    /// Send an element to the back (bottommost).
    pub fn move_element_to_back(&mut self, id: &str) -> bool {
        let Some(index) = self.state.position(id) else {
            return false;
        };
        if index == 0 {
            return false;
        }

        self.begin_change();
        let element = self.state.elements.remove(index);
        self.state.elements.insert(0, element);
        self.commit_change();
        true
    }

    /// Move an element one layer towards the front.
    /// Returns false if it was already at the front.
    pub fn move_element_up(&mut self, id: &str) -> bool {
        match self.state.position(id) {
            Some(index) if index + 1 < self.state.elements.len() => {
                self.begin_change();
                self.state.elements.swap(index, index + 1);
                self.commit_change();
                true
            }
            _ => false,
        }
    }

    /// Move an element one layer towards the back.
    /// Returns false if it was already at the back.
    pub fn move_element_down(&mut self, id: &str) -> bool {
        match self.state.position(id) {
            Some(index) if index > 0 => {
                self.begin_change();
                self.state.elements.swap(index, index - 1);
                self.commit_change();
                true
            }
            _ => false,
        }
    }

    // --- History ---

    /// Undo the last change.
    /// Returns true if undo was performed, false if nothing to undo.
    pub fn undo(&mut self) -> bool {
        let Some(entry) = self.state.history.undo().cloned() else {
            return false;
        };
        self.state.restore(entry);
        self.changed();
        true
    }

    /// Redo the last undone change.
    /// Returns true if redo was performed, false if nothing to redo.
    pub fn redo(&mut self) -> bool {
        let Some(entry) = self.state.history.redo().cloned() else {
            return false;
        };
        self.state.restore(entry);
        self.changed();
        true
    }

    // --- Canvas ---

    pub fn set_active_tool(&mut self, tool: impl Into<String>) {
        self.active_tool = tool.into();
        log::debug!("Active tool is now '{}'", self.active_tool);
        self.changed();
    }

    /// Reset elements, selection and history. Cannot be undone.
    pub fn clear_canvas(&mut self) {
        log::debug!("Clearing canvas");
        self.state = CanvasState::new();
        self.changed();
    }

    /// Replace the whole snapshot, e.g. when opening a project.
    pub fn set_canvas_state(&mut self, mut state: CanvasState) {
        if state.normalize() {
            log::warn!("Canvas state needed repair before it could be adopted");
        }
        self.state = state;
        self.changed();
    }

    // --- Observers ---

    /// Register a callback run after every committed change.
    pub fn subscribe<F>(&mut self, listener: F) -> SubscriptionId
    where
        F: FnMut(&CanvasView<'_>) + 'static,
    {
        let id = self.next_subscription;
        self.next_subscription += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Remove a callback. Returns false if it was not registered.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(listener_id, _)| *listener_id != id);
        self.listeners.len() != before
    }

    // --- Internals ---

    /// Seed the history with the current state so the first change can be
    /// undone. Call before mutating the element list.
    fn begin_change(&mut self) {
        if self.state.history.is_empty() {
            let base = self.state.snapshot();
            self.state.history.seed(base);
        }
    }

    /// Record the mutated element list as a new history entry.
    fn commit_change(&mut self) {
        let entry = self.state.snapshot();
        self.state.history.record(entry, self.config.max_history);
        self.changed();
    }

    fn changed(&mut self) {
        self.persistence.save_or_log(&self.state, &self.active_tool);
        self.notify();
    }

    fn notify(&mut self) {
        if self.listeners.is_empty() {
            return;
        }
        let view = CanvasView::new(&self.state, &self.active_tool);
        for (_, listener) in &mut self.listeners {
            listener(&view);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MAX_UNDO_HISTORY;
    use crate::element::ElementKind;
    use crate::history::{History, HistoryEntry};
    use crate::storage::MemoryStorage;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn store() -> CanvasStore<MemoryStorage> {
        CanvasStore::new(Arc::new(MemoryStorage::new()))
    }

    fn rect(id: &str, left: f64, top: f64) -> CanvasElement {
        CanvasElement::new(id, ElementKind::Rect, left, top).with_size(10.0, 10.0)
    }

    fn ids<S: KeyValueStore>(store: &CanvasStore<S>) -> Vec<&str> {
        store.elements().iter().map(|e| e.id.as_str()).collect()
    }

    #[test]
    fn test_store_starts_empty() {
        let store = store();
        assert!(store.elements().is_empty());
        assert!(store.selected_element().is_none());
        assert!(!store.can_undo());
        assert!(!store.can_redo());
        assert_eq!(store.active_tool(), "select");
    }

    #[test]
    fn test_add_selects_and_enables_undo() {
        let mut store = store();
        assert!(store.add_element(rect("1", 0.0, 0.0)));

        assert_eq!(store.selected_element_id(), Some("1"));
        assert!(store.can_undo());
        assert!(!store.can_redo());
    }

    #[test]
    fn test_add_duplicate_id_is_ignored() {
        let mut store = store();
        store.add_element(rect("1", 0.0, 0.0));
        let history_len = store.canvas_state().history.len();

        assert!(!store.add_element(rect("1", 50.0, 50.0)));
        assert_eq!(store.elements().len(), 1);
        assert_eq!(store.element("1").unwrap().left, 0.0);
        assert_eq!(store.canvas_state().history.len(), history_len);
    }

    #[test]
    fn test_undo_add() {
        let mut store = store();
        store.add_element(rect("1", 0.0, 0.0));

        assert!(store.undo());
        assert!(store.elements().is_empty());
        assert!(store.selected_element().is_none());
        assert!(store.can_redo());
        assert!(!store.can_undo());

        assert!(store.redo());
        assert_eq!(ids(&store), vec!["1"]);
        assert_eq!(store.selected_element_id(), Some("1"));
    }

    #[test]
    fn test_update_reflects_in_selection() {
        let mut store = store();
        store.add_element(rect("1", 0.0, 0.0));

        assert!(store.update_element("1", &ElementPatch::position(5.0, 6.0)));
        let selected = store.selected_element().unwrap();
        assert_eq!((selected.left, selected.top), (5.0, 6.0));
    }

    #[test]
    fn test_update_unknown_is_noop() {
        let mut store = store();
        store.add_element(rect("1", 0.0, 0.0));
        let before = store.canvas_state().clone();

        assert!(!store.update_element("nope", &ElementPatch::position(5.0, 6.0)));
        assert_eq!(store.canvas_state(), &before);
    }

    #[test]
    fn test_delete_clears_selection() {
        let mut store = store();
        store.add_element(rect("1", 0.0, 0.0));
        store.add_element(rect("2", 0.0, 0.0));
        assert_eq!(store.selected_element_id(), Some("2"));

        assert!(store.delete_element("1"));
        assert_eq!(ids(&store), vec!["2"]);
        assert_eq!(store.selected_element_id(), None);

        assert!(store.undo());
        assert_eq!(store.selected_element_id(), Some("2"));
    }

    #[test]
    fn test_duplicate_unknown_is_noop() {
        let mut store = store();
        assert_eq!(store.duplicate_element("missing"), None);
        assert!(!store.can_undo());
    }

    #[test]
    fn test_duplicate_uses_configured_offset() {
        let config = StoreConfig::default().with_duplicate_offset(kurbo::Vec2::new(5.0, -5.0));
        let mut store = CanvasStore::with_config(Arc::new(MemoryStorage::new()), config);
        store.add_element(rect("1", 10.0, 10.0));

        let copy_id = store.duplicate_element("1").unwrap();
        let copy = store.element(&copy_id).unwrap();
        assert_eq!((copy.left, copy.top), (15.0, 5.0));
    }

    #[test]
    fn test_reorder_noops_do_not_record_history() {
        let mut store = store();
        store.add_element(rect("1", 0.0, 0.0));
        store.add_element(rect("2", 0.0, 0.0));
        let history_len = store.canvas_state().history.len();

        assert!(!store.move_element_to_front("2"));
        assert!(!store.move_element_to_back("1"));
        assert!(!store.move_element_up("2"));
        assert!(!store.move_element_down("1"));
        assert!(!store.move_element_up("missing"));
        assert_eq!(store.canvas_state().history.len(), history_len);
    }

    #[test]
    fn test_reorder_single_steps() {
        let mut store = store();
        for id in ["a", "b", "c"] {
            store.add_element(rect(id, 0.0, 0.0));
        }

        assert!(store.move_element_up("a"));
        assert_eq!(ids(&store), vec!["b", "a", "c"]);
        assert!(store.move_element_down("c"));
        assert_eq!(ids(&store), vec!["b", "c", "a"]);
        assert!(store.move_element_to_front("b"));
        assert_eq!(ids(&store), vec!["c", "a", "b"]);
    }

    #[test]
    fn test_tool_change_is_not_history() {
        let mut store = store();
        store.set_active_tool("text");

        assert_eq!(store.active_tool(), "text");
        assert!(store.canvas_state().history.is_empty());
    }

    #[test]
    fn test_clear_canvas_resets_history() {
        let mut store = store();
        store.add_element(rect("1", 0.0, 0.0));
        store.set_active_tool("rect");

        store.clear_canvas();

        assert!(store.elements().is_empty());
        assert!(store.canvas_state().history.is_empty());
        assert!(!store.can_undo());
        assert!(!store.can_redo());
        assert_eq!(store.active_tool(), "rect");
    }

    #[test]
    fn test_max_history() {
        let config = StoreConfig::default().with_max_history(3);
        let mut store = CanvasStore::with_config(Arc::new(MemoryStorage::new()), config);
        for id in ["a", "b", "c", "d"] {
            store.add_element(rect(id, 0.0, 0.0));
        }

        assert!(store.undo());
        assert!(store.undo());
        assert!(!store.undo());
        assert_eq!(ids(&store), vec!["a", "b"]);
    }

    #[test]
    fn test_select_by_id() {
        let mut store = store();
        store.add_element(rect("1", 0.0, 0.0));
        store.add_element(rect("2", 0.0, 0.0));

        assert!(store.select_element_by_id("1"));
        assert_eq!(store.selected_element_id(), Some("1"));

        assert!(!store.select_element_by_id("missing"));
        assert_eq!(store.selected_element_id(), None);
    }

    #[test]
    fn test_elements_at_point_front_to_back() {
        let mut store = store();
        store.add_element(rect("back", 0.0, 0.0));
        store.add_element(rect("front", 5.0, 5.0));

        assert_eq!(store.elements_at_point(Point::new(7.0, 7.0), 0.0), vec!["front", "back"]);
        assert_eq!(store.elements_at_point(Point::new(2.0, 2.0), 0.0), vec!["back"]);
        assert_eq!(store.element_at(Point::new(7.0, 7.0), 0.0).map(|e| e.id.as_str()), Some("front"));
        assert!(store.element_at(Point::new(100.0, 100.0), 0.0).is_none());
    }

    #[test]
    fn test_subscribe_and_unsubscribe() {
        let mut store = store();
        let seen = Rc::new(RefCell::new(Vec::new()));

        let sink = seen.clone();
        let id = store.subscribe(move |view| {
            sink.borrow_mut().push((view.element_ids().len(), view.can_undo, view.active_tool.to_string()));
        });

        store.add_element(rect("1", 0.0, 0.0));
        store.set_active_tool("text");
        assert!(store.unsubscribe(id));
        store.add_element(rect("2", 0.0, 0.0));

        assert_eq!(
            *seen.borrow(),
            vec![(1, true, "select".to_string()), (1, true, "text".to_string())]
        );
        assert!(!store.unsubscribe(id));
    }

    #[test]
    fn test_set_canvas_state_repairs_input() {
        let mut store = store();
        let mut state = CanvasState::new();
        state.elements = vec![rect("a", 0.0, 0.0), rect("a", 1.0, 1.0)];
        state.selected_element_id = Some("ghost".to_string());

        store.set_canvas_state(state);

        assert_eq!(ids(&store), vec!["a"]);
        assert_eq!(store.selected_element_id(), None);
    }

    #[test]
    fn test_undo_into_repaired_history_entry() {
        let mut store = store();
        let mut state = CanvasState::new();
        state.elements = vec![rect("a", 0.0, 0.0)];
        state.history = History::from_parts(
            vec![
                HistoryEntry {
                    elements: vec![rect("a", 0.0, 0.0), rect("a", 9.0, 9.0)],
                    selected_element_id: Some("ghost".to_string()),
                },
                HistoryEntry {
                    elements: vec![rect("a", 0.0, 0.0)],
                    selected_element_id: None,
                },
            ],
            Some(1),
        );

        store.set_canvas_state(state);
        assert!(store.undo());

        assert_eq!(ids(&store), vec!["a"]);
        assert_eq!(store.selected_element_id(), None);
    }

    #[test]
    fn test_default_history_cap() {
        let mut store = store();
        store.add_element(rect("1", 0.0, 0.0));
        for step in 0..200 {
            store.update_element("1", &ElementPatch::position(step as f64, 0.0));
        }

        assert_eq!(store.canvas_state().history.len(), MAX_UNDO_HISTORY);
        let mut undos = 0;
        while store.undo() {
            undos += 1;
        }
        assert_eq!(undos, MAX_UNDO_HISTORY - 1);
    }

    #[test]
    fn test_select_element_not_on_canvas() {
        let mut store = store();
        store.add_element(rect("1", 0.0, 0.0));

        store.select_element(Some(&rect("ghost", 0.0, 0.0)));

        assert_eq!(store.selected_element_id(), None);
        assert!(store.selected_element().is_none());
    }
}
