//! Linear undo/redo history.
//!
//! Entries are flat snapshots of the element list and selection; they never
//! carry history of their own. Recording a new entry after undoing discards
//! everything past the cursor.

use crate::element::{dedupe_by_id, CanvasElement, ElementId};
use serde::{Deserialize, Serialize};

/// A point-in-time copy of the element list and selection.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    #[serde(default)]
    pub elements: Vec<CanvasElement>,
    // Omitted when nothing is selected; a missing key reads back as none.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_element_id: Option<ElementId>,
}

impl HistoryEntry {
    /// Keep the first element for each id and drop a selection pointing at
    /// no element. Returns true if anything changed.
    pub fn normalize(&mut self) -> bool {
        let dropped = dedupe_by_id(&mut self.elements);

        let elements = &self.elements;
        let dangling = self
            .selected_element_id
            .as_deref()
            .is_some_and(|id| !elements.iter().any(|element| element.id == id));
        if dangling {
            self.selected_element_id = None;
        }

        dropped > 0 || dangling
    }
}

/// Ordered snapshots plus a cursor pointing at the current one.
///
/// Serializes as `history` / `historyIndex`, with `-1` for "no entry".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct History {
    #[serde(rename = "history", default)]
    entries: Vec<HistoryEntry>,
    #[serde(rename = "historyIndex", default, with = "history_index")]
    cursor: Option<usize>,
}

impl History {
    /// Create an empty history.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a history from raw parts, clamping the cursor into range.
    pub fn from_parts(entries: Vec<HistoryEntry>, cursor: Option<usize>) -> Self {
        let mut history = Self { entries, cursor };
        history.normalize();
        history
    }

    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    /// Index of the current entry.
    pub fn cursor(&self) -> Option<usize> {
        self.cursor
    }

    /// The entry the cursor points at.
    pub fn current(&self) -> Option<&HistoryEntry> {
        self.cursor.and_then(|index| self.entries.get(index))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Check if an earlier entry exists.
    pub fn can_undo(&self) -> bool {
        self.cursor.is_some_and(|index| index > 0)
    }

    /// Check if a later entry exists.
    pub fn can_redo(&self) -> bool {
        self.next_index() < self.entries.len()
    }

    fn next_index(&self) -> usize {
        self.cursor.map_or(0, |index| index + 1)
    }

    /// Record the state a first change departs from. Does nothing unless
    /// the history is empty.
    pub fn seed(&mut self, base: HistoryEntry) {
        if self.entries.is_empty() {
            self.entries.push(base);
            self.cursor = Some(0);
        }
    }

    /// Append an entry after the cursor, discarding any redo branch.
    ///
    /// With a `limit`, the oldest entries are dropped so at most `limit`
    /// remain.
    pub fn record(&mut self, entry: HistoryEntry, limit: Option<usize>) {
        self.entries.truncate(self.next_index());
        self.entries.push(entry);

        if let Some(limit) = limit {
            let limit = limit.max(1);
            if self.entries.len() > limit {
                let excess = self.entries.len() - limit;
                self.entries.drain(..excess);
            }
        }

        self.cursor = Some(self.entries.len() - 1);
    }

    /// Step back one entry. Returns the entry to restore.
    pub fn undo(&mut self) -> Option<&HistoryEntry> {
        let index = self.cursor.filter(|&index| index > 0)? - 1;
        self.cursor = Some(index);
        self.entries.get(index)
    }

    /// Step forward one entry. Returns the entry to restore.
    pub fn redo(&mut self) -> Option<&HistoryEntry> {
        let index = self.next_index();
        if index >= self.entries.len() {
            return None;
        }
        self.cursor = Some(index);
        self.entries.get(index)
    }

    /// Drop all entries.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.cursor = None;
    }

    /// Repair every entry and pull an out-of-range cursor back onto the
    /// last entry. Returns true if anything changed.
    pub fn normalize(&mut self) -> bool {
        let repaired = self
            .entries
            .iter_mut()
            .map(HistoryEntry::normalize)
            .filter(|&changed| changed)
            .count();
        if repaired > 0 {
            log::warn!("Repaired {} history entries", repaired);
        }

        let cursor = self.cursor;
        if self.entries.is_empty() {
            self.cursor = None;
        } else if let Some(index) = self.cursor {
            self.cursor = Some(index.min(self.entries.len() - 1));
        }

        repaired > 0 || cursor != self.cursor
    }
}

/// Maps `Option<usize>` to a signed index where `-1` means none.
mod history_index {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(cursor: &Option<usize>, serializer: S) -> Result<S::Ok, S::Error> {
        match cursor {
            Some(index) => serializer.serialize_i64(*index as i64),
            None => serializer.serialize_i64(-1),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<usize>, D::Error> {
        let index = i64::deserialize(deserializer)?;
        Ok(usize::try_from(index).ok())
    }
}
