//! Undo/redo history for pixel and layer-structure edits.
//!
//! Pixel edits are recorded as [`Diff`]s holding literal before/after values,
//! so replay never depends on the current state. Structural edits record full
//! before/after copies of the layer list (cheap, buffers are shared until
//! written).
//!
//! Paint calls made between [`History::begin_stroke`] and
//! [`History::end_stroke`] coalesce per cell into one entry.

use std::collections::VecDeque;

use ordermap::OrderMap;

use crate::color::Color;
use crate::error::EngineError;
use crate::raster::{Layer, LayerId, LayerStore};

/// Default bound on the undo stack.
pub const DEFAULT_CAPACITY: usize = 100;

/// A single-cell color change on one layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diff {
    pub layer: LayerId,
    pub row: usize,
    pub col: usize,
    pub prev: Color,
    pub next: Color,
}

type CellKey = (LayerId, usize, usize);

/// Diffs from one continuous paint gesture, keyed by cell.
///
/// Repeated writes to a cell keep the first `prev` and the last `next`.
#[derive(Debug, Default, Clone)]
pub struct Stroke {
    cells: OrderMap<CellKey, Diff>,
}

impl Stroke {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, diff: Diff) {
        let key = (diff.layer.clone(), diff.row, diff.col);
        match self.cells.get_mut(&key) {
            Some(existing) => existing.next = diff.next,
            None => {
                self.cells.insert(key, diff);
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Diffs in first-touched order.
    pub fn into_diffs(self) -> Vec<Diff> {
        self.cells.into_values().collect()
    }
}

/// One reversible edit.
#[derive(Debug, Clone, PartialEq)]
pub enum HistoryEntry {
    Pixels(Vec<Diff>),
    Structure {
        before: Vec<Layer>,
        after: Vec<Layer>,
        selected_before: Option<LayerId>,
        selected_after: Option<LayerId>,
    },
}

impl HistoryEntry {
    /// Restore the state from before this edit.
    fn revert(&self, store: &mut LayerStore) {
        match self {
            HistoryEntry::Pixels(diffs) => {
                // reverse order so a cell touched twice ends at its first prev
                for d in diffs.iter().rev() {
                    store.write_cell(&d.layer, d.row, d.col, d.prev);
                }
            }
            HistoryEntry::Structure { before, selected_before, .. } => {
                store.restore_layers(before.clone(), selected_before.clone());
            }
        }
    }

    /// Re-apply this edit.
    fn reapply(&self, store: &mut LayerStore) {
        match self {
            HistoryEntry::Pixels(diffs) => {
                for d in diffs {
                    store.write_cell(&d.layer, d.row, d.col, d.next);
                }
            }
            HistoryEntry::Structure { after, selected_after, .. } => {
                store.restore_layers(after.clone(), selected_after.clone());
            }
        }
    }
}

/// Bounded undo and redo stacks plus the open stroke, if any.
#[derive(Debug, Clone)]
pub struct History {
    undo: VecDeque<HistoryEntry>,
    redo: Vec<HistoryEntry>,
    capacity: usize,
    stroke: Option<Stroke>,
}

impl Default for History {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    /// A history keeping at most `capacity` undo entries (minimum 1).
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self { undo: VecDeque::with_capacity(capacity), redo: Vec::new(), capacity, stroke: None }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn undo_len(&self) -> usize {
        self.undo.len()
    }

    pub fn redo_len(&self) -> usize {
        self.redo.len()
    }

    pub fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    /// Entries on the undo stack, oldest first.
    pub fn undo_entries(&self) -> impl Iterator<Item = &HistoryEntry> {
        self.undo.iter()
    }

    pub fn stroke_open(&self) -> bool {
        self.stroke.is_some()
    }

    /// Push an entry, evicting the oldest past capacity. Clears redo.
    pub fn push(&mut self, entry: HistoryEntry) {
        self.undo.push_back(entry);
        if self.undo.len() > self.capacity {
            self.undo.pop_front();
            log::debug!("history full, evicted oldest entry");
        }
        self.redo.clear();
    }

    /// Push a set of pixel diffs as one entry; empty sets are dropped.
    ///
    /// An open stroke is split around the entry: what it holds so far is
    /// committed first and a fresh stroke continues the gesture, so the undo
    /// stack stays in the order the cells were written.
    pub fn push_pixels(&mut self, diffs: Vec<Diff>) {
        if diffs.is_empty() {
            return;
        }
        let reopen = self.stroke_open();
        self.end_stroke();
        self.push(HistoryEntry::Pixels(diffs));
        if reopen {
            self.stroke = Some(Stroke::new());
        }
    }

    pub fn push_structural(
        &mut self,
        before: Vec<Layer>,
        after: Vec<Layer>,
        selected_before: Option<LayerId>,
        selected_after: Option<LayerId>,
    ) {
        self.push(HistoryEntry::Structure { before, after, selected_before, selected_after });
    }

    /// Open a stroke. An already-open stroke is committed first.
    pub fn begin_stroke(&mut self) {
        self.end_stroke();
        self.stroke = Some(Stroke::new());
    }

    /// Record one paint diff: into the open stroke, or as its own entry.
    pub fn record(&mut self, diff: Diff) {
        match self.stroke.as_mut() {
            Some(stroke) => stroke.record(diff),
            None => self.push(HistoryEntry::Pixels(vec![diff])),
        }
    }

    /// Close the open stroke, pushing it if it touched any cell.
    pub fn end_stroke(&mut self) {
        if let Some(stroke) = self.stroke.take() {
            if !stroke.is_empty() {
                log::debug!("stroke committed with {} cells", stroke.len());
                self.push(HistoryEntry::Pixels(stroke.into_diffs()));
            }
        }
    }

    /// Undo the latest entry. Returns whether anything changed.
    pub fn undo(&mut self, store: &mut LayerStore) -> Result<bool, EngineError> {
        if self.stroke_open() {
            return Err(EngineError::StrokeInProgress);
        }
        let Some(entry) = self.undo.pop_back() else {
            return Ok(false);
        };
        entry.revert(store);
        self.redo.push(entry);
        Ok(true)
    }

    /// Redo the latest undone entry. Returns whether anything changed.
    pub fn redo(&mut self, store: &mut LayerStore) -> Result<bool, EngineError> {
        if self.stroke_open() {
            return Err(EngineError::StrokeInProgress);
        }
        let Some(entry) = self.redo.pop() else {
            return Ok(false);
        };
        entry.reapply(store);
        self.undo.push_back(entry);
        Ok(true)
    }

    /// Drop every entry and any open stroke.
    pub fn clear(&mut self) {
        self.undo.clear();
        self.redo.clear();
        self.stroke = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Rgb;

    const A: Color = Some(Rgb::new(1, 0, 0));
    const B: Color = Some(Rgb::new(2, 0, 0));
    const C: Color = Some(Rgb::new(3, 0, 0));

    fn diff(layer: &LayerId, row: usize, col: usize, prev: Color, next: Color) -> Diff {
        Diff { layer: layer.clone(), row, col, prev, next }
    }

    #[test]
    fn test_stroke_coalesces_same_cell() {
        let id = LayerId::new("l");
        let mut stroke = Stroke::new();
        stroke.record(diff(&id, 0, 0, A, B));
        stroke.record(diff(&id, 0, 0, B, C));
        stroke.record(diff(&id, 0, 1, None, C));
        let diffs = stroke.into_diffs();
        assert_eq!(diffs.len(), 2);
        assert_eq!(diffs[0], diff(&id, 0, 0, A, C));
        assert_eq!(diffs[1], diff(&id, 0, 1, None, C));
    }

    #[test]
    fn test_capacity_evicts_oldest() {
        let id = LayerId::new("l");
        let mut history = History::new();
        for i in 0..101 {
            history.push_pixels(vec![diff(&id, 0, i, None, A)]);
        }
        assert_eq!(history.undo_len(), 100);
        match history.undo_entries().next() {
            Some(HistoryEntry::Pixels(diffs)) => assert_eq!(diffs[0].col, 1),
            other => panic!("unexpected entry {:?}", other),
        };
    }

    #[test]
    fn test_push_clears_redo() {
        let mut store = LayerStore::with_default_layer(2, 1);
        let id = store.active_id().cloned().unwrap();
        let mut history = History::new();
        store.write_cell(&id, 0, 0, A);
        history.record(diff(&id, 0, 0, None, A));
        assert!(history.undo(&mut store).unwrap());
        assert_eq!(history.redo_len(), 1);
        history.push_pixels(vec![diff(&id, 0, 1, None, B)]);
        assert_eq!(history.redo_len(), 0);
    }

    #[test]
    fn test_empty_stacks_are_noops() {
        let mut store = LayerStore::with_default_layer(1, 1);
        let mut history = History::new();
        assert!(!history.undo(&mut store).unwrap());
        assert!(!history.redo(&mut store).unwrap());
    }

    #[test]
    fn test_empty_pixel_push_is_dropped() {
        let mut history = History::new();
        history.push_pixels(Vec::new());
        history.begin_stroke();
        history.end_stroke();
        assert_eq!(history.undo_len(), 0);
    }

    #[test]
    fn test_undo_rejected_mid_stroke() {
        let mut store = LayerStore::with_default_layer(1, 1);
        let mut history = History::new();
        history.begin_stroke();
        assert_eq!(history.undo(&mut store), Err(EngineError::StrokeInProgress));
        assert_eq!(history.redo(&mut store), Err(EngineError::StrokeInProgress));
    }

    #[test]
    fn test_structural_round_trip() {
        let mut store = LayerStore::with_default_layer(1, 1);
        let mut history = History::new();
        let before = store.layers().to_vec();
        let selected_before = store.active_id().cloned();
        let added = store.add_layer();
        history.push_structural(
            before.clone(),
            store.layers().to_vec(),
            selected_before.clone(),
            Some(added.clone()),
        );

        history.undo(&mut store).unwrap();
        assert_eq!(store.layers(), before.as_slice());
        assert_eq!(store.active_id(), selected_before.as_ref());

        history.redo(&mut store).unwrap();
        assert_eq!(store.len(), 2);
        assert_eq!(store.active_id(), Some(&added));
    }

    #[test]
    fn test_pixel_push_splits_open_stroke() {
        let id = LayerId::new("l");
        let mut history = History::new();
        history.begin_stroke();
        history.record(diff(&id, 0, 0, None, A));
        history.push_pixels(vec![diff(&id, 0, 0, A, B)]);
        assert!(history.stroke_open());
        history.record(diff(&id, 0, 1, None, C));
        history.end_stroke();

        let entries: Vec<_> = history.undo_entries().collect();
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0], &HistoryEntry::Pixels(vec![diff(&id, 0, 0, None, A)]));
        assert_eq!(entries[1], &HistoryEntry::Pixels(vec![diff(&id, 0, 0, A, B)]));
        assert_eq!(entries[2], &HistoryEntry::Pixels(vec![diff(&id, 0, 1, None, C)]));
    }

    #[test]
    fn test_capacity_minimum_is_one() {
        assert_eq!(History::with_capacity(0).capacity(), 1);
    }
}
