//! An editable canvas: one layer store and its undo history.
//!
//! All edits go through [`Canvas`] so that every change lands in history:
//! paint diffs coalesce into the open stroke, fills push one entry each, and
//! layer-list edits push structural entries.

use crate::color::Color;
use crate::error::EngineError;
use crate::history::History;
use crate::paint::{self, FillOptions};
use crate::raster::{Layer, LayerId, LayerStore};

#[derive(Debug, Clone)]
pub struct Canvas {
    store: LayerStore,
    history: History,
}

impl Canvas {
    /// A blank canvas with one default layer.
    pub fn new(width: usize, height: usize) -> Self {
        Self::from_store(LayerStore::with_default_layer(width, height), History::new())
    }

    /// A blank canvas whose history keeps at most `capacity` entries.
    pub fn with_capacity(width: usize, height: usize, capacity: usize) -> Self {
        Self::from_store(
            LayerStore::with_default_layer(width, height),
            History::with_capacity(capacity),
        )
    }

    pub fn from_store(store: LayerStore, history: History) -> Self {
        Self { store, history }
    }

    pub fn store(&self) -> &LayerStore {
        &self.store
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn width(&self) -> usize {
        self.store.width()
    }

    pub fn height(&self) -> usize {
        self.store.height()
    }

    pub fn active_layer_id(&self) -> Option<&LayerId> {
        self.store.active_id()
    }

    pub fn composite_at(&self, row: usize, col: usize) -> Color {
        self.store.composite_at(row, col)
    }

    /// Eyedropper read of the composited value.
    pub fn sample(&self, row: usize, col: usize) -> Color {
        paint::sample(&self.store, row, col)
    }

    /// True when nothing is painted on any layer.
    pub fn is_empty(&self) -> bool {
        self.store.is_blank()
    }

    // ----- pixel edits -----

    pub fn begin_stroke(&mut self) {
        self.history.begin_stroke();
    }

    pub fn end_stroke(&mut self) {
        self.history.end_stroke();
    }

    /// Paint one cell on the active layer. Returns whether a cell changed.
    pub fn paint_cell(&mut self, row: usize, col: usize, color: Color) -> Result<bool, EngineError> {
        let active = self.store.active_id().cloned();
        let diff = paint::paint_cell(&mut self.store, active.as_ref(), row, col, color)?;
        match diff {
            Some(diff) => {
                self.history.record(diff);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    pub fn erase_cell(&mut self, row: usize, col: usize) -> Result<bool, EngineError> {
        self.paint_cell(row, col, None)
    }

    /// Flood fill on the active layer as one history entry. Returns the
    /// number of cells written.
    pub fn flood_fill(
        &mut self,
        row: usize,
        col: usize,
        color: Color,
        options: &FillOptions,
    ) -> Result<usize, EngineError> {
        let active = self.store.active_id().cloned();
        let diffs = paint::flood_fill(&mut self.store, active.as_ref(), row, col, color, options)?;
        let count = diffs.len();
        // fills are atomic and never join an open stroke
        self.history.push_pixels(diffs);
        Ok(count)
    }

    /// Erase every cell of the active layer as one history entry.
    pub fn clear_layer(&mut self) -> Result<usize, EngineError> {
        let id = paint::ensure_drawable(&self.store, self.store.active_id())?.id.clone();
        let cells: Vec<(usize, usize)> = match self.store.layer(&id) {
            Some(layer) => layer.pixels().painted_cells().collect(),
            None => Vec::new(),
        };
        let mut diffs = Vec::with_capacity(cells.len());
        for (row, col) in cells {
            if let Some(diff) = paint::paint_cell(&mut self.store, Some(&id), row, col, None)? {
                diffs.push(diff);
            }
        }
        let count = diffs.len();
        self.history.push_pixels(diffs);
        Ok(count)
    }

    // ----- history -----

    pub fn undo(&mut self) -> Result<bool, EngineError> {
        let changed = self.history.undo(&mut self.store)?;
        if changed {
            log::debug!("undo ({} left)", self.history.undo_len());
        }
        Ok(changed)
    }

    pub fn redo(&mut self) -> Result<bool, EngineError> {
        let changed = self.history.redo(&mut self.store)?;
        if changed {
            log::debug!("redo ({} left)", self.history.redo_len());
        }
        Ok(changed)
    }

    // ----- structural edits -----

    /// Run a layer-list edit and record it if the list or selection changed.
    /// A failed edit leaves the store untouched, so nothing is recorded.
    fn structural<T>(&mut self, edit: impl FnOnce(&mut LayerStore) -> T) -> T {
        // a structural edit ends any gesture in progress
        self.history.end_stroke();
        let before: Vec<Layer> = self.store.layers().to_vec();
        let selected_before = self.store.active_id().cloned();
        let out = edit(&mut self.store);
        let selected_after = self.store.active_id().cloned();
        if self.store.layers() != before.as_slice() || selected_after != selected_before {
            let after = self.store.layers().to_vec();
            self.history.push_structural(before, after, selected_before, selected_after);
        }
        out
    }

    pub fn add_layer(&mut self) -> LayerId {
        self.structural(|s| s.add_layer())
    }

    pub fn remove_layer(&mut self, id: &LayerId) -> Result<(), EngineError> {
        self.structural(|s| s.remove_layer(id).map(|_| ()))
    }

    pub fn duplicate_layer(&mut self, id: &LayerId) -> Result<LayerId, EngineError> {
        self.structural(|s| s.duplicate_layer(id))
    }

    pub fn set_visible(&mut self, id: &LayerId, visible: bool) -> Result<(), EngineError> {
        self.structural(|s| s.set_visible(id, visible))
    }

    pub fn set_locked(&mut self, id: &LayerId, locked: bool) -> Result<(), EngineError> {
        self.structural(|s| s.set_locked(id, locked))
    }

    pub fn rename_layer(&mut self, id: &LayerId, name: &str) -> Result<(), EngineError> {
        self.structural(|s| s.rename(id, name))
    }

    pub fn move_layer(&mut self, from: usize, to: usize) -> bool {
        self.structural(|s| s.move_layer(from, to))
    }

    /// Change the active layer. Selection alone is not an undoable edit.
    pub fn select_layer(&mut self, id: &LayerId) -> Result<(), EngineError> {
        self.store.select(id)
    }

    /// Resize the canvas. Pixels are discarded and history is cleared, since
    /// recorded diffs no longer fit the grid.
    pub fn resize(&mut self, width: usize, height: usize) {
        self.store.resize(width, height);
        self.history.clear();
    }
}
