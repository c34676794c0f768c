//! Paint operations: single-cell painting, sampling and flood fill.
//!
//! Every mutating operation validates the target layer first (see
//! [`ensure_drawable`]) and returns the [`Diff`]s it applied so the caller can
//! record them. Coordinates outside the canvas are ignored, not errors: pointer
//! tracking routinely overshoots the grid edge.

use std::collections::VecDeque;

use crate::color::{matches, Color};
use crate::error::EngineError;
use crate::history::Diff;
use crate::raster::{Layer, LayerId, LayerStore};

/// Options controlling flood fill matching.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FillOptions {
    /// Maximum RGB distance for a cell to count as the target color
    pub tolerance: f64,
    /// Only fill cells 4-connected to the seed; otherwise every matching cell
    pub contiguous: bool,
    /// Match against the composited image instead of the target layer
    pub sample_all_layers: bool,
}

impl Default for FillOptions {
    fn default() -> Self {
        Self { tolerance: 0.0, contiguous: true, sample_all_layers: false }
    }
}

/// Check that `layer` names a layer that can receive paint.
pub fn ensure_drawable<'a>(
    store: &'a LayerStore,
    layer: Option<&LayerId>,
) -> Result<&'a Layer, EngineError> {
    let id = layer.ok_or(EngineError::NoLayerSelected)?;
    let layer = store.layer(id).ok_or_else(|| EngineError::LayerNotFound(id.clone()))?;
    if layer.locked {
        return Err(EngineError::LayerLocked { name: layer.name.clone() });
    }
    if !layer.visible {
        return Err(EngineError::LayerHidden { name: layer.name.clone() });
    }
    Ok(layer)
}

/// Write one cell on a drawable layer.
///
/// Returns `Ok(None)` when nothing changed: the cell is out of bounds or
/// already holds `color`.
pub fn paint_cell(
    store: &mut LayerStore,
    layer: Option<&LayerId>,
    row: usize,
    col: usize,
    color: Color,
) -> Result<Option<Diff>, EngineError> {
    let id = ensure_drawable(store, layer)?.id.clone();
    if !store.in_bounds(row, col) {
        return Ok(None);
    }
    let prev = store.cell(&id, row, col);
    if prev == color {
        return Ok(None);
    }
    store.write_cell(&id, row, col, color);
    Ok(Some(Diff { layer: id, row, col, prev, next: color }))
}

/// Read the composited color at a cell. Needs no drawable layer.
pub fn sample(store: &LayerStore, row: usize, col: usize) -> Color {
    store.composite_at(row, col)
}

/// Recolor the region around (row, col) on the target layer.
///
/// Matching reads either the target layer or, with `sample_all_layers`, the
/// composite; writes always go to the target layer only. Returns one diff per
/// cell that changed, or none when the seed already matches `color` or lies
/// off the canvas.
pub fn flood_fill(
    store: &mut LayerStore,
    layer: Option<&LayerId>,
    row: usize,
    col: usize,
    color: Color,
    options: &FillOptions,
) -> Result<Vec<Diff>, EngineError> {
    let id = ensure_drawable(store, layer)?.id.clone();
    if !store.in_bounds(row, col) {
        return Ok(Vec::new());
    }

    let view: &LayerStore = store;
    let read = |r: usize, c: usize| -> Color {
        if options.sample_all_layers {
            view.composite_at(r, c)
        } else {
            view.cell(&id, r, c)
        }
    };

    let target = read(row, col);
    if matches(target, color, options.tolerance) {
        return Ok(Vec::new());
    }

    let admit = |r: usize, c: usize| matches(target, read(r, c), options.tolerance);
    let cells = if options.contiguous {
        connected_region(view, row, col, admit)
    } else {
        global_region(view, row, col, admit)
    };

    let mut diffs = Vec::with_capacity(cells.len());
    for (r, c) in cells {
        // a matched cell may already hold `color` on the target layer
        if store.cell(&id, r, c) == color {
            continue;
        }
        let prev = store.write_cell(&id, r, c, color).flatten();
        diffs.push(Diff { layer: id.clone(), row: r, col: c, prev, next: color });
    }
    log::debug!("flood fill at ({}, {}) on '{}' changed {} cells", row, col, id, diffs.len());
    Ok(diffs)
}

/// Breadth-first 4-connected region from the seed. The seed is always
/// included; each cell is visited at most once.
fn connected_region(
    store: &LayerStore,
    row: usize,
    col: usize,
    admit: impl Fn(usize, usize) -> bool,
) -> Vec<(usize, usize)> {
    let (width, height) = (store.width(), store.height());
    let mut visited = vec![false; width * height];
    let mut region = Vec::new();
    let mut queue = VecDeque::new();

    visited[row * width + col] = true;
    queue.push_back((row, col));

    while let Some((r, c)) = queue.pop_front() {
        region.push((r, c));
        let neighbors: [(isize, isize); 4] = [(-1, 0), (1, 0), (0, -1), (0, 1)];
        for (dr, dc) in &neighbors {
            let nr = r as isize + dr;
            let nc = c as isize + dc;
            if nr < 0 || nc < 0 || nr as usize >= height || nc as usize >= width {
                continue;
            }
            let (nr, nc) = (nr as usize, nc as usize);
            let idx = nr * width + nc;
            if !visited[idx] && admit(nr, nc) {
                visited[idx] = true;
                queue.push_back((nr, nc));
            }
        }
    }

    region
}

/// Every matching cell on the canvas, plus the seed.
fn global_region(
    store: &LayerStore,
    row: usize,
    col: usize,
    admit: impl Fn(usize, usize) -> bool,
) -> Vec<(usize, usize)> {
    let mut region = vec![(row, col)];
    for r in 0..store.height() {
        for c in 0..store.width() {
            if (r, c) != (row, col) && admit(r, c) {
                region.push((r, c));
            }
        }
    }
    region
}
