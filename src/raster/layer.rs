//! Layers and the ordered layer store.
//!
//! Layers are held topmost-first: index 0 is rendered last and wins
//! compositing ties. Each layer owns its pixel buffer, so the set of buffers
//! always equals the set of live layers.
//!
//! Buffers sit behind an `Arc` and are copied on write. Cloning the layer
//! list for a history snapshot shares pixel storage with the live layers
//! until one side is edited, so replayed history can never alias live state.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::buffer::PixelBuffer;
use crate::color::Color;
use crate::error::EngineError;

/// Stable identifier for a layer within a store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LayerId(String);

impl LayerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One layer: metadata plus its exclusively owned pixel buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layer {
    pub id: LayerId,
    pub name: String,
    pub visible: bool,
    pub locked: bool,
    pixels: Arc<PixelBuffer>,
}

impl Layer {
    /// A visible, unlocked layer with a blank buffer.
    pub fn blank(id: LayerId, name: impl Into<String>, width: usize, height: usize) -> Self {
        Self::with_pixels(id, name, PixelBuffer::blank(width, height))
    }

    pub fn with_pixels(id: LayerId, name: impl Into<String>, pixels: PixelBuffer) -> Self {
        Self { id, name: name.into(), visible: true, locked: false, pixels: Arc::new(pixels) }
    }

    pub fn pixels(&self) -> &PixelBuffer {
        &self.pixels
    }

    /// Mutable access to the buffer, detaching it from any snapshot sharing it.
    pub fn pixels_mut(&mut self) -> &mut PixelBuffer {
        Arc::make_mut(&mut self.pixels)
    }
}

/// Ordered collection of layers sized to one canvas.
#[derive(Debug, Clone)]
pub struct LayerStore {
    width: usize,
    height: usize,
    layers: Vec<Layer>,
    active: Option<LayerId>,
    /// Next id serial; never reused.
    next_serial: u64,
    /// Number used for the next default layer name.
    next_number: u32,
}

impl LayerStore {
    /// A store with no layers.
    pub fn new(width: usize, height: usize) -> Self {
        Self { width, height, layers: Vec::new(), active: None, next_serial: 1, next_number: 1 }
    }

    /// A store with one active default layer named "Layer 1".
    pub fn with_default_layer(width: usize, height: usize) -> Self {
        let mut store = Self::new(width, height);
        store.add_layer();
        store
    }

    /// Rebuild a store from restored layers.
    ///
    /// Buffers must already match `width × height`; the caller validates the
    /// payload. An active id that names no layer falls back to the top layer.
    pub fn from_layers(
        width: usize,
        height: usize,
        layers: Vec<Layer>,
        active: Option<LayerId>,
    ) -> Self {
        let next_number = layers
            .iter()
            .filter_map(|l| l.name.strip_prefix("Layer ").and_then(|n| n.trim().parse::<u32>().ok()))
            .max()
            .unwrap_or(0)
            .max(layers.len() as u32)
            + 1;
        let mut store = Self {
            width,
            height,
            next_serial: layers.len() as u64 + 1,
            layers,
            active: None,
            next_number,
        };
        store.active = match active {
            Some(id) if store.index_of(&id).is_some() => Some(id),
            _ => store.layers.first().map(|l| l.id.clone()),
        };
        store
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn in_bounds(&self, row: usize, col: usize) -> bool {
        row < self.height && col < self.width
    }

    /// Layers, topmost first.
    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    pub fn active_id(&self) -> Option<&LayerId> {
        self.active.as_ref()
    }

    pub fn active_layer(&self) -> Option<&Layer> {
        self.active.as_ref().and_then(|id| self.layer(id))
    }

    pub fn index_of(&self, id: &LayerId) -> Option<usize> {
        self.layers.iter().position(|l| &l.id == id)
    }

    pub fn layer(&self, id: &LayerId) -> Option<&Layer> {
        self.layers.iter().find(|l| &l.id == id)
    }

    fn layer_mut(&mut self, id: &LayerId) -> Result<&mut Layer, EngineError> {
        self.layers
            .iter_mut()
            .find(|l| &l.id == id)
            .ok_or_else(|| EngineError::LayerNotFound(id.clone()))
    }

    fn fresh_id(&mut self) -> LayerId {
        loop {
            let id = LayerId::new(format!("layer-{}", self.next_serial));
            self.next_serial += 1;
            if self.index_of(&id).is_none() {
                return id;
            }
        }
    }

    /// Insert a new blank topmost layer and make it active.
    pub fn add_layer(&mut self) -> LayerId {
        let id = self.fresh_id();
        let name = format!("Layer {}", self.next_number);
        self.next_number += 1;
        self.layers.insert(0, Layer::blank(id.clone(), name, self.width, self.height));
        self.active = Some(id.clone());
        id
    }

    /// Copy a layer, pixels included, directly above the source and select it.
    pub fn duplicate_layer(&mut self, id: &LayerId) -> Result<LayerId, EngineError> {
        let idx = self.index_of(id).ok_or_else(|| EngineError::LayerNotFound(id.clone()))?;
        let new_id = self.fresh_id();
        let mut copy = self.layers[idx].clone();
        copy.id = new_id.clone();
        copy.name = format!("{} copy", copy.name);
        self.layers.insert(idx, copy);
        self.active = Some(new_id.clone());
        Ok(new_id)
    }

    /// Remove a layer and its buffer.
    ///
    /// If it was active, selection falls back to the new top layer, or none.
    pub fn remove_layer(&mut self, id: &LayerId) -> Result<Layer, EngineError> {
        let idx = self.index_of(id).ok_or_else(|| EngineError::LayerNotFound(id.clone()))?;
        let removed = self.layers.remove(idx);
        if self.active.as_ref() == Some(id) {
            self.active = self.layers.first().map(|l| l.id.clone());
        }
        Ok(removed)
    }

    pub fn select(&mut self, id: &LayerId) -> Result<(), EngineError> {
        if self.index_of(id).is_none() {
            return Err(EngineError::LayerNotFound(id.clone()));
        }
        self.active = Some(id.clone());
        Ok(())
    }

    pub fn set_visible(&mut self, id: &LayerId, visible: bool) -> Result<(), EngineError> {
        self.layer_mut(id)?.visible = visible;
        Ok(())
    }

    pub fn set_locked(&mut self, id: &LayerId, locked: bool) -> Result<(), EngineError> {
        self.layer_mut(id)?.locked = locked;
        Ok(())
    }

    /// Rename a layer. A blank name keeps the old one.
    pub fn rename(&mut self, id: &LayerId, name: &str) -> Result<(), EngineError> {
        let layer = self.layer_mut(id)?;
        let name = name.trim();
        if !name.is_empty() {
            layer.name = name.to_string();
        }
        Ok(())
    }

    /// Move the layer at `from` so it ends up at index `to` (clamped).
    pub fn move_layer(&mut self, from: usize, to: usize) -> bool {
        if from >= self.layers.len() {
            return false;
        }
        let to = to.min(self.layers.len() - 1);
        if from == to {
            return false;
        }
        let layer = self.layers.remove(from);
        self.layers.insert(to, layer);
        true
    }

    /// Color of the topmost visible layer with a painted cell at (row, col).
    pub fn composite_at(&self, row: usize, col: usize) -> Color {
        self.layers.iter().filter(|l| l.visible).find_map(|l| l.pixels().get(row, col))
    }

    /// Reallocate every buffer blank at the new size. Pixels are discarded.
    pub fn resize(&mut self, width: usize, height: usize) {
        self.width = width;
        self.height = height;
        for layer in &mut self.layers {
            layer.pixels = Arc::new(PixelBuffer::blank(width, height));
        }
    }

    /// True if no layer has a painted cell.
    pub fn is_blank(&self) -> bool {
        self.layers.iter().all(|l| l.pixels().is_blank())
    }

    /// Raw cell read on one layer; transparent for unknown layers.
    pub fn cell(&self, id: &LayerId, row: usize, col: usize) -> Color {
        self.layer(id).and_then(|l| l.pixels().get(row, col))
    }

    /// Raw cell write with no drawability checks, used by paint operations
    /// after validation and by history replay. Returns the previous value, or
    /// `None` when the layer is missing or the cell is out of bounds.
    pub(crate) fn write_cell(
        &mut self,
        id: &LayerId,
        row: usize,
        col: usize,
        color: Color,
    ) -> Option<Color> {
        if !self.in_bounds(row, col) {
            return None;
        }
        let layer = self.layers.iter_mut().find(|l| &l.id == id)?;
        layer.pixels_mut().set(row, col, color)
    }

    /// Replace the whole layer list, used by structural undo/redo.
    pub(crate) fn restore_layers(&mut self, layers: Vec<Layer>, active: Option<LayerId>) {
        self.layers = layers;
        self.active = active.filter(|id| self.index_of(id).is_some());
    }
}
