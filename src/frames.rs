//! Animation frames: independent canvases in display order.
//!
//! Each frame owns its own layer store and history outright; nothing is
//! shared between frames. Frame names always follow position ("Frame 1",
//! "Frame 2", ...).

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::editor::Canvas;
use crate::error::EngineError;
use crate::history::DEFAULT_CAPACITY;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FrameId(String);

impl FrameId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FrameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One animation frame.
#[derive(Debug, Clone)]
pub struct Frame {
    pub id: FrameId,
    pub name: String,
    pub canvas: Canvas,
}

/// Ordered frames plus the one selected for editing.
#[derive(Debug, Clone)]
pub struct FrameStore {
    width: usize,
    height: usize,
    frames: Vec<Frame>,
    active: usize,
    next_serial: u64,
    history_capacity: usize,
}

impl FrameStore {
    /// A store holding one blank frame.
    pub fn new(width: usize, height: usize) -> Self {
        Self::with_capacity(width, height, DEFAULT_CAPACITY)
    }

    /// Like [`FrameStore::new`], with a per-frame history bound.
    pub fn with_capacity(width: usize, height: usize, history_capacity: usize) -> Self {
        let mut store = Self {
            width,
            height,
            frames: Vec::new(),
            active: 0,
            next_serial: 1,
            history_capacity,
        };
        store.add_frame();
        store
    }

    /// Rebuild from restored frames. Returns `None` if `frames` is empty.
    pub fn from_frames(
        width: usize,
        height: usize,
        frames: Vec<Frame>,
        history_capacity: usize,
    ) -> Option<Self> {
        if frames.is_empty() {
            return None;
        }
        let mut store = Self {
            width,
            height,
            next_serial: frames.len() as u64 + 1,
            frames,
            active: 0,
            history_capacity,
        };
        store.renumber();
        Some(store)
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// Always false; a store keeps at least one frame.
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    pub fn frame(&self, index: usize) -> Option<&Frame> {
        self.frames.get(index)
    }

    pub fn frame_mut(&mut self, index: usize) -> Option<&mut Frame> {
        self.frames.get_mut(index)
    }

    pub fn index_of(&self, id: &FrameId) -> Option<usize> {
        self.frames.iter().position(|f| &f.id == id)
    }

    pub fn active_index(&self) -> usize {
        self.active
    }

    pub fn active_frame(&self) -> &Frame {
        &self.frames[self.active]
    }

    pub fn active_frame_mut(&mut self) -> &mut Frame {
        &mut self.frames[self.active]
    }

    pub fn select(&mut self, index: usize) -> Result<(), EngineError> {
        if index >= self.frames.len() {
            return Err(EngineError::FrameNotFound(index));
        }
        self.active = index;
        Ok(())
    }

    fn fresh_id(&mut self) -> FrameId {
        loop {
            let id = FrameId::new(format!("frame-{}", self.next_serial));
            self.next_serial += 1;
            if self.index_of(&id).is_none() {
                return id;
            }
        }
    }

    fn renumber(&mut self) {
        for (i, frame) in self.frames.iter_mut().enumerate() {
            frame.name = format!("Frame {}", i + 1);
        }
    }

    /// Append a blank frame and make it active. Returns its index.
    pub fn add_frame(&mut self) -> usize {
        let id = self.fresh_id();
        let canvas = Canvas::with_capacity(self.width, self.height, self.history_capacity);
        let name = format!("Frame {}", self.frames.len() + 1);
        self.frames.push(Frame { id, name, canvas });
        self.active = self.frames.len() - 1;
        self.active
    }

    /// Insert a copy of the frame at `index` right after it and select the copy.
    pub fn duplicate_frame(&mut self, index: usize) -> Result<usize, EngineError> {
        let source = self.frames.get(index).ok_or(EngineError::FrameNotFound(index))?;
        let mut copy = source.clone();
        copy.id = self.fresh_id();
        self.frames.insert(index + 1, copy);
        self.renumber();
        self.active = index + 1;
        Ok(self.active)
    }

    /// Remove a frame. The last remaining frame cannot be removed.
    ///
    /// Animation blocks keep their numeric references; ones past the new end
    /// are dropped at playback time.
    pub fn remove_frame(&mut self, id: &FrameId) -> bool {
        if self.frames.len() <= 1 {
            return false;
        }
        let Some(idx) = self.index_of(id) else {
            return false;
        };
        self.frames.remove(idx);
        if idx <= self.active {
            self.active = self.active.saturating_sub(1);
        }
        self.renumber();
        log::debug!("removed frame {}, {} left", id, self.frames.len());
        true
    }

    /// Resize every frame, blanking pixels and clearing each frame's history.
    pub fn resize(&mut self, width: usize, height: usize) {
        self.width = width;
        self.height = height;
        for frame in &mut self.frames {
            frame.canvas.resize(width, height);
        }
    }

    /// True when no frame has a painted cell.
    pub fn is_blank(&self) -> bool {
        self.frames.iter().all(|f| f.canvas.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Rgb;

    #[test]
    fn test_new_store_has_one_frame() {
        let store = FrameStore::new(4, 4);
        assert_eq!(store.len(), 1);
        assert_eq!(store.active_frame().name, "Frame 1");
        assert_eq!(store.active_frame().canvas.store().len(), 1);
    }

    #[test]
    fn test_add_frame_selects_it() {
        let mut store = FrameStore::new(2, 2);
        assert_eq!(store.add_frame(), 1);
        assert_eq!(store.active_index(), 1);
        assert_eq!(store.active_frame().name, "Frame 2");
    }

    #[test]
    fn test_last_frame_cannot_be_removed() {
        let mut store = FrameStore::new(2, 2);
        let id = store.active_frame().id.clone();
        assert!(!store.remove_frame(&id));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_remove_renumbers_and_shifts_active() {
        let mut store = FrameStore::new(2, 2);
        store.add_frame();
        store.add_frame();
        let first = store.frames()[0].id.clone();
        assert_eq!(store.active_index(), 2);
        assert!(store.remove_frame(&first));
        assert_eq!(store.active_index(), 1);
        let names: Vec<_> = store.frames().iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["Frame 1", "Frame 2"]);
    }

    #[test]
    fn test_remove_after_active_keeps_active() {
        let mut store = FrameStore::new(2, 2);
        store.add_frame();
        store.select(0).unwrap();
        let second = store.frames()[1].id.clone();
        assert!(store.remove_frame(&second));
        assert_eq!(store.active_index(), 0);
    }

    #[test]
    fn test_frames_do_not_share_pixels() {
        let mut store = FrameStore::new(2, 2);
        store.active_frame_mut().canvas.paint_cell(0, 0, Some(Rgb::WHITE)).unwrap();
        let copy = store.duplicate_frame(0).unwrap();
        store.active_frame_mut().canvas.paint_cell(0, 0, Some(Rgb::BLACK)).unwrap();
        assert_eq!(copy, 1);
        assert_eq!(store.frames()[0].canvas.composite_at(0, 0), Some(Rgb::WHITE));
        assert_eq!(store.frames()[1].canvas.composite_at(0, 0), Some(Rgb::BLACK));
        assert_ne!(store.frames()[0].id, store.frames()[1].id);
    }

    #[test]
    fn test_resize_all_frames() {
        let mut store = FrameStore::new(2, 2);
        store.active_frame_mut().canvas.paint_cell(1, 1, Some(Rgb::WHITE)).unwrap();
        store.add_frame();
        store.resize(8, 6);
        assert!(store.is_blank());
        for frame in store.frames() {
            assert_eq!(frame.canvas.width(), 8);
            assert_eq!(frame.canvas.height(), 6);
        }
    }

    #[test]
    fn test_select_out_of_range() {
        let mut store = FrameStore::new(1, 1);
        assert_eq!(store.select(3), Err(EngineError::FrameNotFound(3)));
    }
}
