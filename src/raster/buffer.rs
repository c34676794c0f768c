//! Per-layer pixel grid.

use crate::color::Color;

/// A `height × width` grid of optional colors, indexed `[row][col]`.
///
/// Cells are stored row-major in one allocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    width: usize,
    height: usize,
    cells: Vec<Color>,
}

impl PixelBuffer {
    /// Create an all-transparent buffer.
    pub fn blank(width: usize, height: usize) -> Self {
        Self { width, height, cells: vec![None; width * height] }
    }

    /// Build a buffer from row-major rows. Returns `None` if any row has the
    /// wrong length.
    pub fn from_rows(width: usize, rows: Vec<Vec<Color>>) -> Option<Self> {
        let height = rows.len();
        let mut cells = Vec::with_capacity(width * height);
        for row in rows {
            if row.len() != width {
                return None;
            }
            cells.extend(row);
        }
        Some(Self { width, height, cells })
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

    /// Cell value, or transparent when out of bounds.
    pub fn get(&self, row: usize, col: usize) -> Color {
        if self.in_bounds(row, col) {
            self.cells[row * self.width + col]
        } else {
            None
        }
    }

    /// Write a cell and return its previous value, or `None` (nothing written)
    /// when out of bounds.
    pub fn set(&mut self, row: usize, col: usize, color: Color) -> Option<Color> {
        if !self.in_bounds(row, col) {
            return None;
        }
        let idx = row * self.width + col;
        Some(std::mem::replace(&mut self.cells[idx], color))
    }

    /// Reset every cell to transparent.
    pub fn clear(&mut self) {
        self.cells.iter_mut().for_each(|c| *c = None);
    }

    /// True if no cell holds a color.
    pub fn is_blank(&self) -> bool {
        self.cells.iter().all(Option::is_none)
    }

    /// Iterate rows as slices.
    pub fn rows(&self) -> impl Iterator<Item = &[Color]> {
        // chunks() panics on 0; a zero-width buffer has no cells anyway
        self.cells.chunks(self.width.max(1)).take(self.height)
    }

    /// Row-major nested copy, the persistence shape.
    pub fn to_rows(&self) -> Vec<Vec<Color>> {
        self.rows().map(|r| r.to_vec()).collect()
    }

    /// Coordinates of every painted cell.
    pub fn painted_cells(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        let width = self.width.max(1);
        self.cells
            .iter()
            .enumerate()
            .filter(|(_, c)| c.is_some())
            .map(move |(i, _)| (i / width, i % width))
    }
}
