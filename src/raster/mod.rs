//! Raster storage: pixel buffers and the layer store.

pub mod buffer;
pub mod layer;

pub use buffer::PixelBuffer;
pub use layer::{Layer, LayerId, LayerStore};
