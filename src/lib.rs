//! Pixology - layered pixel-art editing, history and animation playback
//!
//! This library provides:
//! - A layer store with top-down compositing and per-layer visibility/locks
//! - Paint operations (pencil, eraser, tolerance-based flood fill)
//! - Bounded undo/redo with per-cell stroke coalescing
//! - Animation frames, play-sequence construction and a playback state machine
//! - An onion-skin preview compositor
//! - JSON snapshots for persisting static and animated projects

pub mod cli;
pub mod color;
pub mod config;
pub mod editor;
pub mod error;
pub mod frames;
pub mod history;
pub mod output;
pub mod paint;
pub mod playback;
pub mod preview;
pub mod raster;
pub mod snapshot;
pub mod telemetry;
pub mod timeline;
