//! Persistence payloads for static and animated projects.
//!
//! A snapshot is plain data: capturing one copies layer contents out of the
//! engine, and restoring validates the payload before building fresh layer
//! stores with empty history.
//!
//! Static shape:
//!
//! ```json
//! { "width": 2, "height": 1, "selectedLayerId": "layer-1",
//!   "layers": [{ "id": "layer-1", "name": "Layer 1", "visible": true,
//!                "locked": false, "pixels": [["#FF0000", null]] }] }
//! ```
//!
//! The animated shape replaces `layers` with `frames` (each carrying its own
//! layers) and adds `animations`.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use serde::{de, Deserialize, Deserializer, Serialize};
use thiserror::Error;

use crate::color::{parse_hex_color, Color};
use crate::editor::Canvas;
use crate::frames::{Frame, FrameId, FrameStore};
use crate::history::History;
use crate::raster::{Layer, LayerId, LayerStore, PixelBuffer};
use crate::timeline::{AnimationBlock, Timeline};

/// Largest accepted width or height.
pub const MAX_DIMENSION: usize = 512;

/// Errors raised while reading or restoring a snapshot.
#[derive(Debug, Error)]
pub enum SnapshotError {
    /// Width or height outside 1..=512
    #[error("invalid canvas size {width}x{height} (each side must be 1..=512)")]
    InvalidDimensions { width: usize, height: usize },
    /// A layer's pixel grid does not match the canvas size
    #[error("layer '{layer}' has {rows} row(s) / a row of {cols} cell(s), expected {width}x{height}")]
    ShapeMismatch { layer: String, rows: usize, cols: usize, width: usize, height: usize },
    /// A cell holds something other than a hex color or null
    #[error("layer '{layer}' cell ({row}, {col}): invalid color '{value}'")]
    InvalidColor { layer: String, row: usize, col: usize, value: String },
    /// Two layers in one store share an id
    #[error("duplicate layer id '{0}'")]
    DuplicateLayerId(String),
    /// An animated snapshot with no frames
    #[error("animated project has no frames")]
    NoFrames,
    #[error("invalid snapshot JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// One layer as persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayerPayload {
    pub id: String,
    pub name: String,
    #[serde(default = "default_true")]
    pub visible: bool,
    #[serde(default)]
    pub locked: bool,
    /// Row-major cells, `"#RRGGBB"` or `null`
    pub pixels: Vec<Vec<Option<String>>>,
}

fn default_true() -> bool {
    true
}

impl LayerPayload {
    fn capture(layer: &Layer) -> Self {
        let pixels = layer
            .pixels()
            .rows()
            .map(|row| row.iter().map(|c| c.map(|rgb| rgb.to_hex())).collect())
            .collect();
        Self {
            id: layer.id.as_str().to_string(),
            name: layer.name.clone(),
            visible: layer.visible,
            locked: layer.locked,
            pixels,
        }
    }

    fn restore(&self, width: usize, height: usize) -> Result<Layer, SnapshotError> {
        let shape_error = |cols: usize| SnapshotError::ShapeMismatch {
            layer: self.id.clone(),
            rows: self.pixels.len(),
            cols,
            width,
            height,
        };
        if self.pixels.len() != height {
            return Err(shape_error(self.pixels.first().map_or(0, Vec::len)));
        }

        let mut rows = Vec::with_capacity(height);
        for (r, row) in self.pixels.iter().enumerate() {
            if row.len() != width {
                return Err(shape_error(row.len()));
            }
            let cells = row
                .iter()
                .enumerate()
                .map(|(c, cell)| self.restore_cell(r, c, cell.as_deref()))
                .collect::<Result<Vec<Color>, _>>()?;
            rows.push(cells);
        }

        let buffer = PixelBuffer::from_rows(width, rows).ok_or_else(|| shape_error(width))?;
        let mut layer = Layer::with_pixels(LayerId::new(self.id.clone()), self.name.clone(), buffer);
        layer.visible = self.visible;
        layer.locked = self.locked;
        Ok(layer)
    }

    fn restore_cell(&self, row: usize, col: usize, cell: Option<&str>) -> Result<Color, SnapshotError> {
        let Some(value) = cell else {
            return Ok(None);
        };
        parse_hex_color(value.trim()).map(Some).map_err(|_| SnapshotError::InvalidColor {
            layer: self.id.clone(),
            row,
            col,
            value: value.to_string(),
        })
    }
}

fn check_dimensions(width: usize, height: usize) -> Result<(), SnapshotError> {
    let valid = 1..=MAX_DIMENSION;
    if valid.contains(&width) && valid.contains(&height) {
        Ok(())
    } else {
        Err(SnapshotError::InvalidDimensions { width, height })
    }
}

fn capture_layers(store: &LayerStore) -> (Option<String>, Vec<LayerPayload>) {
    let selected = store.active_id().map(|id| id.as_str().to_string());
    (selected, store.layers().iter().map(LayerPayload::capture).collect())
}

fn restore_store(
    width: usize,
    height: usize,
    payloads: &[LayerPayload],
    selected: Option<&str>,
) -> Result<LayerStore, SnapshotError> {
    let mut seen = HashSet::new();
    let mut layers = Vec::with_capacity(payloads.len());
    for payload in payloads {
        if !seen.insert(payload.id.as_str()) {
            return Err(SnapshotError::DuplicateLayerId(payload.id.clone()));
        }
        layers.push(payload.restore(width, height)?);
    }
    Ok(LayerStore::from_layers(width, height, layers, selected.map(LayerId::new)))
}

fn layers_blank(payloads: &[LayerPayload]) -> bool {
    payloads.iter().all(|l| l.pixels.iter().flatten().all(Option::is_none))
}

/// A single-canvas project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StaticSnapshot {
    pub width: usize,
    pub height: usize,
    #[serde(default)]
    pub selected_layer_id: Option<String>,
    pub layers: Vec<LayerPayload>,
}

impl StaticSnapshot {
    pub fn capture(canvas: &Canvas) -> Self {
        let store = canvas.store();
        let (selected_layer_id, layers) = capture_layers(store);
        Self { width: store.width(), height: store.height(), selected_layer_id, layers }
    }

    /// Build a canvas from this payload with an empty history.
    pub fn restore(&self, history_capacity: usize) -> Result<Canvas, SnapshotError> {
        check_dimensions(self.width, self.height)?;
        let store =
            restore_store(self.width, self.height, &self.layers, self.selected_layer_id.as_deref())?;
        Ok(Canvas::from_store(store, History::with_capacity(history_capacity)))
    }

    /// True when no layer has a painted cell.
    pub fn is_empty(&self) -> bool {
        layers_blank(&self.layers)
    }
}

/// One frame of an animated project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FramePayload {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub selected_layer_id: Option<String>,
    pub layers: Vec<LayerPayload>,
}

/// A frame store plus its timeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnimatedSnapshot {
    pub width: usize,
    pub height: usize,
    pub frames: Vec<FramePayload>,
    #[serde(default)]
    pub animations: Vec<AnimationBlock>,
}

impl AnimatedSnapshot {
    pub fn capture(frames: &FrameStore, timeline: &Timeline) -> Self {
        let frames_out = frames
            .frames()
            .iter()
            .map(|frame| {
                let (selected_layer_id, layers) = capture_layers(frame.canvas.store());
                FramePayload {
                    id: frame.id.as_str().to_string(),
                    name: frame.name.clone(),
                    selected_layer_id,
                    layers,
                }
            })
            .collect();
        Self {
            width: frames.width(),
            height: frames.height(),
            frames: frames_out,
            animations: timeline.blocks().to_vec(),
        }
    }

    /// Build the frame store and timeline, each frame with an empty history.
    pub fn restore(&self, history_capacity: usize) -> Result<(FrameStore, Timeline), SnapshotError> {
        check_dimensions(self.width, self.height)?;
        let mut frames = Vec::with_capacity(self.frames.len());
        for payload in &self.frames {
            let store = restore_store(
                self.width,
                self.height,
                &payload.layers,
                payload.selected_layer_id.as_deref(),
            )?;
            frames.push(Frame {
                id: FrameId::new(payload.id.clone()),
                name: payload.name.clone(),
                canvas: Canvas::from_store(store, History::with_capacity(history_capacity)),
            });
        }
        let store = FrameStore::from_frames(self.width, self.height, frames, history_capacity)
            .ok_or(SnapshotError::NoFrames)?;
        Ok((store, Timeline::from_blocks(self.animations.clone())))
    }

    /// True when no layer of any frame has a painted cell.
    pub fn is_empty(&self) -> bool {
        self.frames.iter().all(|f| layers_blank(&f.layers))
    }
}

/// Either project shape, as found in a file.
///
/// Serialized without a tag. On read, a top-level `frames` key selects the
/// animated shape; anything else is read as static.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Snapshot {
    Animated(AnimatedSnapshot),
    Static(StaticSnapshot),
}

impl<'de> Deserialize<'de> for Snapshot {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = serde_json::Value::deserialize(deserializer)?;
        let animated = value.get("frames").is_some();
        let snapshot = if animated {
            AnimatedSnapshot::deserialize(value).map(Snapshot::Animated)
        } else {
            StaticSnapshot::deserialize(value).map(Snapshot::Static)
        };
        snapshot.map_err(de::Error::custom)
    }
}

impl Snapshot {
    pub fn width(&self) -> usize {
        match self {
            Snapshot::Animated(s) => s.width,
            Snapshot::Static(s) => s.width,
        }
    }

    pub fn height(&self) -> usize {
        match self {
            Snapshot::Animated(s) => s.height,
            Snapshot::Static(s) => s.height,
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Snapshot::Animated(s) => s.is_empty(),
            Snapshot::Static(s) => s.is_empty(),
        }
    }

    pub fn from_json(json: &str) -> Result<Self, SnapshotError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String, SnapshotError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn read_file(path: &Path) -> Result<Self, SnapshotError> {
        let contents = fs::read_to_string(path)?;
        Self::from_json(&contents)
    }

    pub fn write_file(&self, path: &Path) -> Result<(), SnapshotError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(path, self.to_json()?)?;
        log::info!("wrote snapshot {}", path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Rgb;
    use crate::timeline::LoopMode;
    use pretty_assertions::assert_eq;

    const RED: Color = Some(Rgb::new(255, 0, 0));

    #[test]
    fn test_static_capture_shape() {
        let mut canvas = Canvas::new(2, 1);
        canvas.paint_cell(0, 0, RED).unwrap();
        let snapshot = StaticSnapshot::capture(&canvas);
        let json = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(json["width"], 2);
        assert_eq!(json["selectedLayerId"], "layer-1");
        assert_eq!(json["layers"][0]["name"], "Layer 1");
        assert_eq!(json["layers"][0]["pixels"], serde_json::json!([["#FF0000", null]]));
    }

    #[test]
    fn test_static_restore_keeps_content() {
        let mut canvas = Canvas::new(3, 2);
        canvas.paint_cell(1, 2, RED).unwrap();
        let hidden = canvas.add_layer();
        canvas.set_visible(&hidden, false).unwrap();

        let restored = StaticSnapshot::capture(&canvas).restore(10).unwrap();
        assert_eq!(restored.store().layers(), canvas.store().layers());
        assert_eq!(restored.active_layer_id(), Some(&hidden));
        assert!(!restored.history().can_undo());
        assert_eq!(restored.history().capacity(), 10);
    }

    #[test]
    fn test_restore_rejects_bad_dimensions() {
        let snapshot = StaticSnapshot { width: 0, height: 4, selected_layer_id: None, layers: vec![] };
        assert!(matches!(
            snapshot.restore(100),
            Err(SnapshotError::InvalidDimensions { width: 0, height: 4 })
        ));
        let snapshot = StaticSnapshot { width: 513, height: 4, ..snapshot };
        assert!(snapshot.restore(100).is_err());
    }

    #[test]
    fn test_restore_rejects_shape_and_color() {
        let json = r##"{"width":2,"height":1,"layers":[
            {"id":"a","name":"A","pixels":[["#fff"]]}]}"##;
        let snapshot: StaticSnapshot = serde_json::from_str(json).unwrap();
        assert!(matches!(snapshot.restore(100), Err(SnapshotError::ShapeMismatch { .. })));

        let json = r##"{"width":2,"height":1,"layers":[
            {"id":"a","name":"A","pixels":[["#fff","purple-ish"]]}]}"##;
        let snapshot: StaticSnapshot = serde_json::from_str(json).unwrap();
        match snapshot.restore(100) {
            Err(SnapshotError::InvalidColor { row, col, value, .. }) => {
                assert_eq!((row, col, value.as_str()), (0, 1, "purple-ish"));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_restore_accepts_lowercase_and_shorthand() {
        let json = r##"{"width":2,"height":1,"layers":[
            {"id":"a","name":"A","pixels":[["#ff0000","#0F0"]]}]}"##;
        let canvas = Snapshot::from_json(json).unwrap();
        let Snapshot::Static(snapshot) = canvas else {
            panic!("expected static shape");
        };
        let canvas = snapshot.restore(100).unwrap();
        assert_eq!(canvas.composite_at(0, 0), RED);
        assert_eq!(canvas.composite_at(0, 1), Some(Rgb::new(0, 255, 0)));
        assert!(canvas.store().layers()[0].visible);
    }

    #[test]
    fn test_restore_rejects_duplicate_ids() {
        let layer = LayerPayload {
            id: "x".to_string(),
            name: "X".to_string(),
            visible: true,
            locked: false,
            pixels: vec![vec![None]],
        };
        let snapshot = StaticSnapshot {
            width: 1,
            height: 1,
            selected_layer_id: None,
            layers: vec![layer.clone(), layer],
        };
        assert!(matches!(snapshot.restore(100), Err(SnapshotError::DuplicateLayerId(id)) if id == "x"));
    }

    #[test]
    fn test_animated_round_trip() {
        let mut frames = FrameStore::new(2, 2);
        frames.active_frame_mut().canvas.paint_cell(0, 0, RED).unwrap();
        frames.add_frame();
        let mut timeline = Timeline::new();
        let block = timeline.add_block();
        timeline.add_frame_ref(&block, 2, 2).unwrap();
        timeline.add_frame_ref(&block, 1, 2).unwrap();
        timeline.set_loop_mode(&block, LoopMode::PingPong).unwrap();

        let snapshot = AnimatedSnapshot::capture(&frames, &timeline);
        let json = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(json["animations"][0]["loopMode"], "pingpong");
        assert_eq!(json["animations"][0]["frames"], serde_json::json!([2, 1]));
        assert_eq!(json["frames"][1]["name"], "Frame 2");

        let (restored, restored_timeline) = snapshot.restore(100).unwrap();
        assert_eq!(restored.len(), 2);
        assert_eq!(restored.frames()[0].canvas.composite_at(0, 0), RED);
        assert_eq!(restored_timeline.blocks(), timeline.blocks());
    }

    #[test]
    fn test_animated_without_frames_is_rejected() {
        let snapshot = AnimatedSnapshot { width: 1, height: 1, frames: vec![], animations: vec![] };
        assert!(matches!(snapshot.restore(100), Err(SnapshotError::NoFrames)));
    }

    #[test]
    fn test_malformed_frame_reports_its_field() {
        let json = r#"{"width":1,"height":1,"frames":[{"id":"f"}],"animations":[]}"#;
        let err = Snapshot::from_json(json).unwrap_err().to_string();
        assert!(err.contains("missing field `layers`"), "{}", err);
        assert!(!err.contains("did not match any variant"), "{}", err);
    }

    #[test]
    fn test_frames_key_selects_shape() {
        let animated = r#"{"width":1,"height":1,"frames":[{"id":"f","layers":[]}]}"#;
        assert!(matches!(Snapshot::from_json(animated).unwrap(), Snapshot::Animated(_)));
        let plain = r#"{"width":1,"height":1,"layers":[]}"#;
        assert!(matches!(Snapshot::from_json(plain).unwrap(), Snapshot::Static(_)));
        assert!(matches!(Snapshot::from_json("{"), Err(SnapshotError::Json(_))));
    }

    #[test]
    fn test_is_empty() {
        let mut canvas = Canvas::new(2, 2);
        assert!(StaticSnapshot::capture(&canvas).is_empty());
        canvas.paint_cell(1, 1, RED).unwrap();
        assert!(!StaticSnapshot::capture(&canvas).is_empty());

        let mut frames = FrameStore::new(2, 2);
        frames.add_frame();
        let timeline = Timeline::new();
        assert!(Snapshot::Animated(AnimatedSnapshot::capture(&frames, &timeline)).is_empty());
        frames.active_frame_mut().canvas.paint_cell(0, 1, RED).unwrap();
        assert!(!AnimatedSnapshot::capture(&frames, &timeline).is_empty());
    }

    #[test]
    fn test_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("art.json");
        let snapshot = Snapshot::Static(StaticSnapshot::capture(&Canvas::new(4, 4)));
        snapshot.write_file(&path).unwrap();
        assert_eq!(Snapshot::read_file(&path).unwrap(), snapshot);
    }
}
