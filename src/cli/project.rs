//! Project files as loaded by the command-line tools.

use std::path::Path;

use crate::editor::Canvas;
use crate::frames::FrameStore;
use crate::snapshot::{AnimatedSnapshot, Snapshot, SnapshotError, StaticSnapshot};
use crate::timeline::Timeline;

/// A restored project of either shape.
pub(crate) enum Project {
    Static(Canvas),
    Animated { frames: FrameStore, timeline: Timeline },
}

impl Project {
    pub(crate) fn load(path: &Path, history_capacity: usize) -> Result<Self, SnapshotError> {
        match Snapshot::read_file(path)? {
            Snapshot::Static(s) => Ok(Project::Static(s.restore(history_capacity)?)),
            Snapshot::Animated(s) => {
                let (frames, timeline) = s.restore(history_capacity)?;
                Ok(Project::Animated { frames, timeline })
            }
        }
    }

    pub(crate) fn snapshot(&self) -> Snapshot {
        match self {
            Project::Static(canvas) => Snapshot::Static(StaticSnapshot::capture(canvas)),
            Project::Animated { frames, timeline } => {
                Snapshot::Animated(AnimatedSnapshot::capture(frames, timeline))
            }
        }
    }

    pub(crate) fn save(&self, path: &Path) -> Result<(), SnapshotError> {
        self.snapshot().write_file(path)
    }

    /// The canvas to edit: the project canvas, or frame `frame` (1-based) of
    /// an animated project, defaulting to the first.
    pub(crate) fn canvas_mut(&mut self, frame: Option<usize>) -> Result<&mut Canvas, String> {
        match self {
            Project::Static(canvas) => match frame {
                Some(_) => Err("--frame only applies to animated projects".to_string()),
                None => Ok(canvas),
            },
            Project::Animated { frames, .. } => {
                let number = frame.unwrap_or(1);
                let count = frames.len();
                let index = number.checked_sub(1).filter(|&i| i < count).ok_or_else(|| {
                    format!("frame {} out of range (project has {} frames)", number, count)
                })?;
                frames
                    .select(index)
                    .map_err(|e| e.to_string())?;
                Ok(&mut frames.active_frame_mut().canvas)
            }
        }
    }
}
