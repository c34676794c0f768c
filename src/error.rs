//! Engine error taxonomy and user-facing notices
//!
//! Every error here is recoverable. Callers at the paint/playback boundary turn
//! them into a single [`Notice`] and drop the attempted action.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::raster::LayerId;
use crate::timeline::BlockId;

/// Errors raised by the paint, history, frame and playback components.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    /// No layer is active to receive paint
    #[error("no layer selected")]
    NoLayerSelected,
    /// The target layer is locked
    #[error("layer '{name}' is locked")]
    LayerLocked { name: String },
    /// The target layer is hidden
    #[error("layer '{name}' is hidden")]
    LayerHidden { name: String },
    /// The selected block expands to an empty play sequence
    #[error("animation '{block}' has no playable frames")]
    EmptySequence { block: String },
    /// A layer id does not exist in the store
    #[error("layer '{0}' not found")]
    LayerNotFound(LayerId),
    /// An animation block id does not exist in the timeline
    #[error("animation block '{0}' not found")]
    BlockNotFound(BlockId),
    /// A frame position does not exist in the frame store
    #[error("frame {0} not found")]
    FrameNotFound(usize),
    /// A 1-based frame number outside the frame store
    #[error("frame number {number} is invalid (there are {frame_count} frames)")]
    InvalidFrameNumber { number: u32, frame_count: usize },
    /// Undo/redo requested while a paint stroke is open
    #[error("cannot undo or redo while a stroke is in progress")]
    StrokeInProgress,
}

/// Category of a user-facing notice, mirroring [`EngineError`] variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeKind {
    NoLayerSelected,
    LayerLocked,
    LayerHidden,
    EmptySequence,
    NotFound,
    InvalidInput,
    Busy,
}

/// A transient message shown to the user in place of the dropped action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
}

impl EngineError {
    pub fn kind(&self) -> NoticeKind {
        match self {
            EngineError::NoLayerSelected => NoticeKind::NoLayerSelected,
            EngineError::LayerLocked { .. } => NoticeKind::LayerLocked,
            EngineError::LayerHidden { .. } => NoticeKind::LayerHidden,
            EngineError::EmptySequence { .. } => NoticeKind::EmptySequence,
            EngineError::LayerNotFound(_)
            | EngineError::BlockNotFound(_)
            | EngineError::FrameNotFound(_) => NoticeKind::NotFound,
            EngineError::InvalidFrameNumber { .. } => NoticeKind::InvalidInput,
            EngineError::StrokeInProgress => NoticeKind::Busy,
        }
    }

    /// Convert into the notice surfaced to the user.
    pub fn to_notice(&self) -> Notice {
        let notice = Notice { kind: self.kind(), message: self.to_string() };
        log::warn!("{}", notice.message);
        notice
    }
}

impl From<EngineError> for Notice {
    fn from(e: EngineError) -> Self {
        e.to_notice()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notice_from_locked_layer() {
        let notice: Notice = EngineError::LayerLocked { name: "Layer 2".to_string() }.into();
        assert_eq!(notice.kind, NoticeKind::LayerLocked);
        assert_eq!(notice.message, "layer 'Layer 2' is locked");
    }

    #[test]
    fn test_invalid_frame_number_message() {
        let err = EngineError::InvalidFrameNumber { number: 9, frame_count: 3 };
        assert_eq!(err.to_string(), "frame number 9 is invalid (there are 3 frames)");
        assert_eq!(err.kind(), NoticeKind::InvalidInput);
    }
}
