//! Animation blocks and play-sequence construction.
//!
//! A block is an ordered list of 1-based frame numbers (repeats allowed)
//! plus a loop mode. Blocks only hold numbers, never pixels, and the
//! timeline's order is independent of the frame store's.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::EngineError;

/// Looping mode for playback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LoopMode {
    #[default]
    Forward,
    Backward,
    #[serde(rename = "pingpong")]
    PingPong,
}

impl LoopMode {
    /// The next mode in the toggle cycle forward → backward → pingpong.
    pub fn next(self) -> Self {
        match self {
            LoopMode::Forward => LoopMode::Backward,
            LoopMode::Backward => LoopMode::PingPong,
            LoopMode::PingPong => LoopMode::Forward,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            LoopMode::Forward => "forward",
            LoopMode::Backward => "backward",
            LoopMode::PingPong => "pingpong",
        }
    }

    /// Lenient parse; unknown values fall back to forward.
    pub fn parse_lenient(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "backward" => LoopMode::Backward,
            "pingpong" => LoopMode::PingPong,
            _ => LoopMode::Forward,
        }
    }
}

impl fmt::Display for LoopMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// Payloads may carry null or unrecognized modes.
impl<'de> Deserialize<'de> for LoopMode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(raw.as_deref().map(LoopMode::parse_lenient).unwrap_or_default())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BlockId(String);

impl BlockId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A named sequence of frame references.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnimationBlock {
    pub id: BlockId,
    pub name: String,
    /// 1-based frame numbers, in play order
    #[serde(default)]
    pub frames: Vec<u32>,
    #[serde(default)]
    pub loop_mode: LoopMode,
}

/// Expand a block into zero-based frame indices.
///
/// References outside `1..=frame_count` are dropped (a frame may have been
/// deleted after the block was built). Ping-pong mirrors the interior so a
/// cycle of `[a, b, c]` plays `[a, b, c, b]`.
///
/// ```
/// use pixology::timeline::{build_play_sequence, AnimationBlock, BlockId, LoopMode};
///
/// let mut block = AnimationBlock {
///     id: BlockId::new("walk"),
///     name: "walk".to_string(),
///     frames: vec![1, 2, 3],
///     loop_mode: LoopMode::PingPong,
/// };
/// assert_eq!(build_play_sequence(&block, 3), vec![0, 1, 2, 1]);
/// block.loop_mode = LoopMode::Backward;
/// assert_eq!(build_play_sequence(&block, 3), vec![2, 1, 0]);
/// ```
pub fn build_play_sequence(block: &AnimationBlock, frame_count: usize) -> Vec<usize> {
    let base: Vec<usize> = block
        .frames
        .iter()
        .filter_map(|&n| (n as usize).checked_sub(1))
        .filter(|&i| i < frame_count)
        .collect();

    let dropped = block.frames.len() - base.len();
    if dropped > 0 {
        log::debug!(
            "animation '{}': dropped {} reference(s) outside {} frames",
            block.name,
            dropped,
            frame_count
        );
    }

    if base.is_empty() {
        return base;
    }

    match block.loop_mode {
        LoopMode::Forward => base,
        LoopMode::Backward => base.into_iter().rev().collect(),
        LoopMode::PingPong => {
            if base.len() <= 1 {
                return base;
            }
            let interior = base[1..base.len() - 1].iter().rev().copied();
            let mut seq = base.clone();
            seq.extend(interior);
            seq
        }
    }
}

const UNTITLED_PREFIX: &str = "untitled animation";

/// Ordered list of animation blocks.
#[derive(Debug, Clone)]
pub struct Timeline {
    blocks: Vec<AnimationBlock>,
    untitled: u32,
    next_serial: u64,
}

impl Default for Timeline {
    fn default() -> Self {
        Self { blocks: Vec::new(), untitled: 1, next_serial: 1 }
    }
}

impl Timeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild from restored blocks, continuing the untitled counter after
    /// the highest "untitled animation N" present.
    pub fn from_blocks(blocks: Vec<AnimationBlock>) -> Self {
        let untitled = blocks
            .iter()
            .filter_map(|b| untitled_number(&b.name))
            .max()
            .map_or(1, |n| n + 1);
        Self { next_serial: blocks.len() as u64 + 1, blocks, untitled }
    }

    pub fn blocks(&self) -> &[AnimationBlock] {
        &self.blocks
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn block(&self, id: &BlockId) -> Option<&AnimationBlock> {
        self.blocks.iter().find(|b| &b.id == id)
    }

    /// Find a block by id, falling back to an exact name match.
    pub fn find(&self, key: &str) -> Option<&AnimationBlock> {
        self.blocks
            .iter()
            .find(|b| b.id.as_str() == key)
            .or_else(|| self.blocks.iter().find(|b| b.name == key))
    }

    fn block_mut(&mut self, id: &BlockId) -> Result<&mut AnimationBlock, EngineError> {
        self.blocks
            .iter_mut()
            .find(|b| &b.id == id)
            .ok_or_else(|| EngineError::BlockNotFound(id.clone()))
    }

    fn fresh_id(&mut self) -> BlockId {
        loop {
            let id = BlockId::new(format!("anim-{}", self.next_serial));
            self.next_serial += 1;
            if self.block(&id).is_none() {
                return id;
            }
        }
    }

    /// Append an empty forward block named "untitled animation N".
    pub fn add_block(&mut self) -> BlockId {
        let id = self.fresh_id();
        let name = format!("{} {}", UNTITLED_PREFIX, self.untitled);
        self.untitled += 1;
        self.blocks.push(AnimationBlock {
            id: id.clone(),
            name,
            frames: Vec::new(),
            loop_mode: LoopMode::Forward,
        });
        id
    }

    pub fn remove_block(&mut self, id: &BlockId) -> Result<AnimationBlock, EngineError> {
        let idx = self
            .blocks
            .iter()
            .position(|b| &b.id == id)
            .ok_or_else(|| EngineError::BlockNotFound(id.clone()))?;
        let removed = self.blocks.remove(idx);
        if self.blocks.is_empty() {
            self.untitled = 1;
        }
        Ok(removed)
    }

    /// Rename a block. A blank name keeps the old one.
    pub fn rename_block(&mut self, id: &BlockId, name: &str) -> Result<(), EngineError> {
        let block = self.block_mut(id)?;
        let name = name.trim();
        if !name.is_empty() {
            block.name = name.to_string();
        }
        Ok(())
    }

    /// Append a 1-based frame reference, validated against the current store.
    pub fn add_frame_ref(
        &mut self,
        id: &BlockId,
        number: u32,
        frame_count: usize,
    ) -> Result<(), EngineError> {
        if number < 1 || number as usize > frame_count {
            return Err(EngineError::InvalidFrameNumber { number, frame_count });
        }
        self.block_mut(id)?.frames.push(number);
        Ok(())
    }

    /// Remove the reference at `position`. Returns whether one was removed.
    pub fn remove_frame_ref(&mut self, id: &BlockId, position: usize) -> Result<bool, EngineError> {
        let block = self.block_mut(id)?;
        if position >= block.frames.len() {
            return Ok(false);
        }
        block.frames.remove(position);
        Ok(true)
    }

    /// Move the reference at `from` to position `to` (clamped to the end).
    pub fn move_frame_ref(
        &mut self,
        id: &BlockId,
        from: usize,
        to: usize,
    ) -> Result<bool, EngineError> {
        let block = self.block_mut(id)?;
        if from >= block.frames.len() {
            return Ok(false);
        }
        let to = to.min(block.frames.len() - 1);
        if from == to {
            return Ok(false);
        }
        let moved = block.frames.remove(from);
        block.frames.insert(to, moved);
        Ok(true)
    }

    pub fn set_loop_mode(&mut self, id: &BlockId, mode: LoopMode) -> Result<(), EngineError> {
        self.block_mut(id)?.loop_mode = mode;
        Ok(())
    }

    /// Advance a block to its next loop mode and return it.
    pub fn cycle_loop_mode(&mut self, id: &BlockId) -> Result<LoopMode, EngineError> {
        let block = self.block_mut(id)?;
        block.loop_mode = block.loop_mode.next();
        Ok(block.loop_mode)
    }
}

fn untitled_number(name: &str) -> Option<u32> {
    let rest = name.get(..UNTITLED_PREFIX.len())?;
    if !rest.eq_ignore_ascii_case(UNTITLED_PREFIX) {
        return None;
    }
    name[UNTITLED_PREFIX.len()..].trim().parse().ok()
}
