//! Playback state machine for animation blocks.
//!
//! The [`Player`] owns its [`Scheduler`]; nothing ticks unless the host feeds
//! elapsed time into [`Player::advance`], and the scheduler is disarmed on
//! every transition out of [`PlaybackState::Playing`].

use std::time::Duration;

use crate::error::EngineError;
use crate::timeline::{build_play_sequence, AnimationBlock, BlockId};

/// Lowest accepted playback rate.
pub const MIN_FPS: u32 = 1;
/// Highest accepted playback rate.
pub const MAX_FPS: u32 = 120;
/// Rate used when none is configured.
pub const DEFAULT_FPS: u32 = 12;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaybackState {
    /// No block selected
    #[default]
    Idle,
    /// Block selected and sequence built, not advancing
    Paused,
    /// Advancing on the scheduler
    Playing,
}

/// Fixed-interval timer driven by explicit elapsed time.
#[derive(Debug, Clone)]
pub struct Scheduler {
    period: Duration,
    elapsed: Duration,
    armed: bool,
}

impl Scheduler {
    pub fn new(fps: u32) -> Self {
        Self { period: period_for(fps), elapsed: Duration::ZERO, armed: false }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    pub fn set_fps(&mut self, fps: u32) {
        self.period = period_for(fps);
        self.elapsed = Duration::ZERO;
    }

    pub fn arm(&mut self) {
        self.armed = true;
        self.elapsed = Duration::ZERO;
    }

    pub fn disarm(&mut self) {
        self.armed = false;
        self.elapsed = Duration::ZERO;
    }

    pub fn is_armed(&self) -> bool {
        self.armed
    }

    /// Feed elapsed time; returns how many whole periods passed.
    ///
    /// The remainder carries over to the next call. A disarmed scheduler
    /// never fires.
    pub fn advance(&mut self, dt: Duration) -> u32 {
        if !self.armed {
            return 0;
        }
        self.elapsed += dt;
        let period = self.period.as_nanos().max(1);
        let ticks = self.elapsed.as_nanos() / period;
        let consumed = ticks * period;
        self.elapsed = Duration::from_nanos((self.elapsed.as_nanos() - consumed) as u64);
        u32::try_from(ticks).unwrap_or(u32::MAX)
    }
}

/// Clamp a requested rate into the supported range.
pub fn clamp_fps(fps: u32) -> u32 {
    fps.clamp(MIN_FPS, MAX_FPS)
}

fn period_for(fps: u32) -> Duration {
    Duration::from_micros(1_000_000 / u64::from(clamp_fps(fps)))
}

/// Plays one selected animation block at a time.
#[derive(Debug, Clone)]
pub struct Player {
    block: Option<BlockId>,
    block_name: String,
    sequence: Vec<usize>,
    position: usize,
    state: PlaybackState,
    fps: u32,
    scheduler: Scheduler,
}

impl Default for Player {
    fn default() -> Self {
        Self::new(DEFAULT_FPS)
    }
}

impl Player {
    pub fn new(fps: u32) -> Self {
        let fps = clamp_fps(fps);
        Self {
            block: None,
            block_name: String::new(),
            sequence: Vec::new(),
            position: 0,
            state: PlaybackState::Idle,
            fps,
            scheduler: Scheduler::new(fps),
        }
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn selected(&self) -> Option<&BlockId> {
        self.block.as_ref()
    }

    pub fn sequence(&self) -> &[usize] {
        &self.sequence
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn fps(&self) -> u32 {
        self.fps
    }

    /// Time between frames at the current rate.
    pub fn frame_period(&self) -> Duration {
        self.scheduler.period()
    }

    pub fn is_timer_armed(&self) -> bool {
        self.scheduler.is_armed()
    }

    /// Global frame index at the current position.
    pub fn current_frame(&self) -> Option<usize> {
        self.sequence.get(self.position).copied()
    }

    /// Select a block for playback; it starts paused at the first position.
    pub fn select(&mut self, block: &AnimationBlock, frame_count: usize) {
        self.scheduler.disarm();
        self.block = Some(block.id.clone());
        self.block_name = block.name.clone();
        self.sequence = build_play_sequence(block, frame_count);
        self.position = 0;
        self.state = PlaybackState::Paused;
        log::debug!("selected animation '{}' ({} steps)", block.name, self.sequence.len());
    }

    pub fn deselect(&mut self) {
        self.scheduler.disarm();
        self.block = None;
        self.block_name.clear();
        self.sequence.clear();
        self.position = 0;
        self.state = PlaybackState::Idle;
    }

    /// Drop the selection if `id` was the selected block.
    pub fn on_block_removed(&mut self, id: &BlockId) {
        if self.block.as_ref() == Some(id) {
            self.deselect();
        }
    }

    fn empty_sequence(&self) -> EngineError {
        EngineError::EmptySequence { block: self.block_name.clone() }
    }

    /// Paused ⇄ Playing. Fails without arming the timer when the sequence is
    /// empty. Does nothing while idle.
    pub fn toggle_play(&mut self) -> Result<PlaybackState, EngineError> {
        match self.state {
            PlaybackState::Idle => {}
            PlaybackState::Paused => {
                if self.sequence.is_empty() {
                    return Err(self.empty_sequence());
                }
                self.scheduler.arm();
                self.state = PlaybackState::Playing;
                log::debug!("playing '{}' at {} fps", self.block_name, self.fps);
            }
            PlaybackState::Playing => self.stop(),
        }
        Ok(self.state)
    }

    pub fn stop(&mut self) {
        self.scheduler.disarm();
        if self.state == PlaybackState::Playing {
            self.state = PlaybackState::Paused;
            log::debug!("paused '{}'", self.block_name);
        }
    }

    /// Rebuild after the block or the frame count changed.
    ///
    /// The position is clamped into the new sequence and playback continues,
    /// unless the sequence became empty while playing.
    pub fn refresh(&mut self, block: &AnimationBlock, frame_count: usize) -> Result<(), EngineError> {
        if self.block.as_ref() != Some(&block.id) {
            return Ok(());
        }
        self.block_name = block.name.clone();
        self.sequence = build_play_sequence(block, frame_count);
        self.position = self.position.min(self.sequence.len().saturating_sub(1));
        if self.sequence.is_empty() && self.state == PlaybackState::Playing {
            self.stop();
            return Err(self.empty_sequence());
        }
        Ok(())
    }

    fn seek(&mut self, position: usize) -> Option<usize> {
        if self.sequence.is_empty() {
            return None;
        }
        self.position = position % self.sequence.len();
        self.current_frame()
    }

    pub fn next(&mut self) -> Option<usize> {
        self.seek(self.position + 1)
    }

    pub fn prev(&mut self) -> Option<usize> {
        let len = self.sequence.len();
        self.seek((self.position + len.saturating_sub(1)) % len.max(1))
    }

    pub fn first(&mut self) -> Option<usize> {
        self.seek(0)
    }

    pub fn last(&mut self) -> Option<usize> {
        self.seek(self.sequence.len().saturating_sub(1))
    }

    /// Feed elapsed time. Returns the frame to show when the position moved.
    pub fn advance(&mut self, dt: Duration) -> Option<usize> {
        if self.state != PlaybackState::Playing || self.sequence.is_empty() {
            return None;
        }
        let ticks = self.scheduler.advance(dt) as usize;
        if ticks == 0 {
            return None;
        }
        self.seek(self.position + ticks % self.sequence.len())
    }

    /// Set the rate, clamped into `[MIN_FPS, MAX_FPS]`. Returns the rate used.
    pub fn set_fps(&mut self, fps: u32) -> u32 {
        self.fps = clamp_fps(fps);
        self.scheduler.set_fps(self.fps);
        self.fps
    }
}
