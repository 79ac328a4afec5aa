//! Edit operations with undo/redo support.
//!
//! Uses the Command pattern: every user edit is a [`Command`] that applies
//! itself to a [`Timeline`] and records enough state to restore the exact
//! prior timeline on [`Command::invert`]. Commands either keep the inverse
//! parameters (deleted frames, previous durations) or, for whole-timeline
//! transforms, a full pre-image snapshot.
//!
//! [`CommandStack`] bounds history both by command count and by the summed
//! memory cost of the undo stack, evicting the oldest entries first.

use crate::ops;
use crate::optimize::aggressive_optimize;
use crate::timeline::{Frame, Timeline};
use giftrim_core::{HistorySettings, OptimizeSettings, PixelRect};
use serde::Serialize;
use std::ops::Range;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Bytes charged to a command that stores no frame data.
pub const COMMAND_OVERHEAD_BYTES: usize = std::mem::size_of::<Command>();

// ── Whole-timeline transforms ───────────────────────────────────

/// A whole-timeline frame operation with its parameters.
#[derive(Debug, Clone, PartialEq)]
pub enum TimelineOp {
    AdjustSpeed { multiplier: f64 },
    SetAllDuration { duration: f64 },
    Yoyo,
    RemoveEven,
    RemoveOdd,
    RemoveEveryNth { n: usize },
    RemoveSimilar { threshold: f64 },
    RemoveStaticSequences { threshold: f64 },
    MergeShortFrames { min_duration: f64 },
    ReduceFrameRate { target_ratio: f64 },
    AggressiveOptimize {
        target_size_kb: u64,
        settings: OptimizeSettings,
    },
    Crop { rect: PixelRect },
    Resize { max_width: u32 },
}

impl TimelineOp {
    /// Run the operation.
    pub fn apply(&self, timeline: &mut Timeline) {
        match self {
            Self::AdjustSpeed { multiplier } => ops::adjust_speed(timeline, *multiplier),
            Self::SetAllDuration { duration } => ops::set_all_duration(timeline, *duration),
            Self::Yoyo => ops::yoyo(timeline),
            Self::RemoveEven => ops::remove_even(timeline),
            Self::RemoveOdd => ops::remove_odd(timeline),
            Self::RemoveEveryNth { n } => ops::remove_every_nth(timeline, *n),
            Self::RemoveSimilar { threshold } => ops::remove_similar(timeline, *threshold),
            Self::RemoveStaticSequences { threshold } => {
                ops::remove_static_sequences(timeline, *threshold)
            }
            Self::MergeShortFrames { min_duration } => {
                ops::merge_short_frames(timeline, *min_duration)
            }
            Self::ReduceFrameRate { target_ratio } => {
                ops::reduce_frame_rate(timeline, *target_ratio)
            }
            Self::AggressiveOptimize {
                target_size_kb,
                settings,
            } => {
                aggressive_optimize(timeline, *target_size_kb, settings);
            }
            Self::Crop { rect } => ops::crop(timeline, *rect),
            Self::Resize { max_width } => ops::resize(timeline, *max_width),
        }
    }

    /// Human-readable label.
    pub fn label(&self) -> String {
        match self {
            Self::AdjustSpeed { multiplier } => format!("Change Speed ×{multiplier:.2}"),
            Self::SetAllDuration { duration } => format!("Set All Durations to {duration:.3}s"),
            Self::Yoyo => "Yoyo".into(),
            Self::RemoveEven => "Remove Even Frames".into(),
            Self::RemoveOdd => "Remove Odd Frames".into(),
            Self::RemoveEveryNth { n } => format!("Remove Every Nth Frame (n = {n})"),
            Self::RemoveSimilar { .. } => "Remove Similar Frames".into(),
            Self::RemoveStaticSequences { .. } => "Remove Static Sequences".into(),
            Self::MergeShortFrames { .. } => "Merge Short Frames".into(),
            Self::ReduceFrameRate { .. } => "Reduce Frame Rate".into(),
            Self::AggressiveOptimize { target_size_kb, .. } => {
                format!("Optimize to {target_size_kb} KB")
            }
            Self::Crop { .. } => "Crop".into(),
            Self::Resize { max_width } => format!("Resize to {max_width}px"),
        }
    }
}

// ── Commands ────────────────────────────────────────────────────

/// A reversible edit of the timeline.
#[derive(Debug, Clone)]
pub enum Command {
    /// Delete the frame at `index`.
    DeleteFrame {
        index: usize,
        /// Stored for undo, populated when the command is applied.
        removed: Option<Frame>,
    },
    /// Delete a range of frames (clamped to the timeline).
    DeleteRange {
        range: Range<usize>,
        /// Clamped start and removed frames, populated when applied.
        removed: Option<(usize, Vec<Frame>)>,
    },
    /// Move a frame so it ends up at `to`.
    MoveFrame {
        from: usize,
        to: usize,
        moved: bool,
    },
    /// Insert a copy of a frame right after it.
    DuplicateFrame { index: usize, inserted: bool },
    /// Set one frame's duration.
    SetFrameDuration {
        index: usize,
        duration: f64,
        /// Previous duration, populated when applied.
        previous: Option<f64>,
    },
    /// Reverse playback order. Self-inverse.
    Reverse,
    /// Any whole-timeline operation, undone from a snapshot.
    Transform {
        op: TimelineOp,
        /// Pre-image, populated when applied.
        before: Option<Timeline>,
    },
}

impl Command {
    pub fn delete_frame(index: usize) -> Self {
        Self::DeleteFrame {
            index,
            removed: None,
        }
    }

    pub fn delete_range(range: Range<usize>) -> Self {
        Self::DeleteRange {
            range,
            removed: None,
        }
    }

    pub fn move_frame(from: usize, to: usize) -> Self {
        Self::MoveFrame {
            from,
            to,
            moved: false,
        }
    }

    pub fn duplicate_frame(index: usize) -> Self {
        Self::DuplicateFrame {
            index,
            inserted: false,
        }
    }

    pub fn set_frame_duration(index: usize, duration: f64) -> Self {
        Self::SetFrameDuration {
            index,
            duration,
            previous: None,
        }
    }

    pub fn transform(op: TimelineOp) -> Self {
        Self::Transform { op, before: None }
    }

    /// Apply this command to a timeline, mutating it in place.
    ///
    /// Mutable `&mut self` because variants record what they need for undo.
    pub fn apply(&mut self, timeline: &mut Timeline) {
        match self {
            Self::DeleteFrame { index, removed } => {
                *removed = ops::delete_frame(timeline, *index);
            }
            Self::DeleteRange { range, removed } => {
                *removed = ops::clamp_range(timeline, range.clone()).and_then(|clamped| {
                    let start = clamped.start;
                    let frames = ops::delete_range(timeline, clamped);
                    (!frames.is_empty()).then_some((start, frames))
                });
            }
            Self::MoveFrame { from, to, moved } => {
                *moved = ops::move_frame(timeline, *from, *to);
            }
            Self::DuplicateFrame { index, inserted } => {
                *inserted = ops::duplicate_frame(timeline, *index);
            }
            Self::SetFrameDuration {
                index,
                duration,
                previous,
            } => {
                *previous = ops::set_frame_duration(timeline, *index, *duration);
            }
            Self::Reverse => ops::reverse(timeline),
            Self::Transform { op, before } => {
                *before = Some(timeline.clone());
                op.apply(timeline);
            }
        }
    }

    /// Restore the timeline to its state before the last [`Command::apply`].
    pub fn invert(&mut self, timeline: &mut Timeline) {
        match self {
            Self::DeleteFrame { index, removed } => {
                if let Some(frame) = removed.take() {
                    timeline.frames_mut().insert(*index, frame);
                }
            }
            Self::DeleteRange { removed, .. } => {
                if let Some((start, frames)) = removed.take() {
                    let frames_mut = timeline.frames_mut();
                    let tail = frames_mut.split_off(start.min(frames_mut.len()));
                    frames_mut.extend(frames);
                    frames_mut.extend(tail);
                }
            }
            Self::MoveFrame { from, to, moved } => {
                if std::mem::take(moved) {
                    ops::move_frame(timeline, *to, *from);
                }
            }
            Self::DuplicateFrame { index, inserted } => {
                if std::mem::take(inserted) {
                    timeline.frames_mut().remove(*index + 1);
                }
            }
            Self::SetFrameDuration {
                index, previous, ..
            } => {
                if let Some(previous) = previous.take() {
                    if let Some(frame) = timeline.frames_mut().get_mut(*index) {
                        frame.duration = previous;
                    }
                }
            }
            Self::Reverse => ops::reverse(timeline),
            Self::Transform { before, .. } => {
                if let Some(snapshot) = before.take() {
                    *timeline = snapshot;
                }
            }
        }
    }

    /// Human-readable label for menus.
    pub fn label(&self) -> String {
        match self {
            Self::DeleteFrame { .. } => "Delete Frame".into(),
            Self::DeleteRange { .. } => "Delete Frames".into(),
            Self::MoveFrame { .. } => "Move Frame".into(),
            Self::DuplicateFrame { .. } => "Duplicate Frame".into(),
            Self::SetFrameDuration { .. } => "Set Frame Duration".into(),
            Self::Reverse => "Reverse".into(),
            Self::Transform { op, .. } => op.label(),
        }
    }

    /// Bytes currently held for undo.
    pub fn memory_cost(&self) -> usize {
        let stored = match self {
            Self::DeleteFrame {
                removed: Some(frame),
                ..
            } => frame.memory_size(),
            Self::DeleteRange {
                removed: Some((_, frames)),
                ..
            } => frames.iter().map(Frame::memory_size).sum(),
            Self::Transform {
                before: Some(snapshot),
                ..
            } => snapshot.memory_size(),
            _ => 0,
        };
        COMMAND_OVERHEAD_BYTES + stored
    }

    /// Cost this command will have once applied to `timeline`.
    pub fn estimated_cost(&self, timeline: &Timeline) -> usize {
        let stored = match self {
            Self::DeleteFrame { index, .. } if timeline.len() > 1 => {
                timeline.get(*index).map_or(0, Frame::memory_size)
            }
            Self::DeleteRange { range, .. } => ops::clamp_range(timeline, range.clone())
                .filter(|r| r.len() < timeline.len())
                .map_or(0, |r| {
                    timeline.frames()[r].iter().map(Frame::memory_size).sum()
                }),
            Self::Transform { .. } => timeline.memory_size(),
            _ => 0,
        };
        COMMAND_OVERHEAD_BYTES + stored
    }
}

// ── History ─────────────────────────────────────────────────────

/// Benign failures of undo/redo.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum HistoryError {
    #[error("nothing to undo")]
    NothingToUndo,
    #[error("nothing to redo")]
    NothingToRedo,
}

/// Snapshot of history availability, returned after every transition.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct HistoryState {
    pub can_undo: bool,
    pub can_redo: bool,
    pub undo_label: Option<String>,
    pub redo_label: Option<String>,
    pub undo_count: usize,
    pub redo_count: usize,
    /// Summed memory cost of the undo stack in bytes.
    pub memory_usage: usize,
}

#[derive(Debug)]
struct HistoryEntry {
    command: Command,
    cost: usize,
}

/// Undo/redo history over a single timeline.
///
/// Single-writer: wrap it in a mutex if it must be reached from several threads.
#[derive(Debug)]
pub struct CommandStack {
    /// Applied commands (most recent last).
    undo: Vec<HistoryEntry>,
    /// Undone commands (most recent last).
    redo: Vec<Command>,
    max_commands: usize,
    memory_ceiling: usize,
    memory_usage: usize,
}

impl CommandStack {
    /// Create a stack bounded by command count and undo memory.
    pub fn new(max_commands: usize, memory_ceiling: usize) -> Self {
        Self {
            undo: Vec::new(),
            redo: Vec::new(),
            max_commands: max_commands.max(1),
            memory_ceiling,
            memory_usage: 0,
        }
    }

    pub fn from_settings(settings: &HistorySettings) -> Self {
        Self::new(settings.max_commands, settings.memory_ceiling_bytes)
    }

    /// Apply `command` to `timeline` and record it.
    ///
    /// Oldest entries are evicted until the new command fits under the memory
    /// ceiling. A command that alone exceeds the ceiling is applied but cannot
    /// be undone, and the remaining history is dropped. The redo stack is
    /// always cleared.
    pub fn execute(&mut self, timeline: &mut Timeline, mut command: Command) -> HistoryState {
        self.redo.clear();

        let estimate = command.estimated_cost(timeline);
        if estimate > self.memory_ceiling {
            warn!(
                label = %command.label(),
                cost = estimate,
                ceiling = self.memory_ceiling,
                "Command exceeds history memory ceiling; applying without undo"
            );
            command.apply(timeline);
            self.undo.clear();
            self.memory_usage = 0;
            return self.state();
        }

        while !self.undo.is_empty() && self.memory_usage + estimate > self.memory_ceiling {
            self.evict_oldest();
        }

        command.apply(timeline);
        let cost = command.memory_cost();
        debug!(label = %command.label(), cost, "Executed command");
        self.push_undo(command, cost);
        self.state()
    }

    /// Undo the most recent command.
    pub fn undo(&mut self, timeline: &mut Timeline) -> Result<HistoryState, HistoryError> {
        let HistoryEntry { mut command, cost } =
            self.undo.pop().ok_or(HistoryError::NothingToUndo)?;
        self.memory_usage -= cost;
        command.invert(timeline);
        debug!(label = %command.label(), "Undid command");
        self.redo.push(command);
        Ok(self.state())
    }

    /// Re-apply the most recently undone command.
    pub fn redo(&mut self, timeline: &mut Timeline) -> Result<HistoryState, HistoryError> {
        let mut command = self.redo.pop().ok_or(HistoryError::NothingToRedo)?;
        command.apply(timeline);
        let cost = command.memory_cost();
        debug!(label = %command.label(), "Redid command");
        self.push_undo(command, cost);
        Ok(self.state())
    }

    /// Empty both stacks, e.g. when a new source is opened.
    pub fn clear(&mut self) -> HistoryState {
        self.undo.clear();
        self.redo.clear();
        self.memory_usage = 0;
        self.state()
    }

    /// Current availability snapshot.
    pub fn state(&self) -> HistoryState {
        HistoryState {
            can_undo: self.can_undo(),
            can_redo: self.can_redo(),
            undo_label: self.undo_label(),
            redo_label: self.redo_label(),
            undo_count: self.undo.len(),
            redo_count: self.redo.len(),
            memory_usage: self.memory_usage,
        }
    }

    pub fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    /// Label of the command [`CommandStack::undo`] would revert.
    pub fn undo_label(&self) -> Option<String> {
        self.undo.last().map(|e| e.command.label())
    }

    /// Label of the command [`CommandStack::redo`] would re-apply.
    pub fn redo_label(&self) -> Option<String> {
        self.redo.last().map(Command::label)
    }

    pub fn undo_count(&self) -> usize {
        self.undo.len()
    }

    pub fn redo_count(&self) -> usize {
        self.redo.len()
    }

    /// Summed memory cost of the undo stack in bytes.
    pub fn memory_usage(&self) -> usize {
        self.memory_usage
    }

    pub fn memory_ceiling(&self) -> usize {
        self.memory_ceiling
    }

    fn push_undo(&mut self, command: Command, cost: usize) {
        self.undo.push(HistoryEntry { command, cost });
        self.memory_usage += cost;

        // Keep the newest entry; anything older may go.
        while self.undo.len() > self.max_commands
            || (self.undo.len() > 1 && self.memory_usage > self.memory_ceiling)
        {
            self.evict_oldest();
        }
    }

    fn evict_oldest(&mut self) {
        if self.undo.is_empty() {
            return;
        }
        let entry = self.undo.remove(0);
        self.memory_usage -= entry.cost;
        info!(label = %entry.command.label(), cost = entry.cost, "Evicted undo history");
    }
}

impl Default for CommandStack {
    fn default() -> Self {
        Self::from_settings(&HistorySettings::default())
    }
}

// ── Tests ───────────────────────────────────────────────────────
