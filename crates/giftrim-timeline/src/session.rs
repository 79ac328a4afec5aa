//! An editing session: one timeline plus its undo history.

use crate::edit::{Command, CommandStack, HistoryError, HistoryState};
use crate::timeline::Timeline;
use giftrim_core::HistorySettings;
use tracing::info;

/// Owns the timeline being edited and the commands applied to it.
#[derive(Debug, Default)]
pub struct EditSession {
    timeline: Timeline,
    history: CommandStack,
}

impl EditSession {
    /// Start a session over `timeline` with history limits from `settings`.
    pub fn new(timeline: Timeline, settings: &HistorySettings) -> Self {
        Self {
            timeline,
            history: CommandStack::from_settings(settings),
        }
    }

    /// Replace the timeline, e.g. after importing a new source. Clears history.
    pub fn open(&mut self, timeline: Timeline) -> HistoryState {
        info!(frames = timeline.len(), "Opened timeline");
        self.timeline = timeline;
        self.history.clear()
    }

    /// The timeline in its current state.
    pub fn timeline(&self) -> &Timeline {
        &self.timeline
    }

    /// Hand the timeline over, e.g. to an encoder, ending the session.
    pub fn into_timeline(self) -> Timeline {
        self.timeline
    }

    pub fn execute(&mut self, command: Command) -> HistoryState {
        self.history.execute(&mut self.timeline, command)
    }

    pub fn undo(&mut self) -> Result<HistoryState, HistoryError> {
        self.history.undo(&mut self.timeline)
    }

    pub fn redo(&mut self) -> Result<HistoryState, HistoryError> {
        self.history.redo(&mut self.timeline)
    }

    pub fn history(&self) -> HistoryState {
        self.history.state()
    }
}
