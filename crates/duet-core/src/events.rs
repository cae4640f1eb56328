// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
use crate::pane::{PaneUpdate, Slot};

/// How a candidate stream ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionOutcome {
    /// Stream reached a paragraph boundary or ended normally.
    Finished(String),
    /// Aborted by the episode before the stream ended.
    Canceled,
    /// Request or stream error, already formatted for display.
    Failed(String),
}

/// Pane text for a candidate whose request was aborted.
pub const ABORTED_MESSAGE: &str = "request aborted";

impl SessionOutcome {
    /// Text this outcome contributes as a candidate.  Aborts and failures
    /// count as empty.
    pub fn candidate_text(&self) -> &str {
        match self {
            SessionOutcome::Finished(t) => t,
            SessionOutcome::Canceled | SessionOutcome::Failed(_) => "",
        }
    }

    /// Error text the pane shows in place of the candidate, if any.
    pub fn error_message(&self) -> Option<&str> {
        match self {
            SessionOutcome::Finished(_) => None,
            SessionOutcome::Canceled => Some(ABORTED_MESSAGE),
            SessionOutcome::Failed(m) => Some(m),
        }
    }
}

/// Messages from the two session tasks to the episode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    Pane(Slot, PaneUpdate),
    Settled(Slot, SessionOutcome),
}

/// Keys the episode interprets.  Everything else is the front end's
/// business.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EpisodeKey {
    /// Start generating at the cursor.
    Trigger,
    /// Leave the episode, keeping the buffer as it was.
    Cancel,
    /// Undo the last edit and generate again.
    Up,
    /// Generate again at the same cursor.
    Down,
    Left,
    Right,
}

/// Whether a key was used by the episode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyDisposition {
    /// Let normal editing handle the key.
    PassThrough,
    Consumed,
}

/// The two visual phases after a candidate is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Fade,
    Resize,
}

/// Coarse view of the episode state for front ends and logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EpisodePhase {
    Editing,
    Generating,
    Canceling,
    WaitingForChoice,
    Transitioning,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum EpisodeError {
    #[error("no transition is running")]
    NoTransition,
    #[error("{got:?} phase completed while waiting for {expected:?}")]
    PhaseOutOfOrder { expected: Phase, got: Phase },
}
