// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
use tokio::sync::mpsc;

use crate::events::SessionEvent;

/// Which of the two candidate panes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Slot {
    Left,
    Right,
}

impl Slot {
    pub const ALL: [Slot; 2] = [Slot::Left, Slot::Right];

    pub fn index(self) -> usize {
        match self {
            Slot::Left => 0,
            Slot::Right => 1,
        }
    }

    pub fn other(self) -> Slot {
        match self {
            Slot::Left => Slot::Right,
            Slot::Right => Slot::Left,
        }
    }
}

impl std::fmt::Display for Slot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Slot::Left => write!(f, "left"),
            Slot::Right => write!(f, "right"),
        }
    }
}

/// Visual marking applied when a candidate is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Emphasis {
    #[default]
    None,
    Chosen,
    Discarded,
}

/// A passive presentation slot for one candidate.
pub trait CandidatePane {
    /// Reset to the waiting state, dropping text and decorations.
    fn show_loading(&mut self);
    fn clear(&mut self);
    fn append(&mut self, text: &str);
    fn mark_empty(&mut self);
    fn show_error(&mut self, message: &str);
    fn set_emphasis(&mut self, emphasis: Emphasis);
}

/// What a [`TextPane`] currently shows.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum PaneContent {
    #[default]
    Loading,
    Text(String),
    Empty,
    Error(String),
}

/// Marker rendered for a candidate that produced no text.
pub const EMPTY_MARKER: &str = "[empty]";

/// Retained-mode pane: keeps its content for a renderer to draw.
#[derive(Debug, Clone, Default)]
pub struct TextPane {
    pub content: PaneContent,
    pub emphasis: Emphasis,
}

impl TextPane {
    /// Text a renderer should draw, `None` while loading.
    pub fn display_text(&self) -> Option<&str> {
        match &self.content {
            PaneContent::Loading => None,
            PaneContent::Text(t) => Some(t),
            PaneContent::Empty => Some(EMPTY_MARKER),
            PaneContent::Error(e) => Some(e),
        }
    }

    pub fn is_loading(&self) -> bool {
        self.content == PaneContent::Loading
    }
}

impl CandidatePane for TextPane {
    fn show_loading(&mut self) {
        self.content = PaneContent::Loading;
        self.emphasis = Emphasis::None;
    }

    fn clear(&mut self) {
        self.content = PaneContent::Text(String::new());
    }

    fn append(&mut self, text: &str) {
        match &mut self.content {
            PaneContent::Text(t) => t.push_str(text),
            other => *other = PaneContent::Text(text.to_string()),
        }
    }

    fn mark_empty(&mut self) {
        self.content = PaneContent::Empty;
    }

    fn show_error(&mut self, message: &str) {
        self.content = PaneContent::Error(message.to_string());
    }

    fn set_emphasis(&mut self, emphasis: Emphasis) {
        self.emphasis = emphasis;
    }
}

/// Incremental update a session sends to its pane.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaneUpdate {
    Clear,
    Append(String),
    Empty,
}

/// Write-only handle from a session to its pane.
///
/// Updates travel over the episode's channel and are applied to the pane by
/// the episode, which also keeps the placeholder in view.
#[derive(Debug, Clone)]
pub struct PaneHandle {
    slot: Slot,
    tx: mpsc::Sender<SessionEvent>,
}

impl PaneHandle {
    pub fn new(slot: Slot, tx: mpsc::Sender<SessionEvent>) -> Self {
        Self { slot, tx }
    }

    pub fn slot(&self) -> Slot {
        self.slot
    }

    /// Send an update.  A closed channel means the episode moved on; the
    /// update is dropped.
    pub async fn send(&self, update: PaneUpdate) {
        let _ = self.tx.send(SessionEvent::Pane(self.slot, update)).await;
    }

    pub(crate) async fn settle(&self, outcome: crate::events::SessionOutcome) {
        let _ = self.tx.send(SessionEvent::Settled(self.slot, outcome)).await;
    }
}
