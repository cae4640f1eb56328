// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
mod buffer;
mod episode;
mod events;
mod memory;
mod pane;
mod paragraph;
mod session;
mod transition;

pub use buffer::{BufferAdapter, LineInfo, PlaceholderSpan, Selection};
pub use episode::GenerationEpisode;
pub use events::{
    EpisodeError, ABORTED_MESSAGE, EpisodeKey, EpisodePhase, KeyDisposition, Phase, SessionEvent, SessionOutcome,
};
pub use memory::{MemoryBuffer, PLACEHOLDER};
pub use pane::{CandidatePane, Emphasis, PaneContent, PaneHandle, PaneUpdate, Slot, TextPane, EMPTY_MARKER};
pub use paragraph::{DisplayUpdate, ParagraphFilter};
pub use session::{spawn as spawn_session, StreamSession};
pub use transition::{Commit, Fading, Resizing, Transition};
