// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
//! The two-phase visual transition run after a candidate is chosen.
//!
//! Each phase is a type; finishing one consumes it and yields the next, so
//! the commit cannot happen before both phases have completed.

use crate::pane::{CandidatePane, Emphasis, Slot};

/// Chosen pane fading in, the other fading out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fading {
    chosen: Slot,
}

/// Chosen pane widening, the other shrinking.  The discarded pane has
/// already been cleared.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resizing {
    chosen: Slot,
}

/// Both phases done; the chosen candidate may be committed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Commit {
    pub chosen: Slot,
}

/// Begin the transition by marking both panes.
pub fn start<P: CandidatePane>(chosen: Slot, panes: &mut [P; 2]) -> Fading {
    panes[chosen.index()].set_emphasis(Emphasis::Chosen);
    panes[chosen.other().index()].set_emphasis(Emphasis::Discarded);
    Fading { chosen }
}

impl Fading {
    pub fn chosen(&self) -> Slot {
        self.chosen
    }

    pub fn fade_complete<P: CandidatePane>(self, panes: &mut [P; 2]) -> Resizing {
        panes[self.chosen.other().index()].clear();
        Resizing { chosen: self.chosen }
    }
}

impl Resizing {
    pub fn chosen(&self) -> Slot {
        self.chosen
    }

    pub fn resize_complete(self) -> Commit {
        Commit { chosen: self.chosen }
    }
}

/// A running transition, as stored by the episode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Fading(Fading),
    Resizing(Resizing),
}

impl Transition {
    pub fn chosen(&self) -> Slot {
        match self {
            Transition::Fading(f) => f.chosen(),
            Transition::Resizing(r) => r.chosen(),
        }
    }

    /// The phase currently running.
    pub fn phase(&self) -> crate::Phase {
        match self {
            Transition::Fading(_) => crate::Phase::Fade,
            Transition::Resizing(_) => crate::Phase::Resize,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pane::{PaneContent, TextPane};

    fn panes() -> [TextPane; 2] {
        let mut p: [TextPane; 2] = Default::default();
        p[0].append("left text");
        p[1].append("right text");
        p
    }

    #[test]
    fn start_marks_chosen_and_discarded() {
        let mut p = panes();
        let f = start(Slot::Right, &mut p);
        assert_eq!(f.chosen(), Slot::Right);
        assert_eq!(p[1].emphasis, Emphasis::Chosen);
        assert_eq!(p[0].emphasis, Emphasis::Discarded);
    }

    #[test]
    fn fade_clears_only_the_discarded_pane() {
        let mut p = panes();
        let r = start(Slot::Left, &mut p).fade_complete(&mut p);
        assert_eq!(r.chosen(), Slot::Left);
        assert_eq!(p[0].content, PaneContent::Text("left text".into()));
        assert_eq!(p[1].content, PaneContent::Text(String::new()));
    }

    #[test]
    fn resize_yields_commit_for_chosen_slot() {
        let mut p = panes();
        let commit = start(Slot::Left, &mut p).fade_complete(&mut p).resize_complete();
        assert_eq!(commit, Commit { chosen: Slot::Left });
    }
}
