// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
//! Timing for the fade and resize phases after a candidate is chosen.

use std::time::{Duration, Instant};

use duet_config::TransitionConfig;
use duet_core::{Phase, Slot};

/// Clock for the transition phase currently shown on screen.
#[derive(Debug, Clone, Copy)]
pub struct TransitionAnimation {
    pub chosen: Slot,
    pub phase: Phase,
    started: Instant,
    duration: Duration,
}

impl TransitionAnimation {
    pub fn start(chosen: Slot, phase: Phase, config: &TransitionConfig, now: Instant) -> Self {
        let ms = match phase {
            Phase::Fade => config.fade_ms,
            Phase::Resize => config.resize_ms,
        };
        Self { chosen, phase, started: now, duration: Duration::from_millis(ms) }
    }

    /// Whether this clock belongs to the given running transition.
    pub fn tracks(&self, chosen: Slot, phase: Phase) -> bool {
        self.chosen == chosen && self.phase == phase
    }

    /// Progress through the phase in `0.0..=1.0`.
    pub fn progress(&self, now: Instant) -> f32 {
        if self.duration.is_zero() {
            return 1.0;
        }
        let elapsed = now.saturating_duration_since(self.started);
        (elapsed.as_secs_f32() / self.duration.as_secs_f32()).min(1.0)
    }

    pub fn is_done(&self, now: Instant) -> bool {
        self.progress(now) >= 1.0
    }

    /// Visual state of the split block at `now`.
    pub fn split(&self, now: Instant) -> Split {
        let p = self.progress(now);
        let (fade, widen) = match self.phase {
            Phase::Fade => (p, 0.0),
            Phase::Resize => (1.0, p),
        };
        let chosen_pct = 50 + (50.0 * widen).round() as u16;
        let left_pct = match self.chosen {
            Slot::Left => chosen_pct,
            Slot::Right => 100 - chosen_pct,
        };
        Split { left_pct, fade, chosen: Some(self.chosen) }
    }
}

/// How the two candidate panes share the block.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Split {
    /// Width share of the left pane, in percent.
    pub left_pct: u16,
    /// How far the discarded pane has faded, `0.0..=1.0`.
    pub fade: f32,
    pub chosen: Option<Slot>,
}

impl Default for Split {
    fn default() -> Self {
        Self { left_pct: 50, fade: 0.0, chosen: None }
    }
}
