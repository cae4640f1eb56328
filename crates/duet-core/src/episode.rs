// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
use std::mem;
use std::sync::Arc;

use duet_model::ModelProvider;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};

use crate::buffer::{BufferAdapter, PlaceholderSpan};
use crate::events::{
    EpisodeError, EpisodeKey, EpisodePhase, KeyDisposition, Phase, SessionEvent, SessionOutcome,
};
use crate::pane::{CandidatePane, PaneHandle, PaneUpdate, Slot, TextPane};
use crate::session;
use crate::transition::{self, Commit, Transition};

/// Capacity of the per-episode session channel.
const SESSION_CHANNEL_CAPACITY: usize = 64;

/// Where the episode was triggered and where its placeholder sits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Anchor {
    cursor: usize,
    span: PlaceholderSpan,
}

/// Two sessions in flight.  Dropping a flight closes the channel and
/// cancels whatever is still running.
struct Flight {
    anchor: Anchor,
    events: mpsc::Receiver<SessionEvent>,
    cancels: [Option<oneshot::Sender<()>>; 2],
    outcomes: [Option<SessionOutcome>; 2],
}

impl Flight {
    fn cancel_all(&mut self) {
        for cancel in self.cancels.iter_mut() {
            if let Some(tx) = cancel.take() {
                let _ = tx.send(());
            }
        }
    }

    fn settled(&self) -> bool {
        self.outcomes.iter().all(Option::is_some)
    }

    fn into_candidates(self) -> [String; 2] {
        self.outcomes
            .map(|o| o.map(|o| o.candidate_text().to_string()).unwrap_or_default())
    }
}

/// Action deferred until a cancellation has settled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FollowUp {
    /// Remove the placeholder and return to editing.
    Discard,
    /// Undo the last edit and generate again from the restored cursor.
    Undo,
    /// Generate again at the same cursor.
    Regenerate,
    Choose(Slot),
}

impl FollowUp {
    fn for_key(key: EpisodeKey) -> Option<Self> {
        match key {
            EpisodeKey::Trigger => None,
            EpisodeKey::Cancel => Some(FollowUp::Discard),
            EpisodeKey::Up => Some(FollowUp::Undo),
            EpisodeKey::Down => Some(FollowUp::Regenerate),
            EpisodeKey::Left => Some(FollowUp::Choose(Slot::Left)),
            EpisodeKey::Right => Some(FollowUp::Choose(Slot::Right)),
        }
    }
}

enum EpisodeState {
    Editing,
    Generating(Flight),
    /// Cancel signals sent; the follow-up runs once both sessions settle.
    Canceling(Flight, FollowUp),
    WaitingForChoice(Anchor, [String; 2]),
    Transitioning(Anchor, [String; 2], Transition),
}

/// Single-flight orchestrator for two-candidate generation.
///
/// Owns the editing surface adapter and the two panes.  Keys go in through
/// [`handle_key`](Self::handle_key); session traffic is pulled with
/// [`next_session_event`](Self::next_session_event) and fed back through
/// [`handle_session_event`](Self::handle_session_event); the front end
/// reports animation progress with [`phase_complete`](Self::phase_complete).
///
/// Starting generation spawns Tokio tasks, so keys must be handled from
/// within a runtime.
pub struct GenerationEpisode<B: BufferAdapter, P: CandidatePane = TextPane> {
    buffer: B,
    panes: [P; 2],
    provider: Arc<dyn ModelProvider>,
    state: EpisodeState,
}

impl<B: BufferAdapter, P: CandidatePane + Default> GenerationEpisode<B, P> {
    pub fn new(buffer: B, provider: Arc<dyn ModelProvider>) -> Self {
        Self::with_panes(buffer, [P::default(), P::default()], provider)
    }
}

impl<B: BufferAdapter, P: CandidatePane> GenerationEpisode<B, P> {
    pub fn with_panes(buffer: B, panes: [P; 2], provider: Arc<dyn ModelProvider>) -> Self {
        Self { buffer, panes, provider, state: EpisodeState::Editing }
    }

    // ── Accessors ────────────────────────────────────────────────────────────

    pub fn buffer(&self) -> &B {
        &self.buffer
    }

    /// Direct access for the front end's own editing.  Only meaningful while
    /// [`is_editing`](Self::is_editing) holds.
    pub fn buffer_mut(&mut self) -> &mut B {
        &mut self.buffer
    }

    pub fn pane(&self, slot: Slot) -> &P {
        &self.panes[slot.index()]
    }

    pub fn phase(&self) -> EpisodePhase {
        match self.state {
            EpisodeState::Editing => EpisodePhase::Editing,
            EpisodeState::Generating(_) => EpisodePhase::Generating,
            EpisodeState::Canceling(..) => EpisodePhase::Canceling,
            EpisodeState::WaitingForChoice(..) => EpisodePhase::WaitingForChoice,
            EpisodeState::Transitioning(..) => EpisodePhase::Transitioning,
        }
    }

    pub fn is_editing(&self) -> bool {
        matches!(self.state, EpisodeState::Editing)
    }

    /// True while sessions are running or settling.
    pub fn is_in_flight(&self) -> bool {
        matches!(self.state, EpisodeState::Generating(_) | EpisodeState::Canceling(..))
    }

    /// Placeholder bounds while an episode is active.
    pub fn placeholder(&self) -> Option<PlaceholderSpan> {
        self.anchor().map(|a| a.span)
    }

    /// Collected candidates, once both sessions have settled.
    pub fn candidates(&self) -> Option<&[String; 2]> {
        match &self.state {
            EpisodeState::WaitingForChoice(_, c) | EpisodeState::Transitioning(_, c, _) => Some(c),
            _ => None,
        }
    }

    /// Chosen slot and running phase of the transition, if any.
    pub fn transition(&self) -> Option<(Slot, Phase)> {
        match &self.state {
            EpisodeState::Transitioning(_, _, t) => Some((t.chosen(), t.phase())),
            _ => None,
        }
    }

    fn anchor(&self) -> Option<Anchor> {
        match &self.state {
            EpisodeState::Editing => None,
            EpisodeState::Generating(f) | EpisodeState::Canceling(f, _) => Some(f.anchor),
            EpisodeState::WaitingForChoice(a, _) | EpisodeState::Transitioning(a, _, _) => Some(*a),
        }
    }

    // ── Input ────────────────────────────────────────────────────────────────

    /// Route an episode key.
    ///
    /// While editing, only [`EpisodeKey::Trigger`] is consumed; every other
    /// key passes through to normal editing.  Once an episode is active all
    /// episode keys are consumed, and they are ignored while a cancellation
    /// or transition is running.
    pub fn handle_key(&mut self, key: EpisodeKey) -> KeyDisposition {
        let Some(follow_up) = FollowUp::for_key(key) else {
            if self.is_editing() {
                self.start();
            }
            return KeyDisposition::Consumed;
        };
        if self.is_editing() {
            return KeyDisposition::PassThrough;
        }
        self.request(follow_up);
        KeyDisposition::Consumed
    }

    fn request(&mut self, follow_up: FollowUp) {
        match mem::replace(&mut self.state, EpisodeState::Editing) {
            EpisodeState::Generating(mut flight) => {
                debug!(?follow_up, "canceling candidates");
                flight.cancel_all();
                self.state = EpisodeState::Canceling(flight, follow_up);
            }
            EpisodeState::WaitingForChoice(anchor, candidates) => {
                self.run_follow_up(follow_up, anchor, candidates);
            }
            other => {
                debug!(?follow_up, "ignored while canceling or transitioning");
                self.state = other;
            }
        }
    }

    // ── Session traffic ──────────────────────────────────────────────────────

    /// Next message from the running sessions.
    ///
    /// Pending forever when nothing is in flight, so it can sit in a
    /// `select!` next to terminal input.  `None` means every session task
    /// has gone away; pass that to
    /// [`handle_session_closed`](Self::handle_session_closed).  Cancel safe.
    pub async fn next_session_event(&mut self) -> Option<SessionEvent> {
        match &mut self.state {
            EpisodeState::Generating(f) | EpisodeState::Canceling(f, _) => f.events.recv().await,
            _ => std::future::pending().await,
        }
    }

    pub fn handle_session_event(&mut self, event: SessionEvent) {
        match event {
            SessionEvent::Pane(slot, update) => self.apply_update(slot, update),
            SessionEvent::Settled(slot, outcome) => self.settle(slot, outcome),
        }
    }

    /// Settle any session that vanished without reporting.
    pub fn handle_session_closed(&mut self) {
        let missing: Vec<Slot> = match &self.state {
            EpisodeState::Generating(f) | EpisodeState::Canceling(f, _) => Slot::ALL
                .into_iter()
                .filter(|s| f.outcomes[s.index()].is_none())
                .collect(),
            _ => return,
        };
        for slot in missing {
            warn!(%slot, "session ended without reporting");
            self.settle(slot, SessionOutcome::Failed("candidate stream ended unexpectedly".into()));
        }
    }

    /// Drive session traffic until nothing is in flight.
    ///
    /// A follow-up that starts a new generation keeps the loop going.
    pub async fn pump(&mut self) {
        while self.is_in_flight() {
            match self.next_session_event().await {
                Some(event) => self.handle_session_event(event),
                None => self.handle_session_closed(),
            }
        }
    }

    fn apply_update(&mut self, slot: Slot, update: PaneUpdate) {
        let Some(anchor) = self.anchor().filter(|_| self.is_in_flight()) else {
            return;
        };
        let pane = &mut self.panes[slot.index()];
        match update {
            PaneUpdate::Clear => pane.clear(),
            PaneUpdate::Append(text) => pane.append(&text),
            PaneUpdate::Empty => pane.mark_empty(),
        }
        self.buffer.scroll_into_view(anchor.span);
    }

    fn settle(&mut self, slot: Slot, outcome: SessionOutcome) {
        let flight = match &mut self.state {
            EpisodeState::Generating(f) | EpisodeState::Canceling(f, _) => f,
            _ => return,
        };
        if flight.outcomes[slot.index()].is_some() {
            return;
        }
        debug!(%slot, ?outcome, "candidate settled");
        if let Some(message) = outcome.error_message() {
            self.panes[slot.index()].show_error(message);
            self.buffer.scroll_into_view(flight.anchor.span);
        }
        flight.outcomes[slot.index()] = Some(outcome);
        flight.cancels[slot.index()] = None;
        if flight.settled() {
            self.finish_flight();
        }
    }

    fn finish_flight(&mut self) {
        let (flight, follow_up) = match mem::replace(&mut self.state, EpisodeState::Editing) {
            EpisodeState::Generating(f) => (f, None),
            EpisodeState::Canceling(f, follow_up) => (f, Some(follow_up)),
            other => {
                self.state = other;
                return;
            }
        };
        let anchor = flight.anchor;
        let candidates = flight.into_candidates();
        match follow_up {
            None => {
                debug!("both candidates ready");
                self.state = EpisodeState::WaitingForChoice(anchor, candidates);
            }
            Some(follow_up) => self.run_follow_up(follow_up, anchor, candidates),
        }
    }

    // ── Transitions ──────────────────────────────────────────────────────────

    /// Report that a visual phase of the transition finished.
    ///
    /// Phases must arrive as fade then resize; anything else is ignored and
    /// reported as an error.  Completing the resize commits the chosen
    /// candidate and immediately generates again from the new cursor.
    pub fn phase_complete(&mut self, phase: Phase) -> Result<(), EpisodeError> {
        let (anchor, candidates, running) = match mem::replace(&mut self.state, EpisodeState::Editing) {
            EpisodeState::Transitioning(a, c, t) => (a, c, t),
            other => {
                self.state = other;
                return Err(EpisodeError::NoTransition);
            }
        };
        match (running, phase) {
            (Transition::Fading(fading), Phase::Fade) => {
                let resizing = fading.fade_complete(&mut self.panes);
                self.state = EpisodeState::Transitioning(anchor, candidates, Transition::Resizing(resizing));
                Ok(())
            }
            (Transition::Resizing(resizing), Phase::Resize) => {
                self.commit(anchor, candidates, resizing.resize_complete());
                Ok(())
            }
            (running, got) => {
                let expected = running.phase();
                self.state = EpisodeState::Transitioning(anchor, candidates, running);
                Err(EpisodeError::PhaseOutOfOrder { expected, got })
            }
        }
    }

    fn run_follow_up(&mut self, follow_up: FollowUp, anchor: Anchor, candidates: [String; 2]) {
        debug!(?follow_up, "running follow-up");
        let span = anchor.span;
        match follow_up {
            FollowUp::Discard => {
                self.buffer.delete_range(span.start, span.len);
                self.settle_editing();
            }
            FollowUp::Undo => {
                self.buffer.delete_range(span.start, span.len);
                self.buffer.enable();
                self.buffer.undo();
                self.restart();
            }
            FollowUp::Regenerate => {
                self.buffer.delete_range(span.start, span.len);
                self.restart();
            }
            FollowUp::Choose(slot) => {
                self.buffer.scroll_into_view(span);
                let fading = transition::start(slot, &mut self.panes);
                self.state = EpisodeState::Transitioning(anchor, candidates, Transition::Fading(fading));
            }
        }
    }

    fn commit(&mut self, anchor: Anchor, candidates: [String; 2], commit: Commit) {
        let [left, right] = candidates;
        let text = match commit.chosen {
            Slot::Left => left,
            Slot::Right => right,
        };
        debug!(slot = %commit.chosen, len = text.len(), "committing candidate");
        self.buffer.delete_range(anchor.span.start, anchor.span.len);
        self.buffer.insert_text(anchor.cursor, &text);
        self.restart();
    }

    // ── Starting ─────────────────────────────────────────────────────────────

    /// Generate again; settle in editing if there is nowhere to generate.
    fn restart(&mut self) {
        if !self.start() {
            self.settle_editing();
        }
    }

    fn settle_editing(&mut self) {
        self.state = EpisodeState::Editing;
        self.buffer.enable();
        self.buffer.focus();
    }

    /// Fan out two sessions at the cursor.  Returns false, touching nothing,
    /// when there is no collapsed selection on a valid line.
    fn start(&mut self) -> bool {
        let Some(selection) = self.buffer.selection().filter(|s| s.is_collapsed()) else {
            debug!("trigger ignored: no collapsed selection");
            return false;
        };
        let cursor = selection.index;
        let Some(line) = self.buffer.line(cursor) else {
            debug!(cursor, "trigger ignored: cursor outside the document");
            return false;
        };

        let prompt = self.buffer.text(0, cursor);
        let span = PlaceholderSpan::for_cursor(cursor, &line);
        self.buffer.disable();
        self.buffer.insert_placeholder(span.start);
        self.buffer.scroll_into_view(span);
        for pane in self.panes.iter_mut() {
            pane.show_loading();
        }

        let (tx, rx) = mpsc::channel(SESSION_CHANNEL_CAPACITY);
        let cancels = Slot::ALL.map(|slot| {
            Some(session::spawn(PaneHandle::new(slot, tx.clone()), self.provider.clone(), prompt.clone()))
        });
        debug!(cursor, span_start = span.start, span_len = span.len, "generation started");
        self.state = EpisodeState::Generating(Flight {
            anchor: Anchor { cursor, span },
            events: rx,
            cancels,
            outcomes: [None, None],
        });
        true
    }
}
