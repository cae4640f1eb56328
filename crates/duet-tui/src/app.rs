// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
//! Top-level TUI application state and event loop.

use std::sync::Arc;
use std::time::{Duration, Instant};

use crossterm::event::{Event, EventStream};
use duet_config::Config;
use duet_core::{EpisodeKey, GenerationEpisode, KeyDisposition, MemoryBuffer, Phase, Slot, TextPane};
use duet_model::ModelProvider;
use futures::StreamExt;
use ratatui::{DefaultTerminal, Frame};
use tokio::time::MissedTickBehavior;
use tracing::{debug, warn};

use crate::animation::{Split, TransitionAnimation};
use crate::keys::{map_key, Action};
use crate::layout::{scroll_to_show, AppLayout, DocumentRows};
use crate::widgets::{block_height, draw_document, draw_status, spinner_frame, DocumentView};

/// Redraw interval while an episode is active.
const FRAME: Duration = Duration::from_millis(33);

/// Options passed when constructing the TUI app.
#[derive(Debug, Default)]
pub struct AppOptions {
    /// Text to seed the document with.  Never written back.
    pub initial_text: Option<String>,
}

/// The top-level TUI application state.
pub struct App {
    config: Arc<Config>,
    pub(crate) episode: GenerationEpisode<MemoryBuffer, TextPane>,
    model_name: String,
    /// Index of the first visible document row.
    scroll: usize,
    /// Animation frame counter, advanced while an episode is active.
    tick: usize,
    animation: Option<TransitionAnimation>,
}

impl App {
    pub fn new(config: Arc<Config>, provider: Arc<dyn ModelProvider>, opts: AppOptions) -> Self {
        let buffer = MemoryBuffer::new(opts.initial_text.as_deref().unwrap_or(""));
        let model_name = provider.model_name().to_string();
        Self {
            config,
            episode: GenerationEpisode::new(buffer, provider),
            model_name,
            scroll: 0,
            tick: 0,
            animation: None,
        }
    }

    pub async fn run(mut self, mut terminal: DefaultTerminal) -> anyhow::Result<()> {
        let mut crossterm_events = EventStream::new();
        let mut frames = tokio::time::interval(FRAME);
        frames.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            terminal.draw(|frame| self.draw(frame))?;

            tokio::select! {
                ev = self.episode.next_session_event() => match ev {
                    Some(ev) => self.episode.handle_session_event(ev),
                    None => self.episode.handle_session_closed(),
                },
                Some(Ok(term_event)) = crossterm_events.next() => {
                    if self.handle_term_event(term_event) { break; }
                }
                _ = frames.tick(), if !self.episode.is_editing() => {
                    self.on_tick(Instant::now());
                }
            }
        }
        Ok(())
    }

    /// Returns true when the app should quit.
    fn handle_term_event(&mut self, event: Event) -> bool {
        match event {
            Event::Key(key) => match map_key(key) {
                Some(action) => self.dispatch(action),
                None => false,
            },
            Event::Paste(text) if self.episode.is_editing() => {
                self.episode.buffer_mut().paste(&text);
                false
            }
            _ => false,
        }
    }

    pub(crate) fn dispatch(&mut self, action: Action) -> bool {
        if let Action::Quit = action {
            return true;
        }
        if let Action::Episode(key) = action {
            if self.episode.handle_key(key) == KeyDisposition::PassThrough {
                let buffer = self.episode.buffer_mut();
                match key {
                    EpisodeKey::Up => buffer.move_up(),
                    EpisodeKey::Down => buffer.move_down(),
                    EpisodeKey::Left => buffer.move_left(),
                    EpisodeKey::Right => buffer.move_right(),
                    EpisodeKey::Cancel | EpisodeKey::Trigger => {}
                }
            }
            return false;
        }
        if !self.episode.is_editing() {
            debug!(?action, "input swallowed while generating");
            return false;
        }

        let buffer = self.episode.buffer_mut();
        match action {
            Action::InputChar(c) => buffer.type_char(c),
            Action::InputNewline => buffer.type_char('\n'),
            Action::InputBackspace => buffer.backspace(),
            Action::InputDelete => buffer.delete_forward(),
            Action::MoveLineStart => buffer.move_home(),
            Action::MoveLineEnd => buffer.move_end(),
            Action::Undo => buffer.undo_edit(),
            Action::Episode(_) | Action::Quit => {}
        }
        false
    }

    /// Advance the spinner and drive the transition phases.
    pub(crate) fn on_tick(&mut self, now: Instant) {
        self.tick = self.tick.wrapping_add(1);
        let Some((chosen, phase)) = self.episode.transition() else {
            self.animation = None;
            return;
        };
        let animation = match self.animation {
            Some(a) if a.tracks(chosen, phase) => a,
            _ => {
                let a = TransitionAnimation::start(chosen, phase, &self.config.transition, now);
                self.animation = Some(a);
                a
            }
        };
        if animation.is_done(now) {
            if let Err(e) = self.episode.phase_complete(phase) {
                warn!(error = %e, "transition phase rejected");
            }
        }
    }

    fn split(&self, now: Instant) -> Split {
        match (self.animation, self.episode.transition()) {
            (Some(a), Some((chosen, phase))) if a.tracks(chosen, phase) => a.split(now),
            (_, Some((chosen, phase))) => Split {
                left_pct: 50,
                fade: if phase == Phase::Resize { 1.0 } else { 0.0 },
                chosen: Some(chosen),
            },
            _ => Split::default(),
        }
    }

    pub(crate) fn draw(&mut self, frame: &mut Frame) {
        let layout = AppLayout::new(frame);
        let area = layout.document;
        let split = self.split(Instant::now());
        let spinner = spinner_frame(self.tick);

        let panes = [self.episode.pane(Slot::Left), self.episode.pane(Slot::Right)];
        let buffer = self.episode.buffer();
        let editing = self.episode.is_editing();
        let placeholder = buffer.placeholder_offset();
        let block = if placeholder.is_some() { block_height(panes, split, area.width) } else { 0 };
        let cursor = if editing { buffer.cursor() } else { None };
        let rows = DocumentRows::plan(&buffer.contents(), placeholder, cursor, area.width as usize, block);

        if let Some((top, height)) = rows.focus_rows() {
            self.scroll = scroll_to_show(self.scroll, top, height, area.height as usize);
        }
        let hint = (editing && buffer.is_empty()).then_some(self.config.editor.placeholder.as_str());

        let view = DocumentView { rows: &rows, scroll: self.scroll, panes, split, spinner, hint };
        draw_document(frame, area, &view);
        let busy = self.episode.is_in_flight().then_some(spinner);
        draw_status(frame, layout.status_bar, &self.model_name, self.episode.phase(), busy);
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
