// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use duet_core::EpisodeKey;

/// Logical actions, independent of key binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Keys the generation episode interprets.  Arrows and Escape fall back
    /// to the editing action below when no episode is active.
    Episode(EpisodeKey),

    InputChar(char),
    InputNewline,
    InputBackspace,
    InputDelete,
    MoveLineStart,
    MoveLineEnd,
    Undo,

    Quit,
}

/// Map a raw key event to an [`Action`].
pub fn map_key(event: KeyEvent) -> Option<Action> {
    // Release events arrive when the terminal reports event types.
    if event.kind == KeyEventKind::Release {
        return None;
    }
    let ctrl = event.modifiers.contains(KeyModifiers::CONTROL);
    let alt = event.modifiers.contains(KeyModifiers::ALT);
    let plain = !ctrl && !alt;

    match event.code {
        KeyCode::Char('q') if ctrl => Some(Action::Quit),
        KeyCode::Char('c') if ctrl => Some(Action::Quit),

        // Ctrl+Enter needs keyboard enhancement; Alt+Enter and Ctrl+J work
        // on terminals without it.
        KeyCode::Enter if ctrl || alt => Some(Action::Episode(EpisodeKey::Trigger)),
        KeyCode::Char('j') if ctrl => Some(Action::Episode(EpisodeKey::Trigger)),

        KeyCode::Esc => Some(Action::Episode(EpisodeKey::Cancel)),
        KeyCode::Up => Some(Action::Episode(EpisodeKey::Up)),
        KeyCode::Down => Some(Action::Episode(EpisodeKey::Down)),
        KeyCode::Left => Some(Action::Episode(EpisodeKey::Left)),
        KeyCode::Right => Some(Action::Episode(EpisodeKey::Right)),

        KeyCode::Char('z') if ctrl => Some(Action::Undo),
        KeyCode::Enter => Some(Action::InputNewline),
        KeyCode::Backspace => Some(Action::InputBackspace),
        KeyCode::Delete => Some(Action::InputDelete),
        KeyCode::Home => Some(Action::MoveLineStart),
        KeyCode::End => Some(Action::MoveLineEnd),
        KeyCode::Tab => Some(Action::InputChar('\t')),
        KeyCode::Char(c) if plain => Some(Action::InputChar(c)),
        _ => None,
    }
}
