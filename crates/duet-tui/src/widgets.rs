// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Paragraph, Wrap},
    Frame,
};

use duet_core::{EpisodePhase, PaneContent, Slot, TextPane};

use crate::animation::Split;
use crate::layout::DocumentRows;
use crate::wrap::line_count;

const SPINNER: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

pub fn spinner_frame(tick: usize) -> &'static str {
    SPINNER[tick % SPINNER.len()]
}

// ── Status bar ────────────────────────────────────────────────────────────────

fn phase_hint(phase: EpisodePhase) -> &'static str {
    match phase {
        EpisodePhase::Editing => "Ctrl+Enter: continue   Ctrl+Z: undo   Ctrl+Q: quit",
        EpisodePhase::Generating => "generating…   ←/→: choose   ↓: retry   ↑: undo + retry   Esc: cancel",
        EpisodePhase::Canceling => "canceling…",
        EpisodePhase::WaitingForChoice => "←/→: choose   ↓: retry   ↑: undo + retry   Esc: cancel",
        EpisodePhase::Transitioning => "inserting…",
    }
}

/// Draw the one-line status bar.
pub fn draw_status(frame: &mut Frame, area: Rect, model_name: &str, phase: EpisodePhase, busy: Option<&str>) {
    let busy_span = match busy {
        Some(frame_char) => Span::styled(format!(" {frame_char} "), Style::default().fg(Color::Yellow)),
        None => Span::raw("   "),
    };
    let line = Line::from(vec![
        busy_span,
        Span::styled(model_name.to_string(), Style::default().fg(Color::Cyan)),
        Span::styled(" │ ", Style::default().fg(Color::DarkGray)),
        Span::styled(phase_hint(phase), Style::default().fg(Color::Gray)),
    ]);
    frame.render_widget(Paragraph::new(line).style(Style::default().bg(Color::Black)), area);
}

// ── Document ──────────────────────────────────────────────────────────────────

/// Everything needed to draw the document view for one frame.
pub struct DocumentView<'a> {
    pub rows: &'a DocumentRows,
    pub scroll: usize,
    pub panes: [&'a TextPane; 2],
    pub split: Split,
    pub spinner: &'static str,
    /// Dimmed hint shown while the document is empty.
    pub hint: Option<&'a str>,
}

/// Draw the document with the candidate block in place of the placeholder.
pub fn draw_document(frame: &mut Frame, area: Rect, view: &DocumentView<'_>) {
    let rows = view.rows;
    let height = area.height as usize;

    for screen_row in 0..height {
        let row = view.scroll + screen_row;
        let text = if row < rows.before.len() {
            &rows.before[row]
        } else if row >= rows.block_top() + rows.block_height {
            match rows.after.get(row - rows.block_top() - rows.block_height) {
                Some(t) => t,
                None => break,
            }
        } else {
            continue;
        };
        let rect = Rect::new(area.x, area.y + screen_row as u16, area.width, 1);
        frame.render_widget(Paragraph::new(text.as_str()), rect);
    }

    if let Some(hint) = view.hint {
        let rect = Rect::new(area.x, area.y, area.width, 1.min(area.height));
        frame.render_widget(
            Paragraph::new(hint).style(Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC)),
            rect,
        );
    }

    if rows.block_height > 0 {
        if let Some(rect) = block_rect(area, rows.block_top(), rows.block_height, view.scroll) {
            draw_candidates(frame, rect, view.panes, view.split, view.spinner);
        }
    }

    if let Some((row, col)) = rows.cursor {
        if row >= view.scroll && row < view.scroll + height {
            let x = area.x + (col as u16).min(area.width.saturating_sub(1));
            frame.set_cursor_position((x, area.y + (row - view.scroll) as u16));
        }
    }
}

/// Screen rectangle of the block, clipped to the view.
fn block_rect(area: Rect, top: usize, height: usize, scroll: usize) -> Option<Rect> {
    let view_end = scroll + area.height as usize;
    let start = top.max(scroll);
    let end = (top + height).min(view_end);
    if start >= end {
        return None;
    }
    Some(Rect::new(area.x, area.y + (start - scroll) as u16, area.width, (end - start) as u16))
}

/// Height of the candidate block for a given total width: the taller pane
/// plus borders.
pub fn block_height(panes: [&TextPane; 2], split: Split, width: u16) -> usize {
    let [left_w, right_w] = pane_widths(split, width);
    let inner = |w: u16| w.saturating_sub(2) as usize;
    let rows = |pane: &TextPane, w: u16| match pane.display_text() {
        Some(t) if w > 2 => line_count(t, inner(w)),
        _ => 1,
    };
    rows(panes[0], left_w).max(rows(panes[1], right_w)).max(1) + 2
}

fn pane_widths(split: Split, width: u16) -> [u16; 2] {
    let left = (width as u32 * split.left_pct as u32 / 100) as u16;
    [left, width - left]
}

// ── Candidate panes ───────────────────────────────────────────────────────────

fn draw_candidates(frame: &mut Frame, area: Rect, panes: [&TextPane; 2], split: Split, spinner: &'static str) {
    let halves = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(split.left_pct), Constraint::Percentage(100 - split.left_pct)])
        .split(area);

    for slot in Slot::ALL {
        let rect = halves[slot.index()];
        if rect.width < 3 {
            continue;
        }
        let discarded = split.chosen.is_some_and(|c| c != slot);
        let chosen = split.chosen == Some(slot);
        let block = candidate_block(slot, chosen, discarded, split.fade);
        let inner = block.inner(rect);
        frame.render_widget(block, rect);

        let pane = panes[slot.index()];
        let mut style = content_style(&pane.content);
        if discarded && split.fade > 0.0 {
            style = style.add_modifier(Modifier::DIM);
            if split.fade >= 0.5 {
                style = style.fg(Color::DarkGray);
            }
        }
        let text = pane.display_text().unwrap_or(spinner);
        frame.render_widget(Paragraph::new(text).style(style).wrap(Wrap { trim: false }), inner);
    }
}

fn candidate_block(slot: Slot, chosen: bool, discarded: bool, fade: f32) -> Block<'static> {
    let title = match slot {
        Slot::Left => " ← ",
        Slot::Right => " → ",
    };
    let border_style = if chosen {
        Style::default().fg(Color::LightGreen)
    } else if discarded && fade >= 0.5 {
        Style::default().fg(Color::Black)
    } else if discarded {
        Style::default().fg(Color::DarkGray)
    } else {
        Style::default().fg(Color::LightBlue)
    };
    Block::default()
        .title(Span::styled(title, border_style.add_modifier(Modifier::BOLD)))
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(border_style)
}

fn content_style(content: &PaneContent) -> Style {
    match content {
        PaneContent::Loading => Style::default().fg(Color::Yellow),
        PaneContent::Text(_) => Style::default(),
        PaneContent::Empty => Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
        PaneContent::Error(_) => Style::default().fg(Color::Red),
    }
}
