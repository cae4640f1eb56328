// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    Frame,
};

use crate::wrap::wrap_text;

/// The regions that make up the TUI layout.
#[derive(Debug, Clone, Copy)]
pub struct AppLayout {
    pub document: Rect,
    pub status_bar: Rect,
}

impl AppLayout {
    pub fn compute(area: Rect) -> Self {
        let vertical = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(3), Constraint::Length(1)])
            .split(area);
        AppLayout { document: vertical[0], status_bar: vertical[1] }
    }

    pub fn new(frame: &Frame) -> Self {
        Self::compute(frame.area())
    }
}

/// The document cut into visual rows around the candidate block.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct DocumentRows {
    /// Rows above the block (the whole document when there is no block).
    pub before: Vec<String>,
    /// Height of the candidate block, 0 when there is none.
    pub block_height: usize,
    pub after: Vec<String>,
    /// Cursor `(row, col)`, only while editing.
    pub cursor: Option<(usize, usize)>,
}

impl DocumentRows {
    /// Split `contents` (which ends with a line break) at the placeholder.
    pub fn plan(
        contents: &str,
        placeholder: Option<usize>,
        cursor: Option<usize>,
        width: usize,
        block_height: usize,
    ) -> Self {
        let chars: Vec<char> = contents.chars().collect();
        let Some(p) = placeholder.filter(|p| *p < chars.len()) else {
            let body = strip_break(&chars);
            let wrapped = wrap_text(&body, width, cursor);
            return Self { before: wrapped.lines, cursor: wrapped.cursor, ..Self::default() };
        };

        let before = if p == 0 { Vec::new() } else { wrap_text(&strip_break(&chars[..p]), width, None).lines };
        let tail = strip_break(&chars[p + 1..]);
        let after = if tail.is_empty() { Vec::new() } else { wrap_text(&tail, width, None).lines };
        Self { before, block_height, after, cursor: None }
    }

    pub fn block_top(&self) -> usize {
        self.before.len()
    }

    pub fn total_rows(&self) -> usize {
        self.before.len() + self.block_height + self.after.len()
    }

    /// Row range that must stay visible: the block if present, else the
    /// cursor row.
    pub fn focus_rows(&self) -> Option<(usize, usize)> {
        if self.block_height > 0 {
            Some((self.block_top(), self.block_height))
        } else {
            self.cursor.map(|(row, _)| (row, 1))
        }
    }
}

fn strip_break(chars: &[char]) -> String {
    let chars = chars.strip_suffix(&['\n']).unwrap_or(chars);
    chars.iter().collect()
}

/// Smallest scroll change that shows `height` rows starting at `top` in a
/// view of `view` rows.  A target taller than the view is shown from its
/// top.
pub fn scroll_to_show(scroll: usize, top: usize, height: usize, view: usize) -> usize {
    if view == 0 {
        return top;
    }
    if top < scroll {
        top
    } else if top + height > scroll + view {
        (top + height).saturating_sub(view).min(top)
    } else {
        scroll
    }
}
