// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
//! Soft-wrapping for the document view.
//!
//! [`wrap_text`] turns a string and a character-index cursor into visual
//! lines and the `(row, col)` of the cursor in them.  Explicit newlines
//! always break; long lines wrap at a display-column limit, with wide
//! characters counted via `unicode_width`.

use unicode_width::UnicodeWidthChar;

/// Output of [`wrap_text`].
#[derive(Debug, PartialEq, Eq)]
pub struct WrapState {
    /// Always contains at least one element (possibly `""`).
    pub lines: Vec<String>,
    /// Row and display column of the cursor, if one was requested.
    pub cursor: Option<(usize, usize)>,
}

/// Wrap `content` into visual lines of at most `width` columns.
///
/// * `'\n'` always starts a new visual line.
/// * A character that would overflow `width` starts a new line.
/// * `width == 0` disables soft-wrapping.
/// * A cursor past the end is clamped to the end.
pub fn wrap_text(content: &str, width: usize, cursor: Option<usize>) -> WrapState {
    let total = content.chars().count();
    let cursor = cursor.map(|c| c.min(total));

    let mut lines: Vec<String> = Vec::new();
    let mut cur_line = String::new();
    let mut cur_col = 0usize;
    let mut placed = None;

    for (i, ch) in content.chars().enumerate() {
        let ch_width = if ch == '\n' { 0 } else { UnicodeWidthChar::width(ch).unwrap_or(1) };
        if width > 0 && ch != '\n' && ch_width > 0 && cur_col + ch_width > width {
            lines.push(std::mem::take(&mut cur_line));
            cur_col = 0;
        }
        if placed.is_none() && cursor == Some(i) {
            placed = Some((lines.len(), cur_col));
        }
        if ch == '\n' {
            lines.push(std::mem::take(&mut cur_line));
            cur_col = 0;
        } else {
            cur_line.push(ch);
            cur_col += ch_width;
        }
    }

    if placed.is_none() && cursor == Some(total) {
        // A full last line pushes the cursor onto the next visual line.
        placed = if width > 0 && cur_col >= width {
            Some((lines.len() + 1, 0))
        } else {
            Some((lines.len(), cur_col))
        };
    }
    lines.push(cur_line);

    if let Some((row, _)) = placed {
        while row >= lines.len() {
            lines.push(String::new());
        }
    }
    WrapState { lines, cursor: placed }
}

/// Number of visual lines `content` needs at `width`.
pub fn line_count(content: &str, width: usize) -> usize {
    wrap_text(content, width, None).lines.len()
}
