// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
//! In-memory editing surface.
//!
//! Follows the line model the orchestrator expects: the document always ends
//! with a line break, every line includes its break, and the placeholder is a
//! single block unit that forces a line break when inserted mid-line.  The
//! terminal front end edits through it and the episode tests drive it.

use crate::buffer::{BufferAdapter, LineInfo, PlaceholderSpan, Selection};

/// Character standing in for the placeholder block.
pub const PLACEHOLDER: char = '\u{FFFC}';

#[derive(Debug, Clone)]
struct Snapshot {
    chars: Vec<char>,
    cursor: usize,
}

/// Plain-text buffer with a caret, an enabled flag and snapshot undo.
#[derive(Debug, Clone)]
pub struct MemoryBuffer {
    chars: Vec<char>,
    /// `None` while the surface has no caret (never focused).
    cursor: Option<usize>,
    selection_len: usize,
    enabled: bool,
    focused: bool,
    history: Vec<Snapshot>,
    /// True while consecutive keystrokes extend one undo step.
    typing: bool,
    last_scroll: Option<PlaceholderSpan>,
}

impl Default for MemoryBuffer {
    fn default() -> Self {
        Self::new("")
    }
}

impl MemoryBuffer {
    /// Buffer holding `text` with the caret at the end of the content.
    pub fn new(text: &str) -> Self {
        let mut chars: Vec<char> = text.chars().filter(|c| *c != PLACEHOLDER).collect();
        if chars.last() != Some(&'\n') {
            chars.push('\n');
        }
        let cursor = chars.len() - 1;
        Self {
            chars,
            cursor: Some(cursor),
            selection_len: 0,
            enabled: true,
            focused: true,
            history: Vec::new(),
            typing: false,
            last_scroll: None,
        }
    }

    /// Whole document including the trailing line break.
    pub fn contents(&self) -> String {
        self.chars.iter().collect()
    }

    /// Document without the trailing line break the line model requires.
    pub fn content_text(&self) -> String {
        let s = self.contents();
        s.strip_suffix('\n').map(str::to_string).unwrap_or(s)
    }

    pub fn len(&self) -> usize {
        self.chars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chars.len() <= 1
    }

    pub fn cursor(&self) -> Option<usize> {
        self.cursor
    }

    pub fn set_cursor(&mut self, index: usize) {
        self.cursor = Some(index.min(self.chars.len().saturating_sub(1)));
        self.selection_len = 0;
        self.typing = false;
    }

    pub fn set_selection(&mut self, selection: Option<Selection>) {
        match selection {
            Some(s) => {
                self.set_cursor(s.index);
                self.selection_len = s.len;
            }
            None => self.cursor = None,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn is_focused(&self) -> bool {
        self.focused
    }

    pub fn undo_depth(&self) -> usize {
        self.history.len()
    }

    /// Offset of the placeholder block, if one is present.
    pub fn placeholder_offset(&self) -> Option<usize> {
        self.chars.iter().position(|c| *c == PLACEHOLDER)
    }

    pub fn last_scroll(&self) -> Option<PlaceholderSpan> {
        self.last_scroll
    }

    /// Logical lines for display, without their breaks.
    pub fn lines(&self) -> Vec<String> {
        let text = self.contents();
        let body = text.strip_suffix('\n').unwrap_or(&text);
        body.split('\n').map(str::to_string).collect()
    }

    // ── User editing (no-ops while disabled) ─────────────────────────────────

    pub fn type_char(&mut self, c: char) {
        if !self.enabled || c == PLACEHOLDER {
            return;
        }
        let Some(cursor) = self.cursor else { return };
        if !self.typing || c == '\n' {
            self.checkpoint();
            self.typing = c != '\n';
        }
        self.chars.insert(cursor, c);
        self.cursor = Some(cursor + 1);
    }

    pub fn backspace(&mut self) {
        if !self.enabled {
            return;
        }
        let Some(cursor) = self.cursor else { return };
        if cursor == 0 {
            return;
        }
        self.checkpoint();
        self.typing = false;
        self.chars.remove(cursor - 1);
        self.cursor = Some(cursor - 1);
    }

    pub fn delete_forward(&mut self) {
        if !self.enabled {
            return;
        }
        let Some(cursor) = self.cursor else { return };
        // The trailing break is structural.
        if cursor + 1 >= self.chars.len() {
            return;
        }
        self.checkpoint();
        self.typing = false;
        self.chars.remove(cursor);
    }

    /// Insert pasted plain text at the caret as one undo step.
    ///
    /// One line is one paragraph here, so the blank line that separates
    /// paragraphs in ordinary prose collapses to a single break.
    pub fn paste(&mut self, text: &str) {
        if !self.enabled {
            return;
        }
        let Some(cursor) = self.cursor else { return };
        let text = normalize_paste(text);
        if text.is_empty() {
            return;
        }
        self.checkpoint();
        self.typing = false;
        let chars: Vec<char> = text.chars().collect();
        self.chars.splice(cursor..cursor, chars.iter().copied());
        self.cursor = Some(cursor + chars.len());
    }

    pub fn move_left(&mut self) {
        if let Some(c) = self.cursor.filter(|_| self.enabled) {
            self.set_cursor(c.saturating_sub(1));
        }
    }

    pub fn move_right(&mut self) {
        if let Some(c) = self.cursor.filter(|_| self.enabled) {
            self.set_cursor(c + 1);
        }
    }

    pub fn move_home(&mut self) {
        if let Some(line) = self.caret_line() {
            self.set_cursor(line.start);
        }
    }

    pub fn move_end(&mut self) {
        if let Some(line) = self.caret_line() {
            self.set_cursor(line.start + line.len - 1);
        }
    }

    pub fn move_up(&mut self) {
        let Some(line) = self.caret_line() else { return };
        if line.start == 0 {
            self.set_cursor(0);
            return;
        }
        if let Some(prev) = self.line(line.start - 1) {
            self.set_cursor(prev.start + line.offset.min(prev.len - 1));
        }
    }

    pub fn move_down(&mut self) {
        let Some(line) = self.caret_line() else { return };
        let next_start = line.start + line.len;
        match self.line(next_start) {
            Some(next) => self.set_cursor(next_start + line.offset.min(next.len - 1)),
            None => self.set_cursor(line.start + line.len - 1),
        }
    }

    /// Undo triggered from the keyboard.
    pub fn undo_edit(&mut self) {
        if self.enabled {
            BufferAdapter::undo(self);
        }
    }

    fn caret_line(&self) -> Option<LineInfo> {
        if !self.enabled {
            return None;
        }
        self.line(self.cursor?)
    }

    fn checkpoint(&mut self) {
        self.history.push(Snapshot {
            chars: self.chars.clone(),
            cursor: self.cursor.unwrap_or(0),
        });
    }

    fn splice(&mut self, offset: usize, insert: &[char]) {
        let offset = offset.min(self.chars.len());
        self.chars.splice(offset..offset, insert.iter().copied());
        // API inserts at or before the caret push it along.
        if let Some(c) = self.cursor {
            if c >= offset {
                self.cursor = Some(c + insert.len());
            }
        }
    }
}

fn normalize_paste(text: &str) -> String {
    text.replace("\r\n", "\n")
        .replace('\r', "\n")
        .replace("\n\n", "\n")
        .chars()
        .filter(|c| *c != PLACEHOLDER)
        .collect()
}

impl BufferAdapter for MemoryBuffer {
    fn selection(&self) -> Option<Selection> {
        self.cursor.map(|index| Selection { index, len: self.selection_len })
    }

    fn text(&self, from: usize, to: usize) -> String {
        let to = to.min(self.chars.len());
        let from = from.min(to);
        self.chars[from..to].iter().collect()
    }

    fn line(&self, offset: usize) -> Option<LineInfo> {
        if offset >= self.chars.len() {
            return None;
        }
        let start = self.chars[..offset]
            .iter()
            .rposition(|c| *c == '\n')
            .map(|i| i + 1)
            .unwrap_or(0);
        let end = self.chars[offset..]
            .iter()
            .position(|c| *c == '\n')
            .map(|i| offset + i + 1)
            .unwrap_or(self.chars.len());
        Some(LineInfo { start, len: end - start, offset: offset - start })
    }

    fn insert_placeholder(&mut self, offset: usize) {
        let mid_line = offset > 0
            && offset <= self.chars.len()
            && self.chars[offset - 1] != '\n';
        if mid_line {
            self.splice(offset, &['\n', PLACEHOLDER]);
        } else {
            self.splice(offset, &[PLACEHOLDER]);
        }
        self.typing = false;
    }

    fn delete_range(&mut self, offset: usize, len: usize) {
        let end = (offset + len).min(self.chars.len());
        let offset = offset.min(end);
        self.chars.drain(offset..end);
        if let Some(c) = self.cursor {
            if c >= end {
                self.cursor = Some(c - (end - offset));
            } else if c > offset {
                self.cursor = Some(offset);
            }
        }
        self.typing = false;
    }

    fn insert_text(&mut self, offset: usize, text: &str) {
        self.checkpoint();
        self.typing = false;
        let chars: Vec<char> = text.chars().filter(|c| *c != PLACEHOLDER).collect();
        self.splice(offset, &chars);
    }

    fn enable(&mut self) {
        self.enabled = true;
    }

    fn disable(&mut self) {
        self.enabled = false;
        self.typing = false;
    }

    fn undo(&mut self) {
        if let Some(snap) = self.history.pop() {
            self.chars = snap.chars;
            self.cursor = Some(snap.cursor);
            self.selection_len = 0;
        }
        self.typing = false;
    }

    fn focus(&mut self) {
        self.focused = true;
        if self.cursor.is_none() {
            self.cursor = Some(self.chars.len() - 1);
        }
    }

    fn scroll_into_view(&mut self, span: PlaceholderSpan) {
        self.last_scroll = Some(span);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_buffer_ends_with_break_and_caret_at_end() {
        let b = MemoryBuffer::new("abc");
        assert_eq!(b.contents(), "abc\n");
        assert_eq!(b.cursor(), Some(3));
        assert!(b.is_enabled());
    }

    #[test]
    fn line_reports_start_len_and_offset() {
        let b = MemoryBuffer::new("abc\ndefg");
        assert_eq!(b.line(0), Some(LineInfo { start: 0, len: 4, offset: 0 }));
        assert_eq!(b.line(3), Some(LineInfo { start: 0, len: 4, offset: 3 }));
        assert_eq!(b.line(6), Some(LineInfo { start: 4, len: 5, offset: 2 }));
        assert_eq!(b.line(9), None);
    }

    #[test]
    fn placeholder_mid_line_splits_line() {
        let mut b = MemoryBuffer::new("abcdef");
        b.set_cursor(3);
        b.insert_placeholder(3);
        assert_eq!(b.contents(), format!("abc\n{PLACEHOLDER}def\n"));
        assert_eq!(b.placeholder_offset(), Some(4));
        b.delete_range(3, 2);
        assert_eq!(b.contents(), "abcdef\n");
        assert_eq!(b.cursor(), Some(3));
    }

    #[test]
    fn insert_text_moves_caret_past_inserted_text() {
        let mut b = MemoryBuffer::new("ab");
        b.set_cursor(2);
        b.insert_text(2, "cd");
        assert_eq!(b.contents(), "abcd\n");
        assert_eq!(b.cursor(), Some(4));
    }

    #[test]
    fn undo_restores_text_and_caret_of_api_insert() {
        let mut b = MemoryBuffer::new("ab");
        b.set_cursor(2);
        b.insert_text(2, " more");
        b.undo();
        assert_eq!(b.contents(), "ab\n");
        assert_eq!(b.cursor(), Some(2));
    }

    #[test]
    fn typing_burst_is_one_undo_step() {
        let mut b = MemoryBuffer::new("");
        for c in "hello".chars() {
            b.type_char(c);
        }
        assert_eq!(b.undo_depth(), 1);
        b.move_left();
        b.type_char('!');
        assert_eq!(b.undo_depth(), 2);
        b.undo_edit();
        assert_eq!(b.contents(), "hello\n");
        b.undo_edit();
        assert_eq!(b.contents(), "\n");
    }

    #[test]
    fn paste_collapses_blank_lines_between_paragraphs() {
        let mut b = MemoryBuffer::new("");
        b.paste("First paragraph.\n\nSecond one.\r\n\r\nThird.");
        assert_eq!(b.contents(), "First paragraph.\nSecond one.\nThird.\n");
        assert_eq!(b.cursor(), Some(b.len() - 1));
    }

    #[test]
    fn paste_is_a_single_undo_step() {
        let mut b = MemoryBuffer::new("ab");
        b.set_cursor(1);
        b.paste("one\ntwo\nthree");
        assert_eq!(b.contents(), "aone\ntwo\nthreeb\n");
        assert_eq!(b.undo_depth(), 1);
        b.undo_edit();
        assert_eq!(b.contents(), "ab\n");
        assert_eq!(b.cursor(), Some(1));
    }

    #[test]
    fn paste_ends_typing_burst() {
        let mut b = MemoryBuffer::new("");
        b.type_char('x');
        b.paste("yz");
        b.type_char('!');
        assert_eq!(b.undo_depth(), 3);
    }

    #[test]
    fn disabled_buffer_ignores_user_edits() {
        let mut b = MemoryBuffer::new("x");
        b.disable();
        b.type_char('y');
        b.backspace();
        b.move_left();
        assert_eq!(b.contents(), "x\n");
        assert_eq!(b.cursor(), Some(1));
    }

    #[test]
    fn vertical_movement_keeps_column() {
        let mut b = MemoryBuffer::new("abcd\nxy\nlonger");
        b.set_cursor(3);
        b.move_down();
        assert_eq!(b.cursor(), Some(7)); // clamped to end of "xy"
        b.move_down();
        assert_eq!(b.cursor(), Some(10));
        b.move_up();
        b.move_up();
        assert_eq!(b.cursor(), Some(2));
    }

    #[test]
    fn backspace_joins_lines() {
        let mut b = MemoryBuffer::new("ab\ncd");
        b.set_cursor(3);
        b.backspace();
        assert_eq!(b.contents(), "abcd\n");
        assert_eq!(b.cursor(), Some(2));
    }

    #[test]
    fn trailing_break_cannot_be_deleted() {
        let mut b = MemoryBuffer::new("ab");
        b.delete_forward();
        assert_eq!(b.contents(), "ab\n");
    }

    #[test]
    fn lines_split_without_breaks() {
        let b = MemoryBuffer::new("one\n\nthree");
        assert_eq!(b.lines(), vec!["one", "", "three"]);
    }
}
