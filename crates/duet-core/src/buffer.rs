// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
//! The narrow interface between the orchestrator and the editing surface.

/// Current selection in the editing surface.  Offsets count characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selection {
    pub index: usize,
    pub len: usize,
}

impl Selection {
    pub fn caret(index: usize) -> Self {
        Self { index, len: 0 }
    }

    pub fn is_collapsed(&self) -> bool {
        self.len == 0
    }
}

/// The line containing a given offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineInfo {
    /// Offset of the first character of the line.
    pub start: usize,
    /// Length of the line including its terminating line break.
    pub len: usize,
    /// Position of the queried offset within the line.
    pub offset: usize,
}

impl LineInfo {
    pub fn at_line_start(&self) -> bool {
        self.offset == 0
    }

    pub fn at_line_end(&self) -> bool {
        self.offset + 1 == self.len
    }
}

/// Where the placeholder sits in the buffer and how many units it occupies.
///
/// Recorded once at insertion; every removal uses it verbatim.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlaceholderSpan {
    pub start: usize,
    pub len: usize,
}

impl PlaceholderSpan {
    /// Placeholder bounds for a caret at `cursor` on `line`.
    ///
    /// - end of line: placed at the start of the next line, one unit
    /// - start of line: placed at the cursor, one unit
    /// - mid-line: the surface breaks the line first, two units
    pub fn for_cursor(cursor: usize, line: &LineInfo) -> Self {
        let at_end = line.at_line_end();
        let start = if at_end { cursor + 1 } else { cursor };
        let len = if at_end || line.at_line_start() { 1 } else { 2 };
        Self { start, len }
    }

    pub fn end(&self) -> usize {
        self.start + self.len
    }
}

/// Editing-surface operations the orchestrator relies on.
///
/// Every method is synchronous and its effect is visible immediately.
pub trait BufferAdapter {
    /// Current selection, or `None` when the surface has no caret.
    fn selection(&self) -> Option<Selection>;

    /// Text in `[from, to)`.
    fn text(&self, from: usize, to: usize) -> String;

    /// The line containing `offset`, or `None` if it is out of range.
    fn line(&self, offset: usize) -> Option<LineInfo>;

    /// Insert the non-editable placeholder at `offset`.  A mid-line offset
    /// splits the line, so the placeholder then occupies two units.
    fn insert_placeholder(&mut self, offset: usize);

    fn delete_range(&mut self, offset: usize, len: usize);

    /// Insert text as an undoable edit.
    fn insert_text(&mut self, offset: usize, text: &str);

    fn enable(&mut self);

    fn disable(&mut self);

    /// Revert the last undoable edit.
    fn undo(&mut self);

    fn focus(&mut self);

    fn scroll_into_view(&mut self, span: PlaceholderSpan);
}
