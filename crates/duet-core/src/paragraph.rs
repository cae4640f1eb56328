// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
//! Paragraph-boundary handling for one candidate stream.

/// What the pane should do with a chunk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayUpdate {
    /// First real content: the pane drops its loading state first.
    pub first: bool,
    pub text: String,
}

/// Accumulates streamed text up to the end of the first paragraph.
///
/// Leading line breaks before any content are stripped and remembered; the
/// first embedded line break after that ends the candidate.  Leading
/// whitespace is trimmed from the displayed text only.
#[derive(Debug, Default)]
pub struct ParagraphFilter {
    text: String,
    started: bool,
    new_paragraph: bool,
    terminal: bool,
}

impl ParagraphFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one chunk.  Returns the display update, if any.
    pub fn push(&mut self, chunk: &str) -> Option<DisplayUpdate> {
        if self.terminal {
            return None;
        }
        let mut chunk = chunk;
        if !self.started {
            let stripped = chunk.trim_start_matches('\n');
            if stripped.len() != chunk.len() {
                self.new_paragraph = true;
            }
            if stripped.is_empty() {
                return None;
            }
            chunk = stripped;
        }
        if let Some(cut) = chunk.find('\n') {
            chunk = &chunk[..cut];
            self.terminal = true;
        }
        let first = !self.started;
        self.started = true;
        self.text.push_str(chunk);

        let shown = if first { chunk.trim_start() } else { chunk };
        if shown.is_empty() && !first {
            return None;
        }
        Some(DisplayUpdate { first, text: shown.to_string() })
    }

    /// True once a paragraph boundary was seen.
    pub fn is_terminal(&self) -> bool {
        self.terminal
    }

    pub fn is_new_paragraph(&self) -> bool {
        self.new_paragraph
    }

    /// Raw accumulated text, without the paragraph marker.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Candidate text: a single line break marks a new paragraph.
    pub fn finish(self) -> String {
        if self.new_paragraph {
            format!("\n{}", self.text)
        } else {
            self.text
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feed(chunks: &[&str]) -> (ParagraphFilter, String) {
        let mut f = ParagraphFilter::new();
        let mut shown = String::new();
        for c in chunks {
            if let Some(u) = f.push(c) {
                if u.first {
                    shown.clear();
                }
                shown.push_str(&u.text);
            }
            if f.is_terminal() {
                break;
            }
        }
        (f, shown)
    }

    #[test]
    fn leading_breaks_mark_new_paragraph() {
        let (f, shown) = feed(&["\n", "\n", "Hello"]);
        assert!(f.is_new_paragraph());
        assert_eq!(shown, "Hello");
        assert_eq!(f.finish(), "\nHello");
    }

    #[test]
    fn embedded_break_ends_candidate() {
        let mut f = ParagraphFilter::new();
        f.push("Hello world\n");
        assert!(f.is_terminal());
        assert_eq!(f.push("more"), None);
        assert_eq!(f.finish(), "Hello world");
    }

    #[test]
    fn display_trims_leading_spaces_but_result_keeps_them() {
        let (f, shown) = feed(&[" The", " end"]);
        assert_eq!(shown, "The end");
        assert_eq!(f.finish(), " The end");
    }

    #[test]
    fn empty_stream_yields_empty_text() {
        let (f, shown) = feed(&[]);
        assert_eq!(shown, "");
        assert_eq!(f.finish(), "");
    }

    #[test]
    fn only_line_breaks_is_still_empty() {
        let (f, _) = feed(&["\n\n", "\n"]);
        assert!(f.text().is_empty());
        assert!(f.is_new_paragraph());
        assert_eq!(f.finish(), "\n");
    }

    #[test]
    fn breaks_inside_first_chunk_after_leading_ones() {
        let (f, shown) = feed(&["\nfirst\nsecond"]);
        assert_eq!(shown, "first");
        assert_eq!(f.finish(), "\nfirst");
    }

    #[test]
    fn empty_chunks_before_content_are_skipped() {
        let mut f = ParagraphFilter::new();
        assert_eq!(f.push(""), None);
        let u = f.push("x").unwrap();
        assert!(u.first);
    }
}
