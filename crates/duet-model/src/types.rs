// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
/// Request sent to a model provider.
///
/// Model, token limit and sampling parameters are provider configuration;
/// a request only carries what changes between calls.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompletionRequest {
    /// Buffer text up to the cursor.
    pub prompt: String,
    pub stream: bool,
}

impl CompletionRequest {
    pub fn streaming(prompt: impl Into<String>) -> Self {
        Self { prompt: prompt.into(), stream: true }
    }
}

/// A single streamed event from the model.
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseEvent {
    /// A text fragment streamed from the model.  May be empty (role-only
    /// deltas, keep-alive chunks).
    TextDelta(String),
    /// The stream finished normally
    Done,
}

// ─── Unit tests ──────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn streaming_request_sets_stream_flag() {
        let r = CompletionRequest::streaming("Once upon a time");
        assert!(r.stream);
        assert_eq!(r.prompt, "Once upon a time");
    }

    #[test]
    fn default_request_is_not_streaming() {
        assert!(!CompletionRequest::default().stream);
    }
}
