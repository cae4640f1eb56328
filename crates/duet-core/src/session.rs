// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
use std::sync::Arc;

use duet_model::{CompletionRequest, ModelProvider, ResponseEvent};
use futures::StreamExt;
use tokio::sync::oneshot;
use tracing::{debug, warn};

use crate::events::SessionOutcome;
use crate::pane::{PaneHandle, PaneUpdate};
use crate::paragraph::ParagraphFilter;

/// One outbound completion request feeding one candidate pane.
///
/// The session stops at the end of the first paragraph, on stream end, on
/// error, or when its cancel sender fires (or is dropped).  It never panics
/// past its own boundary: every ending is a [`SessionOutcome`].
pub struct StreamSession {
    pane: PaneHandle,
    cancel: oneshot::Receiver<()>,
    filter: ParagraphFilter,
}

impl StreamSession {
    /// Create a session and the sender that cancels it.
    pub fn new(pane: PaneHandle) -> (Self, oneshot::Sender<()>) {
        let (tx, rx) = oneshot::channel();
        (Self { pane, cancel: rx, filter: ParagraphFilter::new() }, tx)
    }

    /// Stream a continuation of `prompt` into the pane.
    pub async fn run(mut self, provider: Arc<dyn ModelProvider>, prompt: String) -> SessionOutcome {
        let slot = self.pane.slot();
        debug!(%slot, prompt_len = prompt.len(), "sending completion request");

        let opened = tokio::select! {
            biased;
            _ = &mut self.cancel => None,
            r = provider.complete(CompletionRequest::streaming(prompt)) => Some(r),
        };
        let mut stream = match opened {
            None => return self.canceled().await,
            Some(Err(e)) => return self.failed(e).await,
            Some(Ok(s)) => s,
        };

        loop {
            let next = tokio::select! {
                biased;
                _ = &mut self.cancel => return self.canceled().await,
                ev = stream.next() => ev,
            };
            match next {
                None | Some(Ok(ResponseEvent::Done)) => break,
                Some(Err(e)) => return self.failed(e).await,
                Some(Ok(ResponseEvent::TextDelta(chunk))) => {
                    if let Some(update) = self.filter.push(&chunk) {
                        if update.first {
                            self.pane.send(PaneUpdate::Clear).await;
                        }
                        self.pane.send(PaneUpdate::Append(update.text)).await;
                    }
                    if self.filter.is_terminal() {
                        debug!(%slot, "paragraph boundary reached");
                        break;
                    }
                }
            }
        }
        // Dropping the stream here aborts the request.
        drop(stream);
        let text = self.finish().await;
        SessionOutcome::Finished(text)
    }

    /// Run the session and report its outcome on the pane's channel.
    pub async fn run_and_settle(self, provider: Arc<dyn ModelProvider>, prompt: String) {
        let pane = self.pane.clone();
        let outcome = self.run(provider, prompt).await;
        pane.settle(outcome).await;
    }

    async fn finish(self) -> String {
        if self.filter.text().is_empty() {
            self.pane.send(PaneUpdate::Empty).await;
        }
        self.filter.finish()
    }

    async fn canceled(self) -> SessionOutcome {
        debug!(slot = %self.pane.slot(), discarded = self.filter.text().len(), "candidate aborted");
        SessionOutcome::Canceled
    }

    async fn failed(self, e: anyhow::Error) -> SessionOutcome {
        let message = format!("{e:#}");
        warn!(slot = %self.pane.slot(), error = %message, "candidate failed");
        SessionOutcome::Failed(message)
    }
}

/// Spawn a session onto the runtime.  Its outcome arrives as
/// [`crate::SessionEvent::Settled`].
pub fn spawn(
    pane: PaneHandle,
    provider: Arc<dyn ModelProvider>,
    prompt: String,
) -> oneshot::Sender<()> {
    let (session, cancel) = StreamSession::new(pane);
    tokio::spawn(session.run_and_settle(provider, prompt));
    cancel
}
