// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use futures::{stream, StreamExt};

use crate::{provider::ResponseStream, CompletionRequest, ResponseEvent};

const MOCK_CONTINUATIONS: &[&str] = &[
    " The wind rose over the hills, and somewhere below a bell began to ring.\n",
    " Nobody in the village remembered who had built the tower, or why.\n",
    "\n\nThe next morning the road was gone.\n",
    " She folded the letter twice and slipped it under the door.\n",
];

/// Offline provider for trying the editor without a server.  Each call
/// streams the next canned continuation word by word.
pub struct MockProvider {
    calls: AtomicUsize,
    word_delay: Duration,
}

impl Default for MockProvider {
    fn default() -> Self {
        Self { calls: AtomicUsize::new(0), word_delay: Duration::from_millis(40) }
    }
}

#[async_trait]
impl crate::ModelProvider for MockProvider {
    fn name(&self) -> &str {
        "mock"
    }
    fn model_name(&self) -> &str {
        "mock-model"
    }

    async fn complete(&self, _req: CompletionRequest) -> anyhow::Result<ResponseStream> {
        let n = self.calls.fetch_add(1, Ordering::Relaxed);
        let text = MOCK_CONTINUATIONS[n % MOCK_CONTINUATIONS.len()];
        let words: Vec<String> = text.split_inclusive(' ').map(str::to_string).collect();
        let delay = self.word_delay;
        let events = stream::iter(words)
            .then(move |w| async move {
                tokio::time::sleep(delay).await;
                Ok(ResponseEvent::TextDelta(w))
            })
            .chain(stream::iter([Ok(ResponseEvent::Done)]));
        Ok(Box::pin(events))
    }
}

/// One step of a scripted response stream.
#[derive(Debug, Clone)]
pub enum ScriptStep {
    /// Emit a text fragment.
    Text(String),
    /// Yield a stream error (transport failure, malformed chunk).
    Fail(String),
    /// Never yield again; only cancellation ends the stream.
    Stall,
}

/// What a single `complete` call does.
#[derive(Debug, Clone)]
pub enum Script {
    /// Open a stream and play the steps, then end with `Done`.
    Stream(Vec<ScriptStep>),
    /// Fail the request itself (connection refused, HTTP error status).
    Reject(String),
}

impl Script {
    /// Stream of plain text chunks.
    pub fn chunks<I, S>(chunks: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Stream(chunks.into_iter().map(|c| ScriptStep::Text(c.into())).collect())
    }

    /// `calls` scripts that each stream `reply` as a single chunk.
    pub fn repeated(reply: impl Into<String>, calls: usize) -> Vec<Self> {
        let r = reply.into();
        (0..calls).map(|_| Script::chunks([r.clone()])).collect()
    }
}

/// A pre-scripted mock provider.  Each call to `complete` pops the next
/// script from the front of the queue.  This lets tests specify exact chunk
/// sequences, failures and stalls without network access.
pub struct ScriptedMockProvider {
    scripts: Arc<Mutex<Vec<Script>>>,
    chunk_delay: Option<Duration>,
    /// Every request seen by this provider, in call order.
    pub requests: Arc<Mutex<Vec<CompletionRequest>>>,
    /// Number of steps actually pulled from the streams so far.
    pub consumed: Arc<AtomicUsize>,
}

impl ScriptedMockProvider {
    /// Build a provider from a list of scripts, one per `complete` call.
    pub fn new(scripts: Vec<Script>) -> Self {
        Self {
            scripts: Arc::new(Mutex::new(scripts)),
            chunk_delay: None,
            requests: Arc::new(Mutex::new(Vec::new())),
            consumed: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Convenience: every call streams the same single text reply.
    pub fn always_text(reply: impl Into<String>, calls: usize) -> Self {
        Self::new(Script::repeated(reply, calls))
    }

    /// Sleep before each step so concurrent streams interleave.
    pub fn with_chunk_delay(mut self, delay: Duration) -> Self {
        self.chunk_delay = Some(delay);
        self
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl crate::ModelProvider for ScriptedMockProvider {
    fn name(&self) -> &str {
        "scripted-mock"
    }
    fn model_name(&self) -> &str {
        "scripted-mock-model"
    }

    async fn complete(&self, req: CompletionRequest) -> anyhow::Result<ResponseStream> {
        self.requests.lock().unwrap().push(req);
        let script = {
            let mut scripts = self.scripts.lock().unwrap();
            if scripts.is_empty() {
                // Default fallback when all scripts are consumed
                Script::chunks(["[no more scripts]"])
            } else {
                scripts.remove(0)
            }
        };
        let steps = match script {
            Script::Reject(msg) => anyhow::bail!(msg),
            Script::Stream(steps) => steps,
        };

        let delay = self.chunk_delay;
        let consumed = self.consumed.clone();
        let events = stream::iter(steps)
            .then(move |step| {
                let consumed = consumed.clone();
                async move {
                    if let Some(d) = delay {
                        tokio::time::sleep(d).await;
                    }
                    match step {
                        ScriptStep::Text(t) => {
                            consumed.fetch_add(1, Ordering::SeqCst);
                            Ok(ResponseEvent::TextDelta(t))
                        }
                        ScriptStep::Fail(msg) => {
                            consumed.fetch_add(1, Ordering::SeqCst);
                            Err(anyhow::anyhow!(msg))
                        }
                        ScriptStep::Stall => futures::future::pending().await,
                    }
                }
            })
            .chain(stream::iter([Ok(ResponseEvent::Done)]));
        Ok(Box::pin(events))
    }
}

// ─── Unit tests ──────────────────────────────────────────────────────────────
