// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
//! Streaming driver for OpenAI-compatible text generation APIs.
//!
//! Local servers (llama.cpp, vLLM, LM Studio, Ollama) and hosted services
//! (OpenAI, Groq, OpenRouter) all speak the same SSE wire format.  Two request
//! shapes are supported:
//!
//! - [`ModelKind::Completion`]: `POST {base}/completions` with a raw `prompt`
//! - [`ModelKind::Chat`]: `POST {base}/chat/completions` with a system and a
//!   user message
//!
//! Sampling parameters from the config are merged verbatim into the body and
//! win over anything set here.

use anyhow::{anyhow, bail, Context};
use async_trait::async_trait;
use futures::StreamExt;
use serde_json::{json, Map, Value};
use tracing::{debug, trace};

use duet_config::ModelKind;

use crate::{provider::ResponseStream, CompletionRequest, ResponseEvent};

/// OpenAI-compatible streaming completion provider.
pub struct OpenAiCompatProvider {
    /// Provider id returned by `ModelProvider::name()`.
    driver_name: &'static str,
    /// Model id forwarded to the API.
    model: String,
    /// API key (pre-resolved from config or env).  `None` → no auth header.
    api_key: Option<String>,
    kind: ModelKind,
    /// Full endpoint URL, derived from the base URL and `kind`.
    url: String,
    max_tokens: u32,
    /// Only sent for `ModelKind::Chat`.
    system_prompt: String,
    /// Extra key-value pairs merged verbatim into the request body.
    params: Map<String, Value>,
    client: reqwest::Client,
}

impl OpenAiCompatProvider {
    /// # Parameters
    /// - `base_url`: API base that ends **before** `/completions`, e.g.
    ///   `http://localhost:8080/v1/`
    /// - `api_key`: pre-resolved key; `None` for local servers
    /// - `params`: JSON object merged verbatim into every request body
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        driver_name: &'static str,
        model: String,
        api_key: Option<String>,
        base_url: &str,
        kind: ModelKind,
        max_tokens: u32,
        system_prompt: String,
        params: Map<String, Value>,
    ) -> Self {
        let base = base_url.trim_end_matches('/');
        let url = match kind {
            ModelKind::Completion => format!("{base}/completions"),
            ModelKind::Chat => format!("{base}/chat/completions"),
        };
        Self {
            driver_name,
            model,
            api_key,
            kind,
            url,
            max_tokens,
            system_prompt,
            params,
            client: reqwest::Client::new(),
        }
    }

    /// Build the JSON request body for `req`.
    pub(crate) fn request_body(&self, req: &CompletionRequest) -> Value {
        let mut body = json!({
            // Ignored by most local servers.
            "model": self.model,
            "stream": req.stream,
            "max_tokens": self.max_tokens,
            // llama.cpp spelling of the token limit.
            "n_predict": self.max_tokens,
            // llama.cpp: reuse the KV cache for the shared prompt prefix.
            "cache_prompt": true,
        });
        match self.kind {
            ModelKind::Completion => {
                body["prompt"] = json!(req.prompt);
            }
            ModelKind::Chat => {
                body["messages"] = json!([
                    { "role": "system", "content": self.system_prompt },
                    { "role": "user", "content": req.prompt },
                ]);
            }
        }
        for (k, v) in &self.params {
            body[k] = v.clone();
        }
        body
    }
}

#[async_trait]
impl crate::ModelProvider for OpenAiCompatProvider {
    fn name(&self) -> &str {
        self.driver_name
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    async fn complete(&self, req: CompletionRequest) -> anyhow::Result<ResponseStream> {
        let body = self.request_body(&req);

        debug!(
            driver = %self.driver_name,
            model = %self.model,
            kind = %self.kind,
            prompt_chars = req.prompt.chars().count(),
            "sending completion request"
        );
        trace!(request_body = ?body, "full completion request");

        let mut http_req = self.client.post(&self.url).json(&body);
        if let Some(key) = &self.api_key {
            http_req = http_req.bearer_auth(key);
        }

        let resp = http_req
            .send()
            .await
            .with_context(|| format!("{} request failed", self.driver_name))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            bail!("{} error {status}: {text}", self.driver_name);
        }

        let byte_stream = resp.bytes_stream();
        // SSE events and multibyte characters can be split across TCP
        // packets.  Keep raw bytes across chunks; decode complete lines only.
        let event_stream = byte_stream
            .scan(Vec::new(), |buf: &mut Vec<u8>, chunk| {
                let events: Vec<anyhow::Result<ResponseEvent>> = match chunk {
                    Ok(b) => {
                        buf.extend_from_slice(&b);
                        drain_complete_sse_lines(buf)
                    }
                    Err(e) => vec![Err(anyhow!(e).context("reading completion stream"))],
                };
                std::future::ready(Some(events))
            })
            .flat_map(futures::stream::iter);

        Ok(Box::pin(event_stream))
    }
}

/// Parse a single complete SSE line into a [`ResponseEvent`].
///
/// Returns `None` for blank lines, comments and non-`data` fields.
fn parse_sse_data_line(line: &str) -> Option<anyhow::Result<ResponseEvent>> {
    let data = line.strip_prefix("data:")?.trim();
    if data.is_empty() {
        return None;
    }
    if data == "[DONE]" {
        return Some(Ok(ResponseEvent::Done));
    }
    let parsed = serde_json::from_str::<Value>(data)
        .with_context(|| format!("malformed stream chunk: {data}"))
        .and_then(|v| parse_sse_chunk(&v));
    Some(parsed)
}

/// Drain all complete `\n`-terminated SSE lines from `buf`.
///
/// Any trailing incomplete line is left in `buf` so it can be extended by
/// the next TCP chunk.  `\n` never occurs inside a UTF-8 sequence, so every
/// drained line is a whole number of characters.
pub(crate) fn drain_complete_sse_lines(buf: &mut Vec<u8>) -> Vec<anyhow::Result<ResponseEvent>> {
    let mut events = Vec::new();
    while let Some(nl_pos) = buf.iter().position(|&b| b == b'\n') {
        let raw: Vec<u8> = buf.drain(..=nl_pos).collect();
        let line = match std::str::from_utf8(&raw[..nl_pos]) {
            Ok(line) => line.trim_end_matches('\r'),
            Err(e) => {
                events.push(Err(anyhow!(e).context("stream line is not valid UTF-8")));
                continue;
            }
        };
        if let Some(ev) = parse_sse_data_line(line) {
            events.push(ev);
        }
    }
    events
}

/// Extract the text fragment from one decoded chunk.
///
/// Three shapes are accepted: `choices[0].text` (completions),
/// `choices[0].delta.content` (chat) and a top-level `content` (llama.cpp
/// native).  An `error` object in the stream is surfaced as an error.
fn parse_sse_chunk(v: &Value) -> anyhow::Result<ResponseEvent> {
    if let Some(err) = v.get("error").filter(|e| !e.is_null()) {
        let msg = err["message"].as_str().map(str::to_string).unwrap_or_else(|| err.to_string());
        bail!("completion stream error: {msg}");
    }

    let choice = &v["choices"][0];
    let text = choice["text"]
        .as_str()
        .or_else(|| choice["delta"]["content"].as_str())
        .or_else(|| v["content"].as_str())
        .unwrap_or("");

    Ok(ResponseEvent::TextDelta(text.to_string()))
}

// ─── Unit tests ──────────────────────────────────────────────────────────────
