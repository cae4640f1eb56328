// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
//! Wire-format tests: spin up a minimal HTTP/1.1 mock server, point the
//! OpenAI-compatible driver at it, issue a `CompletionRequest`, and assert both
//! the HTTP request the driver sent and the `ResponseEvent`s it emitted.
//!
//! These tests run without any API keys and without external network access.
//! They exercise the full driver pipeline: serialisation → HTTP → SSE parsing.

use futures::StreamExt;
use serde_json::Value;
use std::collections::HashMap;
use duet_config::{ModelConfig, ModelKind};
use duet_model::{from_config, CompletionRequest, ResponseEvent};
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpListener;

// ── Minimal HTTP/1.1 mock server ──────────────────────────────────────────────

#[derive(Debug)]
struct CapturedRequest {
    method: String,
    path: String,
    headers: HashMap<String, String>,
    body: Value,
}

/// Bind a one-shot HTTP/1.1 mock server on a random loopback port.
/// It accepts exactly one request, captures it, and replies with the given
/// status + body.  Returns the port number and a receiver for the captured
/// request (fulfilled once the request has been fully read).
async fn mock_server_once(
    status: u16,
    content_type: &'static str,
    resp_body: impl Into<String> + Send + 'static,
) -> (u16, tokio::sync::oneshot::Receiver<CapturedRequest>) {
    let resp_body: String = resp_body.into();
    mock_server_parts(status, content_type, vec![resp_body.into_bytes()]).await
}

/// Like [`mock_server_once`], but writes the body as separate writes with a
/// pause in between, so the client sees each part as its own chunk.
async fn mock_server_parts(
    status: u16,
    content_type: &'static str,
    parts: Vec<Vec<u8>>,
) -> (u16, tokio::sync::oneshot::Receiver<CapturedRequest>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let (tx, rx) = tokio::sync::oneshot::channel::<CapturedRequest>();

    tokio::spawn(async move {
        let (stream, _) = listener.accept().await.expect("accept");
        let (read_half, mut write_half) = stream.into_split();
        let mut reader = BufReader::new(read_half);

        // Request line
        let mut request_line = String::new();
        reader.read_line(&mut request_line).await.unwrap();
        let request_line = request_line.trim().to_string();
        let mut req_parts = request_line.splitn(3, ' ');
        let method = req_parts.next().unwrap_or("").to_string();
        let path = req_parts.next().unwrap_or("").to_string();

        // Headers
        let mut headers: HashMap<String, String> = HashMap::new();
        let mut content_length: usize = 0;
        loop {
            let mut line = String::new();
            reader.read_line(&mut line).await.unwrap();
            let trimmed = line.trim();
            if trimmed.is_empty() {
                break;
            }
            if let Some((k, v)) = trimmed.split_once(": ") {
                let key = k.to_lowercase();
                if key == "content-length" {
                    content_length = v.parse().unwrap_or(0);
                }
                headers.insert(key, v.to_string());
            }
        }

        // Body
        let mut body_bytes = vec![0u8; content_length];
        reader.read_exact(&mut body_bytes).await.unwrap();
        let body: Value = serde_json::from_slice(&body_bytes).unwrap_or(Value::Null);

        let _ = tx.send(CapturedRequest {
            method,
            path,
            headers,
            body,
        });

        // Write response with Content-Length so reqwest knows when to stop
        let content_length: usize = parts.iter().map(Vec::len).sum();
        let head = format!(
            "HTTP/1.1 {status} OK\r\nContent-Type: {content_type}\r\nContent-Length: {content_length}\r\nConnection: close\r\n\r\n",
        );
        let _ = write_half.write_all(head.as_bytes()).await;
        for part in parts {
            let _ = write_half.write_all(&part).await;
            let _ = write_half.flush().await;
            tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        }
    });

    (port, rx)
}

/// Build a minimal SSE response body from a list of `data:` payloads.
/// Appends `data: [DONE]\n\n` automatically.
fn sse_body(events: &[&str]) -> String {
    let mut s = events
        .iter()
        .map(|e| format!("data: {e}\n\n"))
        .collect::<String>();
    s.push_str("data: [DONE]\n\n");
    s
}

fn config_for(port: u16, kind: ModelKind) -> ModelConfig {
    ModelConfig {
        provider: "openai".into(),
        name: "llama3-70b-8192".into(),
        base_url: format!("http://127.0.0.1:{port}/v1/"),
        kind,
        max_tokens: 32,
        ..ModelConfig::default()
    }
}

async fn collect_text(mut stream: duet_model::ResponseStream) -> (String, bool) {
    let mut text = String::new();
    let mut done = false;
    while let Some(ev) = stream.next().await {
        match ev.unwrap() {
            ResponseEvent::TextDelta(t) => text.push_str(&t),
            ResponseEvent::Done => done = true,
        }
    }
    (text, done)
}

// ── Completion kind ───────────────────────────────────────────────────────────

#[tokio::test]
async fn completion_kind_sends_prompt_to_completions_endpoint() {
    let sse = sse_body(&[r#"{"choices":[{"text":"hi","index":0}]}"#]);
    let (port, req_rx) = mock_server_once(200, "text/event-stream", sse).await;

    let provider = from_config(&config_for(port, ModelKind::Completion)).unwrap();
    let stream = provider
        .complete(CompletionRequest::streaming("Once upon a time"))
        .await
        .unwrap();
    let _ = collect_text(stream).await;

    let req = req_rx.await.unwrap();
    assert_eq!(req.method, "POST");
    assert_eq!(req.path, "/v1/completions");
    assert_eq!(req.body["prompt"], "Once upon a time");
    assert_eq!(req.body["model"], "llama3-70b-8192");
    assert_eq!(req.body["max_tokens"], 32);
    assert_eq!(req.body["n_predict"], 32);
    assert_eq!(req.body["stream"], true);
    assert_eq!(req.body["cache_prompt"], true);
    // Default sampling params are forwarded verbatim.
    assert!((req.body["min_p"].as_f64().unwrap() - 0.02).abs() < 1e-9);
    assert_eq!(req.body["top_k"], 0);
}

#[tokio::test]
async fn completion_kind_text_events_collected() {
    let sse = sse_body(&[
        r#"{"choices":[{"text":"Hello","index":0}]}"#,
        r#"{"choices":[{"text":" world","index":0}]}"#,
    ]);
    let (port, _) = mock_server_once(200, "text/event-stream", sse).await;

    let provider = from_config(&config_for(port, ModelKind::Completion)).unwrap();
    let stream = provider.complete(CompletionRequest::streaming("x")).await.unwrap();
    let (text, done) = collect_text(stream).await;
    assert_eq!(text, "Hello world");
    assert!(done, "[DONE] must produce a Done event");
}

#[tokio::test]
async fn multibyte_character_split_across_writes_is_decoded() {
    let body = sse_body(&[r#"{"choices":[{"text":"café"}]}"#]).into_bytes();
    // Split inside the two-byte "é" (0xC3 0xA9).
    let split = body.iter().position(|&b| b == 0xC3).unwrap() + 1;
    let parts = vec![body[..split].to_vec(), body[split..].to_vec()];
    let (port, _) = mock_server_parts(200, "text/event-stream", parts).await;

    let provider = from_config(&config_for(port, ModelKind::Completion)).unwrap();
    let stream = provider.complete(CompletionRequest::streaming("x")).await.unwrap();
    let (text, done) = collect_text(stream).await;
    assert_eq!(text, "café");
    assert!(done);
}

// ── Chat kind ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn chat_kind_sends_system_and_user_messages() {
    let sse = sse_body(&[r#"{"choices":[{"delta":{"content":"ok"}}]}"#]);
    let (port, req_rx) = mock_server_once(200, "text/event-stream", sse).await;

    let mut cfg = config_for(port, ModelKind::Chat);
    cfg.system_prompt = "continue the story".into();
    let provider = from_config(&cfg).unwrap();
    let stream = provider.complete(CompletionRequest::streaming("It was dark")).await.unwrap();
    let (text, _) = collect_text(stream).await;
    assert_eq!(text, "ok");

    let req = req_rx.await.unwrap();
    assert_eq!(req.path, "/v1/chat/completions");
    let msgs = req.body["messages"].as_array().expect("messages array");
    assert_eq!(msgs.len(), 2, "system + user");
    assert_eq!(msgs[0]["role"], "system");
    assert_eq!(msgs[0]["content"], "continue the story");
    assert_eq!(msgs[1]["content"], "It was dark");
}

// ── Auth ──────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn api_key_is_sent_as_bearer_token() {
    let sse = sse_body(&[r#"{"content":"ok"}"#]);
    let (port, req_rx) = mock_server_once(200, "text/event-stream", sse).await;

    let mut cfg = config_for(port, ModelKind::Completion);
    cfg.api_key = Some("sk-test-key".into());
    let provider = from_config(&cfg).unwrap();
    let stream = provider.complete(CompletionRequest::streaming("x")).await.unwrap();
    let _ = collect_text(stream).await;

    let req = req_rx.await.unwrap();
    assert_eq!(
        req.headers.get("authorization").map(String::as_str),
        Some("Bearer sk-test-key")
    );
}

#[tokio::test]
async fn no_api_key_sends_no_authorization_header() {
    let sse = sse_body(&[r#"{"content":"ok"}"#]);
    let (port, req_rx) = mock_server_once(200, "text/event-stream", sse).await;

    let provider = from_config(&config_for(port, ModelKind::Completion)).unwrap();
    let stream = provider.complete(CompletionRequest::streaming("x")).await.unwrap();
    let _ = collect_text(stream).await;

    let req = req_rx.await.unwrap();
    assert!(!req.headers.contains_key("authorization"));
}

// ── Errors ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn non_200_response_returns_error() {
    let (port, _) = mock_server_once(
        401,
        "application/json",
        r#"{"error":{"message":"Unauthorized","type":"invalid_request_error"}}"#,
    )
    .await;

    let provider = from_config(&config_for(port, ModelKind::Completion)).unwrap();
    let result = provider.complete(CompletionRequest::streaming("hi")).await;

    assert!(result.is_err(), "non-200 response must produce an error");
    let msg = result.err().unwrap().to_string();
    assert!(msg.contains("401"), "error message should include status 401, got: {msg}");
}

#[tokio::test]
async fn malformed_chunk_surfaces_as_stream_error() {
    let (port, _) = mock_server_once(200, "text/event-stream", "data: {oops\n\n").await;

    let provider = from_config(&config_for(port, ModelKind::Completion)).unwrap();
    let mut stream = provider.complete(CompletionRequest::streaming("x")).await.unwrap();
    let first = stream.next().await.expect("one item");
    assert!(first.is_err());
}
