// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
//! Ollama chat driver.
//!
//! Speaks the native Ollama HTTP API: `POST /api/chat` with `stream: true`
//! returns newline-delimited JSON objects, one per generated fragment;
//! `GET /api/tags` lists installed models.  A chat line looks like
//! `{"message":{"content":"..."},"done":false}` and the final line carries
//! `"done": true`.

use std::time::Duration;

use anyhow::{bail, Context};
use async_trait::async_trait;
use futures::StreamExt;
use serde_json::{json, Value};
use tracing::debug;

use freja_config::BackendConfig;

use crate::{backend::ChatStream, ChatBackend, Message, ResponseEvent};

pub struct OllamaBackend {
    base_url: String,
    model: String,
    client: reqwest::Client,
}

impl OllamaBackend {
    /// Construct an explicit backend handle from configuration.  No global
    /// client: every session receives its own handle at construction time.
    pub fn new(cfg: &BackendConfig) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(cfg.connect_timeout_secs))
            .build()
            .context("building HTTP client")?;
        Ok(Self {
            base_url: cfg.base_url.trim_end_matches('/').to_string(),
            model: cfg.model.clone(),
            client,
        })
    }
}

#[async_trait]
impl ChatBackend for OllamaBackend {
    fn name(&self) -> &str {
        "ollama"
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    async fn chat(&self, messages: &[Message]) -> anyhow::Result<ChatStream> {
        let body = json!({
            "model": self.model,
            "messages": messages,
            "stream": true,
        });

        debug!(
            model = %self.model,
            message_count = messages.len(),
            "sending chat request"
        );

        let resp = self
            .client
            .post(format!("{}/api/chat", self.base_url))
            .json(&body)
            .send()
            .await
            .with_context(|| format!("ollama request to {} failed", self.base_url))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            bail!("ollama error {status}: {text}");
        }

        let byte_stream = resp.bytes_stream();
        // NDJSON objects can be split across multiple TCP packets.  Maintain
        // a line buffer across chunks; emit events only for complete lines.
        let event_stream = byte_stream
            .scan(String::new(), |buf, chunk| {
                let events: Vec<anyhow::Result<ResponseEvent>> = match chunk {
                    Ok(b) => {
                        buf.push_str(&String::from_utf8_lossy(&b));
                        drain_complete_lines(buf)
                    }
                    Err(e) => vec![Err(anyhow::anyhow!(e))],
                };
                std::future::ready(Some(events))
            })
            .flat_map(futures::stream::iter);

        Ok(Box::pin(event_stream))
    }

    /// List installed models via `GET /api/tags`.
    async fn list_models(&self) -> anyhow::Result<Vec<String>> {
        let resp = self
            .client
            .get(format!("{}/api/tags", self.base_url))
            .send()
            .await
            .with_context(|| format!("ollama request to {} failed", self.base_url))?;

        if !resp.status().is_success() {
            bail!("ollama error {}", resp.status());
        }

        let body: Value = resp.json().await.context("parsing /api/tags response")?;
        let mut names: Vec<String> = body["models"]
            .as_array()
            .map(|models| {
                models
                    .iter()
                    .filter_map(|m| m["name"].as_str().map(str::to_string))
                    .collect()
            })
            .unwrap_or_default();
        names.sort();
        Ok(names)
    }
}

/// Drain all complete `\n`-terminated NDJSON lines from `buf`.
///
/// Any trailing incomplete line is left in `buf` so it can be extended by
/// the next TCP chunk.
pub(crate) fn drain_complete_lines(buf: &mut String) -> Vec<anyhow::Result<ResponseEvent>> {
    let mut events = Vec::new();
    while let Some(nl_pos) = buf.find('\n') {
        let line = buf[..nl_pos].trim_end_matches('\r').to_string();
        *buf = buf[nl_pos + 1..].to_string();
        if let Some(ev) = parse_chat_line(&line) {
            events.push(ev);
        }
    }
    events
}

/// Parse a single complete NDJSON chat line into a [`ResponseEvent`].
///
/// Returns `None` for empty or unparseable lines.
fn parse_chat_line(line: &str) -> Option<anyhow::Result<ResponseEvent>> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    let v: Value = serde_json::from_str(line).ok()?;

    if let Some(err) = v.get("error").and_then(|e| e.as_str()) {
        return Some(Ok(ResponseEvent::Error(err.to_string())));
    }
    if v["done"].as_bool() == Some(true) {
        // The done frame may still carry a last (usually empty) fragment.
        if let Some(text) = v["message"]["content"].as_str() {
            if !text.is_empty() {
                return Some(Ok(ResponseEvent::TextDelta(text.to_string())));
            }
        }
        return Some(Ok(ResponseEvent::Done));
    }
    if let Some(text) = v["message"]["content"].as_str() {
        return Some(Ok(ResponseEvent::TextDelta(text.to_string())));
    }
    None
}

// ─── Unit tests ──────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    // ── parse_chat_line ───────────────────────────────────────────────────────

    #[test]
    fn content_frame_produces_text_delta() {
        let line = r#"{"message":{"role":"assistant","content":"Hello"},"done":false}"#;
        let ev = parse_chat_line(line).unwrap().unwrap();
        assert_eq!(ev, ResponseEvent::TextDelta("Hello".into()));
    }

    #[test]
    fn done_frame_produces_done() {
        let line = r#"{"message":{"role":"assistant","content":""},"done":true}"#;
        let ev = parse_chat_line(line).unwrap().unwrap();
        assert_eq!(ev, ResponseEvent::Done);
    }

    #[test]
    fn done_frame_with_trailing_content_keeps_the_content() {
        // Some server versions attach the final fragment to the done frame.
        let line = r#"{"message":{"content":"!"},"done":true}"#;
        let ev = parse_chat_line(line).unwrap().unwrap();
        assert_eq!(ev, ResponseEvent::TextDelta("!".into()));
    }

    #[test]
    fn error_frame_produces_error_event() {
        let line = r#"{"error":"model not found"}"#;
        let ev = parse_chat_line(line).unwrap().unwrap();
        assert_eq!(ev, ResponseEvent::Error("model not found".into()));
    }

    #[test]
    fn empty_and_garbage_lines_are_skipped() {
        assert!(parse_chat_line("").is_none());
        assert!(parse_chat_line("   ").is_none());
        assert!(parse_chat_line("not json").is_none());
    }

    // ── drain_complete_lines ──────────────────────────────────────────────────

    #[test]
    fn incomplete_line_is_retained_in_buffer() {
        let mut buf = String::from(r#"{"message":{"content":"par"#);
        let events = drain_complete_lines(&mut buf);
        assert!(events.is_empty(), "no newline yet, nothing to emit");
        assert!(!buf.is_empty(), "partial line must be retained");
    }

    #[test]
    fn frame_split_across_chunks_is_reassembled() {
        let mut buf = String::from(r#"{"message":{"content":"Hel"#);
        assert!(drain_complete_lines(&mut buf).is_empty());

        buf.push_str("lo\"},\"done\":false}\n");
        let events = drain_complete_lines(&mut buf);
        assert_eq!(events.len(), 1);
        assert_eq!(
            *events[0].as_ref().unwrap(),
            ResponseEvent::TextDelta("Hello".into()),
        );
        assert!(buf.is_empty());
    }

    #[test]
    fn multiple_lines_in_one_chunk_emit_in_order() {
        let mut buf = String::new();
        buf.push_str("{\"message\":{\"content\":\"a\"},\"done\":false}\n");
        buf.push_str("{\"message\":{\"content\":\"b\"},\"done\":false}\n");
        buf.push_str("{\"done\":true}\n");
        let events: Vec<ResponseEvent> = drain_complete_lines(&mut buf)
            .into_iter()
            .map(|e| e.unwrap())
            .collect();
        assert_eq!(
            events,
            vec![
                ResponseEvent::TextDelta("a".into()),
                ResponseEvent::TextDelta("b".into()),
                ResponseEvent::Done,
            ],
        );
    }

    #[test]
    fn windows_line_endings_are_tolerated() {
        let mut buf = String::from("{\"message\":{\"content\":\"x\"},\"done\":false}\r\n");
        let events = drain_complete_lines(&mut buf);
        assert_eq!(events.len(), 1);
        assert_eq!(
            *events[0].as_ref().unwrap(),
            ResponseEvent::TextDelta("x".into()),
        );
    }
}
