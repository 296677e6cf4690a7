// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use futures::stream;

use crate::{backend::ChatStream, ChatBackend, Message, ResponseEvent, Role};

/// Deterministic mock backend for tests.  Echoes the last user message
/// back as the assistant response, one word per delta.
#[derive(Default)]
pub struct MockBackend;

#[async_trait]
impl ChatBackend for MockBackend {
    fn name(&self) -> &str {
        "mock"
    }

    fn model_name(&self) -> &str {
        "mock-model"
    }

    async fn chat(&self, messages: &[Message]) -> anyhow::Result<ChatStream> {
        let reply = messages
            .iter()
            .rev()
            .find(|m| m.role == Role::User)
            .map(|m| m.content.clone())
            .unwrap_or_else(|| "[no input]".to_string());

        let mut events: Vec<anyhow::Result<ResponseEvent>> = reply
            .split_inclusive(' ')
            .map(|w| Ok(ResponseEvent::TextDelta(w.to_string())))
            .collect();
        events.push(Ok(ResponseEvent::Done));
        Ok(Box::pin(stream::iter(events)))
    }

    async fn list_models(&self) -> anyhow::Result<Vec<String>> {
        Ok(vec!["mock-model".to_string()])
    }
}

/// A pre-scripted mock backend.  Each call to `chat` pops the next event
/// script from the front of the queue, so tests can specify exact delta
/// sequences — including split `<think>` tags — without network access.
pub struct ScriptedMockBackend {
    scripts: Arc<Mutex<Vec<Vec<ResponseEvent>>>>,
    /// The last message list seen by `chat`, for request inspection.
    pub last_request: Arc<Mutex<Option<Vec<Message>>>>,
}

impl ScriptedMockBackend {
    pub fn new(scripts: Vec<Vec<ResponseEvent>>) -> Self {
        Self {
            scripts: Arc::new(Mutex::new(scripts)),
            last_request: Arc::new(Mutex::new(None)),
        }
    }

    /// Convenience: one response composed of the given text deltas,
    /// terminated by `Done`.
    pub fn from_deltas(deltas: &[&str]) -> Self {
        let mut script: Vec<ResponseEvent> = deltas
            .iter()
            .map(|d| ResponseEvent::TextDelta(d.to_string()))
            .collect();
        script.push(ResponseEvent::Done);
        Self::new(vec![script])
    }
}

#[async_trait]
impl ChatBackend for ScriptedMockBackend {
    fn name(&self) -> &str {
        "mock"
    }

    fn model_name(&self) -> &str {
        "scripted-mock"
    }

    async fn chat(&self, messages: &[Message]) -> anyhow::Result<ChatStream> {
        *self.last_request.lock().unwrap() = Some(messages.to_vec());
        let script = {
            let mut scripts = self.scripts.lock().unwrap();
            if scripts.is_empty() {
                vec![ResponseEvent::Done]
            } else {
                scripts.remove(0)
            }
        };
        let events: Vec<anyhow::Result<ResponseEvent>> =
            script.into_iter().map(Ok).collect();
        Ok(Box::pin(stream::iter(events)))
    }

    async fn list_models(&self) -> anyhow::Result<Vec<String>> {
        Ok(vec!["scripted-mock".to_string()])
    }
}

// ─── Unit tests ──────────────────────────────────────────────────────────────
