// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub backend: BackendConfig,
    #[serde(default)]
    pub chat: ChatConfig,
    #[serde(default)]
    pub tui: TuiConfig,
}

/// Connection parameters for the model-serving backend.  There is no
/// implicit global client: the session is constructed from this explicit
/// parameter set (base URL + model identifier).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Base URL of the Ollama-compatible server.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Model identifier forwarded on every request.
    #[serde(default = "default_model")]
    pub model: String,
    /// TCP connect timeout in seconds.
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            model: default_model(),
            connect_timeout_secs: default_connect_timeout(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatConfig {
    /// System message prepended to every conversation.
    #[serde(default = "default_preamble")]
    pub system_preamble: String,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self { system_preamble: default_preamble() }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TuiConfig {
    /// Expand reasoning sections by default instead of showing a collapsed
    /// preview line.
    #[serde(default)]
    pub show_reasoning: bool,
    /// Use plain ASCII instead of Unicode glyphs for UI decoration.
    #[serde(default)]
    pub ascii: bool,
}

fn default_base_url() -> String {
    "http://localhost:11434".to_string()
}

fn default_model() -> String {
    "deepseek-r1:latest".to_string()
}

fn default_connect_timeout() -> u64 {
    10
}

fn default_preamble() -> String {
    "You are a helpful AI assistant. Be concise, helpful, and friendly in your responses."
        .to_string()
}

// ─── Unit tests ──────────────────────────────────────────────────────────────
