// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
mod backend;
mod mock;
mod ollama;
mod types;

pub use backend::{ChatBackend, ChatStream};
pub use mock::{MockBackend, ScriptedMockBackend};
pub use ollama::OllamaBackend;
pub use types::*;

use freja_config::BackendConfig;

/// Construct a boxed [`ChatBackend`] from configuration.
///
/// Backend selection is by URL scheme: `mock:` builds the echo mock (used
/// by tests and demos without a running server); anything else is treated
/// as an Ollama-compatible HTTP endpoint.
pub fn from_config(cfg: &BackendConfig) -> anyhow::Result<Box<dyn ChatBackend>> {
    if cfg.base_url.starts_with("mock:") {
        return Ok(Box::new(MockBackend));
    }
    Ok(Box::new(OllamaBackend::new(cfg)?))
}
