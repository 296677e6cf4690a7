use async_trait::async_trait;
use futures::Stream;
use std::pin::Pin;

use crate::{Message, ResponseEvent};

pub type ChatStream = Pin<Box<dyn Stream<Item = anyhow::Result<ResponseEvent>> + Send>>;

/// A model-serving backend that streams chat completions.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// Backend name for status display.
    fn name(&self) -> &str;

    /// Model identifier as reported to users.
    fn model_name(&self) -> &str;

    /// Send the conversation and return a streaming response.
    async fn chat(&self, messages: &[Message]) -> anyhow::Result<ChatStream>;

    /// List model identifiers available from this backend.
    async fn list_models(&self) -> anyhow::Result<Vec<String>>;
}
