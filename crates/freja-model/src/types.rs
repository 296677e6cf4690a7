use serde::{Deserialize, Serialize};

/// A single message in the conversation history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn system(text: impl Into<String>) -> Self {
        Self { role: Role::System, content: text.into() }
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self { role: Role::User, content: text.into() }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self { role: Role::Assistant, content: text.into() }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// A single framed event from the inbound response stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponseEvent {
    /// An incremental text fragment.  May split `<think>` tags and math
    /// delimiters at arbitrary byte positions; the content classifier
    /// downstream must tolerate that.
    TextDelta(String),
    /// Terminal marker: the response completed normally.
    Done,
    /// Error payload from the backend; the session substitutes a
    /// user-visible fallback message and discards its classifier.
    Error(String),
}

// ─── Unit tests ──────────────────────────────────────────────────────────────
