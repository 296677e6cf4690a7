// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
//! Core chat data: the `ChatEntry` enum and helpers that operate on the
//! transcript without needing access to the full `App` state.

use freja_model::Message;

/// One entry in the chat transcript (a concrete message or a display-only
/// note).
#[derive(Debug, Clone)]
pub enum ChatEntry {
    Message(Message),
    /// Text the model emitted inside `<think>` tags; hidden behind a
    /// collapsed preview by default.
    Reasoning { content: String },
    Error(String),
}

/// Collect the `Message` objects from the transcript, skipping display-only
/// entries (Reasoning, Error).  Used when building the request payload for
/// the next turn.
pub fn messages_for_request(preamble: &str, entries: &[ChatEntry]) -> Vec<Message> {
    let mut messages = vec![Message::system(preamble)];
    messages.extend(entries.iter().filter_map(|e| match e {
        ChatEntry::Message(m) => Some(m.clone()),
        _ => None,
    }));
    messages
}

/// Return a short single-line preview of a collapsed reasoning section.
pub fn reasoning_preview(content: &str) -> String {
    const MAX: usize = 60;
    let first_line = content.lines().next().unwrap_or("").trim();
    if first_line.chars().count() > MAX {
        format!("{}…", first_line.chars().take(MAX).collect::<String>())
    } else {
        first_line.to_string()
    }
}

// ─── Unit tests ──────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use freja_model::Role;

    #[test]
    fn request_payload_starts_with_system_preamble() {
        let entries = vec![ChatEntry::Message(Message::user("question"))];
        let messages = messages_for_request("be helpful", &entries);
        assert_eq!(messages[0].role, Role::System);
        assert_eq!(messages[0].content, "be helpful");
        assert_eq!(messages[1].content, "question");
    }

    #[test]
    fn reasoning_and_error_entries_are_excluded_from_requests() {
        let entries = vec![
            ChatEntry::Message(Message::user("q")),
            ChatEntry::Reasoning { content: "hidden deliberation".into() },
            ChatEntry::Error("connection refused".into()),
            ChatEntry::Message(Message::assistant("a")),
        ];
        let messages = messages_for_request("sys", &entries);
        assert_eq!(messages.len(), 3, "system + user + assistant only");
        assert!(messages.iter().all(|m| !m.content.contains("hidden")));
    }

    #[test]
    fn reasoning_preview_is_first_line_truncated() {
        let content = "first line of thought\nsecond line";
        assert_eq!(reasoning_preview(content), "first line of thought");

        let long = "x".repeat(100);
        let preview = reasoning_preview(&long);
        assert!(preview.chars().count() <= 61, "60 chars plus ellipsis");
        assert!(preview.ends_with('…'));
    }
}
