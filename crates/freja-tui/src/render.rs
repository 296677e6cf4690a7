// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
//! Mapping from typed content segments to styled terminal lines.  This is
//! the rendering collaborator of the content core: every accumulation
//! update re-runs the segmenter on the full buffer and rebuilds lines from
//! scratch (segment lists are never mutated in place).

use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};

use freja_content::{segment, typeset_or_fallback, MathTypesetter, SegmentKind};
use freja_model::{Message, Role};

use crate::entry::{reasoning_preview, ChatEntry};
use crate::markdown::{render_markdown, StyledLines};

fn math_style() -> Style {
    Style::default().fg(Color::Cyan)
}

/// Render one block of model output: math segments are typeset, structured
/// spans go through the markdown renderer, plain prose is passed through.
pub fn render_content(
    text: &str,
    typesetter: &dyn MathTypesetter,
    width: u16,
    ascii: bool,
    base: Style,
) -> StyledLines {
    let parsed = segment(text);
    let mut lines: StyledLines = Vec::new();
    let mut spans: Vec<Span<'static>> = Vec::new();

    let flush = |lines: &mut StyledLines, spans: &mut Vec<Span<'static>>| {
        if !spans.is_empty() {
            lines.push(Line::from(std::mem::take(spans)));
        }
    };

    for seg in &parsed.segments {
        match seg.kind {
            SegmentKind::PlainText => {
                // Inline flow: only a newline in the source breaks the line.
                let mut parts = seg.content.split('\n');
                if let Some(first) = parts.next() {
                    if !first.is_empty() {
                        spans.push(Span::styled(first.to_string(), base));
                    }
                }
                for part in parts {
                    flush(&mut lines, &mut spans);
                    if part.is_empty() {
                        lines.push(Line::default());
                    } else {
                        spans.push(Span::styled(part.to_string(), base));
                    }
                }
            }
            SegmentKind::StructuredText => {
                flush(&mut lines, &mut spans);
                lines.extend(render_markdown(&seg.content, width, ascii));
            }
            SegmentKind::MathInline => {
                let rendered = typeset_or_fallback(typesetter, &seg.content, false);
                spans.push(Span::styled(rendered, math_style().patch(base)));
            }
            SegmentKind::MathDisplay => {
                flush(&mut lines, &mut spans);
                let rendered = typeset_or_fallback(typesetter, &seg.content, true);
                lines.push(
                    Line::from(Span::styled(
                        rendered,
                        math_style().add_modifier(Modifier::BOLD),
                    ))
                    .centered(),
                );
            }
        }
    }
    flush(&mut lines, &mut spans);
    lines
}

/// Render the whole transcript plus any in-flight streaming buffers.
#[allow(clippy::too_many_arguments)]
pub fn render_transcript(
    entries: &[ChatEntry],
    streaming_visible: &str,
    streaming_reasoning: &str,
    streaming: bool,
    typesetter: &dyn MathTypesetter,
    width: u16,
    ascii: bool,
    show_reasoning: bool,
) -> StyledLines {
    let mut lines: StyledLines = Vec::new();

    for entry in entries {
        match entry {
            ChatEntry::Message(m) => render_message(&mut lines, m, typesetter, width, ascii),
            ChatEntry::Reasoning { content } => {
                render_reasoning(&mut lines, content, width, ascii, show_reasoning)
            }
            ChatEntry::Error(msg) => {
                lines.push(Line::default());
                lines.push(Line::from(vec![
                    Span::styled("Error: ", Style::default().fg(Color::Red).add_modifier(Modifier::BOLD)),
                    Span::styled(msg.clone(), Style::default().fg(Color::Red)),
                ]));
            }
        }
    }

    if streaming {
        if !streaming_reasoning.is_empty() {
            render_reasoning(&mut lines, streaming_reasoning, width, ascii, show_reasoning);
        }
        if !streaming_visible.is_empty() {
            lines.push(Line::default());
            lines.push(agent_label());
            lines.extend(render_content(
                streaming_visible,
                typesetter,
                width,
                ascii,
                Style::default(),
            ));
        }
    }

    lines
}

fn agent_label() -> Line<'static> {
    Line::from(Span::styled(
        "Agent:",
        Style::default().fg(Color::Blue).add_modifier(Modifier::BOLD),
    ))
}

fn render_message(
    lines: &mut StyledLines,
    m: &Message,
    typesetter: &dyn MathTypesetter,
    width: u16,
    ascii: bool,
) {
    match m.role {
        Role::User => {
            lines.push(Line::default());
            lines.push(Line::from(Span::styled(
                "You:",
                Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
            )));
            for l in m.content.lines() {
                lines.push(Line::from(Span::raw(l.to_string())));
            }
        }
        Role::Assistant => {
            lines.push(Line::default());
            lines.push(agent_label());
            lines.extend(render_content(&m.content, typesetter, width, ascii, Style::default()));
        }
        // The system preamble is not part of the visible transcript.
        Role::System => {}
    }
}

fn render_reasoning(
    lines: &mut StyledLines,
    content: &str,
    width: u16,
    ascii: bool,
    expanded: bool,
) {
    let dim = Style::default().fg(Color::DarkGray);
    lines.push(Line::default());
    if expanded {
        lines.push(Line::from(Span::styled(
            "thinking:",
            dim.add_modifier(Modifier::BOLD),
        )));
        // Reasoning renders as dimmed markdown-free prose; it is scratch
        // text, not an answer.
        for l in content.lines() {
            for wrapped in wrap_plain(l, width) {
                lines.push(Line::from(Span::styled(wrapped, dim)));
            }
        }
    } else {
        let marker = if ascii { ">" } else { "▸" };
        lines.push(Line::from(Span::styled(
            format!("{marker} thinking: {} (ctrl-r to expand)", reasoning_preview(content)),
            dim,
        )));
    }
}

/// Greedy character wrap for dimmed reasoning prose.
fn wrap_plain(line: &str, width: u16) -> Vec<String> {
    let width = if width == 0 { 80 } else { width as usize };
    if line.is_empty() {
        return vec![String::new()];
    }
    let chars: Vec<char> = line.chars().collect();
    chars
        .chunks(width)
        .map(|c| c.iter().collect())
        .collect()
}

// ─── Unit tests ──────────────────────────────────────────────────────────────
