// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
//! Stateless content segmenter: finds math spans in a complete string,
//! resolves overlaps between the competing delimiter grammars, and
//! classifies the remaining prose as structured markup or plain text.
//!
//! `segment` is pure and cheap enough to re-run on the whole accumulated
//! buffer on every streaming render pass; it is not incremental.

use std::sync::OnceLock;

use regex::Regex;

use crate::types::{MathMatch, ParsedContent, Segment, SegmentKind};

/// The math grammars, in fixed scan order.  Order matters: when two
/// grammars match at the same offset, the earlier one wins the overlap
/// filter (the merge sort is stable).
fn math_grammars() -> &'static [(Regex, bool)] {
    static GRAMMARS: OnceLock<Vec<(Regex, bool)>> = OnceLock::new();
    GRAMMARS.get_or_init(|| {
        vec![
            // \[ ... \] display math, non-greedy, may span lines
            (Regex::new(r"(?s)\\\[(.*?)\\\]").unwrap(), true),
            // \( ... \) inline math, non-greedy, may span lines
            (Regex::new(r"(?s)\\\((.*?)\\\)").unwrap(), false),
            // $ ... $ inline math; no newline or nested $ inside
            (Regex::new(r"\$([^$\n]+?)\$").unwrap(), false),
        ]
    })
}

fn markup_patterns() -> &'static [Regex] {
    static PATTERNS: OnceLock<Vec<Regex>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        vec![
            Regex::new(r"\*\*[^*]+\*\*").unwrap(),       // **bold**
            Regex::new(r"\*[^*\n]+\*").unwrap(),         // *italic*
            Regex::new(r"(?m)^#+\s").unwrap(),           // # headers
            Regex::new(r"(?m)^\*\s+").unwrap(),          // * bullet points
            Regex::new(r"(?m)^\d+\.\s").unwrap(),        // 1. numbered lists
            Regex::new(r"(?m)^-\s+").unwrap(),           // - bullet points
            Regex::new(r"`[^`]+`").unwrap(),             // `code`
            Regex::new(r"\[[^\]]+\]\([^)]+\)").unwrap(), // [link](url)
        ]
    })
}

/// True if any lightweight-markup pattern matches anywhere in `text`.
///
/// Span-granular by design: callers promote the whole span to
/// [`SegmentKind::StructuredText`] on a single hit.
pub fn has_markup_syntax(text: &str) -> bool {
    markup_patterns().iter().any(|p| p.is_match(text))
}

/// Scan `text` with every grammar independently and return all raw hits in
/// grammar-scan order (all display hits, then all `\(..\)`, then `$..$`).
fn scan_math(text: &str) -> Vec<MathMatch> {
    let mut matches = Vec::new();
    for (re, display) in math_grammars() {
        for caps in re.captures_iter(text) {
            let whole = caps.get(0).expect("capture 0 always present");
            let inner = caps.get(1).map(|m| m.as_str()).unwrap_or("");
            matches.push(MathMatch {
                start: whole.start(),
                end: whole.end(),
                inner: inner.trim().to_string(),
                display: *display,
            });
        }
    }
    matches
}

/// Greedy first-wins overlap resolution over start-sorted matches.
///
/// A match is accepted only if its `[start, end)` range intersects no
/// already-accepted range; otherwise it is dropped entirely (never
/// partially rendered).  Ties at the same start offset resolve to the
/// match that came first in grammar-scan order, which the caller's stable
/// sort preserves.
pub fn filter_overlapping(matches: Vec<MathMatch>) -> Vec<MathMatch> {
    let mut accepted: Vec<MathMatch> = Vec::with_capacity(matches.len());
    for m in matches {
        let overlaps = accepted
            .iter()
            .any(|a| m.start < a.end && a.start < m.end);
        if !overlaps {
            accepted.push(m);
        }
    }
    accepted
}

/// Partition `text` into an ordered list of typed segments.
///
/// Pure and reentrant; safe to invoke repeatedly on growing prefixes of
/// the same logical text during streaming.  Malformed or unterminated
/// delimiters simply fail to match and the text degrades to prose.
pub fn segment(text: &str) -> ParsedContent {
    if text.is_empty() {
        return ParsedContent {
            has_math: false,
            has_structured_markup: false,
            segments: vec![Segment::new(SegmentKind::PlainText, "", 0)],
        };
    }

    let mut matches = scan_math(text);
    // Stable: same-start ties keep grammar-scan order.
    matches.sort_by_key(|m| m.start);
    let accepted = filter_overlapping(matches);

    let mut out = ParsedContent::default();
    let mut cursor = 0usize;

    for m in &accepted {
        if m.start > cursor {
            push_prose(&mut out, &text[cursor..m.start], cursor);
        }
        if !m.inner.is_empty() {
            out.has_math = true;
            let kind = if m.display { SegmentKind::MathDisplay } else { SegmentKind::MathInline };
            out.segments.push(Segment::new(kind, m.inner.clone(), m.start));
        }
        cursor = m.end;
    }

    if cursor < text.len() {
        push_prose(&mut out, &text[cursor..], cursor);
    }

    // Degenerate case: the whole input was consumed by empty-bodied math
    // delimiters.  Classify the full text as one prose span instead.
    if out.segments.is_empty() {
        out.has_math = false;
        push_prose(&mut out, text, 0);
    }

    out
}

fn push_prose(out: &mut ParsedContent, text: &str, start: usize) {
    let kind = if has_markup_syntax(text) {
        out.has_structured_markup = true;
        SegmentKind::StructuredText
    } else {
        SegmentKind::PlainText
    };
    out.segments.push(Segment::new(kind, text, start));
}

// ─── Unit tests ──────────────────────────────────────────────────────────────
