// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
//! Content classification core: the incremental stream classifier that
//! separates visible answer text from `<think>` reasoning text, and the
//! stateless segmenter that types accumulated text into plain / structured /
//! math segments for rendering.
//!
//! This crate does no I/O and holds no global state; everything here is
//! driven by the session that owns one response stream.

mod classifier;
mod segmenter;
mod typeset;
mod types;

pub use classifier::{FeedDelta, StreamClassifier};
pub use segmenter::{filter_overlapping, has_markup_syntax, segment};
pub use typeset::{typeset_or_fallback, MathTypesetter, UnicodeTypesetter};
pub use types::{MathMatch, ParsedContent, Segment, SegmentKind};
