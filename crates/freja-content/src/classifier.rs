// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
//! Incremental stream classifier: routes a live token stream into the
//! visible-answer and reasoning channels by tracking `<think>` / `</think>`
//! sentinel tags, correctly across fragment boundaries.
//!
//! A tag may arrive split over any number of fragments, so the classifier
//! never emits a buffer suffix that could still grow into the tag it is
//! waiting for; everything before that suffix is emitted greedily so the UI
//! stays live.

const THINK_OPEN: &str = "<think>";
const THINK_CLOSE: &str = "</think>";

/// Which channel currently receives emitted text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Normal,
    InReasoning,
}

/// Text newly routed to each channel by one `feed` or `finalize` call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeedDelta {
    pub visible: String,
    pub reasoning: String,
}

impl FeedDelta {
    pub fn is_empty(&self) -> bool {
        self.visible.is_empty() && self.reasoning.is_empty()
    }
}

/// Per-response classifier state.  One instance per in-flight response,
/// exclusively owned by the session driving that response's stream, and
/// discarded (or `reset`) when the stream ends or errors.
#[derive(Debug)]
pub struct StreamClassifier {
    mode: Mode,
    /// Unconsumed input tail that could still be a partial sentinel tag.
    pending: String,
    visible: String,
    reasoning: String,
}

impl Default for StreamClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl StreamClassifier {
    pub fn new() -> Self {
        Self {
            mode: Mode::Normal,
            pending: String::new(),
            visible: String::new(),
            reasoning: String::new(),
        }
    }

    /// Consume one incoming fragment and return the text newly routed to
    /// each channel.  Routed text is also appended to the per-channel
    /// accumulators ([`visible_text`](Self::visible_text) /
    /// [`reasoning_text`](Self::reasoning_text)).
    pub fn feed(&mut self, fragment: &str) -> FeedDelta {
        self.pending.push_str(fragment);
        let mut delta = FeedDelta::default();

        loop {
            let tag = self.active_tag();
            match self.pending.find(tag) {
                Some(pos) => {
                    let before: String = self.pending.drain(..pos + tag.len()).collect();
                    self.emit(&before[..pos], &mut delta);
                    self.mode = match self.mode {
                        Mode::Normal => Mode::InReasoning,
                        Mode::InReasoning => Mode::Normal,
                    };
                }
                None => {
                    // No full tag left.  Retain only the longest suffix that
                    // is a prefix of the tag we are waiting for; emit the
                    // rest now so streaming output stays responsive.
                    let keep = partial_tag_suffix(&self.pending, tag);
                    let emit_len = self.pending.len() - keep;
                    if emit_len > 0 {
                        let out: String = self.pending.drain(..emit_len).collect();
                        self.emit(&out, &mut delta);
                    }
                    break;
                }
            }
        }

        delta
    }

    /// Flush any retained tail to the active channel.  An unterminated
    /// reasoning section therefore ends up in the reasoning channel without
    /// requiring a closing tag.
    pub fn finalize(&mut self) -> FeedDelta {
        let rest = std::mem::take(&mut self.pending);
        let mut delta = FeedDelta::default();
        self.emit(&rest, &mut delta);
        delta
    }

    /// All visible-channel text routed so far.
    pub fn visible_text(&self) -> &str {
        &self.visible
    }

    /// All reasoning-channel text routed so far.
    pub fn reasoning_text(&self) -> &str {
        &self.reasoning
    }

    /// True while inside an unclosed `<think>` section.
    pub fn in_reasoning(&self) -> bool {
        self.mode == Mode::InReasoning
    }

    /// Clear all state so the instance can serve a new response.
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    fn active_tag(&self) -> &'static str {
        match self.mode {
            Mode::Normal => THINK_OPEN,
            Mode::InReasoning => THINK_CLOSE,
        }
    }

    fn emit(&mut self, text: &str, delta: &mut FeedDelta) {
        if text.is_empty() {
            return;
        }
        match self.mode {
            Mode::Normal => {
                delta.visible.push_str(text);
                self.visible.push_str(text);
            }
            Mode::InReasoning => {
                delta.reasoning.push_str(text);
                self.reasoning.push_str(text);
            }
        }
    }
}

/// Length of the longest proper suffix of `buf` that is a prefix of `tag`.
///
/// The caller has already ruled out a complete occurrence of `tag`, so only
/// strictly-shorter prefixes are considered.  Tags are ASCII, so the
/// returned length always lands on a char boundary of `buf`.
fn partial_tag_suffix(buf: &str, tag: &str) -> usize {
    let max = buf.len().min(tag.len().saturating_sub(1));
    for k in (1..=max).rev() {
        if buf.ends_with(&tag[..k]) {
            return k;
        }
    }
    0
}

// ─── Unit tests ──────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn feed_all(fragments: &[&str]) -> (String, String) {
        let mut c = StreamClassifier::new();
        for f in fragments {
            c.feed(f);
        }
        c.finalize();
        (c.visible_text().to_string(), c.reasoning_text().to_string())
    }

    // ── Basic routing ─────────────────────────────────────────────────────────

    #[test]
    fn plain_text_goes_to_visible_channel() {
        let (visible, reasoning) = feed_all(&["hello world"]);
        assert_eq!(visible, "hello world");
        assert_eq!(reasoning, "");
    }

    #[test]
    fn think_section_goes_to_reasoning_channel() {
        let (visible, reasoning) = feed_all(&["<think>pondering</think>answer"]);
        assert_eq!(visible, "answer");
        assert_eq!(reasoning, "pondering");
    }

    #[test]
    fn tags_are_consumed_and_never_emitted() {
        let (visible, reasoning) = feed_all(&["a<think>b</think>c"]);
        assert!(!visible.contains("think"), "tag leaked into visible: {visible:?}");
        assert!(!reasoning.contains("think"), "tag leaked into reasoning: {reasoning:?}");
    }

    #[test]
    fn multiple_think_sections_in_one_fragment() {
        let (visible, reasoning) = feed_all(&["a<think>1</think>b<think>2</think>c"]);
        assert_eq!(visible, "abc");
        assert_eq!(reasoning, "12");
    }

    // ── Split-tag correctness ─────────────────────────────────────────────────

    #[test]
    fn tag_split_across_fragments_is_recognised() {
        let (visible, reasoning) = feed_all(&["he<th", "ink>secret</think>world"]);
        assert_eq!(visible, "heworld");
        assert_eq!(reasoning, "secret");
    }

    #[test]
    fn split_feed_matches_single_fragment_feed() {
        let whole = feed_all(&["he<think>secret</think>world"]);
        let split = feed_all(&["he<th", "ink>secret</think>world"]);
        assert_eq!(whole, split, "fragmentation must not change channel output");
    }

    #[test]
    fn tag_split_one_character_at_a_time() {
        let input = "x<think>y</think>z";
        let frags: Vec<String> = input.chars().map(|c| c.to_string()).collect();
        let mut c = StreamClassifier::new();
        for f in &frags {
            c.feed(f);
        }
        c.finalize();
        assert_eq!(c.visible_text(), "xz");
        assert_eq!(c.reasoning_text(), "y");
    }

    #[test]
    fn closing_tag_split_across_fragments() {
        let (visible, reasoning) = feed_all(&["<think>deep</th", "ink>done"]);
        assert_eq!(visible, "done");
        assert_eq!(reasoning, "deep");
    }

    #[test]
    fn partial_tag_prefix_is_withheld_until_resolved() {
        let mut c = StreamClassifier::new();
        let d = c.feed("he<th");
        // "<th" may still become "<think>" — only "he" may be emitted now.
        assert_eq!(d.visible, "he");
        let d = c.feed("at was fun");
        // It did not: the withheld text is released unmodified.
        assert_eq!(d.visible, "<that was fun");
        assert_eq!(c.reasoning_text(), "");
    }

    #[test]
    fn lone_angle_bracket_is_eventually_emitted() {
        let (visible, reasoning) = feed_all(&["a < b"]);
        assert_eq!(visible, "a < b");
        assert_eq!(reasoning, "");
    }

    #[test]
    fn trailing_partial_tag_is_flushed_by_finalize() {
        let mut c = StreamClassifier::new();
        let d = c.feed("end<thin");
        assert_eq!(d.visible, "end");
        let d = c.finalize();
        assert_eq!(d.visible, "<thin");
        assert_eq!(c.visible_text(), "end<thin");
    }

    // ── Unterminated reasoning ────────────────────────────────────────────────

    #[test]
    fn unterminated_reasoning_flushes_to_reasoning_on_finalize() {
        let mut c = StreamClassifier::new();
        c.feed("<think>oops");
        let d = c.finalize();
        assert_eq!(d.reasoning, "oops");
        assert_eq!(c.visible_text(), "");
        assert_eq!(c.reasoning_text(), "oops");
    }

    #[test]
    fn in_reasoning_reports_open_think_section() {
        let mut c = StreamClassifier::new();
        assert!(!c.in_reasoning());
        c.feed("<think>hmm");
        assert!(c.in_reasoning());
        c.feed("</think>");
        assert!(!c.in_reasoning());
    }

    // ── Delta semantics ───────────────────────────────────────────────────────

    #[test]
    fn deltas_concatenate_to_accumulators() {
        let mut c = StreamClassifier::new();
        let mut vis = String::new();
        let mut rea = String::new();
        for f in ["say <th", "ink>let me see</think>", " hello", ""] {
            let d = c.feed(f);
            vis.push_str(&d.visible);
            rea.push_str(&d.reasoning);
        }
        let d = c.finalize();
        vis.push_str(&d.visible);
        rea.push_str(&d.reasoning);
        assert_eq!(vis, c.visible_text());
        assert_eq!(rea, c.reasoning_text());
    }

    #[test]
    fn empty_fragment_is_a_no_op() {
        let mut c = StreamClassifier::new();
        let d = c.feed("");
        assert!(d.is_empty());
    }

    #[test]
    fn reset_clears_all_state() {
        let mut c = StreamClassifier::new();
        c.feed("<think>abc");
        c.reset();
        assert!(!c.in_reasoning());
        assert_eq!(c.visible_text(), "");
        assert_eq!(c.reasoning_text(), "");
        let d = c.feed("fresh");
        assert_eq!(d.visible, "fresh");
    }

    // ── partial_tag_suffix ────────────────────────────────────────────────────

    #[test]
    fn partial_suffix_finds_longest_prefix() {
        assert_eq!(partial_tag_suffix("abc<think", "<think>"), 6);
        assert_eq!(partial_tag_suffix("abc<", "<think>"), 1);
        assert_eq!(partial_tag_suffix("abc", "<think>"), 0);
        assert_eq!(partial_tag_suffix("", "<think>"), 0);
    }

    #[test]
    fn partial_suffix_ignores_non_prefix_angle_text() {
        assert_eq!(partial_tag_suffix("a <b", "<think>"), 0);
        assert_eq!(partial_tag_suffix("x</t", "</think>"), 3);
    }

    #[test]
    fn partial_suffix_is_safe_with_multibyte_text() {
        assert_eq!(partial_tag_suffix("π ≈ 3<t", "<think>"), 2);
        assert_eq!(partial_tag_suffix("émoji🎉", "<think>"), 0);
    }
}
