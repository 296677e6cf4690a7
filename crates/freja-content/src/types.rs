/// What a segment is, and therefore how it should be rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentKind {
    /// Ordinary prose with no recognised formatting syntax.
    PlainText,
    /// Prose in which at least one lightweight-markup pattern matched
    /// (emphasis, list item, heading, inline code, link).  Promotion is
    /// span-granular: one match anywhere tags the whole span.
    StructuredText,
    /// Block-level math, extracted from `\[ ... \]` delimiters.
    MathDisplay,
    /// Run-in-text math, extracted from `\( ... \)` or `$ ... $`.
    MathInline,
}

/// A classified, contiguous span of renderable content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub kind: SegmentKind,
    /// The text payload.  For math kinds this is the delimiter-stripped,
    /// whitespace-trimmed expression; the delimiters are implied by `kind`.
    pub content: String,
    /// Render key derived from the source byte offset.  Unique within one
    /// render pass only; never persisted.
    pub id: String,
}

impl Segment {
    pub(crate) fn new(kind: SegmentKind, content: impl Into<String>, start: usize) -> Self {
        Self { kind, content: content.into(), id: format!("seg-{start}") }
    }

    /// True for both math kinds.
    pub fn is_math(&self) -> bool {
        matches!(self.kind, SegmentKind::MathDisplay | SegmentKind::MathInline)
    }
}

/// The segmenter's output for one render pass.
///
/// `segments` is in original document order, contiguous and non-overlapping,
/// and covers the entire input.  Concatenating segment contents (with math
/// delimiters reinserted per `kind`) reconstructs the input.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedContent {
    pub has_math: bool,
    pub has_structured_markup: bool,
    pub segments: Vec<Segment>,
}

/// A math-delimiter hit from one grammar scan, before overlap filtering.
///
/// `start`/`end` are byte offsets into the scanned string and cover the
/// delimiters; `inner` excludes them and is whitespace-trimmed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MathMatch {
    pub start: usize,
    pub end: usize,
    pub inner: String,
    pub display: bool,
}
