use crate::types::Span;

/// Share of a candidate's length that may overlap an already used span.
pub const OVERLAP_TOLERANCE_RATIO: f64 = 0.2;

/// Largest overlap, in tokens, a candidate of `len` tokens may have with one used span.
fn allowed_overlap(len: usize) -> usize {
    ((len as f64 * OVERLAP_TOLERANCE_RATIO).floor() as usize).max(1)
}

/// True when `candidate` overlaps some used span by more than the tolerance.
pub fn is_blocked(candidate: &Span, used: &[Span]) -> bool {
    let allowed = allowed_overlap(candidate.len());
    used.iter().any(|u| candidate.overlap(u) > allowed)
}

/// Reference spans already claimed by accepted prompts of one reference document.
///
/// Append-only. One instance per document; the batch driver drops it when it
/// moves to the next document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UsedSpanTracker {
    spans: Vec<Span>,
}

impl UsedSpanTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, span: Span) {
        self.spans.push(span);
    }

    pub fn spans(&self) -> &[Span] {
        &self.spans
    }

    pub fn is_blocked(&self, candidate: &Span) -> bool {
        is_blocked(candidate, &self.spans)
    }

    pub fn len(&self) -> usize {
        self.spans.len()
    }

    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }
}
