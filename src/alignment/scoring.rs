use serde::{Deserialize, Serialize};

use crate::alignment::normalize::normalize;
use crate::types::{PositionScores, ScoreResult, WordSpec};

/// Per-position weights; should sum to at most 1.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Weights {
    pub start: f64,
    pub middle: f64,
    pub end: f64,
}

impl Weights {
    pub fn total(&self) -> f64 {
        self.start + self.middle + self.end
    }
}

impl Default for Weights {
    fn default() -> Self {
        Self {
            start: 0.35,
            middle: 0.30,
            end: 0.35,
        }
    }
}

/// Scores `candidate` against `spec` after normalizing it the way the spec's word was.
pub fn score_word(candidate: &str, spec: &WordSpec, weights: &Weights) -> ScoreResult {
    let normalized = normalize(candidate, spec.normalize);
    score_normalized(&normalized, spec, weights)
}

/// Positional similarity for a candidate already normalized under `spec.normalize`.
///
/// First and last characters are all-or-nothing; the middle term is the fraction of
/// the spec's interior positions, below the shorter length's last index, that the
/// candidate reproduces at the same index.
pub fn score_normalized(candidate: &str, spec: &WordSpec, weights: &Weights) -> ScoreResult {
    if candidate.is_empty() || spec.length == 0 {
        return ScoreResult::default();
    }
    let cand = candidate.chars().collect::<Vec<_>>();
    let m = spec.length.min(cand.len());

    let start = if m >= 1 && spec.start_char == cand.first().copied() {
        1.0
    } else {
        0.0
    };
    let end = if m >= 2 && spec.end_char == cand.last().copied() {
        1.0
    } else {
        0.0
    };

    let mut considered = 0usize;
    let mut matched = 0usize;
    for (&pos, &c) in spec.interior_chars.range(..m.saturating_sub(1)) {
        considered += 1;
        if cand.get(pos) == Some(&c) {
            matched += 1;
        }
    }
    let middle = if considered == 0 {
        0.0
    } else {
        matched as f64 / considered as f64
    };

    ScoreResult {
        score: weights.start * start + weights.middle * middle + weights.end * end,
        detail: PositionScores { start, middle, end },
    }
}
