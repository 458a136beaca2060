use serde::Deserialize;

use crate::alignment::scoring::Weights;
use crate::alignment::span_tracker::is_blocked;
use crate::pipeline::traits::WordScorer;
use crate::types::{MappingEntry, Span, Token, WordSpec};

mod candidate_selector;
mod fallback;
#[cfg(test)]
mod tests;
mod window_search;

pub use fallback::fallback_window;

/// Tuning of the skip-tolerant search.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct AssemblyOptions {
    pub weights: Weights,
    /// Explicit exclusive cap on starting offsets; derived from the first word when `None`.
    pub max_window_start: Option<usize>,
    /// Offsets scanned past the first word's best single match when the cap is derived.
    pub window_margin: usize,
    /// Extra reference tokens that may be skipped before each prompt word.
    pub max_skip: usize,
    /// Subtracted from a word score whenever a skip was used.
    pub skip_penalty: f64,
    pub position_bonus: f64,
    pub bonus_free_offsets: usize,
    pub bonus_decay_offsets: usize,
}

impl Default for AssemblyOptions {
    fn default() -> Self {
        Self {
            weights: Weights::default(),
            max_window_start: None,
            window_margin: 50,
            max_skip: 2,
            skip_penalty: 0.1,
            position_bonus: 0.01,
            bonus_free_offsets: 10,
            bonus_decay_offsets: 50,
        }
    }
}

/// One complete prompt-to-reference mapping.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub start_offset: usize,
    /// One entry per prompt word, reference indices strictly increasing.
    pub mapping: Vec<MappingEntry>,
    /// Mean per-word score in [0, 1].
    pub score: f64,
    /// `score` plus the position bonus; used only to rank candidates.
    pub ranking_score: f64,
    pub span: Span,
}

/// Outcome of the primary search. The assembler never applies a threshold.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Assembly {
    /// Best candidate whose span is free.
    pub best: Option<Candidate>,
    /// Best candidate rejected because its span was already claimed.
    pub best_blocked: Option<Candidate>,
    pub offsets_scanned: usize,
}

/// Searches every starting offset below the window cap for the mapping that best explains `specs`.
pub fn assemble(
    specs: &[WordSpec],
    reference: &[Token],
    options: &AssemblyOptions,
    used_spans: &[Span],
    scorer: &dyn WordScorer,
) -> Assembly {
    if specs.is_empty() || reference.is_empty() {
        return Assembly::default();
    }

    let cap = window_search::window_start_cap(specs, reference, options, used_spans, scorer);
    let mut selector = candidate_selector::CandidateSelector::default();

    for start in 0..cap {
        let Some(mapping) = window_search::walk_from(specs, reference, start, options, scorer)
        else {
            continue;
        };
        debug_assert!(
            mapping
                .windows(2)
                .all(|w| w[0].reference_index < w[1].reference_index),
            "mapping must be monotonic"
        );
        let (Some(first), Some(last)) = (mapping.first(), mapping.last()) else {
            continue;
        };
        let span = Span::new(first.reference_index, last.reference_index);
        let score = mapping.iter().map(|m| m.score).sum::<f64>() / specs.len() as f64;
        let ranking_score = score + candidate_selector::position_bonus(start, options);
        let blocked = is_blocked(&span, used_spans);
        let candidate = Candidate {
            start_offset: start,
            mapping,
            score,
            ranking_score,
            span,
        };
        if selector.offer(candidate, blocked) {
            tracing::debug!(
                start,
                span_start = span.start,
                span_end = span.end,
                blocked,
                score = format!("{score:.3}"),
                ranking = format!("{ranking_score:.3}"),
                "assembler: new best candidate"
            );
        }
    }

    let (best, best_blocked) = selector.finish();
    Assembly {
        best,
        best_blocked,
        offsets_scanned: cap,
    }
}
