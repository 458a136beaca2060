use super::Candidate;
use crate::alignment::scoring::Weights;
use crate::alignment::span_tracker::is_blocked;
use crate::pipeline::traits::WordScorer;
use crate::types::{MappingEntry, Span, Token, WordSpec};

/// Fixed-width sliding window: prompt word `i` against reference token `s + i`.
///
/// Returns the best window not blocked by `used_spans`; earliest wins ties.
/// `None` when the prompt is empty or longer than the reference, or when every
/// window is blocked.
pub fn fallback_window(
    specs: &[WordSpec],
    reference: &[Token],
    weights: &Weights,
    used_spans: &[Span],
    scorer: &dyn WordScorer,
) -> Option<Candidate> {
    let width = specs.len();
    if width == 0 || width > reference.len() {
        return None;
    }

    let mut best: Option<Candidate> = None;
    for start in 0..=(reference.len() - width) {
        let span = Span::new(start, start + width - 1);
        if is_blocked(&span, used_spans) {
            continue;
        }
        let mapping = specs
            .iter()
            .enumerate()
            .map(|(prompt_index, spec)| {
                let token = &reference[start + prompt_index];
                MappingEntry {
                    prompt_index,
                    reference_index: start + prompt_index,
                    matched_word: token.text.clone(),
                    score: scorer.score(&token.text, spec, weights).score,
                    skip_count: 0,
                }
            })
            .collect::<Vec<_>>();
        let score = mapping.iter().map(|m| m.score).sum::<f64>() / width as f64;
        if best.as_ref().map_or(true, |b| score > b.score) {
            best = Some(Candidate {
                start_offset: start,
                mapping,
                score,
                ranking_score: score,
                span,
            });
        }
    }

    if let Some(found) = &best {
        tracing::debug!(
            start = found.start_offset,
            score = format!("{:.3}", found.score),
            "assembler: fallback window selected"
        );
    }
    best
}
