use super::AssemblyOptions;
use crate::pipeline::traits::WordScorer;
use crate::types::{MappingEntry, Span, Token, WordSpec};

/// Exclusive upper bound on the starting offsets to scan.
///
/// An explicit cap wins. Otherwise the cap sits `window_margin` offsets past the
/// latest best single-token match of the first prompt word, ignoring tokens
/// that already belong to a used span. With no usable first-word match the
/// whole reference is scanned.
pub(super) fn window_start_cap(
    specs: &[WordSpec],
    reference: &[Token],
    options: &AssemblyOptions,
    used_spans: &[Span],
    scorer: &dyn WordScorer,
) -> usize {
    let t_len = reference.len();
    if let Some(cap) = options.max_window_start {
        return cap.min(t_len);
    }
    let Some(first) = specs.first() else {
        return 0;
    };

    let mut best: Option<(usize, f64)> = None;
    for (idx, token) in reference.iter().enumerate() {
        if used_spans.iter().any(|s| s.start <= idx && idx <= s.end) {
            continue;
        }
        let score = scorer.score(&token.text, first, &options.weights).score;
        if score <= 0.0 {
            continue;
        }
        if best.map_or(true, |(_, b)| score >= b) {
            best = Some((idx, score));
        }
    }

    match best {
        Some((idx, _)) => idx
            .saturating_add(options.window_margin)
            .saturating_add(1)
            .min(t_len),
        None => t_len,
    }
}

/// Greedy skip-tolerant walk from `start`.
///
/// Each prompt word takes the best token in `[t, t + max_skip]`, where any
/// skip costs `skip_penalty`; the earliest token wins ties. Returns `None` when
/// the reference runs out before every prompt word is placed.
pub(super) fn walk_from(
    specs: &[WordSpec],
    reference: &[Token],
    start: usize,
    options: &AssemblyOptions,
    scorer: &dyn WordScorer,
) -> Option<Vec<MappingEntry>> {
    let mut mapping = Vec::with_capacity(specs.len());
    let mut cursor = start;
    for (prompt_index, spec) in specs.iter().enumerate() {
        let (reference_index, adjusted) =
            best_in_window(spec, reference, cursor, options, scorer)?;
        mapping.push(MappingEntry {
            prompt_index,
            reference_index,
            matched_word: reference[reference_index].text.clone(),
            score: adjusted.max(0.0),
            skip_count: reference_index - cursor,
        });
        cursor = reference_index + 1;
    }
    Some(mapping)
}

fn best_in_window(
    spec: &WordSpec,
    reference: &[Token],
    cursor: usize,
    options: &AssemblyOptions,
    scorer: &dyn WordScorer,
) -> Option<(usize, f64)> {
    if cursor >= reference.len() {
        return None;
    }
    let last = cursor.saturating_add(options.max_skip).min(reference.len() - 1);
    let mut best: Option<(usize, f64)> = None;
    for idx in cursor..=last {
        let raw = scorer.score(&reference[idx].text, spec, &options.weights).score;
        let adjusted = if idx > cursor {
            raw - options.skip_penalty
        } else {
            raw
        };
        if best.map_or(true, |(_, b)| adjusted > b) {
            best = Some((idx, adjusted));
        }
    }
    best
}
