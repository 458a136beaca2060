use super::window_search::{walk_from, window_start_cap};
use super::{assemble, fallback_window, AssemblyOptions};
use crate::alignment::lexicon::Lexicon;
use crate::alignment::normalize::{tokenize, NormalizeOptions};
use crate::alignment::scoring::Weights;
use crate::alignment::word_spec::build_from_normalized;
use crate::pipeline::defaults::PositionalWordScorer;
use crate::types::{Span, Token, WordSpec};

const SCENARIO: &str = "sáng nay chúng tôi cùng đi học";

fn tokens(text: &str) -> Vec<Token> {
    tokenize(text, NormalizeOptions::default(), &Lexicon::default()).tokens
}

fn specs(text: &str) -> Vec<WordSpec> {
    tokens(text)
        .into_iter()
        .map(|t| build_from_normalized(&t.text, t.text.clone(), NormalizeOptions::default()))
        .collect()
}

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

#[test]
fn exact_run_is_found_without_skips() {
    let reference = tokens(SCENARIO);
    let assembly = assemble(
        &specs("chúng tôi cùng"),
        &reference,
        &AssemblyOptions::default(),
        &[],
        &PositionalWordScorer,
    );
    let best = assembly.best.expect("candidate");
    assert_eq!(best.span, Span::new(2, 4));
    assert_eq!(best.start_offset, 2);
    assert!(close(best.score, 1.0));
    assert!(best.mapping.iter().all(|m| m.skip_count == 0));
    assert!(assembly.best_blocked.is_none());
}

#[test]
fn inserted_reference_word_is_skipped_with_penalty() {
    let reference = tokens(SCENARIO);
    let assembly = assemble(
        &specs("chúng tôi đi học"),
        &reference,
        &AssemblyOptions::default(),
        &[],
        &PositionalWordScorer,
    );
    let best = assembly.best.expect("candidate");
    assert_eq!(best.span, Span::new(2, 6));
    let indices = best
        .mapping
        .iter()
        .map(|m| m.reference_index)
        .collect::<Vec<_>>();
    assert_eq!(indices, [2, 3, 5, 6]);
    assert_eq!(best.mapping[2].skip_count, 1);
    assert_eq!(best.mapping[2].matched_word, "đi");
    // "đi" scores 0.7 on its own, minus the skip penalty.
    assert!(close(best.mapping[2].score, 0.6));
    assert!(close(best.score, 0.9));
}

#[test]
fn zero_skip_forces_lockstep_walk() {
    let reference = tokens(SCENARIO);
    let options = AssemblyOptions {
        max_skip: 0,
        ..AssemblyOptions::default()
    };
    let assembly = assemble(
        &specs("chúng tôi đi học"),
        &reference,
        &options,
        &[],
        &PositionalWordScorer,
    );
    let best = assembly.best.expect("candidate");
    assert!(best.mapping.iter().all(|m| m.skip_count == 0));
    assert_eq!(best.span, Span::new(2, 5));
    assert!(close(best.score, 0.5));
}

#[test]
fn earliest_offset_wins_ties() {
    let reference = tokens("chúng tôi đến chúng tôi");
    let assembly = assemble(
        &specs("chúng tôi"),
        &reference,
        &AssemblyOptions::default(),
        &[],
        &PositionalWordScorer,
    );
    let best = assembly.best.expect("candidate");
    assert_eq!(best.start_offset, 0);
    assert_eq!(best.span, Span::new(0, 1));
}

#[test]
fn used_span_moves_match_to_next_occurrence() {
    let reference = tokens("chúng tôi đến chúng tôi");
    let used = [Span::new(0, 1)];
    let assembly = assemble(
        &specs("chúng tôi"),
        &reference,
        &AssemblyOptions::default(),
        &used,
        &PositionalWordScorer,
    );
    let best = assembly.best.expect("unblocked candidate");
    assert_eq!(best.span, Span::new(3, 4));
    let blocked = assembly.best_blocked.expect("blocked candidate");
    assert_eq!(blocked.span, Span::new(0, 1));
    assert!(close(blocked.score, 1.0));
}

#[test]
fn explicit_window_cap_limits_offsets() {
    let reference = tokens(SCENARIO);
    let options = AssemblyOptions {
        max_window_start: Some(1),
        ..AssemblyOptions::default()
    };
    let assembly = assemble(
        &specs("chúng tôi"),
        &reference,
        &options,
        &[],
        &PositionalWordScorer,
    );
    assert_eq!(assembly.offsets_scanned, 1);
    let best = assembly.best.expect("candidate");
    assert_eq!(best.start_offset, 0);
    // Reached from offset 0 by skipping two tokens.
    assert_eq!(best.span, Span::new(2, 3));
    assert!(close(best.score, 0.95));
}

#[test]
fn derived_cap_sits_past_first_word_match() {
    let reference = tokens(SCENARIO);
    let options = AssemblyOptions {
        window_margin: 0,
        ..AssemblyOptions::default()
    };
    let cap = window_start_cap(
        &specs("chúng tôi"),
        &reference,
        &options,
        &[],
        &PositionalWordScorer,
    );
    assert_eq!(cap, 3);

    let cap = window_start_cap(
        &specs("chúng tôi"),
        &reference,
        &options,
        &[Span::new(0, 3)],
        &PositionalWordScorer,
    );
    // "cùng" is the best first-word match left outside the used span.
    assert_eq!(cap, 5);

    let cap = window_start_cap(
        &specs("xyz"),
        &reference,
        &options,
        &[],
        &PositionalWordScorer,
    );
    assert_eq!(cap, reference.len());
}

#[test]
fn walk_stops_when_reference_runs_out() {
    let reference = tokens("chúng tôi");
    let options = AssemblyOptions::default();
    assert!(walk_from(&specs("chúng tôi đi"), &reference, 0, &options, &PositionalWordScorer).is_none());
    assert!(walk_from(&specs("chúng"), &reference, 2, &options, &PositionalWordScorer).is_none());

    let assembly = assemble(
        &specs("chúng tôi đi"),
        &reference,
        &options,
        &[],
        &PositionalWordScorer,
    );
    assert!(assembly.best.is_none());
    assert!(assembly.best_blocked.is_none());
}

#[test]
fn empty_inputs_produce_no_candidates() {
    let options = AssemblyOptions::default();
    let empty = assemble(&[], &tokens(SCENARIO), &options, &[], &PositionalWordScorer);
    assert!(empty.best.is_none());
    assert_eq!(empty.offsets_scanned, 0);

    let empty = assemble(&specs("chúng tôi"), &[], &options, &[], &PositionalWordScorer);
    assert!(empty.best.is_none());
}

#[test]
fn mappings_are_strictly_increasing() {
    let reference = tokens("hôm qua sáng nay chúng tôi cùng nhau đi học tại trường làng");
    for prompt in ["hôm nay chúng tôi đi học", "nay tôi nhau học", "trường làng", "chúng ta đi"] {
        let assembly = assemble(
            &specs(prompt),
            &reference,
            &AssemblyOptions::default(),
            &[],
            &PositionalWordScorer,
        );
        let best = assembly.best.expect("candidate");
        assert!(best
            .mapping
            .windows(2)
            .all(|w| w[0].reference_index < w[1].reference_index));
        assert!((0.0..=1.0).contains(&best.score));
        assert_eq!(best.mapping.len(), specs(prompt).len());
    }
}

#[test]
fn fallback_picks_best_free_window() {
    let reference = tokens("chúng tôi đến chúng tôi");
    let weights = Weights::default();
    let prompt = specs("chúng tôi");

    let found = fallback_window(&prompt, &reference, &weights, &[], &PositionalWordScorer)
        .expect("window");
    assert_eq!(found.span, Span::new(0, 1));
    assert!(close(found.score, 1.0));

    let found = fallback_window(
        &prompt,
        &reference,
        &weights,
        &[Span::new(0, 1)],
        &PositionalWordScorer,
    )
    .expect("window");
    assert_eq!(found.span, Span::new(3, 4));
}

#[test]
fn fallback_none_when_prompt_longer_or_all_blocked() {
    let reference = tokens("chúng tôi");
    let weights = Weights::default();
    assert!(fallback_window(
        &specs("chúng tôi đi"),
        &reference,
        &weights,
        &[],
        &PositionalWordScorer
    )
    .is_none());
    assert!(fallback_window(
        &specs("chúng tôi"),
        &reference,
        &weights,
        &[Span::new(0, 1)],
        &PositionalWordScorer
    )
    .is_none());
    assert!(fallback_window(&[], &reference, &weights, &[], &PositionalWordScorer).is_none());
}

#[test]
fn derived_cap_reaches_latest_best_first_word() {
    let fillers = vec!["và"; 80].join(" ");
    let reference = tokens(&format!("chúng tôi {fillers} chúng tôi cùng đi học tại trường"));
    let prompt = specs("chúng tôi đi học tại trường");
    let options = AssemblyOptions::default();

    let cap = window_start_cap(&prompt, &reference, &options, &[], &PositionalWordScorer);
    assert_eq!(cap, reference.len());

    let best = assemble(&prompt, &reference, &options, &[], &PositionalWordScorer)
        .best
        .expect("candidate");
    assert_eq!(best.span, Span::new(82, 88));
    assert!(best.score > 0.93);
}

#[test]
fn huge_skip_and_margin_do_not_overflow() {
    let reference = tokens(SCENARIO);
    let options = AssemblyOptions {
        max_skip: usize::MAX,
        window_margin: usize::MAX,
        ..AssemblyOptions::default()
    };
    let assembly = assemble(
        &specs("chúng tôi đi học"),
        &reference,
        &options,
        &[],
        &PositionalWordScorer,
    );
    assert_eq!(assembly.offsets_scanned, reference.len());
    let best = assembly.best.expect("candidate");
    assert_eq!(best.span, Span::new(2, 6));
}
