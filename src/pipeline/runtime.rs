use crate::alignment::assembler::Candidate;
use crate::alignment::lexicon::Lexicon;
use crate::alignment::normalize::NormalizeOptions;
use crate::alignment::perfect_match::{year_corrected, MIN_SUBSTRING_CHARS};
use crate::alignment::span_tracker::is_blocked;
use crate::alignment::word_spec::build_from_normalized;
use crate::config::AlignerConfig;
use crate::pipeline::traits::{PromptTokenizer, SegmentAssembler, WordScorer};
use crate::types::{AlignmentResult, Decision, Span, TokenStream, WordSpec};

pub struct PromptAligner {
    config: AlignerConfig,
    lexicon: Lexicon,
    tokenizer: Box<dyn PromptTokenizer>,
    word_scorer: Box<dyn WordScorer>,
    segment_assembler: Box<dyn SegmentAssembler>,
}

pub(crate) struct PromptAlignerParts {
    pub config: AlignerConfig,
    pub lexicon: Lexicon,
    pub tokenizer: Box<dyn PromptTokenizer>,
    pub word_scorer: Box<dyn WordScorer>,
    pub segment_assembler: Box<dyn SegmentAssembler>,
}

impl PromptAligner {
    pub(crate) fn from_parts(parts: PromptAlignerParts) -> Self {
        Self {
            config: parts.config,
            lexicon: parts.lexicon,
            tokenizer: parts.tokenizer,
            word_scorer: parts.word_scorer,
            segment_assembler: parts.segment_assembler,
        }
    }

    pub fn config(&self) -> &AlignerConfig {
        &self.config
    }

    pub fn lexicon(&self) -> &Lexicon {
        &self.lexicon
    }

    /// Matches at or above this score should claim their span.
    pub fn high_confidence_threshold(&self) -> f64 {
        self.config.high_confidence_threshold
    }

    /// Tokenizes `text` the way [`PromptAligner::align`] does, so callers can
    /// interpret consumed spans.
    pub fn tokenize(&self, text: &str) -> TokenStream {
        self.tokenizer
            .tokenize(text, self.config.normalize, &self.lexicon)
    }

    /// Aligns one prompt against one reference document.
    ///
    /// `used_spans` are token ranges of `reference` already claimed by earlier
    /// prompts. Never fails: every outcome is a [`Decision`].
    pub fn align(&self, prompt: &str, reference: &str, used_spans: &[Span]) -> AlignmentResult {
        let options = self.config.normalize;
        let result = self.align_pass(prompt, reference, used_spans, options);
        if result.decision != Decision::NoMatch
            || !self.config.tone_insensitive_retry
            || options.remove_diacritics
        {
            return result;
        }

        let retried = self.align_pass(prompt, reference, used_spans, options.folded());
        tracing::debug!(
            decision = retried.decision.as_str(),
            score = format!("{:.3}", retried.score),
            "aligner: tone-insensitive retry"
        );
        if retried.decision == Decision::NoMatch {
            result
        } else {
            retried
        }
    }

    fn align_pass(
        &self,
        prompt: &str,
        reference: &str,
        used_spans: &[Span],
        options: NormalizeOptions,
    ) -> AlignmentResult {
        let prompt_stream = self.tokenizer.tokenize(prompt, options, &self.lexicon);
        let reference_stream = self.tokenizer.tokenize(reference, options, &self.lexicon);
        if prompt_stream.is_empty() || reference_stream.is_empty() {
            return AlignmentResult::rejected(Decision::EmptyInput, 0.0);
        }

        if let Some(run) = find_exact_run(&prompt_stream, &reference_stream, used_spans) {
            let last = run.start + run.width - 1;
            let keeps_prompt = !options.remove_diacritics
                || self.tones_agree(prompt, reference, options, &prompt_stream, &reference_stream, run.start);
            let corrected_text = if keeps_prompt {
                prompt.to_string()
            } else {
                reference_stream.phrase(run.start, last)
            };
            tracing::debug!(
                occurrences = run.occurrences,
                start = run.start,
                claimed = run.span.is_none(),
                keeps_prompt,
                "aligner: exact match"
            );
            return AlignmentResult {
                accepted: true,
                corrected_text: Some(corrected_text),
                score: 1.0,
                consumed_span: run.span,
                decision: Decision::ExactMatch,
                mapping: Vec::new(),
            };
        }

        let specs = word_specs(&prompt_stream, options);
        let threshold = self.config.accept_threshold_for(prompt_stream.len());
        let assembly = self.segment_assembler.assemble(
            &specs,
            &reference_stream.tokens,
            &self.config.assembly,
            used_spans,
            self.word_scorer.as_ref(),
        );
        tracing::debug!(
            offsets = assembly.offsets_scanned,
            best = assembly.best.as_ref().map(|c| format!("{:.3}", c.score)),
            best_blocked = assembly.best_blocked.as_ref().map(|c| format!("{:.3}", c.score)),
            threshold = format!("{threshold:.3}"),
            "aligner: primary assembly"
        );

        let best_score = assembly.best.as_ref().map_or(0.0, |c| c.score);
        if let Some(best) = assembly.best.filter(|c| c.score >= threshold) {
            return accepted(Decision::AssembledMatch, best, &reference_stream);
        }
        if let Some(blocked) = assembly
            .best_blocked
            .filter(|c| c.score >= threshold && c.score > best_score)
        {
            return AlignmentResult {
                mapping: blocked.mapping,
                ..AlignmentResult::rejected(Decision::SpanClaimed, blocked.score)
            };
        }

        let fallback = self.segment_assembler.fallback(
            &specs,
            &reference_stream.tokens,
            &self.config.assembly.weights,
            used_spans,
            self.word_scorer.as_ref(),
        );
        let fallback_score = fallback.as_ref().map_or(0.0, |c| c.score);
        if let Some(window) = fallback.filter(|c| c.score >= self.config.fallback_threshold) {
            return accepted(Decision::FallbackMatch, window, &reference_stream);
        }

        AlignmentResult::rejected(Decision::NoMatch, best_score.max(fallback_score))
    }

    /// Whether a run found under folded diacritics also matches with them kept.
    /// Positions where the folded tokens differ (a restored year) are not compared.
    fn tones_agree(
        &self,
        prompt: &str,
        reference: &str,
        options: NormalizeOptions,
        prompt_stream: &TokenStream,
        reference_stream: &TokenStream,
        start: usize,
    ) -> bool {
        let toned = NormalizeOptions {
            remove_diacritics: false,
            ..options
        };
        let prompt_toned = self.tokenizer.tokenize(prompt, toned, &self.lexicon);
        let reference_toned = self.tokenizer.tokenize(reference, toned, &self.lexicon);
        prompt_stream.tokens.iter().enumerate().all(|(i, folded)| {
            let Some(reference_folded) = reference_stream.tokens.get(start + i) else {
                return false;
            };
            if folded.text != reference_folded.text {
                return true;
            }
            match (prompt_toned.tokens.get(i), reference_toned.tokens.get(start + i)) {
                (Some(p), Some(r)) => p.text == r.text,
                _ => false,
            }
        })
    }
}

fn word_specs(prompt: &TokenStream, options: NormalizeOptions) -> Vec<WordSpec> {
    prompt
        .tokens
        .iter()
        .map(|t| {
            let raw = prompt
                .surface
                .get(t.surface_start)
                .map_or(t.text.as_str(), String::as_str);
            build_from_normalized(raw, t.text.clone(), options)
        })
        .collect()
}

fn accepted(decision: Decision, candidate: Candidate, reference: &TokenStream) -> AlignmentResult {
    AlignmentResult {
        accepted: true,
        corrected_text: Some(reference.phrase(candidate.span.start, candidate.span.end)),
        score: candidate.score,
        consumed_span: Some(candidate.span),
        decision,
        mapping: candidate.mapping,
    }
}

/// Start indices where `needle` occurs as a contiguous run of `haystack`.
fn token_runs(haystack: &[&str], needle: &[&str]) -> Vec<usize> {
    if needle.is_empty() || needle.len() > haystack.len() {
        return Vec::new();
    }
    haystack
        .windows(needle.len())
        .enumerate()
        .filter(|(_, window)| *window == needle)
        .map(|(start, _)| start)
        .collect()
}

struct ExactRun {
    /// Start of the first free occurrence, or of the first occurrence when all are claimed.
    start: usize,
    width: usize,
    span: Option<Span>,
    occurrences: usize,
}

/// The prompt's tokens occur as a contiguous run of the reference, possibly
/// after restoring a truncated year. Prompts of at most three chars only
/// count when they are the whole reference.
fn find_exact_run(
    prompt: &TokenStream,
    reference: &TokenStream,
    used_spans: &[Span],
) -> Option<ExactRun> {
    let prompt_words = prompt.texts();
    let reference_words = reference.texts();
    let short = prompt.normalized_text().chars().count() <= MIN_SUBSTRING_CHARS;
    let mut runs = if short && prompt_words != reference_words {
        Vec::new()
    } else {
        token_runs(&reference_words, &prompt_words)
    };
    if runs.is_empty() {
        let corrected = year_corrected(&reference.normalized_text(), &prompt.normalized_text())?;
        let corrected_words = corrected.split_whitespace().collect::<Vec<_>>();
        runs = token_runs(&reference_words, &corrected_words);
    }
    let width = prompt_words.len();
    let first = *runs.first()?;
    let span = runs
        .iter()
        .map(|&start| Span::new(start, start + width - 1))
        .find(|span| !is_blocked(span, used_spans));
    Some(ExactRun {
        start: span.map_or(first, |s| s.start),
        width,
        span,
        occurrences: runs.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::builder::PromptAlignerBuilder;

    const REFERENCE: &str = "Sáng nay chúng tôi cùng đi học tại trường. Chiều nay chúng tôi về nhà.";

    fn aligner() -> PromptAligner {
        PromptAlignerBuilder::new(AlignerConfig::default())
            .build()
            .expect("default config is valid")
    }

    #[test]
    fn empty_prompt_or_reference() {
        let aligner = aligner();
        assert_eq!(aligner.align("", REFERENCE, &[]).decision, Decision::EmptyInput);
        assert_eq!(aligner.align(" ... ", REFERENCE, &[]).decision, Decision::EmptyInput);
        let result = aligner.align("chúng tôi", "", &[]);
        assert_eq!(result.decision, Decision::EmptyInput);
        assert!(!result.accepted);
        assert_eq!(result.final_text("chúng tôi"), "chúng tôi");
    }

    #[test]
    fn exact_run_keeps_original_text() {
        let aligner = aligner();
        let result = aligner.align("Chúng tôi cùng đi học!", REFERENCE, &[]);
        assert_eq!(result.decision, Decision::ExactMatch);
        assert_eq!(result.score, 1.0);
        assert_eq!(result.corrected_text.as_deref(), Some("Chúng tôi cùng đi học!"));
        assert_eq!(result.consumed_span, Some(Span::new(2, 6)));
    }

    #[test]
    fn exact_match_takes_next_free_occurrence() {
        let aligner = aligner();
        let result = aligner.align("chúng tôi", REFERENCE, &[Span::new(2, 3)]);
        assert_eq!(result.decision, Decision::ExactMatch);
        assert_eq!(result.consumed_span, Some(Span::new(11, 12)));

        let result = aligner.align("chúng tôi", REFERENCE, &[Span::new(2, 3), Span::new(11, 12)]);
        assert!(result.accepted);
        assert_eq!(result.consumed_span, None);
    }

    #[test]
    fn truncated_year_counts_as_exact() {
        let aligner = aligner();
        let result = aligner.align("124 tỷ USD", "Doanh thu năm 2024 tỷ USD.", &[]);
        assert_eq!(result.decision, Decision::ExactMatch);
        assert_eq!(result.consumed_span, Some(Span::new(3, 5)));
        assert_eq!(result.corrected_text.as_deref(), Some("124 tỷ USD"));
    }

    #[test]
    fn noisy_prompt_is_replaced_by_reference_phrase() {
        let aligner = aligner();
        let result = aligner.align("hôm nay chúng tôi đi học", REFERENCE, &[]);
        assert_eq!(result.decision, Decision::AssembledMatch);
        assert!(result.score >= 0.75);
        let span = result.consumed_span.expect("span");
        assert_eq!(span.start, 0);
        assert_eq!(
            result.corrected_text.as_deref(),
            Some("Sáng nay chúng tôi cùng đi học")
        );
    }

    #[test]
    fn claimed_span_is_reported_not_reused() {
        let aligner = aligner();
        let reference = "hôm qua trời mưa rất to";
        let first = aligner.align("hôm qua trời mua rất to", reference, &[]);
        assert_eq!(first.decision, Decision::AssembledMatch);
        let used = [first.consumed_span.expect("span")];

        let second = aligner.align("hôm qua trời mua rất to", reference, &used);
        assert_eq!(second.decision, Decision::SpanClaimed);
        assert!(!second.accepted);
        assert_eq!(second.final_text("hôm qua trời mua rất to"), "hôm qua trời mua rất to");
    }

    #[test]
    fn unrelated_prompt_is_not_matched() {
        let aligner = aligner();
        let result = aligner.align("xyz qwv", REFERENCE, &[]);
        assert_eq!(result.decision, Decision::NoMatch);
        assert!(!result.accepted);
        assert!(result.corrected_text.is_none());
        assert!(result.consumed_span.is_none());
    }

    #[test]
    fn tone_insensitive_retry_recovers_unaccented_prompt() {
        let reference = "Người dân đổ xô đi mua vàng";
        let with_retry = aligner().align("nguoi dan do xo", reference, &[]);
        assert_eq!(with_retry.decision, Decision::ExactMatch);
        assert_eq!(with_retry.corrected_text.as_deref(), Some("Người dân đổ xô"));
        assert_eq!(with_retry.consumed_span, Some(Span::new(0, 3)));

        let config = AlignerConfig {
            tone_insensitive_retry: false,
            ..AlignerConfig::default()
        };
        let without = PromptAlignerBuilder::new(config)
            .build()
            .expect("valid config")
            .align("nguoi dan do xo", reference, &[]);
        assert!(!without.accepted);
    }

    #[test]
    fn folded_preset_restores_tones_only_when_missing() {
        let aligner = PromptAlignerBuilder::new(AlignerConfig::legacy())
            .build()
            .expect("valid config");
        let reference = "Người dân đổ xô đi mua vàng";

        let unaccented = aligner.align("nguoi dan do xo", reference, &[]);
        assert_eq!(unaccented.decision, Decision::ExactMatch);
        assert_eq!(unaccented.final_text("nguoi dan do xo"), "Người dân đổ xô");

        let accented = aligner.align("người dân đổ xô!", reference, &[]);
        assert_eq!(accented.decision, Decision::ExactMatch);
        assert_eq!(accented.final_text("người dân đổ xô!"), "người dân đổ xô!");
    }

    #[test]
    fn short_prompt_is_not_an_exact_run() {
        let aligner = aligner();
        let reference = "sáng nay chúng tôi cùng đi học";
        let result = aligner.align("đi", reference, &[]);
        assert_ne!(result.decision, Decision::ExactMatch);
        assert!(result.score < 1.0);

        let whole = aligner.align("Đi.", "đi", &[]);
        assert_eq!(whole.decision, Decision::ExactMatch);
        assert_eq!(whole.consumed_span, Some(Span::new(0, 0)));
    }

    #[test]
    fn unbounded_skip_settings_still_align() {
        let mut config = AlignerConfig::default();
        config.assembly.max_skip = usize::MAX;
        config.assembly.window_margin = usize::MAX;
        let aligner = PromptAlignerBuilder::new(config).build().expect("valid config");
        let result = aligner.align("chúng tôi đi học", REFERENCE, &[]);
        assert_eq!(result.decision, Decision::AssembledMatch);
        assert_eq!(result.consumed_span, Some(Span::new(2, 6)));
    }

    #[test]
    fn alignment_is_deterministic() {
        let aligner = aligner();
        let a = aligner.align("hôm nay chúng tôi đi học", REFERENCE, &[Span::new(11, 12)]);
        let b = aligner.align("hôm nay chúng tôi đi học", REFERENCE, &[Span::new(11, 12)]);
        assert_eq!(a, b);
    }

    #[test]
    fn token_runs_finds_every_occurrence() {
        assert_eq!(token_runs(&["a", "b", "a", "b"], &["a", "b"]), [0, 2]);
        assert!(token_runs(&["a"], &["a", "b"]).is_empty());
        assert!(token_runs(&["a"], &[]).is_empty());
    }
}
