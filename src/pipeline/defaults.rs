use crate::alignment::assembler::{assemble, fallback_window, Assembly, AssemblyOptions, Candidate};
use crate::alignment::lexicon::Lexicon;
use crate::alignment::normalize::{tokenize, NormalizeOptions};
use crate::alignment::scoring::{score_normalized, Weights};
use crate::error::AlignmentError;
use crate::pipeline::traits::{PromptTokenizer, SegmentAssembler, Transcriber, WordScorer};
use crate::types::{ScoreResult, Span, Token, TokenStream, WordSpec};

/// Phrases speech-to-text models tend to invent over silence or music.
pub const DEFAULT_HALLUCINATION_PHRASES: [&str; 5] =
    ["subscribe", "đăng ký", "like", "channel", "kênh"];

pub struct LexiconTokenizer;

impl PromptTokenizer for LexiconTokenizer {
    fn tokenize(&self, text: &str, options: NormalizeOptions, lexicon: &Lexicon) -> TokenStream {
        tokenize(text, options, lexicon)
    }
}

pub struct PositionalWordScorer;

impl WordScorer for PositionalWordScorer {
    fn score(&self, candidate: &str, spec: &WordSpec, weights: &Weights) -> ScoreResult {
        score_normalized(candidate, spec, weights)
    }
}

pub struct SkipTolerantAssembler;

impl SegmentAssembler for SkipTolerantAssembler {
    fn assemble(
        &self,
        specs: &[WordSpec],
        reference: &[Token],
        options: &AssemblyOptions,
        used_spans: &[Span],
        scorer: &dyn WordScorer,
    ) -> Assembly {
        assemble(specs, reference, options, used_spans, scorer)
    }

    fn fallback(
        &self,
        specs: &[WordSpec],
        reference: &[Token],
        weights: &Weights,
        used_spans: &[Span],
        scorer: &dyn WordScorer,
    ) -> Option<Candidate> {
        fallback_window(specs, reference, weights, used_spans, scorer)
    }
}

/// Wraps a [`Transcriber`] and blanks out transcripts containing a known hallucinated phrase.
pub struct HallucinationFilter<T> {
    inner: T,
    phrases: Vec<String>,
}

impl<T: Transcriber> HallucinationFilter<T> {
    pub fn new(inner: T) -> Self {
        Self::with_phrases(inner, DEFAULT_HALLUCINATION_PHRASES)
    }

    pub fn with_phrases<I, S>(inner: T, phrases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            inner,
            phrases: phrases
                .into_iter()
                .map(|p| p.as_ref().to_lowercase())
                .filter(|p| !p.is_empty())
                .collect(),
        }
    }

    fn is_hallucination(&self, text: &str) -> bool {
        let lowered = text.to_lowercase();
        self.phrases.iter().any(|p| lowered.contains(p.as_str()))
    }
}

impl<T: Transcriber> Transcriber for HallucinationFilter<T> {
    fn transcribe(&self, audio: &[u8]) -> Result<String, AlignmentError> {
        let text = self.inner.transcribe(audio)?;
        if self.is_hallucination(&text) {
            tracing::warn!(text = %text, "transcriber: dropping hallucinated output");
            return Ok(String::new());
        }
        Ok(text)
    }
}
