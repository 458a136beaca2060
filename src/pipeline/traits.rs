use crate::alignment::assembler::{Assembly, AssemblyOptions, Candidate};
use crate::alignment::lexicon::Lexicon;
use crate::alignment::normalize::NormalizeOptions;
use crate::alignment::scoring::Weights;
use crate::error::AlignmentError;
use crate::pipeline::records::ReferenceDocument;
use crate::types::{ScoreResult, Span, Token, TokenStream, WordSpec};

pub trait PromptTokenizer: Send + Sync {
    fn tokenize(&self, text: &str, options: NormalizeOptions, lexicon: &Lexicon) -> TokenStream;
}

/// Similarity of one reference token to one prompt word.
///
/// `candidate` is already normalized with `spec.normalize`.
pub trait WordScorer: Send + Sync {
    fn score(&self, candidate: &str, spec: &WordSpec, weights: &Weights) -> ScoreResult;
}

pub trait SegmentAssembler: Send + Sync {
    fn assemble(
        &self,
        specs: &[WordSpec],
        reference: &[Token],
        options: &AssemblyOptions,
        used_spans: &[Span],
        scorer: &dyn WordScorer,
    ) -> Assembly;

    fn fallback(
        &self,
        specs: &[WordSpec],
        reference: &[Token],
        weights: &Weights,
        used_spans: &[Span],
        scorer: &dyn WordScorer,
    ) -> Option<Candidate>;
}

/// Speech-to-text engine turning one audio clip into raw text.
pub trait Transcriber {
    fn transcribe(&self, audio: &[u8]) -> Result<String, AlignmentError>;
}

/// Source of reference documents for prompt records.
pub trait ReferenceStore {
    fn lookup(&self, record_id: &str) -> Option<ReferenceDocument<'_>>;
}
