pub mod alignment;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod types;

pub use alignment::assembler::{assemble, fallback_window, Assembly, AssemblyOptions, Candidate};
pub use alignment::lexicon::{Lexicon, LexiconConfig};
pub use alignment::normalize::{normalize, strip_reference_header, tokenize, NormalizeOptions};
pub use alignment::perfect_match::is_perfect_match;
pub use alignment::report::{
    build_report, BatchSummary, DecisionRecord, Meta, RecordOutcome, Report,
};
pub use alignment::scoring::{score_word, Weights};
pub use alignment::span_tracker::{is_blocked, UsedSpanTracker};
pub use alignment::word_spec::build_word_spec;
pub use config::AlignerConfig;
pub use error::AlignmentError;
pub use pipeline::batch::{transcribe_clips, AudioClip, BatchDriver, BatchOutput};
pub use pipeline::builder::PromptAlignerBuilder;
pub use pipeline::defaults::{
    HallucinationFilter, LexiconTokenizer, PositionalWordScorer, SkipTolerantAssembler,
};
pub use pipeline::records::{
    parse_records, read_records, write_records, DirectoryReferenceStore, InMemoryReferenceStore,
    PromptRecord, ReferenceDocument,
};
pub use pipeline::runtime::PromptAligner;
pub use pipeline::traits::{PromptTokenizer, ReferenceStore, SegmentAssembler, Transcriber, WordScorer};
pub use types::{
    AlignmentResult, Decision, MappingEntry, PositionScores, ScoreResult, Span, Token, TokenStream,
    WordSpec,
};
