use std::path::Path;

use crate::alignment::lexicon::Lexicon;
use crate::config::AlignerConfig;
use crate::error::AlignmentError;
use crate::pipeline::defaults::{LexiconTokenizer, PositionalWordScorer, SkipTolerantAssembler};
use crate::pipeline::runtime::{PromptAligner, PromptAlignerParts};
use crate::pipeline::traits::{PromptTokenizer, SegmentAssembler, WordScorer};

pub struct PromptAlignerBuilder {
    config: AlignerConfig,
    tokenizer: Option<Box<dyn PromptTokenizer>>,
    word_scorer: Option<Box<dyn WordScorer>>,
    segment_assembler: Option<Box<dyn SegmentAssembler>>,
}

impl PromptAlignerBuilder {
    pub fn new(config: AlignerConfig) -> Self {
        Self {
            config,
            tokenizer: None,
            word_scorer: None,
            segment_assembler: None,
        }
    }

    pub fn from_config_path(path: &Path) -> Result<Self, AlignmentError> {
        Ok(Self::new(AlignerConfig::load(path)?))
    }

    pub fn config_mut(&mut self) -> &mut AlignerConfig {
        &mut self.config
    }

    pub fn with_tokenizer(mut self, tokenizer: Box<dyn PromptTokenizer>) -> Self {
        self.tokenizer = Some(tokenizer);
        self
    }

    pub fn with_word_scorer(mut self, word_scorer: Box<dyn WordScorer>) -> Self {
        self.word_scorer = Some(word_scorer);
        self
    }

    pub fn with_segment_assembler(mut self, segment_assembler: Box<dyn SegmentAssembler>) -> Self {
        self.segment_assembler = Some(segment_assembler);
        self
    }

    pub fn build(self) -> Result<PromptAligner, AlignmentError> {
        self.config.validate()?;
        let lexicon = Lexicon::new(&self.config.lexicon);
        tracing::debug!(
            accept = self.config.accept_threshold,
            fallback = self.config.fallback_threshold,
            high_confidence = self.config.high_confidence_threshold,
            max_skip = self.config.assembly.max_skip,
            remove_diacritics = self.config.normalize.remove_diacritics,
            "prompt aligner configured"
        );

        Ok(PromptAligner::from_parts(PromptAlignerParts {
            config: self.config,
            lexicon,
            tokenizer: self
                .tokenizer
                .unwrap_or_else(|| Box::new(LexiconTokenizer)),
            word_scorer: self
                .word_scorer
                .unwrap_or_else(|| Box::new(PositionalWordScorer)),
            segment_assembler: self
                .segment_assembler
                .unwrap_or_else(|| Box::new(SkipTolerantAssembler)),
        }))
    }
}
