use std::path::Path;

use serde::Deserialize;

use crate::alignment::assembler::AssemblyOptions;
use crate::alignment::lexicon::LexiconConfig;
use crate::alignment::normalize::NormalizeOptions;
use crate::error::AlignmentError;

/// Word-count bands for the length-dependent acceptance threshold.
const DYNAMIC_THRESHOLDS: [(usize, f64); 3] = [(5, 0.86), (10, 0.80), (20, 0.75)];
const DYNAMIC_THRESHOLD_LONG: f64 = 0.72;
const WEIGHT_SUM_TOLERANCE: f64 = 1e-9;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct AlignerConfig {
    pub normalize: NormalizeOptions,
    pub assembly: AssemblyOptions,
    /// Minimum score for an assembled match.
    pub accept_threshold: f64,
    /// Lower bar for the fixed-window fallback.
    pub fallback_threshold: f64,
    /// Matches at or above this score claim their reference span.
    pub high_confidence_threshold: f64,
    /// Replace `accept_threshold` with a bar that depends on prompt word count.
    pub dynamic_threshold: bool,
    /// Retry with diacritics folded when a toned pass finds nothing.
    pub tone_insensitive_retry: bool,
    pub lexicon: LexiconConfig,
}

impl Default for AlignerConfig {
    fn default() -> Self {
        Self {
            normalize: NormalizeOptions::default(),
            assembly: AssemblyOptions::default(),
            accept_threshold: 0.75,
            fallback_threshold: 0.6,
            high_confidence_threshold: 0.85,
            dynamic_threshold: false,
            tone_insensitive_retry: true,
            lexicon: LexiconConfig::default(),
        }
    }
}

impl AlignerConfig {
    /// Behaviour of the first matcher generation: no skips, diacritics always folded.
    pub fn legacy() -> Self {
        Self {
            normalize: NormalizeOptions {
                strip_punctuation: true,
                remove_diacritics: true,
            },
            assembly: AssemblyOptions {
                max_skip: 0,
                skip_penalty: 0.0,
                ..AssemblyOptions::default()
            },
            tone_insensitive_retry: false,
            ..Self::default()
        }
    }

    pub fn load(path: &Path) -> Result<Self, AlignmentError> {
        let data = std::fs::read_to_string(path)
            .map_err(|e| AlignmentError::io("read aligner config", e))?;
        serde_json::from_str(&data).map_err(|e| AlignmentError::json("aligner config", e))
    }

    pub fn validate(&self) -> Result<(), AlignmentError> {
        let w = &self.assembly.weights;
        if [w.start, w.middle, w.end]
            .iter()
            .any(|v| !v.is_finite() || *v < 0.0)
        {
            return Err(AlignmentError::invalid_input(
                "weights must be finite and non-negative",
            ));
        }
        if w.total() > 1.0 + WEIGHT_SUM_TOLERANCE {
            return Err(AlignmentError::invalid_input(format!(
                "weights sum to {:.3}, expected at most 1",
                w.total()
            )));
        }
        for (name, value) in [
            ("accept_threshold", self.accept_threshold),
            ("fallback_threshold", self.fallback_threshold),
            ("high_confidence_threshold", self.high_confidence_threshold),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(AlignmentError::invalid_input(format!(
                    "{name} must lie in [0, 1], got {value}"
                )));
            }
        }
        if self.fallback_threshold > self.accept_threshold
            || self.accept_threshold > self.high_confidence_threshold
        {
            return Err(AlignmentError::invalid_input(
                "thresholds must satisfy fallback <= accept <= high_confidence",
            ));
        }
        if !self.assembly.skip_penalty.is_finite() || self.assembly.skip_penalty < 0.0 {
            return Err(AlignmentError::invalid_input(
                "skip_penalty must be finite and non-negative",
            ));
        }
        if !self.assembly.position_bonus.is_finite() || self.assembly.position_bonus < 0.0 {
            return Err(AlignmentError::invalid_input(
                "position_bonus must be finite and non-negative",
            ));
        }
        Ok(())
    }

    /// Acceptance bar for a prompt of `word_count` words.
    pub fn accept_threshold_for(&self, word_count: usize) -> f64 {
        if !self.dynamic_threshold {
            return self.accept_threshold;
        }
        DYNAMIC_THRESHOLDS
            .iter()
            .find(|(max_words, _)| word_count <= *max_words)
            .map(|&(_, threshold)| threshold)
            .unwrap_or(DYNAMIC_THRESHOLD_LONG)
    }
}
