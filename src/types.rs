use std::collections::BTreeMap;

use serde::Serialize;

use crate::alignment::normalize::NormalizeOptions;

/// One normalized comparison unit.
///
/// `surface_start..=surface_end` is the range of raw whitespace-delimited words
/// this token was derived from. Merged number phrases and split dates share
/// their source range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub text: String,
    pub surface_start: usize,
    pub surface_end: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenStream {
    /// Raw words of the source text, in order.
    pub surface: Vec<String>,
    pub tokens: Vec<Token>,
}

impl TokenStream {
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn texts(&self) -> Vec<&str> {
        self.tokens.iter().map(|t| t.text.as_str()).collect()
    }

    /// Normalized tokens joined by single spaces.
    pub fn normalized_text(&self) -> String {
        self.texts().join(" ")
    }

    /// Surface text covering tokens `first..=last`. Empty when out of range.
    pub fn phrase(&self, first: usize, last: usize) -> String {
        if first > last || last >= self.tokens.len() {
            return String::new();
        }
        let start = self.tokens[first..=last]
            .iter()
            .map(|t| t.surface_start)
            .min()
            .unwrap_or(0);
        let end = self.tokens[first..=last]
            .iter()
            .map(|t| t.surface_end)
            .max()
            .unwrap_or(start);
        self.surface[start..=end.min(self.surface.len().saturating_sub(1))].join(" ")
    }
}

/// Positional fingerprint of one prompt word.
#[derive(Debug, Clone, PartialEq)]
pub struct WordSpec {
    pub raw_form: String,
    pub normalized_form: String,
    /// Length in chars of `normalized_form`.
    pub length: usize,
    pub start_char: Option<char>,
    pub end_char: Option<char>,
    /// Only positions strictly between the first and last char.
    pub interior_chars: BTreeMap<usize, char>,
    /// Options `normalized_form` was produced with; candidates are scored under the same options.
    pub normalize: NormalizeOptions,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct PositionScores {
    pub start: f64,
    pub middle: f64,
    pub end: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct ScoreResult {
    pub score: f64,
    pub detail: PositionScores,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MappingEntry {
    pub prompt_index: usize,
    pub reference_index: usize,
    pub matched_word: String,
    /// Word score after the skip penalty.
    pub score: f64,
    pub skip_count: usize,
}

/// Inclusive range of reference token indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        debug_assert!(start <= end, "span start must not exceed end");
        Self { start, end }
    }

    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> usize {
        self.end - self.start + 1
    }

    /// Number of token positions shared with `other`.
    pub fn overlap(&self, other: &Span) -> usize {
        let lo = self.start.max(other.start);
        let hi = self.end.min(other.end);
        if lo > hi {
            0
        } else {
            hi - lo + 1
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Decision {
    ExactMatch,
    AssembledMatch,
    FallbackMatch,
    /// A candidate cleared the threshold but its span was already used.
    SpanClaimed,
    NoMatch,
    EmptyInput,
}

impl Decision {
    pub const ALL: [Decision; 6] = [
        Decision::ExactMatch,
        Decision::AssembledMatch,
        Decision::FallbackMatch,
        Decision::SpanClaimed,
        Decision::NoMatch,
        Decision::EmptyInput,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::ExactMatch => "EXACT_MATCH",
            Self::AssembledMatch => "ASSEMBLED_MATCH",
            Self::FallbackMatch => "FALLBACK_MATCH",
            Self::SpanClaimed => "SPAN_CLAIMED",
            Self::NoMatch => "NO_MATCH",
            Self::EmptyInput => "EMPTY_INPUT",
        }
    }

    pub fn is_accepted(self) -> bool {
        matches!(
            self,
            Self::ExactMatch | Self::AssembledMatch | Self::FallbackMatch
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlignmentResult {
    pub accepted: bool,
    pub corrected_text: Option<String>,
    pub score: f64,
    pub consumed_span: Option<Span>,
    pub decision: Decision,
    pub mapping: Vec<MappingEntry>,
}

impl AlignmentResult {
    pub fn rejected(decision: Decision, score: f64) -> Self {
        Self {
            accepted: false,
            corrected_text: None,
            score,
            consumed_span: None,
            decision,
            mapping: Vec::new(),
        }
    }

    /// Text to persist for `original`: the correction when accepted, otherwise the original verbatim.
    pub fn final_text<'a>(&'a self, original: &'a str) -> &'a str {
        match (&self.corrected_text, self.accepted) {
            (Some(text), true) => text.as_str(),
            _ => original,
        }
    }
}
