use std::collections::HashMap;

use serde::Deserialize;
use unicode_normalization::UnicodeNormalization;

const DEFAULT_NUMBER_WORDS: [(&str, &str); 11] = [
    ("không", "0"),
    ("một", "1"),
    ("hai", "2"),
    ("ba", "3"),
    ("bốn", "4"),
    ("sáu", "6"),
    ("bảy", "7"),
    ("tám", "8"),
    ("chín", "9"),
    ("mười", "10"),
    ("tư", "4"),
];

const DEFAULT_MONTH_PHRASES: [(&str, &str); 15] = [
    ("tháng giêng", "tháng 1"),
    ("tháng một", "tháng 1"),
    ("tháng hai", "tháng 2"),
    ("tháng ba", "tháng 3"),
    ("tháng tư", "tháng 4"),
    ("tháng bốn", "tháng 4"),
    ("tháng năm", "tháng 5"),
    ("tháng sáu", "tháng 6"),
    ("tháng bảy", "tháng 7"),
    ("tháng tám", "tháng 8"),
    ("tháng chín", "tháng 9"),
    ("tháng mười", "tháng 10"),
    ("tháng mười một", "tháng 11"),
    ("tháng mười hai", "tháng 12"),
    ("tháng chạp", "tháng 12"),
];

const DEFAULT_HEADER_MARKERS: [&str; 8] = [
    "nguồn:",
    "source:",
    "url:",
    "link:",
    "ảnh:",
    "video:",
    "tiêu đề:",
    "title:",
];

const DEFAULT_ATTRIBUTION_MARKERS: [&str; 2] = ["(dân trí)", "dân trí"];

/// Lookup tables used during canonicalization, as they appear in configuration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct LexiconConfig {
    /// Single number word to digits.
    pub number_words: HashMap<String, String>,
    /// Multi-word month phrase to its canonical phrase.
    pub month_phrases: HashMap<String, String>,
    /// Word meaning both "year" and "five".
    pub year_word: String,
    pub year_word_digit: String,
    /// Reference lines opening with one of these are dropped.
    pub header_markers: Vec<String>,
    /// Leading source attributions stripped from reference lines.
    pub attribution_markers: Vec<String>,
}

impl Default for LexiconConfig {
    fn default() -> Self {
        Self {
            number_words: DEFAULT_NUMBER_WORDS
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            month_phrases: DEFAULT_MONTH_PHRASES
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            year_word: "năm".to_string(),
            year_word_digit: "5".to_string(),
            header_markers: DEFAULT_HEADER_MARKERS.iter().map(|s| s.to_string()).collect(),
            attribution_markers: DEFAULT_ATTRIBUTION_MARKERS
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
struct Phrase {
    source: Vec<String>,
    target: Vec<String>,
}

/// Compiled form of [`LexiconConfig`]: keys folded to NFC lowercase, phrases longest first.
#[derive(Debug, Clone, PartialEq)]
pub struct Lexicon {
    number_words: HashMap<String, String>,
    phrases: Vec<Phrase>,
    year_word: String,
    year_word_digit: String,
    header_markers: Vec<String>,
    attribution_markers: Vec<String>,
}

impl Default for Lexicon {
    fn default() -> Self {
        Self::new(&LexiconConfig::default())
    }
}

fn fold_key(s: &str) -> String {
    s.nfc().collect::<String>().to_lowercase()
}

fn words(s: &str) -> Vec<String> {
    fold_key(s).split_whitespace().map(str::to_string).collect()
}

impl Lexicon {
    pub fn new(config: &LexiconConfig) -> Self {
        let mut phrases = config
            .month_phrases
            .iter()
            .map(|(source, target)| Phrase {
                source: words(source),
                target: words(target),
            })
            .filter(|p| !p.source.is_empty() && !p.target.is_empty())
            .collect::<Vec<_>>();
        // Longest phrase first; ties ordered lexically so matching is deterministic.
        phrases.sort_by(|a, b| {
            b.source
                .len()
                .cmp(&a.source.len())
                .then_with(|| a.source.cmp(&b.source))
        });

        let mut markers = config
            .attribution_markers
            .iter()
            .map(|m| fold_key(m))
            .collect::<Vec<_>>();
        markers.sort_by_key(|m| std::cmp::Reverse(m.chars().count()));

        Self {
            number_words: config
                .number_words
                .iter()
                .map(|(k, v)| (fold_key(k), v.trim().to_string()))
                .collect(),
            phrases,
            year_word: fold_key(&config.year_word),
            year_word_digit: config.year_word_digit.trim().to_string(),
            header_markers: config.header_markers.iter().map(|m| fold_key(m)).collect(),
            attribution_markers: markers,
        }
    }

    /// Longest month phrase starting at `words[0]`: (words consumed, replacement).
    pub fn match_phrase<S: AsRef<str>>(&self, words: &[S]) -> Option<(usize, &[String])> {
        self.phrases.iter().find_map(|phrase| {
            let n = phrase.source.len();
            if words.len() < n {
                return None;
            }
            let hit = phrase
                .source
                .iter()
                .zip(words.iter())
                .all(|(a, b)| a == b.as_ref());
            hit.then_some((n, phrase.target.as_slice()))
        })
    }

    pub fn number_word(&self, word: &str) -> Option<&str> {
        self.number_words.get(word).map(String::as_str)
    }

    /// Digit for the year/five word, or `None` when `word` is something else
    /// or `next` is a 4-digit number (then the word means "year").
    pub fn year_word(&self, word: &str, next: Option<&str>) -> Option<&str> {
        if word != self.year_word {
            return None;
        }
        if next.is_some_and(is_four_digit_number) {
            return None;
        }
        Some(self.year_word_digit.as_str())
    }

    pub fn is_header_line(&self, lowered_line: &str) -> bool {
        self.header_markers
            .iter()
            .any(|m| lowered_line.starts_with(m.as_str()))
    }

    pub fn attribution_markers(&self) -> &[String] {
        &self.attribution_markers
    }
}

pub(crate) fn is_four_digit_number(s: &str) -> bool {
    s.len() == 4 && s.bytes().all(|b| b.is_ascii_digit())
}
