use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;
use unicode_normalization::UnicodeNormalization;

use crate::alignment::lexicon::Lexicon;
use crate::types::{Token, TokenStream};

/// One class per base letter; every member folds to the class base.
const DIACRITIC_CLASSES: [(char, &str); 7] = [
    ('a', "àáảãạăằắẳẵặâầấẩẫậ"),
    ('e', "èéẻẽẹêềếểễệ"),
    ('i', "ìíỉĩị"),
    ('o', "òóỏõọôồốổỗộơờớởỡợ"),
    ('u', "ùúủũụưừứửữự"),
    ('y', "ỳýỷỹỵ"),
    ('d', "đ"),
];

/// Non-ASCII punctuation replaced alongside ASCII punctuation.
const EXTRA_PUNCTUATION: &str = "“”‘’«»…–—·•¿¡。，！？：；、";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(default)]
pub struct NormalizeOptions {
    pub strip_punctuation: bool,
    pub remove_diacritics: bool,
}

impl Default for NormalizeOptions {
    fn default() -> Self {
        Self {
            strip_punctuation: true,
            remove_diacritics: false,
        }
    }
}

impl NormalizeOptions {
    pub fn folded(self) -> Self {
        Self {
            remove_diacritics: true,
            ..self
        }
    }
}

static RE_DATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(\d{1,2})[/.\-](\d{1,2})[/.\-](\d{4})\b").expect("valid date regex")
});

fn is_punctuation(c: char) -> bool {
    c.is_ascii_punctuation() || EXTRA_PUNCTUATION.contains(c)
}

pub fn fold_diacritic(c: char) -> char {
    DIACRITIC_CLASSES
        .iter()
        .find(|(_, members)| members.contains(c))
        .map(|&(base, _)| base)
        .unwrap_or(c)
}

pub fn remove_diacritics(text: &str) -> String {
    text.chars().map(fold_diacritic).collect()
}

/// NFC + lowercase.
fn fold_case(text: &str) -> String {
    text.nfc().collect::<String>().to_lowercase()
}

fn strip_punctuation(text: &str) -> String {
    text.chars()
        .map(|c| if is_punctuation(c) { ' ' } else { c })
        .collect()
}

/// Canonical comparable form of `text`. Never fails; empty in, empty out.
pub fn normalize(text: &str, options: NormalizeOptions) -> String {
    if text.is_empty() {
        return String::new();
    }
    let mut s = fold_case(text);
    if options.strip_punctuation {
        s = strip_punctuation(&s);
    }
    if options.remove_diacritics {
        s = remove_diacritics(&s);
    }
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// `d/m/yyyy` (also `-` or `.` separated) to `"d m yyyy"`, leading zeros dropped.
pub fn canonicalize_dates(text: &str) -> String {
    RE_DATE
        .replace_all(text, |caps: &regex::Captures<'_>| {
            let day = caps[1].trim_start_matches('0');
            let month = caps[2].trim_start_matches('0');
            format!(
                "{} {} {}",
                if day.is_empty() { "0" } else { day },
                if month.is_empty() { "0" } else { month },
                &caps[3]
            )
        })
        .into_owned()
}

/// Number words and month phrases to digits over whitespace-separated words.
pub fn canonicalize_number_words(text: &str, lexicon: &Lexicon) -> String {
    let words = text.split_whitespace().collect::<Vec<_>>();
    let mut out: Vec<String> = Vec::with_capacity(words.len());
    let mut i = 0;
    while i < words.len() {
        let (consumed, replacement) = canonical_at(&words[..], i, lexicon);
        match replacement {
            Some(rep) => out.extend(rep),
            None => out.push(words[i].to_string()),
        }
        i += consumed;
    }
    out.join(" ")
}

/// Canonical replacement for the words starting at `i`, and how many words it covers.
/// `None` replacement means the word stays as is.
fn canonical_at<S: AsRef<str>>(
    words: &[S],
    i: usize,
    lexicon: &Lexicon,
) -> (usize, Option<Vec<String>>) {
    if let Some((n, target)) = lexicon.match_phrase(&words[i..]) {
        return (n, Some(target.to_vec()));
    }
    let word = words[i].as_ref();
    if let Some(digits) = lexicon.number_word(word) {
        return (1, Some(vec![digits.to_string()]));
    }
    let next = words.get(i + 1).map(|w| w.as_ref());
    if let Some(digit) = lexicon.year_word(word, next) {
        return (1, Some(vec![digit.to_string()]));
    }
    (1, None)
}

/// Splits `text` into normalized tokens, keeping the surface words each token came from.
pub fn tokenize(text: &str, options: NormalizeOptions, lexicon: &Lexicon) -> TokenStream {
    let surface = text
        .split_whitespace()
        .map(str::to_string)
        .collect::<Vec<_>>();

    // (piece, surface index) before number-word canonicalization.
    let mut pieces: Vec<(String, usize)> = Vec::with_capacity(surface.len());
    for (idx, word) in surface.iter().enumerate() {
        let mut s = canonicalize_dates(&fold_case(word));
        if options.strip_punctuation {
            s = strip_punctuation(&s);
        }
        pieces.extend(s.split_whitespace().map(|p| (p.to_string(), idx)));
    }

    let piece_words = pieces.iter().map(|(p, _)| p.as_str()).collect::<Vec<_>>();
    let mut tokens = Vec::with_capacity(pieces.len());
    let mut i = 0;
    while i < pieces.len() {
        let (consumed, replacement) = canonical_at(&piece_words[..], i, lexicon);
        let surface_start = pieces[i].1;
        let surface_end = pieces[i + consumed - 1].1;
        let texts = replacement.unwrap_or_else(|| vec![pieces[i].0.clone()]);
        for text in texts {
            let text = if options.remove_diacritics {
                remove_diacritics(&text)
            } else {
                text
            };
            tokens.push(Token {
                text,
                surface_start,
                surface_end,
            });
        }
        i += consumed;
    }

    debug_assert!(
        tokens
            .windows(2)
            .all(|w| w[0].surface_start <= w[1].surface_start),
        "token surface ranges must be ordered"
    );

    TokenStream { surface, tokens }
}

/// Drops boilerplate from a reference document: URL lines, header-marker lines,
/// leading source attributions. Remaining lines keep their original text.
pub fn strip_reference_header(text: &str, lexicon: &Lexicon) -> String {
    let mut kept = Vec::new();
    for line in text.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        let lowered = fold_case(trimmed);
        if is_url_line(&lowered) || lexicon.is_header_line(&lowered) {
            continue;
        }
        let body = strip_attribution(trimmed, &lowered, lexicon);
        if !body.is_empty() {
            kept.push(body.to_string());
        }
    }
    kept.join("\n")
}

fn is_url_line(lowered: &str) -> bool {
    lowered.starts_with("http://") || lowered.starts_with("https://") || lowered.starts_with("www.")
}

fn strip_attribution<'a>(line: &'a str, lowered: &str, lexicon: &Lexicon) -> &'a str {
    for marker in lexicon.attribution_markers() {
        if !lowered.starts_with(marker.as_str()) {
            continue;
        }
        // Case folding keeps char counts for the Vietnamese alphabet; map by chars, not bytes.
        let marker_chars = marker.chars().count();
        let Some((cut, _)) = line.char_indices().nth(marker_chars) else {
            return "";
        };
        let rest = line[cut..].trim_start();
        return rest
            .trim_start_matches(|c: char| c == '-' || c == '–' || c == '—' || c == ':')
            .trim_start();
    }
    line
}
