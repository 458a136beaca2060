use crate::alignment::lexicon::is_four_digit_number;
use crate::alignment::normalize::{normalize, NormalizeOptions};

/// Prompts at or below this many chars only count as perfect on full equality.
pub(crate) const MIN_SUBSTRING_CHARS: usize = 3;

fn is_three_digit_number(s: &str) -> bool {
    s.len() == 3 && s.bytes().all(|b| b.is_ascii_digit())
}

/// `needle` occurs in `haystack` starting and ending on word boundaries.
fn contains_words(haystack: &str, needle: &str) -> bool {
    if needle.is_empty() {
        return false;
    }
    format!(" {haystack} ").contains(&format!(" {needle} "))
}

/// True when the prompt needs no alignment: it already is (part of) the reference.
///
/// Both sides are normalized with default options first. Matches when the
/// strings are equal, when a prompt longer than three chars occurs in the
/// reference on word boundaries, or when a truncated year in the prompt
/// ("124" for "2024") is the only difference.
pub fn is_perfect_match(reference: &str, prompt: &str) -> bool {
    let options = NormalizeOptions::default();
    let reference = normalize(reference, options);
    let prompt = normalize(prompt, options);
    is_perfect_normalized(&reference, &prompt)
}

pub(crate) fn is_perfect_normalized(reference: &str, prompt: &str) -> bool {
    if prompt.is_empty() || reference.is_empty() {
        return false;
    }
    if reference == prompt {
        return true;
    }
    if prompt.chars().count() > MIN_SUBSTRING_CHARS && contains_words(reference, prompt) {
        return true;
    }
    year_corrected(reference, prompt).is_some()
}

/// The prompt with one truncated year restored, when that makes it match the reference.
pub(crate) fn year_corrected(reference: &str, prompt: &str) -> Option<String> {
    let years = reference
        .split_whitespace()
        .filter(|t| is_four_digit_number(t))
        .collect::<Vec<_>>();
    if years.is_empty() {
        return None;
    }

    let mut tried = Vec::new();
    for short in prompt.split_whitespace().filter(|t| is_three_digit_number(t)) {
        if tried.contains(&short) {
            continue;
        }
        tried.push(short);
        for year in years.iter().filter(|y| y.ends_with(&short[1..])) {
            let corrected = prompt
                .split_whitespace()
                .map(|t| if t == short { *year } else { t })
                .collect::<Vec<_>>()
                .join(" ");
            if corrected == reference || contains_words(reference, &corrected) {
                return Some(corrected);
            }
        }
    }
    None
}
