use std::collections::BTreeMap;

use crate::alignment::normalize::{normalize, NormalizeOptions};
use crate::types::WordSpec;

/// Positional fingerprint of `word` under `options`.
pub fn build_word_spec(word: &str, options: NormalizeOptions) -> WordSpec {
    let normalized = normalize(word, options);
    build_from_normalized(word, normalized, options)
}

/// Like [`build_word_spec`] for a token that is already normalized under `options`.
pub(crate) fn build_from_normalized(
    raw: &str,
    normalized: String,
    options: NormalizeOptions,
) -> WordSpec {
    let chars = normalized.chars().collect::<Vec<_>>();
    let length = chars.len();
    let interior_chars = if length > 2 {
        chars[1..length - 1]
            .iter()
            .enumerate()
            .map(|(i, &c)| (i + 1, c))
            .collect()
    } else {
        BTreeMap::new()
    };

    WordSpec {
        raw_form: raw.to_string(),
        start_char: chars.first().copied(),
        end_char: chars.last().copied(),
        normalized_form: normalized,
        length,
        interior_chars,
        normalize: options,
    }
}
