//! Name normalization and the 0–100 similarity score.
//!
//! Scores are normalized Levenshtein ratios over [`case_key`] text. Diacritics
//! are kept: `Türk` and `Turk` differ by one edit, so a diacritic-stripped
//! spelling lands just under the default auto-match threshold and is offered
//! as a suggestion instead of being silently merged.

/// Trim and collapse inner whitespace runs to a single space.
pub fn clean_name(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Case-insensitive comparison key.
///
/// Every Turkish I form (`I`, `İ`, `ı`) folds to a plain `i`: uppercase text
/// cannot tell dotted from dotless, so `SATIŞ`, `Satış` and `satiş` share a
/// key.
pub fn case_key(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for (i, word) in s.split_whitespace().enumerate() {
        if i > 0 {
            out.push(' ');
        }
        for ch in word.chars() {
            match ch {
                'İ' | 'I' | 'ı' => out.push('i'),
                c => out.extend(c.to_lowercase()),
            }
        }
    }
    out
}

/// Case key with diacritics transliterated to ASCII (`satış fiyatı` →
/// `satis fiyati`). Used for header keyword matching only.
pub fn fold_key(s: &str) -> String {
    deunicode::deunicode(&case_key(s)).to_lowercase()
}

/// Similarity of two names in `[0, 100]`, floored to one decimal so a
/// reported score never rounds up across a threshold.
pub fn similarity(a: &str, b: &str) -> f64 {
    score_keys(&case_key(a), &case_key(b))
}

/// Similarity of two precomputed case keys.
pub fn score_keys(a: &str, b: &str) -> f64 {
    floor_tenth(strsim::normalized_levenshtein(a, b) * 100.0)
}

/// Upper bound of [`score_keys`] from character lengths alone: the edit
/// distance is at least the length difference.
pub fn length_bound(a_chars: usize, b_chars: usize) -> f64 {
    let max = a_chars.max(b_chars);
    if max == 0 {
        return 100.0;
    }
    let diff = a_chars.abs_diff(b_chars);
    (1.0 - diff as f64 / max as f64) * 100.0
}

fn floor_tenth(score: f64) -> f64 {
    // Guard float noise like 99.99999999 on identical-length ratios.
    ((score * 10.0) + 1e-9).floor() / 10.0
}
