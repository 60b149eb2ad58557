//! Trigram-based text similarity.
//!
//! Mirrors the `pg_trgm` semantics the catalog's similarity queries rely
//! on: each alphanumeric word is padded with two leading spaces and one
//! trailing space, trigrams are collected into a set, and similarity is
//! the Jaccard coefficient of the two sets.

use std::collections::HashSet;

/// Lowercases and trims a free-text input.
pub fn normalize_text(input: &str) -> String {
    input.trim().to_lowercase()
}

/// Trigram similarity between two strings, in `[0.0, 1.0]`.
///
/// Inputs are compared case-insensitively. Returns 0.0 when either side
/// produces no trigrams (e.g. empty or punctuation-only strings).
pub fn trigram_similarity(a: &str, b: &str) -> f64 {
    let ta = trigrams(a);
    let tb = trigrams(b);
    if ta.is_empty() || tb.is_empty() {
        return 0.0;
    }
    let intersection = ta.intersection(&tb).count() as f64;
    let union = ta.union(&tb).count() as f64;
    intersection / union
}

/// Padded word trigrams of a string.
fn trigrams(s: &str) -> HashSet<String> {
    let mut set = HashSet::new();
    let lower = s.to_lowercase();
    for word in lower
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
    {
        let padded: Vec<char> = format!("  {word} ").chars().collect();
        for window in padded.windows(3) {
            set.insert(window.iter().collect());
        }
    }
    set
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_strings_score_one() {
        assert_eq!(trigram_similarity("amoxicilline", "amoxicilline"), 1.0);
        assert_eq!(trigram_similarity("Amoxicilline", "amoxicilline"), 1.0);
    }

    #[test]
    fn disjoint_strings_score_zero() {
        assert_eq!(trigram_similarity("xyz", "qqq"), 0.0);
    }

    #[test]
    fn empty_input_scores_zero() {
        assert_eq!(trigram_similarity("", "amoxicilline"), 0.0);
        assert_eq!(trigram_similarity("  ", "---"), 0.0);
    }

    #[test]
    fn prefix_scores_below_typo() {
        // A four-letter prefix of a long name shares few trigrams with it,
        // while a single-letter typo keeps most of them.
        let prefix = trigram_similarity("amox", "amoxicilline");
        let typo = trigram_similarity("amoxicillina", "amoxicilline");
        assert!(prefix < 0.3, "got {prefix}");
        assert!(typo > 0.5, "got {typo}");
    }

    #[test]
    fn multi_word_names() {
        let s = trigram_similarity("doliprane 500", "doliprane");
        assert!(s > 0.3, "got {s}");
    }

    #[test]
    fn normalize_trims_and_lowercases() {
        assert_eq!(normalize_text("  AmOx  "), "amox");
    }
}
