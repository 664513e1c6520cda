//! String similarity primitives.
//!
//! Pure functions with no address semantics. All of them are total: empty,
//! mixed-case and non-ASCII input degrades to a low score, never a panic.
//!
//! | Function | Range | Case |
//! |----------|-------|------|
//! | [`jaro`] | 0.0–1.0 | sensitive |
//! | [`jaro_winkler`] | 0.0–1.0 | insensitive |
//! | [`levenshtein_distance`] | 0.. | sensitive |
//! | [`levenshtein_similarity`] | 0.0–1.0 | insensitive |
//! | [`token_similarity`] | 0.0–1.0 | insensitive, order-free |
//! | [`consonant_similarity`] | 0.0–1.0 | insensitive |
//!
//! City and street comparison in the matcher uses [`token_similarity`].

pub mod jaro;
pub mod levenshtein;
pub mod token;

pub use jaro::{jaro, jaro_winkler, jaro_winkler_with_scaling};
pub use levenshtein::{levenshtein_distance, levenshtein_similarity};
pub use token::token_similarity;

/// Damping applied when consonant skeletons are unavailable
const CONSONANT_FALLBACK_DAMPING: f64 = 0.5;

/// Jaro-Winkler over precomputed consonant skeletons.
///
/// When either skeleton is empty, falls back to Jaro-Winkler over the full
/// strings scaled by one half, so consonant-only evidence never rivals a
/// direct match.
#[must_use]
pub fn consonant_similarity(s1: &str, s2: &str, consonants1: &str, consonants2: &str) -> f64 {
    if consonants1.is_empty() || consonants2.is_empty() {
        return jaro_winkler(s1, s2) * CONSONANT_FALLBACK_DAMPING;
    }
    jaro_winkler(consonants1, consonants2)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::extract_consonants;

    #[test]
    fn test_consonant_similarity_tolerates_vowel_typos() {
        let (a, b) = ("Хрещатик", "Хрищатек");
        let score = consonant_similarity(a, b, &extract_consonants(a), &extract_consonants(b));
        assert!((score - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_consonant_similarity_fallback_is_damped() {
        let score = consonant_similarity("Іо", "Іо", &extract_consonants("Іо"), "");
        assert!((score - 0.5).abs() < 1e-9);
        assert!(consonant_similarity("", "", "", "").abs() < 1e-9);
    }
}
