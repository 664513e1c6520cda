//! Jaro and Jaro-Winkler similarity.
//!
//! Both operate on Unicode scalar values, so Cyrillic input is compared
//! letter by letter rather than byte by byte.

/// Default Winkler prefix scaling factor
pub const DEFAULT_PREFIX_SCALING: f64 = 0.1;

/// Longest common prefix the Winkler adjustment rewards
const MAX_PREFIX_LENGTH: usize = 4;

/// Jaro scores below this are returned without the prefix boost
const WINKLER_BOOST_THRESHOLD: f64 = 0.7;

#[inline]
fn count_to_f64(count: usize) -> f64 {
    #[allow(clippy::cast_precision_loss)]
    {
        count as f64
    }
}

/// Classic Jaro similarity, case-sensitive.
///
/// Returns 0.0 when either string is empty or no characters match.
#[must_use]
pub fn jaro(s1: &str, s2: &str) -> f64 {
    let a: Vec<char> = s1.chars().collect();
    let b: Vec<char> = s2.chars().collect();
    jaro_chars(&a, &b)
}

fn jaro_chars(a: &[char], b: &[char]) -> f64 {
    let (len1, len2) = (a.len(), b.len());
    if len1 == 0 || len2 == 0 {
        return 0.0;
    }

    let match_window = (len1.max(len2) / 2).saturating_sub(1);

    let mut a_matched = vec![false; len1];
    let mut b_matched = vec![false; len2];
    let mut matches = 0usize;

    for (i, &c) in a.iter().enumerate() {
        let start = i.saturating_sub(match_window);
        let end = (i + match_window + 1).min(len2);
        for j in start..end {
            if !b_matched[j] && b[j] == c {
                a_matched[i] = true;
                b_matched[j] = true;
                matches += 1;
                break;
            }
        }
    }

    if matches == 0 {
        return 0.0;
    }

    // Walk both matched streams in order; every disagreement is half a transposition
    let mut transpositions = 0usize;
    let mut b_matches = b
        .iter()
        .zip(b_matched.iter())
        .filter_map(|(c, &m)| m.then_some(*c));
    for (c, _) in a.iter().zip(a_matched.iter()).filter(|(_, &m)| m) {
        if b_matches.next() != Some(*c) {
            transpositions += 1;
        }
    }

    let m = count_to_f64(matches);
    let t = count_to_f64(transpositions) / 2.0;
    (m / count_to_f64(len1) + m / count_to_f64(len2) + (m - t) / m) / 3.0
}

/// Jaro-Winkler similarity with the default prefix scaling of 0.1.
///
/// Case-insensitive; see [`jaro_winkler_with_scaling`].
#[must_use]
pub fn jaro_winkler(s1: &str, s2: &str) -> f64 {
    jaro_winkler_with_scaling(s1, s2, DEFAULT_PREFIX_SCALING)
}

/// Jaro-Winkler similarity, case-insensitive.
///
/// Equal strings score 1.0 and an empty input scores 0.0. A Jaro score below
/// 0.7 is returned as is; above it, each character of the common prefix (at
/// most four) closes `scaling` of the remaining gap to 1.0.
#[must_use]
pub fn jaro_winkler_with_scaling(s1: &str, s2: &str, scaling: f64) -> f64 {
    if s1.is_empty() || s2.is_empty() {
        return 0.0;
    }

    let a: Vec<char> = s1.to_lowercase().chars().collect();
    let b: Vec<char> = s2.to_lowercase().chars().collect();
    if a == b {
        return 1.0;
    }

    let jaro = jaro_chars(&a, &b);
    if jaro < WINKLER_BOOST_THRESHOLD {
        return jaro;
    }

    let prefix = a
        .iter()
        .zip(b.iter())
        .take(MAX_PREFIX_LENGTH)
        .take_while(|(x, y)| x == y)
        .count();

    let scaling = scaling.clamp(0.0, 0.25);
    (jaro + count_to_f64(prefix) * scaling * (1.0 - jaro)).min(1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx_eq(a: f64, b: f64) -> bool {
        (a - b).abs() < 0.001
    }

    #[test]
    fn test_jaro_basic() {
        assert!(approx_eq(jaro("", ""), 0.0));
        assert!(approx_eq(jaro("abc", ""), 0.0));
        assert!(approx_eq(jaro("abc", "abc"), 1.0));
        assert!(approx_eq(jaro("abc", "xyz"), 0.0));
    }

    #[test]
    fn test_jaro_examples() {
        assert!(approx_eq(jaro("MARTHA", "MARHTA"), 0.944));
        assert!(approx_eq(jaro("DWAYNE", "DUANE"), 0.822));
        assert!(approx_eq(jaro("DIXON", "DICKSONX"), 0.767));
    }

    #[test]
    fn test_jaro_is_case_sensitive() {
        assert!(jaro("Київ", "київ") < 1.0);
    }

    #[test]
    fn test_jaro_winkler_examples() {
        assert!(approx_eq(jaro_winkler("MARTHA", "MARHTA"), 0.961));
        assert!(approx_eq(jaro_winkler("DWAYNE", "DUANE"), 0.84));
        assert!(approx_eq(jaro_winkler("DIXON", "DICKSONX"), 0.813));
    }

    #[test]
    fn test_jaro_winkler_symmetry_on_examples() {
        for (a, b) in [
            ("MARTHA", "MARHTA"),
            ("DWAYNE", "DUANE"),
            ("DIXON", "DICKSONX"),
            ("хрещатик", "хрещатік"),
        ] {
            assert!(approx_eq(jaro_winkler(a, b), jaro_winkler(b, a)));
            assert!(approx_eq(jaro(a, b), jaro(b, a)));
        }
    }

    #[test]
    fn test_jaro_winkler_short_circuits() {
        assert!(approx_eq(jaro_winkler("Київ", "КИЇВ"), 1.0));
        assert!(approx_eq(jaro_winkler("", "Київ"), 0.0));
        assert!(approx_eq(jaro_winkler("Київ", ""), 0.0));
    }

    #[test]
    fn test_jaro_winkler_no_boost_below_threshold() {
        let low = jaro("abcdef", "azzzzz");
        assert!(low < WINKLER_BOOST_THRESHOLD);
        assert!(approx_eq(jaro_winkler("abcdef", "azzzzz"), low));
    }

    #[test]
    fn test_jaro_winkler_cyrillic() {
        let score = jaro_winkler("шевченка", "шевченко");
        assert!(score > 0.9 && score < 1.0);
    }
}
