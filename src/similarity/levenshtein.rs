//! Levenshtein edit distance and its normalized similarity.

#[inline]
fn count_to_f64(count: usize) -> f64 {
    #[allow(clippy::cast_precision_loss)]
    {
        count as f64
    }
}

/// Number of single-character insertions, deletions or substitutions
/// needed to turn `s1` into `s2`.
///
/// Case-sensitive; normalize first when case should not count.
#[must_use]
pub fn levenshtein_distance(s1: &str, s2: &str) -> usize {
    let a: Vec<char> = s1.chars().collect();
    let b: Vec<char> = s2.chars().collect();

    // Keep the row as short as possible
    let (long, short) = if a.len() >= b.len() { (a, b) } else { (b, a) };
    if short.is_empty() {
        return long.len();
    }

    let mut row: Vec<usize> = (0..=short.len()).collect();
    for (i, &c1) in long.iter().enumerate() {
        let mut diagonal = row[0];
        row[0] = i + 1;
        for (j, &c2) in short.iter().enumerate() {
            let substitution = diagonal + usize::from(c1 != c2);
            let deletion = row[j + 1] + 1;
            let insertion = row[j] + 1;
            diagonal = row[j + 1];
            row[j + 1] = substitution.min(deletion).min(insertion);
        }
    }

    row[short.len()]
}

/// `1 - distance / max_len`, case-insensitive. Empty input scores 0.0.
#[must_use]
pub fn levenshtein_similarity(s1: &str, s2: &str) -> f64 {
    if s1.is_empty() || s2.is_empty() {
        return 0.0;
    }

    let a = s1.to_lowercase();
    let b = s2.to_lowercase();
    let max_len = a.chars().count().max(b.chars().count());
    if max_len == 0 {
        return 1.0;
    }

    1.0 - count_to_f64(levenshtein_distance(&a, &b)) / count_to_f64(max_len)
}
