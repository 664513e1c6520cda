//! Order-insensitive token similarity.
//!
//! Address words arrive in any order (`Київ м.` vs `м. Київ`,
//! `Українки Лесі` vs `Лесі Українки`), so names are compared as bags of
//! whitespace-separated tokens rather than as single strings.

use super::jaro::jaro_winkler;

#[inline]
fn count_to_f64(count: usize) -> f64 {
    #[allow(clippy::cast_precision_loss)]
    {
        count as f64
    }
}

/// Similarity of two strings treated as unordered multisets of tokens.
///
/// Every cross pair of tokens is scored with Jaro-Winkler; pairs are then
/// taken greedily from best to worst, each token used at most once. The
/// result is the matched score mass divided by the mean token count, so
/// unmatched tokens on either side pull the score down.
///
/// Ties are broken on the token text itself, never on position, which makes
/// the result independent of token order. Single-token inputs reduce to
/// plain [`jaro_winkler`].
#[must_use]
pub fn token_similarity(s1: &str, s2: &str) -> f64 {
    let a: Vec<String> = s1.split_whitespace().map(str::to_lowercase).collect();
    let b: Vec<String> = s2.split_whitespace().map(str::to_lowercase).collect();

    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    if a.len() == 1 && b.len() == 1 {
        return jaro_winkler(&a[0], &b[0]);
    }

    let mut pairs: Vec<(f64, usize, usize)> = Vec::with_capacity(a.len() * b.len());
    for (i, x) in a.iter().enumerate() {
        for (j, y) in b.iter().enumerate() {
            pairs.push((jaro_winkler(x, y), i, j));
        }
    }

    pairs.sort_by(|p, q| {
        q.0.partial_cmp(&p.0)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a[p.1].cmp(&a[q.1]))
            .then_with(|| b[p.2].cmp(&b[q.2]))
    });

    let mut a_used = vec![false; a.len()];
    let mut b_used = vec![false; b.len()];
    let mut total = 0.0;
    let mut remaining = a.len().min(b.len());

    for (score, i, j) in pairs {
        if remaining == 0 {
            break;
        }
        if a_used[i] || b_used[j] {
            continue;
        }
        a_used[i] = true;
        b_used[j] = true;
        total += score;
        remaining -= 1;
    }

    (2.0 * total / count_to_f64(a.len() + b.len())).min(1.0)
}
