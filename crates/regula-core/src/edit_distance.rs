//! Bounded Damerau-Levenshtein distance over short symbol sequences.
//!
//! Insertions, deletions, substitutions and transpositions of adjacent
//! symbols all cost one. Used to recognize misspelled POSIX class names.

use std::collections::HashMap;
use std::hash::Hash;

/// Distance between `source` and `target`, or `None` when it exceeds `max`.
pub fn edit_distance<T>(source: &[T], target: &[T], max: usize) -> Option<usize>
where
    T: Copy + Eq + Hash,
{
    let m = source.len();
    let n = target.len();

    if m.abs_diff(n) > max {
        return None;
    }
    if m == 0 || n == 0 {
        let d = m.max(n);
        return (d <= max).then_some(d);
    }

    let infinity = m + n;
    let width = n + 2;
    let mut d = vec![0usize; (m + 2) * width];
    let at = |i: usize, j: usize| i * width + j;

    d[at(0, 0)] = infinity;
    for i in 0..=m {
        d[at(i + 1, 0)] = infinity;
        d[at(i + 1, 1)] = i;
    }
    for j in 0..=n {
        d[at(0, j + 1)] = infinity;
        d[at(1, j + 1)] = j;
    }

    // Last row in which each symbol of `source` was seen.
    let mut last_row: HashMap<T, usize> = HashMap::new();

    for i in 1..=m {
        let mut last_match_col = 0;
        for j in 1..=n {
            let k = last_row.get(&target[j - 1]).copied().unwrap_or(0);
            let l = last_match_col;
            let cost = if source[i - 1] == target[j - 1] {
                last_match_col = j;
                0
            } else {
                1
            };

            let substitute = d[at(i, j)] + cost;
            let insert = d[at(i + 1, j)] + 1;
            let delete = d[at(i, j + 1)] + 1;
            let transpose = d[at(k, l)] + (i - k - 1) + 1 + (j - l - 1);

            d[at(i + 1, j + 1)] = substitute.min(insert).min(delete).min(transpose);
        }
        last_row.insert(source[i - 1], i);
    }

    let distance = d[at(m + 1, n + 1)];
    (distance <= max).then_some(distance)
}

/// Unbounded distance between two strings, compared by `char`.
pub fn damerau_levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    edit_distance(&a, &b, usize::MAX / 4).unwrap_or(usize::MAX)
}

/// Picks the candidate closest to `input` within `max`, preferring the
/// earliest candidate on ties.
pub fn closest<'a>(input: &str, candidates: &[&'a str], max: usize) -> Option<(&'a str, usize)> {
    let input: Vec<char> = input.chars().collect();
    let mut best: Option<(&'a str, usize)> = None;
    for &candidate in candidates {
        let chars: Vec<char> = candidate.chars().collect();
        let Some(d) = edit_distance(&input, &chars, max) else {
            continue;
        };
        if best.is_none_or(|(_, prev)| d < prev) {
            best = Some((candidate, d));
        }
    }
    best
}
