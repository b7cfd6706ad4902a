//! Indel-based string similarity on a 0–100 scale.

use std::collections::BTreeSet;

fn lcs_len(a: &[char], b: &[char]) -> usize {
    if a.is_empty() || b.is_empty() {
        return 0;
    }
    let mut prev = vec![0usize; b.len() + 1];
    let mut row = vec![0usize; b.len() + 1];
    for &ca in a {
        for (j, &cb) in b.iter().enumerate() {
            row[j + 1] = if ca == cb {
                prev[j] + 1
            } else {
                row[j].max(prev[j + 1])
            };
        }
        std::mem::swap(&mut prev, &mut row);
    }
    prev[b.len()]
}

/// `round(200 * LCS / (|a| + |b|))`, counted in chars. Two empty strings are
/// identical.
pub fn ratio(a: &str, b: &str) -> u8 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let total = a.len() + b.len();
    if total == 0 {
        return 100;
    }
    let score = (200 * lcs_len(&a, &b)) as f64 / total as f64;
    score.round() as u8
}

fn joined<'a>(parts: impl IntoIterator<Item = &'a str>) -> String {
    parts.into_iter().collect::<Vec<_>>().join(" ")
}

fn combine(sect: &str, diff: &str) -> String {
    match (sect.is_empty(), diff.is_empty()) {
        (true, _) => diff.to_string(),
        (_, true) => sect.to_string(),
        _ => format!("{sect} {diff}"),
    }
}

/// Token-set similarity: the shared tokens compared with each side's full
/// token set, best of three. A name whose tokens are a subset of the other's
/// scores 100. Either side without tokens scores 0.
pub fn token_set_ratio(a: &str, b: &str) -> u8 {
    let tokens_a: BTreeSet<&str> = a.split_whitespace().collect();
    let tokens_b: BTreeSet<&str> = b.split_whitespace().collect();
    if tokens_a.is_empty() || tokens_b.is_empty() {
        return 0;
    }

    let sect = joined(tokens_a.intersection(&tokens_b).copied());
    let diff_ab = joined(tokens_a.difference(&tokens_b).copied());
    let diff_ba = joined(tokens_b.difference(&tokens_a).copied());

    let sect_ab = combine(&sect, &diff_ab);
    let sect_ba = combine(&sect, &diff_ba);

    let mut best = ratio(&sect_ab, &sect_ba);
    if !sect.is_empty() {
        best = best.max(ratio(&sect, &sect_ab)).max(ratio(&sect, &sect_ba));
    }
    best
}
