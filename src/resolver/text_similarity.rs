//! String similarity between user input and display labels
//!
//! Seven measures, each in 0.0..=1.0, averaged into one score:
//!
//! | Measure                 | Source                         |
//! |-------------------------|--------------------------------|
//! | normalized Levenshtein  | `strsim`                       |
//! | Jaro-Winkler            | `strsim`                       |
//! | Sørensen-Dice (bigrams) | `strsim`                       |
//! | metric LCS              | longest common subsequence     |
//! | Kondrak n-gram (n = 2)  | positional bigram edit distance|
//! | cosine (3-shingles)     | shingle profile vectors        |
//! | Jaccard (3-shingles)    | shingle sets                   |
//!
//! Both inputs are NFKC-folded and lower-cased first.

use crate::nlp::normalize::normalize_text;
use std::collections::{BTreeMap, BTreeSet};

const SHINGLE: usize = 3;
const KONDRAK_N: usize = 2;

/// Averaged similarity of two strings
pub fn similarity(a: &str, b: &str) -> f64 {
    let a = normalize_text(a);
    let b = normalize_text(b);
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    if a == b {
        return 1.0;
    }

    let scores = [
        strsim::normalized_levenshtein(&a, &b),
        strsim::jaro_winkler(&a, &b),
        strsim::sorensen_dice(&a, &b),
        metric_lcs(&a, &b),
        kondrak_ngram(&a, &b, KONDRAK_N),
        cosine(&a, &b, SHINGLE),
        jaccard(&a, &b, SHINGLE),
    ];
    let mean = scores.iter().sum::<f64>() / scores.len() as f64;
    mean.clamp(0.0, 1.0)
}

/// Length of the longest common subsequence over the longer length
pub fn metric_lcs(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let longest = a.len().max(b.len());
    if longest == 0 {
        return 1.0;
    }

    let mut prev = vec![0usize; b.len() + 1];
    let mut curr = vec![0usize; b.len() + 1];
    for ca in &a {
        for (j, cb) in b.iter().enumerate() {
            curr[j + 1] = if ca == cb {
                prev[j] + 1
            } else {
                prev[j + 1].max(curr[j])
            };
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b.len()] as f64 / longest as f64
}

/// Kondrak's n-gram similarity: one minus the normalized n-gram edit distance
pub fn kondrak_ngram(a: &str, b: &str, n: usize) -> f64 {
    const PAD: char = '\n';
    let n = n.max(1);
    let s: Vec<char> = a.chars().collect();
    let t: Vec<char> = b.chars().collect();
    let (sl, tl) = (s.len(), t.len());
    if s == t {
        return 1.0;
    }
    if sl == 0 || tl == 0 {
        return 0.0;
    }
    if sl < n || tl < n {
        let same = s.iter().zip(&t).filter(|(x, y)| x == y).count();
        return same as f64 / sl.max(tl) as f64;
    }

    let padded: Vec<char> = std::iter::repeat(PAD).take(n - 1).chain(s.iter().copied()).collect();
    let mut p: Vec<f64> = (0..=sl).map(|i| i as f64).collect();
    let mut d = vec![0.0; sl + 1];
    let mut t_j = vec![PAD; n];

    for j in 1..=tl {
        if j < n {
            for (k, slot) in t_j.iter_mut().enumerate() {
                *slot = if k < n - j { PAD } else { t[k - (n - j)] };
            }
        } else {
            t_j.copy_from_slice(&t[j - n..j]);
        }

        d[0] = j as f64;
        for i in 1..=sl {
            let mut cost = 0usize;
            let mut tn = n;
            for k in 0..n {
                let c = padded[i - 1 + k];
                if c != t_j[k] {
                    cost += 1;
                } else if c == PAD {
                    tn -= 1;
                }
            }
            let edit = cost as f64 / tn.max(1) as f64;
            d[i] = (d[i - 1] + 1.0).min(p[i] + 1.0).min(p[i - 1] + edit);
        }
        std::mem::swap(&mut p, &mut d);
    }

    1.0 - p[sl] / sl.max(tl) as f64
}

fn shingles(s: &str, k: usize) -> BTreeMap<String, usize> {
    let chars: Vec<char> = s.chars().collect();
    let mut profile = BTreeMap::new();
    if chars.len() < k {
        return profile;
    }
    for window in chars.windows(k) {
        *profile.entry(window.iter().collect()).or_insert(0) += 1;
    }
    profile
}

/// Cosine similarity of the k-shingle profiles
pub fn cosine(a: &str, b: &str, k: usize) -> f64 {
    let pa = shingles(a, k);
    let pb = shingles(b, k);
    if pa.is_empty() || pb.is_empty() {
        return if a == b { 1.0 } else { 0.0 };
    }
    let dot: f64 = pa
        .iter()
        .filter_map(|(s, x)| pb.get(s).map(|y| (*x * *y) as f64))
        .sum();
    let norm = |p: &BTreeMap<String, usize>| p.values().map(|v| (*v * *v) as f64).sum::<f64>().sqrt();
    dot / (norm(&pa) * norm(&pb))
}

/// Jaccard index of the k-shingle sets
pub fn jaccard(a: &str, b: &str, k: usize) -> f64 {
    let sa: BTreeSet<String> = shingles(a, k).into_keys().collect();
    let sb: BTreeSet<String> = shingles(b, k).into_keys().collect();
    if sa.is_empty() || sb.is_empty() {
        return if a == b { 1.0 } else { 0.0 };
    }
    let inter = sa.intersection(&sb).count();
    let union = sa.union(&sb).count();
    inter as f64 / union as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_identical_after_normalization() {
        assert_eq!(similarity("Add Measure", "add   measure"), 1.0);
    }

    #[test]
    fn test_empty_scores_zero() {
        assert_eq!(similarity("", "exit"), 0.0);
        assert_eq!(similarity("!!", "exit"), 0.0);
    }

    #[test]
    fn test_related_beats_unrelated() {
        let close = similarity("add a measure", "add measure");
        let far = similarity("xqzv blorf", "add measure");
        assert!(close > 0.7, "close = {close}");
        assert!(far < 0.4, "far = {far}");
    }

    #[test]
    fn test_metric_lcs() {
        assert_eq!(metric_lcs("abcd", "abcd"), 1.0);
        assert_eq!(metric_lcs("abcd", "axcy"), 0.5);
        assert_eq!(metric_lcs("abc", "xyz"), 0.0);
    }

    #[test]
    fn test_kondrak_ngram() {
        assert_eq!(kondrak_ngram("drill", "drill", 2), 1.0);
        assert!(kondrak_ngram("drill down", "drill up", 2) > kondrak_ngram("drill down", "exit", 2));
        assert_eq!(kondrak_ngram("a", "a", 2), 1.0);
    }

    #[test]
    fn test_shingle_measures() {
        assert_eq!(jaccard("abcd", "abcd", 3), 1.0);
        assert_eq!(jaccard("abcd", "bcde", 3), 1.0 / 3.0);
        assert!((cosine("abcd", "bcde", 3) - 0.5).abs() < 1e-9);
    }

    proptest! {
        #[test]
        fn prop_similarity_bounded_and_symmetric_on_identity(a in "[a-z ]{0,12}", b in "[a-z ]{0,12}") {
            let s = similarity(&a, &b);
            prop_assert!((0.0..=1.0).contains(&s));
            if !normalize_text(&a).is_empty() {
                prop_assert_eq!(similarity(&a, &a), 1.0);
            }
        }
    }
}
