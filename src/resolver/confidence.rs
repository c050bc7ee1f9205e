//! Ranked resolution candidates

use cube_types::WordGroup;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// A candidate value with the confidence it was resolved with and the term
/// of the user input that produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceResult<T> {
    pub value: T,
    pub confidence: f64,
    #[serde(default)]
    pub term: Option<WordGroup>,
}

impl<T> ConfidenceResult<T> {
    pub fn new(value: T, confidence: f64) -> Self {
        Self {
            value,
            confidence,
            term: None,
        }
    }

    pub fn with_term(mut self, term: WordGroup) -> Self {
        self.term = Some(term);
        self
    }
}

impl<T: Ord> ConfidenceResult<T> {
    /// Ranking order: higher confidence first, then value, then term
    pub fn rank_cmp(&self, other: &Self) -> Ordering {
        other
            .confidence
            .partial_cmp(&self.confidence)
            .unwrap_or(Ordering::Equal)
            .then_with(|| self.value.cmp(&other.value))
            .then_with(|| self.term.cmp(&other.term))
    }
}

/// Sort best first; equal confidences are ordered by value, then term
pub fn rank<T: Ord>(results: &mut [ConfidenceResult<T>]) {
    results.sort_by(ConfidenceResult::rank_cmp);
}

/// Keep only the best result per value
pub fn best_per_value<T: Ord + Clone>(mut results: Vec<ConfidenceResult<T>>) -> Vec<ConfidenceResult<T>> {
    rank(&mut results);
    let mut seen = Vec::<T>::new();
    results.retain(|r| {
        if seen.contains(&r.value) {
            false
        } else {
            seen.push(r.value.clone());
            true
        }
    });
    results
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rank_is_deterministic() {
        let mut results = vec![
            ConfidenceResult::new("b", 0.5),
            ConfidenceResult::new("c", 0.9),
            ConfidenceResult::new("a", 0.5),
        ];
        rank(&mut results);
        let order: Vec<_> = results.iter().map(|r| r.value).collect();
        assert_eq!(order, vec!["c", "a", "b"]);
    }

    #[test]
    fn test_term_breaks_remaining_ties() {
        let mut results = vec![
            ConfidenceResult::new("a", 0.5).with_term(WordGroup::new("zeta")),
            ConfidenceResult::new("a", 0.5).with_term(WordGroup::new("alpha")),
        ];
        rank(&mut results);
        assert_eq!(results[0].term.as_ref().unwrap().text, "alpha");
    }

    #[test]
    fn test_best_per_value() {
        let results = vec![
            ConfidenceResult::new("a", 0.4),
            ConfidenceResult::new("b", 0.6),
            ConfidenceResult::new("a", 0.8),
        ];
        let best = best_per_value(results);
        assert_eq!(best.len(), 2);
        assert_eq!(best[0].value, "a");
        assert_eq!(best[0].confidence, 0.8);
    }
}
