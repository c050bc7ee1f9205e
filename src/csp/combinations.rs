//! Candidate combination generator
//!
//! Groups similarities by cube and emits every subset of every group. The
//! intended subset is not known up front, so all of them are handed to the
//! solver and constraints plus score decide.

use super::element::AnalysisSituationElement;
use cube_types::CubeSimilarity;
use std::collections::{BTreeMap, BTreeSet};

/// Largest per-cube group that is expanded in full (2^16 subsets)
pub const MAX_GROUP_SIZE: usize = 16;

/// All candidate bundles for one field.
///
/// The result is sorted and free of duplicates; the empty bundle is always
/// part of it. Empty input yields exactly one empty bundle.
pub fn generate_combinations<'a, I>(similarities: I) -> Vec<AnalysisSituationElement>
where
    I: IntoIterator<Item = &'a CubeSimilarity>,
{
    let mut groups: BTreeMap<&str, BTreeSet<&CubeSimilarity>> = BTreeMap::new();
    for sim in similarities {
        groups.entry(sim.cube.as_str()).or_default().insert(sim);
    }

    let mut result: BTreeSet<AnalysisSituationElement> = BTreeSet::new();
    result.insert(AnalysisSituationElement::new());

    for (cube, members) in groups {
        let (members, dropped) = split_group(members);
        if !dropped.is_empty() {
            let dropped: Vec<String> = dropped
                .iter()
                .map(|s| format!("{} -> {} ({:.2})", s.term.text, s.element, s.score))
                .collect();
            tracing::warn!(
                cube,
                kept = members.len(),
                ?dropped,
                "Truncating candidate group before expansion"
            );
        }

        for mask in 0u32..(1u32 << members.len()) {
            let bundle: AnalysisSituationElement = members
                .iter()
                .enumerate()
                .filter(|(i, _)| mask & (1 << i) != 0)
                .map(|(_, s)| (*s).clone())
                .collect();
            result.insert(bundle);
        }
    }

    result.into_iter().collect()
}

/// Split a cube group into the members that are expanded and those cut off.
///
/// Iteration over the set is best-first, so the lowest-scored members are dropped.
fn split_group<'a>(
    members: BTreeSet<&'a CubeSimilarity>,
) -> (Vec<&'a CubeSimilarity>, Vec<&'a CubeSimilarity>) {
    let mut kept: Vec<&CubeSimilarity> = members.into_iter().collect();
    let dropped = kept.split_off(kept.len().min(MAX_GROUP_SIZE));
    (kept, dropped)
}

#[cfg(test)]
mod tests {
    use super::*;
    use cube_types::{ElementType, WordGroup};
    use proptest::prelude::*;

    fn sim(cube: &str, element: &str, score: f64) -> CubeSimilarity {
        CubeSimilarity::new(
            WordGroup::with_indices(element, [0]),
            element,
            score,
            cube,
            ElementType::Measure,
        )
    }

    #[test]
    fn test_empty_input_single_empty_bundle() {
        let combos = generate_combinations(&Vec::<CubeSimilarity>::new());
        assert_eq!(combos, vec![AnalysisSituationElement::new()]);
    }

    #[test]
    fn test_single_similarity_gives_itself_and_empty() {
        let m1 = sim("C1", "M1", 0.5);
        let combos = generate_combinations(&[m1.clone()]);
        assert_eq!(combos.len(), 2);
        assert!(combos.contains(&AnalysisSituationElement::new()));
        assert!(combos.contains(&[m1].into_iter().collect()));
    }

    #[test]
    fn test_groups_never_mix_cubes() {
        let sims = vec![sim("C1", "M1", 0.5), sim("C2", "M2", 0.7), sim("C1", "M3", 0.4)];
        let combos = generate_combinations(&sims);
        // {} + 3 non-empty subsets of C1 + 1 of C2
        assert_eq!(combos.len(), 5);
        assert!(combos.iter().all(|b| b.cubes().len() <= 1));
    }

    #[test]
    fn test_oversized_group_is_truncated() {
        let sims: Vec<_> = (0..MAX_GROUP_SIZE + 2)
            .map(|i| sim("C1", &format!("M{i:02}"), 0.5))
            .collect();
        let combos = generate_combinations(&sims);
        assert_eq!(combos.len(), 1 << MAX_GROUP_SIZE);
    }

    #[test]
    fn test_truncation_drops_weakest_members() {
        let sims: Vec<_> = (0..MAX_GROUP_SIZE + 2)
            .map(|i| sim("C1", &format!("M{i:02}"), 1.0 - i as f64 * 0.01))
            .collect();
        let (kept, dropped) = split_group(sims.iter().collect());
        assert_eq!(kept.len(), MAX_GROUP_SIZE);
        let dropped: Vec<&str> = dropped.iter().map(|s| s.element.as_str()).collect();
        assert_eq!(dropped, vec!["M16", "M17"]);
        assert!(kept.iter().all(|s| s.score > 0.835));
    }

    #[test]
    fn test_small_group_drops_nothing() {
        let sims = vec![sim("C1", "M1", 0.5), sim("C1", "M2", 0.4)];
        let (kept, dropped) = split_group(sims.iter().collect());
        assert_eq!(kept.len(), 2);
        assert!(dropped.is_empty());
    }

    proptest! {
        #[test]
        fn prop_power_set_complete(n in 0usize..8) {
            let sims: Vec<_> = (0..n).map(|i| sim("C1", &format!("M{i}"), 0.5)).collect();
            prop_assert_eq!(generate_combinations(&sims).len(), 1usize << n);
        }

        #[test]
        fn prop_generation_idempotent(
            raw in prop::collection::vec((0usize..3, 0usize..5, 0.0f64..=1.0), 0..7)
        ) {
            let sims: Vec<_> = raw
                .iter()
                .map(|(c, e, s)| sim(&format!("C{c}"), &format!("M{e}"), *s))
                .collect();
            let first: BTreeSet<_> = generate_combinations(&sims).into_iter().collect();
            let mut reversed = sims.clone();
            reversed.reverse();
            let second: BTreeSet<_> = generate_combinations(&reversed).into_iter().collect();
            prop_assert_eq!(first, second);
        }
    }
}
