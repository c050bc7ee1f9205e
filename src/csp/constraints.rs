//! Constraint validator
//!
//! Pure predicates over candidate bundles and assignments. None of them
//! fails: a violated constraint only makes an assignment infeasible (hard
//! score below zero) so the solver steers away from it.
//!
//! | Predicate                              | Holds when                                              |
//! |----------------------------------------|---------------------------------------------------------|
//! | `all_in_cube`                          | every member belongs to the chosen cube                 |
//! | `maximum_one_element_per_dimension`    | no two levels of the same dimension                     |
//! | `contains_duplicates`                  | an element is bound twice (violation)                   |
//! | `multiple_assignments_per_term`        | one term names two elements (violation)                 |
//! | `all_in_appropriate_cube`              | each comparison side draws from exactly one cube        |
//! | `score_in_both_parts`                  | every comparative measure is present on both sides      |
//! | `predicate_in_both_parts`              | every join condition is present on both sides           |
//! | `has_join_condition`                   | a comparison binds at least one join condition          |

use super::assignment::{Field, SituationAssignment};
use super::element::AnalysisSituationElement;
use cube_types::{CubeSimilarity, PatternPart};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// True if every member of the bundle belongs to `cube`.
///
/// Vacuously true for a missing or empty bundle; false for a non-empty
/// bundle when no cube is chosen.
pub fn all_in_cube(cube: Option<&str>, bundle: Option<&AnalysisSituationElement>) -> bool {
    let Some(bundle) = bundle else {
        return true;
    };
    if bundle.is_empty() {
        return true;
    }
    match cube {
        Some(cube) => bundle.iter().all(|s| s.cube == cube),
        None => false,
    }
}

/// At most one member per dimension.
///
/// Bundles containing non-dimensional members, or members of more than one
/// element type, are rejected outright.
pub fn maximum_one_element_per_dimension(bundle: Option<&AnalysisSituationElement>) -> bool {
    let Some(bundle) = bundle else {
        return true;
    };
    let Some(first) = bundle.iter().next() else {
        return true;
    };
    if bundle.iter().any(|s| s.element_type != first.element_type) {
        return false;
    }

    let mut seen = BTreeSet::new();
    for sim in bundle {
        match sim.dimension() {
            Some(dimension) => {
                if !seen.insert(dimension) {
                    return false;
                }
            }
            None => return false,
        }
    }
    true
}

/// True if an element is bound more than once across all fields.
///
/// Repeated comparative bindings are allowed as long as each occupies a
/// different comparison side.
pub fn contains_duplicates(assignment: &SituationAssignment) -> bool {
    let mut by_element: BTreeMap<&str, Vec<&CubeSimilarity>> = BTreeMap::new();
    for (_, sim) in assignment.bound() {
        by_element.entry(sim.element.as_str()).or_default().push(sim);
    }

    by_element
        .values()
        .filter(|occurrences| occurrences.len() > 1)
        .any(|occurrences| !comparative_on_distinct_parts(occurrences))
}

fn comparative_on_distinct_parts(occurrences: &[&CubeSimilarity]) -> bool {
    let mut parts = BTreeSet::new();
    occurrences
        .iter()
        .all(|s| matches!(s.part(), Some(part) if parts.insert(part)))
}

/// True if one term (identified by its token positions, or by its text when
/// it carries no positions) is bound to more than one distinct element.
///
/// A term may resolve to a pair of comparative elements when both have the
/// same kind and element type and sit on opposite sides.
pub fn multiple_assignments_per_term(assignment: &SituationAssignment) -> bool {
    let mut by_term: BTreeMap<(&BTreeSet<usize>, &str), Vec<&CubeSimilarity>> = BTreeMap::new();
    for (_, sim) in assignment.bound() {
        let indices = sim.term.term_key();
        let text = if indices.is_empty() { sim.term.text.as_str() } else { "" };
        by_term.entry((indices, text)).or_default().push(sim);
    }

    by_term.values().any(|bindings| {
        let distinct: BTreeSet<&str> = bindings.iter().map(|s| s.element.as_str()).collect();
        distinct.len() > 1 && !is_comparative_pair(bindings)
    })
}

fn is_comparative_pair(bindings: &[&CubeSimilarity]) -> bool {
    let Some(first) = bindings.first() else {
        return false;
    };
    let same_shape = bindings.iter().all(|s| {
        s.is_comparative()
            && s.kind_name() == first.kind_name()
            && s.element_type == first.element_type
    });
    if !same_shape {
        return false;
    }
    let count = |part: PatternPart| bindings.iter().filter(|s| s.part() == Some(part)).count();
    count(PatternPart::SetOfInterest) == 1 && count(PatternPart::SetOfComparison) == 1
}

/// Each comparison side must draw its comparative elements from exactly one
/// cube. Vacuously true without comparative elements.
pub fn all_in_appropriate_cube(assignment: &SituationAssignment) -> bool {
    let mut cubes_by_part: BTreeMap<PatternPart, BTreeSet<&str>> = BTreeMap::new();
    for (_, sim) in assignment.bound() {
        if let Some(part) = sim.part() {
            cubes_by_part.entry(part).or_default().insert(sim.cube.as_str());
        }
    }
    cubes_by_part.values().all(|cubes| cubes.len() == 1)
}

/// Every distinct comparative measure in the bundle appears on both sides
pub fn score_in_both_parts(scores: Option<&AnalysisSituationElement>) -> bool {
    in_both_parts(scores)
}

/// Every distinct join condition in the bundle appears on both sides
pub fn predicate_in_both_parts(join_conditions: Option<&AnalysisSituationElement>) -> bool {
    in_both_parts(join_conditions)
}

/// True unless the assignment is comparative and binds no join condition.
///
/// Both contexts of a comparison are related through a join condition; a
/// comparison without one can never be executed.
pub fn has_join_condition(assignment: &SituationAssignment) -> bool {
    !assignment.is_comparative()
        || assignment
            .get(Field::JoinConditions)
            .is_some_and(|b| !b.is_empty())
}

fn in_both_parts(bundle: Option<&AnalysisSituationElement>) -> bool {
    let Some(bundle) = bundle else {
        return true;
    };
    let mut parts_by_element: BTreeMap<&str, BTreeSet<PatternPart>> = BTreeMap::new();
    for sim in bundle {
        let parts = parts_by_element.entry(sim.element.as_str()).or_default();
        if let Some(part) = sim.part() {
            parts.insert(part);
        }
    }
    parts_by_element.values().all(|parts| {
        parts.contains(&PatternPart::SetOfInterest) && parts.contains(&PatternPart::SetOfComparison)
    })
}

/// A violated hard constraint
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Violation {
    NotInCube(Field),
    MultipleLevelsPerDimension,
    DuplicateElement,
    MultipleAssignmentsPerTerm,
    InappropriateCube,
    ScoreNotInBothParts,
    PredicateNotInBothParts,
    MissingJoinCondition,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Violation::NotInCube(field) => write!(f, "{field} outside chosen cube"),
            Violation::MultipleLevelsPerDimension => f.write_str("more than one level per dimension"),
            Violation::DuplicateElement => f.write_str("element bound twice"),
            Violation::MultipleAssignmentsPerTerm => f.write_str("term bound to several elements"),
            Violation::InappropriateCube => f.write_str("comparison side spans several cubes"),
            Violation::ScoreNotInBothParts => f.write_str("comparative measure on one side only"),
            Violation::PredicateNotInBothParts => f.write_str("join condition on one side only"),
            Violation::MissingJoinCondition => f.write_str("comparison without join condition"),
        }
    }
}

/// All hard-constraint violations of an assignment.
///
/// Comparative fields are exempt from the chosen-cube check; their cubes
/// are governed by [`all_in_appropriate_cube`].
pub fn violations(assignment: &SituationAssignment) -> Vec<Violation> {
    let cube = assignment.cube.as_deref();
    let mut result: Vec<Violation> = assignment
        .fields
        .iter()
        .filter(|(field, bundle)| !field.is_comparative() && !all_in_cube(cube, Some(*bundle)))
        .map(|(field, _)| Violation::NotInCube(*field))
        .collect();

    if let Some(levels) = assignment.get(Field::GranularityLevels) {
        if !maximum_one_element_per_dimension(Some(levels)) {
            result.push(Violation::MultipleLevelsPerDimension);
        }
    }
    if contains_duplicates(assignment) {
        result.push(Violation::DuplicateElement);
    }
    if multiple_assignments_per_term(assignment) {
        result.push(Violation::MultipleAssignmentsPerTerm);
    }
    if assignment.is_comparative() {
        if !all_in_appropriate_cube(assignment) {
            result.push(Violation::InappropriateCube);
        }
        if !score_in_both_parts(assignment.get(Field::Scores)) {
            result.push(Violation::ScoreNotInBothParts);
        }
        if !predicate_in_both_parts(assignment.get(Field::JoinConditions)) {
            result.push(Violation::PredicateNotInBothParts);
        }
        if !has_join_condition(assignment) {
            result.push(Violation::MissingJoinCondition);
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use cube_types::{ElementType, WordGroup};

    fn sim(cube: &str, element: &str, t: ElementType, tokens: &[usize]) -> CubeSimilarity {
        CubeSimilarity::new(
            WordGroup::with_indices(element, tokens.iter().copied()),
            element,
            0.8,
            cube,
            t,
        )
    }

    fn level(dimension: &str, element: &str, token: usize) -> CubeSimilarity {
        sim("C1", element, ElementType::Level, &[token]).in_dimension(dimension)
    }

    fn bundle(sims: impl IntoIterator<Item = CubeSimilarity>) -> AnalysisSituationElement {
        sims.into_iter().collect()
    }

    #[test]
    fn test_all_in_cube() {
        let b = bundle([sim("C1", "M1", ElementType::Measure, &[0])]);
        assert!(all_in_cube(Some("C1"), Some(&b)));
        assert!(!all_in_cube(Some("C2"), Some(&b)));
        assert!(!all_in_cube(None, Some(&b)));
        assert!(all_in_cube(None, None));
        assert!(all_in_cube(Some("C2"), Some(&AnalysisSituationElement::new())));
    }

    #[test]
    fn test_one_level_per_dimension() {
        let ok = bundle([level("time", "year", 0), level("doctor", "district", 1)]);
        assert!(maximum_one_element_per_dimension(Some(&ok)));

        let clash = bundle([level("time", "year", 0), level("time", "month", 1)]);
        assert!(!maximum_one_element_per_dimension(Some(&clash)));

        assert!(maximum_one_element_per_dimension(None));
        assert!(maximum_one_element_per_dimension(Some(&AnalysisSituationElement::new())));
    }

    #[test]
    fn test_one_level_rejects_plain_and_mixed() {
        let plain = bundle([sim("C1", "M1", ElementType::Measure, &[0])]);
        assert!(!maximum_one_element_per_dimension(Some(&plain)));

        let mixed = bundle([
            level("time", "year", 0),
            sim("C1", "p", ElementType::LevelPredicate, &[1]).in_dimension("doctor"),
        ]);
        assert!(!maximum_one_element_per_dimension(Some(&mixed)));
    }

    #[test]
    fn test_duplicates_across_fields() {
        let m = sim("C1", "M1", ElementType::Measure, &[0]);
        let mut other_term = m.clone();
        other_term.term = WordGroup::with_indices("costs", [3]);
        let a = SituationAssignment::new(Some("C1".into()))
            .with_field(Field::Measures, bundle([m]))
            .with_field(Field::FilterConditions, bundle([other_term]));
        assert!(contains_duplicates(&a));
    }

    #[test]
    fn test_duplicates_exempt_on_distinct_parts() {
        let interest = sim("C1", "J1", ElementType::JoinConditionPredicate, &[0])
            .on_part(PatternPart::SetOfInterest);
        let comparison = sim("C1", "J1", ElementType::JoinConditionPredicate, &[0])
            .on_part(PatternPart::SetOfComparison);
        let a = SituationAssignment::new(Some("C1".into()))
            .with_field(Field::JoinConditions, bundle([interest.clone(), comparison]));
        assert!(!contains_duplicates(&a));

        let mut same_side = interest.clone();
        same_side.term = WordGroup::with_indices("other", [5]);
        let b = SituationAssignment::new(Some("C1".into()))
            .with_field(Field::JoinConditions, bundle([interest, same_side]));
        assert!(contains_duplicates(&b));
    }

    #[test]
    fn test_multiple_assignments_per_term() {
        let a = SituationAssignment::new(Some("C1".into())).with_field(
            Field::Measures,
            bundle([
                sim("C1", "M1", ElementType::Measure, &[1, 2]),
                sim("C1", "M2", ElementType::Measure, &[1, 2]),
            ]),
        );
        assert!(multiple_assignments_per_term(&a));

        let b = SituationAssignment::new(Some("C1".into())).with_field(
            Field::Measures,
            bundle([
                sim("C1", "M1", ElementType::Measure, &[1]),
                sim("C1", "M2", ElementType::Measure, &[2]),
            ]),
        );
        assert!(!multiple_assignments_per_term(&b));
    }

    #[test]
    fn test_term_may_name_a_comparative_pair() {
        let a = SituationAssignment::new(Some("C1".into())).with_field(
            Field::ScoreFilters,
            bundle([
                sim("C1", "thisYear", ElementType::ComparativeMeasurePredicate, &[4])
                    .on_part(PatternPart::SetOfInterest),
                sim("C1", "lastYear", ElementType::ComparativeMeasurePredicate, &[4])
                    .on_part(PatternPart::SetOfComparison),
            ]),
        );
        assert!(!multiple_assignments_per_term(&a));

        let b = SituationAssignment::new(Some("C1".into())).with_field(
            Field::ScoreFilters,
            bundle([
                sim("C1", "thisYear", ElementType::ComparativeMeasurePredicate, &[4])
                    .on_part(PatternPart::SetOfInterest),
                sim("C1", "lastYear", ElementType::ComparativeMeasurePredicate, &[4])
                    .on_part(PatternPart::SetOfInterest),
            ]),
        );
        assert!(multiple_assignments_per_term(&b));
    }

    #[test]
    fn test_appropriate_cube_per_side() {
        let j = |cube: &str, part| sim(cube, "J1", ElementType::JoinConditionPredicate, &[0]).on_part(part);

        let one_cube_each = SituationAssignment::new(Some("C1".into())).with_field(
            Field::JoinConditions,
            bundle([j("C1", PatternPart::SetOfInterest), j("C2", PatternPart::SetOfComparison)]),
        );
        assert!(all_in_appropriate_cube(&one_cube_each));

        let split_side = SituationAssignment::new(Some("C1".into())).with_field(
            Field::JoinConditions,
            bundle([j("C1", PatternPart::SetOfInterest), j("C2", PatternPart::SetOfInterest)]),
        );
        assert!(!all_in_appropriate_cube(&split_side));

        assert!(all_in_appropriate_cube(&SituationAssignment::default()));
    }

    #[test]
    fn test_score_needs_both_parts() {
        let interest = sim("C1", "ratio", ElementType::ComparativeMeasure, &[0])
            .with_measure(PatternPart::SetOfInterest, "M1");
        let comparison = sim("C1", "ratio", ElementType::ComparativeMeasure, &[0])
            .with_measure(PatternPart::SetOfComparison, "M1");

        assert!(!score_in_both_parts(Some(&bundle([interest.clone()]))));
        assert!(score_in_both_parts(Some(&bundle([interest, comparison]))));
        assert!(score_in_both_parts(Some(&AnalysisSituationElement::new())));
        assert!(score_in_both_parts(None));
    }

    #[test]
    fn test_predicate_needs_both_parts() {
        let interest = sim("C1", "J1", ElementType::JoinConditionPredicate, &[0])
            .on_part(PatternPart::SetOfInterest);
        assert!(!predicate_in_both_parts(Some(&bundle([interest]))));

        let plain = sim("C1", "J2", ElementType::JoinConditionPredicate, &[0]);
        assert!(!predicate_in_both_parts(Some(&bundle([plain]))));
    }

    #[test]
    fn test_comparison_needs_join_condition() {
        let ratio = |part| {
            sim("C1", "ratio", ElementType::ComparativeMeasure, &[1])
                .with_measure(part, "M1")
        };
        let scores_only = SituationAssignment::new(Some("C1".into())).with_field(
            Field::Scores,
            bundle([ratio(PatternPart::SetOfInterest), ratio(PatternPart::SetOfComparison)]),
        );
        assert!(!has_join_condition(&scores_only));
        assert!(violations(&scores_only).contains(&Violation::MissingJoinCondition));

        let joined = scores_only.clone().with_field(
            Field::JoinConditions,
            bundle([
                sim("C1", "J1", ElementType::JoinConditionPredicate, &[3])
                    .on_part(PatternPart::SetOfInterest),
                sim("C1", "J1", ElementType::JoinConditionPredicate, &[3])
                    .on_part(PatternPart::SetOfComparison),
            ]),
        );
        assert!(has_join_condition(&joined));
        assert!(violations(&joined).is_empty());

        assert!(has_join_condition(&SituationAssignment::new(Some("C1".into()))));
    }

    #[test]
    fn test_violations_report() {
        let a = SituationAssignment::new(Some("C1".into()))
            .with_field(
                Field::Measures,
                bundle([sim("C2", "M1", ElementType::Measure, &[0])]),
            )
            .with_field(
                Field::GranularityLevels,
                bundle([level("time", "year", 1), level("time", "month", 2)]),
            );
        let found = violations(&a);
        assert!(found.contains(&Violation::NotInCube(Field::Measures)));
        assert!(found.contains(&Violation::MultipleLevelsPerDimension));
        assert!(!found.contains(&Violation::ScoreNotInBothParts));
    }
}
