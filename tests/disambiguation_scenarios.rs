//! Disambiguation scenarios
//!
//! Exercises the combination generator, the constraint predicates and the
//! solver through the public API:
//! - single-measure scoring on the 0..=10 000 scale
//! - cube consistency across competing cubes
//! - one level per dimension
//! - two-sided comparisons

use cube_dialogue::config::SolverSettings;
use cube_dialogue::csp::constraints::{maximum_one_element_per_dimension, score_in_both_parts};
use cube_dialogue::csp::{
    generate_combinations, violations, AnalysisSituationElement, DisambiguationService, Field,
    FillOutcome, SolveOutcome, Solver, SolverProblem, Violation,
};
use cube_dialogue::schema::UnavailableSchema;
use cube_dialogue::{AnalysisSituation, CubeSimilarity, ElementType, PatternPart, WordGroup};
use proptest::prelude::*;

fn measure(term: &str, index: usize, cube: &str, element: &str, score: f64) -> CubeSimilarity {
    CubeSimilarity::new(
        WordGroup::with_indices(term, [index]),
        element,
        score,
        cube,
        ElementType::Measure,
    )
}

fn level(index: usize, element: &str, dimension: &str, score: f64) -> CubeSimilarity {
    CubeSimilarity::new(
        WordGroup::with_indices(element, [index]),
        element,
        score,
        "C1",
        ElementType::Level,
    )
    .in_dimension(dimension)
}

fn solve(similarities: &[CubeSimilarity]) -> SolveOutcome {
    let settings = SolverSettings::default();
    Solver::new(settings.clone()).solve(&SolverProblem::build(similarities, &settings))
}

/// Test 1: one measure at 0.5 gives one bundle plus the empty bundle and scores 5000
#[test]
fn test_single_measure_scenario() {
    let sims = vec![measure("total costs", 0, "C1", "M1", 0.5)];

    let bundles = generate_combinations(&sims);
    assert_eq!(bundles.len(), 2);
    let non_empty: Vec<&AnalysisSituationElement> = bundles.iter().filter(|b| !b.is_empty()).collect();
    assert_eq!(non_empty.len(), 1);
    assert_eq!(non_empty[0].score(), 0.5);

    let SolveOutcome::Determined { assignment, score } = solve(&sims) else {
        panic!("expected a determined assignment");
    };
    assert_eq!(assignment.cube.as_deref(), Some("C1"));
    assert_eq!(assignment.score(), 5000);
    assert_eq!(score.soft, 5000);
}

/// Test 2: similarities from two cubes never end up mixed
#[test]
fn test_cube_consistency_scenario() {
    let sims = vec![
        measure("costs", 0, "C1", "M1", 0.8),
        measure("amount", 1, "C2", "M2", 0.6),
    ];

    let SolveOutcome::Determined { assignment, .. } = solve(&sims) else {
        panic!("expected a determined assignment");
    };
    assert_eq!(assignment.cube.as_deref(), Some("C1"));
    let measures = assignment.get(Field::Measures).unwrap();
    assert!(measures.iter().all(|s| s.cube == "C1"));
    assert!(measures.iter().any(|s| s.element == "M1"));
}

/// Test 3: the service keeps the chosen cube even when the schema is down
#[test]
fn test_service_degrades_without_schema() {
    let schema = UnavailableSchema;
    let settings = SolverSettings::default();
    let service = DisambiguationService::new(&schema, &settings);
    let sims = vec![measure("costs", 0, "C1", "M1", 0.8)];

    let outcome = service.fill("en", &AnalysisSituation::new(), &sims).unwrap();
    let FillOutcome::Determined { situation, .. } = outcome else {
        panic!("expected a determined situation");
    };
    let situation = situation.as_non_comparative().unwrap();
    assert_eq!(situation.cube.as_deref(), Some("C1"));
    assert!(situation.measures.contains("M1"));
}

/// Test 4: two levels of one dimension are never chosen together
#[test]
fn test_one_level_per_dimension() {
    let state = level(0, "L-state", "D1", 1.0);
    let district = level(1, "L-district", "D1", 1.0);

    let both: AnalysisSituationElement = [state.clone(), district.clone()].into_iter().collect();
    assert!(!maximum_one_element_per_dimension(Some(&both)));

    let mut sims = vec![measure("costs", 2, "C1", "M1", 1.0)];
    sims.extend([state, district]);
    let SolveOutcome::Determined { assignment, .. } = solve(&sims) else {
        panic!("expected a determined assignment");
    };
    assert_eq!(assignment.get(Field::GranularityLevels).map(|b| b.len()), Some(1));
    assert!(!violations(&assignment).contains(&Violation::MultipleLevelsPerDimension));
}

/// Test 5: a comparative measure on one side only fails the pairing check
#[test]
fn test_comparative_pairing() {
    let interest = CubeSimilarity::new(
        WordGroup::with_indices("cost ratio", [0, 1]),
        "CM1",
        1.0,
        "C1",
        ElementType::ComparativeMeasure,
    )
    .with_measure(PatternPart::SetOfInterest, "M1");
    let comparison = interest
        .clone()
        .with_measure(PatternPart::SetOfComparison, "M1");

    let one_sided: AnalysisSituationElement = [interest.clone()].into_iter().collect();
    assert!(!score_in_both_parts(Some(&one_sided)));

    let two_sided: AnalysisSituationElement = [interest, comparison].into_iter().collect();
    assert!(score_in_both_parts(Some(&two_sided)));
}

/// Test 6: nothing to disambiguate
#[test]
fn test_no_similarities_is_undetermined() {
    assert_eq!(solve(&[]), SolveOutcome::Undetermined);
}

/// Test 7: a fuzzy measure and a fuzzy level on separate terms are both bound
#[test]
fn test_fuzzy_measure_and_level_together() {
    let sims = vec![
        measure("total cost", 0, "C1", "M1", 0.9),
        level(2, "L1", "D1", 0.8),
    ];

    let SolveOutcome::Determined { assignment, score } = solve(&sims) else {
        panic!("expected a determined assignment");
    };
    let measures = assignment.get(Field::Measures).unwrap();
    assert!(measures.iter().any(|s| s.element == "M1"));
    let levels = assignment.get(Field::GranularityLevels).unwrap();
    assert!(levels.iter().any(|s| s.element == "L1"));
    assert_eq!(score.soft, 17_000);
    assert_eq!(score.coverage, 2);
}

fn arb_measures() -> impl Strategy<Value = Vec<CubeSimilarity>> {
    prop::collection::vec((0usize..3, 0.05f64..=1.0), 1..6).prop_map(|raw| {
        raw.into_iter()
            .enumerate()
            .map(|(i, (cube, score))| {
                let cube = format!("C{cube}");
                let element = format!("{cube}/M{i}");
                measure(&format!("t{i}"), i, &cube, &element, score)
            })
            .collect()
    })
}

proptest! {
    /// Test 8: every bound element belongs to the chosen cube
    #[test]
    fn prop_solver_output_is_cube_consistent(sims in arb_measures()) {
        if let SolveOutcome::Determined { assignment, .. } = solve(&sims) {
            let cube = assignment.cube.clone().unwrap();
            for (_, sim) in assignment.bound() {
                prop_assert_eq!(&sim.cube, &cube);
            }
        }
    }

    /// Test 9: n same-cube similarities give 2^n bundles, twice the same
    #[test]
    fn prop_power_set_is_complete_and_stable(n in 0usize..6) {
        let sims: Vec<CubeSimilarity> = (0..n)
            .map(|i| measure(&format!("t{i}"), i, "C1", &format!("M{i}"), 0.5))
            .collect();
        let first = generate_combinations(&sims);
        prop_assert_eq!(first.len(), 1 << n);
        prop_assert_eq!(first, generate_combinations(&sims));
    }

    /// Test 10: dropping a member never lowers a non-empty product below the full bundle
    #[test]
    fn prop_removing_member_never_decreases_score(scores in prop::collection::vec(0.01f64..=1.0, 2..6)) {
        let bundle: AnalysisSituationElement = scores
            .iter()
            .enumerate()
            .map(|(i, s)| measure(&format!("t{i}"), i, "C1", &format!("M{i}"), *s))
            .collect();
        let full = bundle.score();
        for sim in bundle.iter() {
            prop_assert!(bundle.without(sim).score() >= full - 1e-12);
        }
    }
}
