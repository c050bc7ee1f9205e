//! Disambiguation solver
//!
//! Chooses one cube and one candidate bundle per field so that the hard
//! constraints hold and the assignment score is as high as possible.
//!
//! ```text
//!   similarities ──▶ SolverProblem ──┬─ space ≤ exhaustive_limit ─▶ exhaustive search
//!   (per field      (cubes, bundles)  │
//!    combinations)                    └─ otherwise ─────────────────▶ seeded local search
//!                                                                     (restarts, hill climbing,
//!                                                                      step + time budget)
//! ```
//!
//! Assignments compare by hard score (minus the number of violated
//! constraints), then by the summed field score, then by the number
//! of bound similarities. Among equal candidates the first one found wins,
//! which makes the result deterministic.

use super::assignment::{Field, SituationAssignment};
use super::combinations::generate_combinations;
use super::constraints::{all_in_cube, violations};
use super::element::AnalysisSituationElement;
use crate::config::SolverSettings;
use cube_types::CubeSimilarity;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::time::{Duration, Instant};

/// Lexicographic solution quality
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct SolutionScore {
    /// Minus the number of violated hard constraints
    pub hard: i64,
    /// Summed field scores, up to 10 000 per bound field
    pub soft: i64,
    /// Number of bound similarities
    pub coverage: i64,
}

impl SolutionScore {
    pub fn is_feasible(&self) -> bool {
        self.hard >= 0
    }
}

/// Score an assignment
pub fn evaluate(assignment: &SituationAssignment) -> SolutionScore {
    SolutionScore {
        hard: -(violations(assignment).len() as i64),
        soft: assignment.score(),
        coverage: assignment.coverage() as i64,
    }
}

/// Whether a field takes part in solving under the given settings
pub fn field_enabled(field: Field, settings: &SolverSettings) -> bool {
    match field {
        Field::GranularityLevels => settings.use_levels,
        Field::SliceConditions => settings.use_level_predicates,
        Field::BaseMeasureConditions => settings.use_base_measure_predicates,
        Field::FilterConditions => settings.use_aggregate_measure_predicates,
        Field::Cubes
        | Field::Measures
        | Field::Scores
        | Field::ScoreFilters
        | Field::JoinConditions => true,
    }
}

/// Search space: candidate cubes and candidate bundles per field
#[derive(Debug, Clone, Default)]
pub struct SolverProblem {
    pub cubes: Vec<String>,
    pub candidates: BTreeMap<Field, Vec<AnalysisSituationElement>>,
}

impl SolverProblem {
    /// Build the problem from raw similarities.
    ///
    /// Similarities of disabled fields are ignored entirely, including the
    /// cubes they would contribute.
    pub fn build<'a, I>(similarities: I, settings: &SolverSettings) -> Self
    where
        I: IntoIterator<Item = &'a CubeSimilarity>,
    {
        let mut by_field: BTreeMap<Field, Vec<&CubeSimilarity>> = BTreeMap::new();
        let mut cubes = BTreeSet::new();

        for sim in similarities {
            let field = Field::for_type(sim.element_type);
            if !field_enabled(field, settings) {
                continue;
            }
            cubes.insert(sim.cube.clone());
            by_field.entry(field).or_default().push(sim);
        }

        let candidates = by_field
            .into_iter()
            .map(|(field, sims)| (field, generate_combinations(sims)))
            .collect();

        Self {
            cubes: cubes.into_iter().collect(),
            candidates,
        }
    }

    /// Bundles of `field` admissible for `cube`
    fn admissible(&self, field: Field, cube: &str) -> Vec<&AnalysisSituationElement> {
        self.candidates
            .get(&field)
            .map(|bundles| {
                bundles
                    .iter()
                    .filter(|b| field.is_comparative() || all_in_cube(Some(cube), Some(b)))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Number of assignments the exhaustive search would visit
    pub fn search_space(&self) -> u128 {
        self.cubes
            .iter()
            .map(|cube| {
                self.candidates
                    .keys()
                    .map(|field| self.admissible(*field, cube).len() as u128)
                    .fold(1u128, u128::saturating_mul)
            })
            .fold(0u128, u128::saturating_add)
    }
}

/// Result of solving
#[derive(Debug, Clone, PartialEq)]
pub enum SolveOutcome {
    Determined {
        assignment: SituationAssignment,
        score: SolutionScore,
    },
    /// No feasible assignment with a cube and a positive score
    Undetermined,
}

/// Constraint solver over [`SolverProblem`]s
#[derive(Debug, Clone, Default)]
pub struct Solver {
    settings: SolverSettings,
}

impl Solver {
    pub fn new(settings: SolverSettings) -> Self {
        Self { settings }
    }

    pub fn solve(&self, problem: &SolverProblem) -> SolveOutcome {
        if problem.cubes.is_empty() {
            tracing::debug!("No candidate cubes, situation undetermined");
            return SolveOutcome::Undetermined;
        }

        let space = problem.search_space();
        let exhaustive = space <= u128::from(self.settings.exhaustive_limit);
        tracing::info!(
            cubes = problem.cubes.len(),
            fields = problem.candidates.len(),
            space = %space,
            strategy = if exhaustive { "exhaustive" } else { "local" },
            "Solving analysis situation"
        );

        let best = if exhaustive {
            self.solve_exhaustive(problem)
        } else {
            self.solve_local(problem)
        };

        match best {
            Some((assignment, score)) if score.is_feasible() && score.soft > 0 => {
                tracing::debug!(
                    cube = ?assignment.cube,
                    hard = score.hard,
                    soft = score.soft,
                    "Best assignment found"
                );
                SolveOutcome::Determined { assignment, score }
            }
            Some((assignment, score)) => {
                tracing::debug!(
                    violations = ?violations(&assignment),
                    soft = score.soft,
                    "No feasible assignment"
                );
                SolveOutcome::Undetermined
            }
            None => SolveOutcome::Undetermined,
        }
    }

    fn solve_exhaustive(&self, problem: &SolverProblem) -> Option<(SituationAssignment, SolutionScore)> {
        let fields: Vec<Field> = problem.candidates.keys().copied().collect();
        let mut best: Option<(SituationAssignment, SolutionScore)> = None;

        for cube in &problem.cubes {
            let options: Vec<Vec<&AnalysisSituationElement>> = fields
                .iter()
                .map(|field| problem.admissible(*field, cube))
                .collect();
            if options.iter().any(Vec::is_empty) {
                continue;
            }

            // odometer over the per-field option lists
            let mut indices = vec![0usize; fields.len()];
            loop {
                let mut assignment = SituationAssignment::new(Some(cube.clone()));
                for (i, field) in fields.iter().enumerate() {
                    assignment.set(*field, options[i][indices[i]].clone());
                }
                let score = evaluate(&assignment);
                if best.as_ref().map_or(true, |(_, b)| score > *b) {
                    best = Some((assignment, score));
                }

                let mut pos = 0;
                loop {
                    if pos == indices.len() {
                        break;
                    }
                    indices[pos] += 1;
                    if indices[pos] < options[pos].len() {
                        break;
                    }
                    indices[pos] = 0;
                    pos += 1;
                }
                if pos == indices.len() {
                    break;
                }
            }
        }
        best
    }

    fn solve_local(&self, problem: &SolverProblem) -> Option<(SituationAssignment, SolutionScore)> {
        let fields: Vec<Field> = problem.candidates.keys().copied().collect();
        let options: Vec<&Vec<AnalysisSituationElement>> =
            fields.iter().filter_map(|f| problem.candidates.get(f)).collect();
        let empty: Vec<usize> = options
            .iter()
            .map(|bundles| bundles.iter().position(|b| b.is_empty()).unwrap_or(0))
            .collect();
        let deadline = self
            .settings
            .time_limit_ms
            .map(|ms| Instant::now() + Duration::from_millis(ms));

        // variable 0 is the cube, variable i + 1 the bundle of fields[i]
        let build = |state: &[usize]| {
            let mut assignment = SituationAssignment::new(Some(problem.cubes[state[0]].clone()));
            for (i, field) in fields.iter().enumerate() {
                assignment.set(*field, options[i][state[i + 1]].clone());
            }
            assignment
        };
        let domain = |var: usize| {
            if var == 0 {
                problem.cubes.len()
            } else {
                options[var - 1].len()
            }
        };
        // moving to another cube clears the bundles that do not fit it
        let neighbour = |state: &[usize], var: usize, value: usize| {
            let mut next = state.to_vec();
            next[var] = value;
            if var == 0 {
                let cube = problem.cubes[value].as_str();
                for (i, field) in fields.iter().enumerate() {
                    if !field.is_comparative() && !all_in_cube(Some(cube), Some(&options[i][next[i + 1]])) {
                        next[i + 1] = empty[i];
                    }
                }
            }
            next
        };

        let mut best: Option<(Vec<usize>, SolutionScore)> = None;
        let mut steps_total = 0usize;

        'restarts: for restart in 0..self.settings.restarts {
            let mut rng = StdRng::seed_from_u64(self.settings.seed.wrapping_add(restart as u64));
            // the first restarts start each cube from empty bundles
            let mut state: Vec<usize> = if restart < problem.cubes.len() {
                std::iter::once(restart).chain(empty.iter().copied()).collect()
            } else {
                (0..=fields.len()).map(|var| rng.gen_range(0..domain(var))).collect()
            };
            let mut current = evaluate(&build(&state));

            for _ in 0..self.settings.max_steps {
                if deadline.is_some_and(|d| Instant::now() >= d) {
                    tracing::warn!(restart, steps_total, "Local search hit its time limit");
                    if best.as_ref().map_or(true, |(_, b)| current > *b) {
                        best = Some((state, current));
                    }
                    break 'restarts;
                }
                steps_total += 1;

                let mut step_best: Option<(Vec<usize>, SolutionScore)> = None;
                for var in 0..state.len() {
                    for value in 0..domain(var) {
                        if value == state[var] {
                            continue;
                        }
                        let candidate = neighbour(&state, var, value);
                        let score = evaluate(&build(&candidate));
                        if step_best.as_ref().map_or(true, |(_, s)| score > *s) {
                            step_best = Some((candidate, score));
                        }
                    }
                }

                match step_best {
                    Some((next, score)) if score > current => {
                        state = next;
                        current = score;
                    }
                    _ => break,
                }
            }

            if best.as_ref().map_or(true, |(_, b)| current > *b) {
                best = Some((state, current));
            }
        }

        tracing::debug!(steps_total, "Local search finished");
        best.map(|(state, score)| (build(&state), score))
    }
}
