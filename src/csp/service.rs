//! Disambiguation service
//!
//! Runs the solver over one turn's similarities and writes the winning
//! assignment into a copy of the situation.
//!
//! ```text
//! similarities ─▶ SolverProblem ─▶ Solver ─▶ SituationAssignment
//!                                                 │
//!                     ┌───────────────────────────┴────────────────┐
//!                     ▼                                            ▼
//!            non-comparative fields                      comparative fields
//!   cube (cascading qualifications), measures,      context per side, implied
//!   conditions, slice conditions, granularity       measures, joins, scores
//! ```

use super::assignment::{Field, SituationAssignment};
use super::solver::{SolutionScore, SolveOutcome, Solver, SolverProblem};
use crate::analysis::{AnalysisSituation, ComparativeAnalysisSituation, EngineSituation, ValueSetter};
use crate::config::SolverSettings;
use crate::error::{DialogueError, Result};
use crate::schema::SchemaLookup;
use cube_types::{CubeSimilarity, ElementType, PatternPart};
use std::collections::BTreeSet;

/// Result of filling a situation from similarities
#[derive(Debug, Clone, PartialEq)]
pub enum FillOutcome {
    Determined {
        situation: EngineSituation,
        assignment: SituationAssignment,
        score: SolutionScore,
    },
    /// Nothing could be determined; the caller keeps its situation
    Undetermined,
}

impl FillOutcome {
    pub fn is_determined(&self) -> bool {
        matches!(self, FillOutcome::Determined { .. })
    }

    pub fn situation(&self) -> Option<&EngineSituation> {
        match self {
            FillOutcome::Determined { situation, .. } => Some(situation),
            FillOutcome::Undetermined => None,
        }
    }
}

/// Resolves similarities into analysis situations
pub struct DisambiguationService<'a> {
    schema: &'a dyn SchemaLookup,
    settings: &'a SolverSettings,
}

impl<'a> DisambiguationService<'a> {
    pub fn new(schema: &'a dyn SchemaLookup, settings: &'a SolverSettings) -> Self {
        Self { schema, settings }
    }

    /// Solve and fill. The input situation is never modified.
    pub fn fill(
        &self,
        lang: &str,
        situation: &AnalysisSituation,
        similarities: &[CubeSimilarity],
    ) -> Result<FillOutcome> {
        if lang.trim().is_empty() {
            return Err(DialogueError::invalid_argument("language must not be blank"));
        }
        if similarities.is_empty() {
            tracing::debug!("No similarities to disambiguate");
            return Ok(FillOutcome::Undetermined);
        }

        let problem = SolverProblem::build(similarities, self.settings);
        let (assignment, score) = match Solver::new(self.settings.clone()).solve(&problem) {
            SolveOutcome::Determined { assignment, score } => (assignment, score),
            SolveOutcome::Undetermined => return Ok(FillOutcome::Undetermined),
        };

        let setter = ValueSetter::new(self.schema, lang);
        let base = self.fill_values(&setter, situation, &assignment);
        let situation = if assignment.is_comparative() {
            EngineSituation::Comparative(self.fill_comparative(&setter, &base, &assignment))
        } else {
            EngineSituation::NonComparative(base)
        };

        Ok(FillOutcome::Determined {
            situation,
            assignment,
            score,
        })
    }

    fn fill_values(
        &self,
        setter: &ValueSetter<'_>,
        situation: &AnalysisSituation,
        assignment: &SituationAssignment,
    ) -> AnalysisSituation {
        let mut next = situation.clone();
        let Some(cube) = assignment.cube.as_deref() else {
            return next;
        };
        setter.set_cube_in_place(&mut next, cube);

        if let Some(measures) = assignment.get(Field::Measures).filter(|b| !b.is_empty()) {
            next.set_measures(measures.iter().map(|s| s.element.clone()));
        }
        if self.settings.use_base_measure_predicates {
            for sim in bundle(assignment, Field::BaseMeasureConditions) {
                next.add_base_measure_condition(sim.element.as_str());
            }
        }
        if self.settings.use_aggregate_measure_predicates {
            for sim in bundle(assignment, Field::FilterConditions) {
                next.add_filter_condition(sim.element.as_str());
            }
        }
        for sim in bundle(assignment, Field::SliceConditions) {
            match self.predicate_dimension(sim) {
                Some(dimension) => {
                    next.qualification_mut(&dimension)
                        .add_slice_condition(sim.element.as_str());
                }
                None => tracing::warn!(predicate = %sim.element, "Slice condition without dimension"),
            }
        }
        for sim in bundle(assignment, Field::GranularityLevels) {
            if let Some(dimension) = sim.dimension() {
                next.qualification_mut(dimension)
                    .set_granularity_level(Some(&sim.element));
            }
        }
        next
    }

    fn predicate_dimension(&self, sim: &CubeSimilarity) -> Option<String> {
        if let Some(dimension) = sim.dimension() {
            return Some(dimension.to_string());
        }
        match self.schema.level_and_dimension_for_predicate(&sim.element) {
            Ok(levels) => levels
                .into_iter()
                .find(|l| l.part.is_none())
                .map(|l| l.dimension),
            Err(err) => {
                tracing::error!(predicate = %sim.element, error = %err, "Predicate level query failed");
                None
            }
        }
    }

    /// Build both comparison contexts from a comparative assignment.
    ///
    /// A side whose comparative elements come from the chosen cube starts
    /// from `base`; a side drawing from another cube starts from that cube
    /// alone.
    fn fill_comparative(
        &self,
        setter: &ValueSetter<'_>,
        base: &AnalysisSituation,
        assignment: &SituationAssignment,
    ) -> ComparativeAnalysisSituation {
        let comparative: Vec<&CubeSimilarity> = assignment
            .bound()
            .filter(|(field, _)| field.is_comparative())
            .map(|(_, sim)| sim)
            .collect();

        let context = |part: PatternPart| {
            let side: Vec<&&CubeSimilarity> =
                comparative.iter().filter(|s| s.part() == Some(part)).collect();
            let cube = side.first().map(|s| s.cube.as_str()).or(assignment.cube.as_deref());

            let mut ctx = match cube {
                Some(cube) if Some(cube) != base.cube.as_deref() => {
                    setter.set_cube(&AnalysisSituation::new(), cube)
                }
                _ => base.clone(),
            };
            for measure in side.iter().filter_map(|s| s.measure()) {
                ctx.add_measure(measure);
            }
            for join in side
                .iter()
                .filter(|s| s.element_type == ElementType::JoinConditionPredicate)
            {
                self.apply_join_level(&mut ctx, &join.element, part);
            }
            ctx
        };

        ComparativeAnalysisSituation {
            context_of_interest: context(PatternPart::SetOfInterest),
            context_of_comparison: context(PatternPart::SetOfComparison),
            join_conditions: element_ids(assignment, Field::JoinConditions),
            scores: element_ids(assignment, Field::Scores),
            score_filters: element_ids(assignment, Field::ScoreFilters),
        }
    }

    /// Join conditions fix the granularity of the joined dimension
    fn apply_join_level(&self, ctx: &mut AnalysisSituation, predicate: &str, part: PatternPart) {
        match self.schema.level_and_dimension_for_predicate(predicate) {
            Ok(levels) => {
                for level in levels.into_iter().filter(|l| l.part == Some(part)) {
                    ctx.qualification_mut(&level.dimension)
                        .set_granularity_level(Some(&level.level));
                }
            }
            Err(err) => {
                tracing::error!(predicate, error = %err, "Join condition level query failed");
            }
        }
    }
}

fn bundle(assignment: &SituationAssignment, field: Field) -> impl Iterator<Item = &CubeSimilarity> {
    assignment.get(field).into_iter().flat_map(|b| b.iter())
}

fn element_ids(assignment: &SituationAssignment, field: Field) -> BTreeSet<String> {
    bundle(assignment, field).map(|s| s.element.clone()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{InMemorySchema, SimilaritySource, UnavailableSchema};
    use cube_types::WordGroup;

    const SCHEMA: &str = r#"
cubes:
  - uri: "ex:claims"
    labels: { en: "insurance claims" }
    measures:
      - uri: "ex:totalCosts"
        labels: { en: "total costs" }
    dimensions:
      - uri: "ex:doctor"
        labels: { en: "doctor" }
        levels:
          - uri: "ex:doctorState"
            labels: { en: "doctor state" }
          - uri: "ex:doctorDistrict"
            labels: { en: "doctor district" }
        level_predicates:
          - uri: "ex:urban"
            labels: { en: "urban districts" }
            level: "ex:doctorDistrict"
    comparative_measures:
      - uri: "ex:costRatio"
        labels: { en: "cost ratio" }
        interest_measure: "ex:totalCosts"
        comparison_measure: "ex:totalCosts"
    join_condition_predicates:
      - uri: "ex:sameDistrict"
        labels: { en: "same district" }
        dimension: "ex:doctor"
        level: "ex:doctorDistrict"
"#;

    fn schema() -> InMemorySchema {
        InMemorySchema::from_yaml(SCHEMA).unwrap()
    }

    /// Similarities for `text` with token positions starting at `first`
    fn matches(schema: &InMemorySchema, text: &str, first: usize) -> Vec<CubeSimilarity> {
        let words = text.split_whitespace().count();
        let term = WordGroup::with_indices(text, first..first + words);
        schema
            .word_similarity("en", text, None)
            .unwrap()
            .into_iter()
            .map(|mut s| {
                s.term = term.clone();
                s
            })
            .collect()
    }

    #[test]
    fn test_blank_language_rejected() {
        let schema = UnavailableSchema;
        let settings = SolverSettings::default();
        let service = DisambiguationService::new(&schema, &settings);
        let err = service.fill(" ", &AnalysisSituation::new(), &[]).unwrap_err();
        assert!(matches!(err, DialogueError::InvalidArgument(_)));
    }

    #[test]
    fn test_empty_similarities_undetermined() {
        let schema = UnavailableSchema;
        let settings = SolverSettings::default();
        let service = DisambiguationService::new(&schema, &settings);
        let outcome = service.fill("en", &AnalysisSituation::new(), &[]).unwrap();
        assert_eq!(outcome, FillOutcome::Undetermined);
    }

    #[test]
    fn test_measure_fills_cube_and_qualifications() {
        let schema = schema();
        let settings = SolverSettings::default();
        let service = DisambiguationService::new(&schema, &settings);
        let input = AnalysisSituation::new();

        let outcome = service
            .fill("en", &input, &matches(&schema, "total costs", 0))
            .unwrap();
        let situation = outcome.situation().and_then(|s| s.as_non_comparative()).unwrap();

        assert_eq!(situation.cube.as_deref(), Some("ex:claims"));
        assert!(situation.measures.contains("ex:totalCosts"));
        assert!(situation.dimension_qualification("ex:doctor").is_some());
        assert_eq!(input, AnalysisSituation::new());
    }

    #[test]
    fn test_levels_and_slices_land_on_their_dimension() {
        let schema = schema();
        let settings = SolverSettings::default();
        let service = DisambiguationService::new(&schema, &settings);

        let mut sims = matches(&schema, "total costs", 0);
        sims.extend(matches(&schema, "doctor district", 2));
        sims.extend(matches(&schema, "urban districts", 4));

        let outcome = service.fill("en", &AnalysisSituation::new(), &sims).unwrap();
        let situation = outcome.situation().and_then(|s| s.as_non_comparative()).unwrap();
        let doctor = situation.dimension_qualification("ex:doctor").unwrap();
        assert_eq!(doctor.granularity_level, "ex:doctorDistrict");
        assert!(doctor.slice_conditions.contains("ex:urban"));
    }

    #[test]
    fn test_failing_schema_still_sets_cube() {
        let schema = schema();
        let sims = matches(&schema, "total costs", 0);
        let unavailable = UnavailableSchema;
        let settings = SolverSettings::default();
        let service = DisambiguationService::new(&unavailable, &settings);

        let outcome = service.fill("en", &AnalysisSituation::new(), &sims).unwrap();
        let situation = outcome.situation().and_then(|s| s.as_non_comparative()).unwrap();
        assert_eq!(situation.cube.as_deref(), Some("ex:claims"));
        assert!(situation.dimension_qualifications.is_empty());
    }

    #[test]
    fn test_comparative_assignment_builds_both_contexts() {
        let schema = schema();
        let settings = SolverSettings::default();
        let service = DisambiguationService::new(&schema, &settings);

        let mut sims = matches(&schema, "cost ratio", 0);
        sims.extend(matches(&schema, "same district", 2));

        let outcome = service.fill("en", &AnalysisSituation::new(), &sims).unwrap();
        let Some(EngineSituation::Comparative(cmp)) = outcome.situation() else {
            panic!("expected a comparative situation");
        };
        assert!(cmp.scores.contains("ex:costRatio"));
        assert!(cmp.join_conditions.contains("ex:sameDistrict"));
        for ctx in [&cmp.context_of_interest, &cmp.context_of_comparison] {
            assert!(ctx.measures.contains("ex:totalCosts"));
            assert_eq!(
                ctx.dimension_qualification("ex:doctor").unwrap().granularity_level,
                "ex:doctorDistrict"
            );
        }
        assert!(cmp.is_executable());
    }
}
