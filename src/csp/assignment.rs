//! Solver assignment: one cube plus one candidate bundle per field

use super::element::AnalysisSituationElement;
use cube_types::{CubeSimilarity, ElementType};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Integer scale of assignment scores
pub const SCORE_SCALE: f64 = 10_000.0;

/// Analysis-situation field a bundle is assigned to
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    /// Similarities that name the cube itself
    Cubes,
    Measures,
    GranularityLevels,
    SliceConditions,
    BaseMeasureConditions,
    FilterConditions,
    Scores,
    ScoreFilters,
    JoinConditions,
}

impl Field {
    pub const ALL: [Field; 9] = [
        Field::Cubes,
        Field::Measures,
        Field::GranularityLevels,
        Field::SliceConditions,
        Field::BaseMeasureConditions,
        Field::FilterConditions,
        Field::Scores,
        Field::ScoreFilters,
        Field::JoinConditions,
    ];

    /// Field fed by similarities of the given element type
    pub fn for_type(element_type: ElementType) -> Field {
        match element_type {
            ElementType::Cube => Field::Cubes,
            ElementType::Measure => Field::Measures,
            ElementType::Level => Field::GranularityLevels,
            ElementType::LevelPredicate => Field::SliceConditions,
            ElementType::BaseMeasurePredicate => Field::BaseMeasureConditions,
            ElementType::AggregateMeasurePredicate => Field::FilterConditions,
            ElementType::ComparativeMeasure => Field::Scores,
            ElementType::ComparativeMeasurePredicate => Field::ScoreFilters,
            ElementType::JoinConditionPredicate => Field::JoinConditions,
        }
    }

    /// Fields that only exist on comparative situations
    pub fn is_comparative(&self) -> bool {
        matches!(self, Field::Scores | Field::ScoreFilters | Field::JoinConditions)
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Field::Cubes => "cubes",
            Field::Measures => "measures",
            Field::GranularityLevels => "granularity_levels",
            Field::SliceConditions => "slice_conditions",
            Field::BaseMeasureConditions => "base_measure_conditions",
            Field::FilterConditions => "filter_conditions",
            Field::Scores => "scores",
            Field::ScoreFilters => "score_filters",
            Field::JoinConditions => "join_conditions",
        };
        f.write_str(name)
    }
}

/// A candidate interpretation: chosen cube and one bundle per field.
///
/// Fields without an entry are unset, exactly like an empty bundle.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SituationAssignment {
    pub cube: Option<String>,
    pub fields: BTreeMap<Field, AnalysisSituationElement>,
}

impl SituationAssignment {
    pub fn new(cube: Option<String>) -> Self {
        Self {
            cube,
            fields: BTreeMap::new(),
        }
    }

    pub fn with_field(mut self, field: Field, bundle: AnalysisSituationElement) -> Self {
        self.set(field, bundle);
        self
    }

    pub fn set(&mut self, field: Field, bundle: AnalysisSituationElement) {
        self.fields.insert(field, bundle);
    }

    pub fn get(&self, field: Field) -> Option<&AnalysisSituationElement> {
        self.fields.get(&field)
    }

    /// Every bound similarity together with its field
    pub fn bound(&self) -> impl Iterator<Item = (Field, &CubeSimilarity)> {
        self.fields
            .iter()
            .flat_map(|(field, bundle)| bundle.iter().map(move |s| (*field, s)))
    }

    /// Number of bound similarities
    pub fn coverage(&self) -> usize {
        self.fields.values().map(AnalysisSituationElement::len).sum()
    }

    pub fn is_comparative(&self) -> bool {
        self.fields
            .iter()
            .any(|(field, bundle)| field.is_comparative() && !bundle.is_empty())
    }

    /// Sum of the non-empty field scores; 0 without cube or without any bound element.
    ///
    /// Each field contributes its bundle score (the product of its members),
    /// so binding another field never lowers the total.
    pub fn field_sum(&self) -> f64 {
        if self.cube.as_deref().map_or(true, |c| c.trim().is_empty()) {
            return 0.0;
        }
        self.fields
            .values()
            .filter(|b| !b.is_empty())
            .map(AnalysisSituationElement::score)
            .sum()
    }

    /// Score in [`SCORE_SCALE`] units; every bound field adds 0..=10 000
    pub fn score(&self) -> i64 {
        (self.field_sum() * SCORE_SCALE).floor() as i64
    }
}
