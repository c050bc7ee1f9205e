//! Cube Types - Level 1 Foundation Types
//!
//! Pure data structures shared by the dialogue engine: the word groups produced
//! by the language front-end, the schema element vocabulary, and the scored
//! similarities that link the two.
//!
//! ## Architecture Level: LEVEL 1 (Foundation)
//!
//! ```text
//! ┌──────────────┐     ┌──────────────────┐     ┌──────────────────┐
//! │  WordGroup   │────▶│  CubeSimilarity  │────▶│ candidate bundle │
//! │ (term + ids) │     │ (element, score) │     │   (dialogue)     │
//! └──────────────┘     └──────────────────┘     └──────────────────┘
//! ```
//!
//! ## Critical Rules
//!
//! 1. **NO WORKSPACE DEPENDENCIES** - the dialogue crate depends on this one, never the reverse
//! 2. **SERIALIZABLE** - all types support serde
//! 3. **TOTAL ORDERING** - similarities sort deterministically, best score first

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;
use thiserror::Error;

// ============================================================================
// ERRORS
// ============================================================================

/// Failure to interpret a schema vocabulary string
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TypeError {
    #[error("Unknown element type IRI: {0}")]
    UnknownElementType(String),

    #[error("Unknown pattern part: {0}")]
    UnknownPatternPart(String),
}

// ============================================================================
// WORD GROUPS
// ============================================================================

/// A contiguous group of words taken from the user's sentence.
///
/// Two word groups denote the same term when they cover the same token
/// positions, regardless of casing or the expression they were taken from.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct WordGroup {
    /// Surface text of the group
    pub text: String,
    /// Expression (phrase or sentence) the group was taken from
    #[serde(default)]
    pub source_expression: Option<String>,
    /// Zero-based token positions in the sentence
    #[serde(default)]
    pub token_indices: BTreeSet<usize>,
}

impl WordGroup {
    /// Create a word group without position information
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            source_expression: None,
            token_indices: BTreeSet::new(),
        }
    }

    /// Create a word group covering the given token positions
    pub fn with_indices(text: impl Into<String>, indices: impl IntoIterator<Item = usize>) -> Self {
        Self {
            text: text.into(),
            source_expression: None,
            token_indices: indices.into_iter().collect(),
        }
    }

    /// Attach the expression this group was extracted from
    pub fn from_expression(mut self, expression: impl Into<String>) -> Self {
        self.source_expression = Some(expression.into());
        self
    }

    /// Identity used when checking whether one term is bound twice.
    pub fn term_key(&self) -> &BTreeSet<usize> {
        &self.token_indices
    }
}

impl fmt::Display for WordGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

// ============================================================================
// SCHEMA VOCABULARY
// ============================================================================

const CUBES_NS: &str = "http://dke.jku.at/inga/cubes#";

/// Kind of schema element a term was matched against
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ElementType {
    Cube,
    Measure,
    Level,
    LevelPredicate,
    BaseMeasurePredicate,
    AggregateMeasurePredicate,
    JoinConditionPredicate,
    ComparativeMeasure,
    ComparativeMeasurePredicate,
}

impl ElementType {
    pub const ALL: [ElementType; 9] = [
        ElementType::Cube,
        ElementType::Measure,
        ElementType::Level,
        ElementType::LevelPredicate,
        ElementType::BaseMeasurePredicate,
        ElementType::AggregateMeasurePredicate,
        ElementType::JoinConditionPredicate,
        ElementType::ComparativeMeasure,
        ElementType::ComparativeMeasurePredicate,
    ];

    fn local_name(&self) -> &'static str {
        match self {
            ElementType::Cube => "BaseCube",
            ElementType::Measure => "AggregateMeasure",
            ElementType::Level => "Level",
            ElementType::LevelPredicate => "LevelPredicate",
            ElementType::BaseMeasurePredicate => "BaseMeasurePredicate",
            ElementType::AggregateMeasurePredicate => "AggregateMeasurePredicate",
            ElementType::JoinConditionPredicate => "JoinConditionPredicate",
            ElementType::ComparativeMeasure => "ComparativeMeasure",
            ElementType::ComparativeMeasurePredicate => "ComparativeMeasurePredicate",
        }
    }

    /// Type IRI as stored in the schema graph
    pub fn iri(&self) -> String {
        format!("{}{}", CUBES_NS, self.local_name())
    }

    /// Parse a type IRI back into an element type
    pub fn from_iri(iri: &str) -> Result<Self, TypeError> {
        iri.strip_prefix(CUBES_NS)
            .and_then(|local| {
                Self::ALL
                    .iter()
                    .copied()
                    .find(|t| t.local_name() == local)
            })
            .ok_or_else(|| TypeError::UnknownElementType(iri.to_string()))
    }

    /// Predicates restrict a query; everything else selects something.
    pub fn is_predicate(&self) -> bool {
        matches!(
            self,
            ElementType::LevelPredicate
                | ElementType::BaseMeasurePredicate
                | ElementType::AggregateMeasurePredicate
                | ElementType::JoinConditionPredicate
                | ElementType::ComparativeMeasurePredicate
        )
    }
}

impl fmt::Display for ElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.local_name())
    }
}

/// Side of a two-sided comparison
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum PatternPart {
    #[serde(rename = "setOfInterest")]
    SetOfInterest,
    #[serde(rename = "setOfComparison")]
    SetOfComparison,
}

impl PatternPart {
    pub fn as_str(&self) -> &'static str {
        match self {
            PatternPart::SetOfInterest => "setOfInterest",
            PatternPart::SetOfComparison => "setOfComparison",
        }
    }

    pub fn opposite(&self) -> PatternPart {
        match self {
            PatternPart::SetOfInterest => PatternPart::SetOfComparison,
            PatternPart::SetOfComparison => PatternPart::SetOfInterest,
        }
    }
}

impl FromStr for PatternPart {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "setOfInterest" => Ok(PatternPart::SetOfInterest),
            "setOfComparison" => Ok(PatternPart::SetOfComparison),
            other => Err(TypeError::UnknownPatternPart(other.to_string())),
        }
    }
}

impl fmt::Display for PatternPart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// SIMILARITIES
// ============================================================================

fn clamp_score(score: f64) -> f64 {
    if score > 0.0 {
        score
    } else {
        0.0
    }
}

/// A scored match between a term and some element.
///
/// Used directly for label matches (operations, values); schema matches use
/// [`CubeSimilarity`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Similarity<E> {
    pub term: WordGroup,
    pub element: E,
    /// Confidence, never negative
    pub score: f64,
}

impl<E> Similarity<E> {
    pub fn new(term: WordGroup, element: E, score: f64) -> Self {
        Self {
            term,
            element,
            score: clamp_score(score),
        }
    }
}

/// Variant-specific context of a [`CubeSimilarity`]
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SimilarityKind {
    /// Plain cube element (cube, measure, predicate)
    Plain,
    /// Element that belongs to a dimension (levels, level predicates)
    Dimension { dimension: String },
    /// Element matched to one side of a comparison
    Comparative { part: PatternPart },
    /// Comparative measure predicate together with the measure it implies
    ComparativeMeasure { part: PatternPart, measure: String },
}

/// A scored match between a term and an element of a specific cube.
///
/// Ordering is best-first: higher scores sort before lower ones, ties are
/// broken by cube, element, element type, term and kind so that sorting is
/// total and reproducible.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CubeSimilarity {
    pub term: WordGroup,
    /// Element IRI
    pub element: String,
    pub score: f64,
    /// Cube IRI the element belongs to
    pub cube: String,
    pub element_type: ElementType,
    #[serde(flatten)]
    pub kind: SimilarityKind,
}

impl CubeSimilarity {
    pub fn new(
        term: WordGroup,
        element: impl Into<String>,
        score: f64,
        cube: impl Into<String>,
        element_type: ElementType,
    ) -> Self {
        Self {
            term,
            element: element.into(),
            score: clamp_score(score),
            cube: cube.into(),
            element_type,
            kind: SimilarityKind::Plain,
        }
    }

    /// Tag the similarity with the dimension its element belongs to
    pub fn in_dimension(mut self, dimension: impl Into<String>) -> Self {
        self.kind = SimilarityKind::Dimension {
            dimension: dimension.into(),
        };
        self
    }

    /// Tag the similarity with the comparison side it was matched to
    pub fn on_part(mut self, part: PatternPart) -> Self {
        self.kind = SimilarityKind::Comparative { part };
        self
    }

    /// Tag a comparative measure predicate with its side and implied measure
    pub fn with_measure(mut self, part: PatternPart, measure: impl Into<String>) -> Self {
        self.kind = SimilarityKind::ComparativeMeasure {
            part,
            measure: measure.into(),
        };
        self
    }

    pub fn is_comparative(&self) -> bool {
        matches!(
            self.kind,
            SimilarityKind::Comparative { .. } | SimilarityKind::ComparativeMeasure { .. }
        )
    }

    pub fn is_dimensional(&self) -> bool {
        matches!(self.kind, SimilarityKind::Dimension { .. })
    }

    pub fn part(&self) -> Option<PatternPart> {
        match &self.kind {
            SimilarityKind::Comparative { part } | SimilarityKind::ComparativeMeasure { part, .. } => {
                Some(*part)
            }
            _ => None,
        }
    }

    pub fn dimension(&self) -> Option<&str> {
        match &self.kind {
            SimilarityKind::Dimension { dimension } => Some(dimension),
            _ => None,
        }
    }

    pub fn measure(&self) -> Option<&str> {
        match &self.kind {
            SimilarityKind::ComparativeMeasure { measure, .. } => Some(measure),
            _ => None,
        }
    }

    /// Discriminant of the kind, ignoring its payload
    pub fn kind_name(&self) -> &'static str {
        match self.kind {
            SimilarityKind::Plain => "plain",
            SimilarityKind::Dimension { .. } => "dimension",
            SimilarityKind::Comparative { .. } => "comparative",
            SimilarityKind::ComparativeMeasure { .. } => "comparative_measure",
        }
    }
}

impl PartialEq for CubeSimilarity {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for CubeSimilarity {}

impl Hash for CubeSimilarity {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.score.to_bits().hash(state);
        self.cube.hash(state);
        self.element.hash(state);
        self.element_type.hash(state);
        self.term.hash(state);
        self.kind.hash(state);
    }
}

impl Ord for CubeSimilarity {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .score
            .total_cmp(&self.score)
            .then_with(|| self.cube.cmp(&other.cube))
            .then_with(|| self.element.cmp(&other.element))
            .then_with(|| self.element_type.cmp(&other.element_type))
            .then_with(|| self.term.cmp(&other.term))
            .then_with(|| self.kind.cmp(&other.kind))
    }
}

impl PartialOrd for CubeSimilarity {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

// ============================================================================
// SCHEMA LABELS
// ============================================================================

/// Human readable label of a schema element
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Label {
    pub uri: String,
    pub lang: String,
    pub label: String,
    #[serde(default)]
    pub description: Option<String>,
}

impl Label {
    pub fn new(uri: impl Into<String>, lang: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            lang: lang.into(),
            label: label.into(),
            description: None,
        }
    }
}

/// Label of a level together with the dimension it belongs to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DimensionLabel {
    pub dimension: String,
    pub dimension_label: String,
    /// Level IRI
    pub uri: String,
    pub label: String,
}

/// Level and dimension a predicate restricts, with the comparison side when
/// the predicate belongs to a comparative cube.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PredicateLevel {
    pub dimension: String,
    pub level: String,
    #[serde(default)]
    pub part: Option<PatternPart>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sim(element: &str, score: f64) -> CubeSimilarity {
        CubeSimilarity::new(
            WordGroup::with_indices("costs", [1]),
            element,
            score,
            "cube:a",
            ElementType::Measure,
        )
    }

    #[test]
    fn test_element_type_iri_round_trip() {
        for t in ElementType::ALL {
            assert_eq!(ElementType::from_iri(&t.iri()), Ok(t));
        }
        assert_eq!(
            ElementType::Measure.iri(),
            "http://dke.jku.at/inga/cubes#AggregateMeasure"
        );
        assert!(ElementType::from_iri("http://example.org/Other").is_err());
    }

    #[test]
    fn test_pattern_part_parse() {
        assert_eq!("setOfInterest".parse(), Ok(PatternPart::SetOfInterest));
        assert_eq!("setOfComparison".parse(), Ok(PatternPart::SetOfComparison));
        assert!("both".parse::<PatternPart>().is_err());
        assert_eq!(
            PatternPart::SetOfInterest.opposite(),
            PatternPart::SetOfComparison
        );
    }

    #[test]
    fn test_negative_and_nan_scores_clamped() {
        assert_eq!(sim("m", -0.3).score, 0.0);
        assert_eq!(sim("m", f64::NAN).score, 0.0);
        assert_eq!(sim("m", 0.7).score, 0.7);
    }

    #[test]
    fn test_ordering_best_first_with_tie_break() {
        let mut sims = vec![sim("b", 0.4), sim("c", 0.9), sim("a", 0.4)];
        sims.sort();
        let order: Vec<_> = sims.iter().map(|s| s.element.as_str()).collect();
        assert_eq!(order, vec!["c", "a", "b"]);
    }

    #[test]
    fn test_kind_queries() {
        let plain = sim("m", 0.5);
        assert!(!plain.is_comparative());
        assert!(!plain.is_dimensional());

        let dim = sim("l", 0.5).in_dimension("dim:time");
        assert!(dim.is_dimensional());
        assert_eq!(dim.dimension(), Some("dim:time"));

        let cmp = sim("p", 0.5).with_measure(PatternPart::SetOfComparison, "m");
        assert!(cmp.is_comparative());
        assert_eq!(cmp.part(), Some(PatternPart::SetOfComparison));
        assert_eq!(cmp.measure(), Some("m"));
        assert_eq!(cmp.kind_name(), "comparative_measure");
    }

    #[test]
    fn test_serde_flattens_kind() {
        let s = sim("l", 0.5).in_dimension("dim:doctor");
        let json = serde_json::to_value(&s).unwrap();
        assert_eq!(json["kind"], "dimension");
        assert_eq!(json["dimension"], "dim:doctor");
        assert_eq!(json["element_type"], "measure");
        let back: CubeSimilarity = serde_json::from_value(json).unwrap();
        assert_eq!(back, s);
    }
}
