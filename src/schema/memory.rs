//! In-memory cube schema loaded from YAML
//!
//! Serves both lookup traits from a static schema description. Used by the
//! terminal dialogue and by tests.
//!
//! ```yaml
//! cubes:
//!   - uri: "http://example.org/cubes#claims"
//!     labels: { en: "insurance claims" }
//!     measures:
//!       - uri: "http://example.org/cubes#totalCosts"
//!         labels: { en: "total costs" }
//!     dimensions:
//!       - uri: "http://example.org/cubes#doctor"
//!         labels: { en: "doctor" }
//!         levels:                       # coarsest first
//!           - uri: "http://example.org/cubes#doctorDistrict"
//!             labels: { en: "doctor district" }
//!             members:
//!               - uri: "http://example.org/cubes#linz"
//!                 labels: { en: "linz" }
//!         level_predicates:
//!           - uri: "http://example.org/cubes#urbanDistricts"
//!             labels: { en: "urban districts" }
//!             level: "http://example.org/cubes#doctorDistrict"
//! ```

use super::{SchemaLookup, SimilaritySource};
use crate::error::{ConfigError, QueryError};
use crate::nlp::normalize::normalize_text;
use cube_types::{
    CubeSimilarity, DimensionLabel, ElementType, Label, PatternPart, PredicateLevel,
    SimilarityKind, WordGroup,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::Path;

/// Label matches below this Jaro-Winkler score are not reported
pub const DEFAULT_MIN_SCORE: f64 = 0.85;

fn default_min_score() -> f64 {
    DEFAULT_MIN_SCORE
}

/// A labelled schema element
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ElementDef {
    pub uri: String,
    /// Label per language code
    #[serde(default)]
    pub labels: BTreeMap<String, String>,
    #[serde(default)]
    pub description: Option<String>,
}

impl ElementDef {
    /// Label in `lang`, or the IRI fragment when none exists
    pub fn label(&self, lang: &str) -> Label {
        let text = self
            .labels
            .get(lang)
            .cloned()
            .unwrap_or_else(|| fragment(&self.uri).to_string());
        Label {
            uri: self.uri.clone(),
            lang: lang.to_string(),
            label: text,
            description: self.description.clone(),
        }
    }
}

fn fragment(uri: &str) -> &str {
    uri.rsplit(['#', '/']).next().unwrap_or(uri)
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LevelDef {
    #[serde(flatten)]
    pub element: ElementDef,
    #[serde(default)]
    pub members: Vec<ElementDef>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LevelPredicateDef {
    #[serde(flatten)]
    pub element: ElementDef,
    /// Level the predicate restricts
    pub level: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DimensionDef {
    #[serde(flatten)]
    pub element: ElementDef,
    /// Levels, coarsest first
    #[serde(default)]
    pub levels: Vec<LevelDef>,
    #[serde(default)]
    pub level_predicates: Vec<LevelPredicateDef>,
}

/// Comparative measure with the aggregate measure used on each side
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ComparativeMeasureDef {
    #[serde(flatten)]
    pub element: ElementDef,
    pub interest_measure: String,
    pub comparison_measure: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JoinConditionDef {
    #[serde(flatten)]
    pub element: ElementDef,
    pub dimension: String,
    pub level: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CubeDef {
    #[serde(flatten)]
    pub element: ElementDef,
    #[serde(default)]
    pub measures: Vec<ElementDef>,
    #[serde(default)]
    pub base_measure_predicates: Vec<ElementDef>,
    #[serde(default)]
    pub aggregate_measure_predicates: Vec<ElementDef>,
    #[serde(default)]
    pub dimensions: Vec<DimensionDef>,
    #[serde(default)]
    pub comparative_measures: Vec<ComparativeMeasureDef>,
    #[serde(default)]
    pub comparative_measure_predicates: Vec<ElementDef>,
    #[serde(default)]
    pub join_condition_predicates: Vec<JoinConditionDef>,
}

const BOTH_PARTS: [PatternPart; 2] = [PatternPart::SetOfInterest, PatternPart::SetOfComparison];

impl CubeDef {
    fn uri(&self) -> &str {
        &self.element.uri
    }

    /// Every matchable element of the cube with its type and similarity kinds
    fn matchable(&self) -> Vec<(&ElementDef, ElementType, Vec<SimilarityKind>)> {
        let plain = || vec![SimilarityKind::Plain];
        let per_part = || {
            BOTH_PARTS
                .iter()
                .map(|&part| SimilarityKind::Comparative { part })
                .collect::<Vec<_>>()
        };

        let mut out = vec![(&self.element, ElementType::Cube, plain())];
        out.extend(self.measures.iter().map(|m| (m, ElementType::Measure, plain())));
        out.extend(
            self.base_measure_predicates
                .iter()
                .map(|p| (p, ElementType::BaseMeasurePredicate, plain())),
        );
        out.extend(
            self.aggregate_measure_predicates
                .iter()
                .map(|p| (p, ElementType::AggregateMeasurePredicate, plain())),
        );
        for dim in &self.dimensions {
            let in_dim = || {
                vec![SimilarityKind::Dimension {
                    dimension: dim.element.uri.clone(),
                }]
            };
            out.extend(
                dim.levels
                    .iter()
                    .map(|l| (&l.element, ElementType::Level, in_dim())),
            );
            out.extend(
                dim.level_predicates
                    .iter()
                    .map(|p| (&p.element, ElementType::LevelPredicate, in_dim())),
            );
        }
        for cm in &self.comparative_measures {
            let kinds = vec![
                SimilarityKind::ComparativeMeasure {
                    part: PatternPart::SetOfInterest,
                    measure: cm.interest_measure.clone(),
                },
                SimilarityKind::ComparativeMeasure {
                    part: PatternPart::SetOfComparison,
                    measure: cm.comparison_measure.clone(),
                },
            ];
            out.push((&cm.element, ElementType::ComparativeMeasure, kinds));
        }
        out.extend(
            self.comparative_measure_predicates
                .iter()
                .map(|p| (p, ElementType::ComparativeMeasurePredicate, per_part())),
        );
        out.extend(
            self.join_condition_predicates
                .iter()
                .map(|j| (&j.element, ElementType::JoinConditionPredicate, per_part())),
        );
        out
    }

    fn all_elements(&self) -> Vec<&ElementDef> {
        let mut out: Vec<&ElementDef> = self.matchable().into_iter().map(|(e, _, _)| e).collect();
        for dim in &self.dimensions {
            out.push(&dim.element);
            for level in &dim.levels {
                out.extend(level.members.iter());
            }
        }
        out
    }

    fn dimension(&self, dimension: &str) -> Option<&DimensionDef> {
        self.dimensions.iter().find(|d| d.element.uri == dimension)
    }
}

/// Static cube schema
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InMemorySchema {
    #[serde(default = "default_min_score")]
    pub min_score: f64,
    #[serde(default)]
    pub cubes: Vec<CubeDef>,
}

impl InMemorySchema {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_yaml(&content)
    }

    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    fn cube(&self, cube: &str) -> Result<&CubeDef, QueryError> {
        self.cubes
            .iter()
            .find(|c| c.uri() == cube)
            .ok_or_else(|| QueryError::new(format!("unknown cube {cube}")))
    }
}

/// Similarity of a fragment to a label, 1.0 for an exact normalized match
pub fn label_score(text: &str, label: &str) -> f64 {
    let a = normalize_text(text);
    let b = normalize_text(label);
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    if a == b {
        return 1.0;
    }
    strsim::jaro_winkler(&a, &b)
}

impl SimilaritySource for InMemorySchema {
    fn word_similarity(
        &self,
        lang: &str,
        text: &str,
        cube: Option<&str>,
    ) -> Result<Vec<CubeSimilarity>, QueryError> {
        let mut result = Vec::new();

        for def in self.cubes.iter().filter(|c| cube.map_or(true, |id| c.uri() == id)) {
            for (element, element_type, kinds) in def.matchable() {
                let Some(label) = element.labels.get(lang) else {
                    continue;
                };
                let score = label_score(text, label);
                if score < self.min_score {
                    continue;
                }
                for kind in kinds {
                    let mut sim = CubeSimilarity::new(
                        WordGroup::new(text),
                        element.uri.clone(),
                        score,
                        def.uri(),
                        element_type,
                    );
                    sim.kind = kind;
                    result.push(sim);
                }
            }
        }

        result.sort();
        Ok(result)
    }
}

impl SchemaLookup for InMemorySchema {
    fn labels_by_lang_and_uris(
        &self,
        lang: &str,
        uris: &[String],
    ) -> Result<HashMap<String, Label>, QueryError> {
        let wanted: HashSet<&str> = uris.iter().map(String::as_str).collect();
        Ok(self
            .cubes
            .iter()
            .flat_map(|c| c.all_elements())
            .filter(|e| wanted.contains(e.uri.as_str()))
            .map(|e| (e.uri.clone(), e.label(lang)))
            .collect())
    }

    fn top_level_labels_by_lang_and_cube(
        &self,
        lang: &str,
        cube: &str,
    ) -> Result<Vec<DimensionLabel>, QueryError> {
        let def = self.cube(cube)?;
        Ok(def
            .dimensions
            .iter()
            .filter_map(|dim| {
                dim.levels.first().map(|top| DimensionLabel {
                    dimension: dim.element.uri.clone(),
                    dimension_label: dim.element.label(lang).label,
                    uri: top.element.uri.clone(),
                    label: top.element.label(lang).label,
                })
            })
            .collect())
    }

    fn level_and_dimension_for_predicate(
        &self,
        predicate: &str,
    ) -> Result<Vec<PredicateLevel>, QueryError> {
        let mut result = Vec::new();
        for def in &self.cubes {
            for dim in &def.dimensions {
                result.extend(
                    dim.level_predicates
                        .iter()
                        .filter(|p| p.element.uri == predicate)
                        .map(|p| PredicateLevel {
                            dimension: dim.element.uri.clone(),
                            level: p.level.clone(),
                            part: None,
                        }),
                );
            }
            for join in def
                .join_condition_predicates
                .iter()
                .filter(|j| j.element.uri == predicate)
            {
                result.extend(BOTH_PARTS.iter().map(|&part| PredicateLevel {
                    dimension: join.dimension.clone(),
                    level: join.level.clone(),
                    part: Some(part),
                }));
            }
        }
        Ok(result)
    }

    fn cube_labels(&self, lang: &str) -> Result<Vec<Label>, QueryError> {
        Ok(self.cubes.iter().map(|c| c.element.label(lang)).collect())
    }

    fn labels_by_lang_and_cube(
        &self,
        lang: &str,
        cube: &str,
        element_type: ElementType,
    ) -> Result<Vec<Label>, QueryError> {
        let def = self.cube(cube)?;
        Ok(def
            .matchable()
            .into_iter()
            .filter(|(_, t, _)| *t == element_type)
            .map(|(e, _, _)| e.label(lang))
            .collect())
    }

    fn level_labels_by_lang_and_dimension(
        &self,
        lang: &str,
        cube: &str,
        dimension: &str,
    ) -> Result<Vec<DimensionLabel>, QueryError> {
        let def = self.cube(cube)?;
        let Some(dim) = def.dimension(dimension) else {
            return Ok(Vec::new());
        };
        let dimension_label = dim.element.label(lang).label;
        Ok(dim
            .levels
            .iter()
            .map(|l| DimensionLabel {
                dimension: dim.element.uri.clone(),
                dimension_label: dimension_label.clone(),
                uri: l.element.uri.clone(),
                label: l.element.label(lang).label,
            })
            .collect())
    }

    fn member_labels_by_lang_and_level(
        &self,
        lang: &str,
        cube: &str,
        level: &str,
    ) -> Result<Vec<Label>, QueryError> {
        let def = self.cube(cube)?;
        Ok(def
            .dimensions
            .iter()
            .flat_map(|d| d.levels.iter())
            .filter(|l| l.element.uri == level)
            .flat_map(|l| l.members.iter().map(|m| m.label(lang)))
            .collect())
    }
}
