//! Per-turn snapshot of the schema elements the resolver rules look at

use crate::error::QueryError;
use crate::schema::SchemaLookup;
use cube_types::{DimensionLabel, ElementType, Label};
use serde::Serialize;
use std::collections::BTreeMap;

/// A dimension with its levels (coarsest first) and level members
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DimensionEntry {
    pub uri: String,
    pub label: String,
    pub levels: Vec<DimensionLabel>,
    /// Members per level IRI
    pub members: BTreeMap<String, Vec<Label>>,
}

impl DimensionEntry {
    pub fn level_index(&self, level: &str) -> Option<usize> {
        self.levels.iter().position(|l| l.uri == level)
    }

    pub fn level_label(&self, level: &str) -> Option<&str> {
        self.levels
            .iter()
            .find(|l| l.uri == level)
            .map(|l| l.label.as_str())
    }
}

/// A level predicate and the dimension it restricts
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PredicateEntry {
    pub dimension: String,
    pub label: Label,
}

/// Labels of every element of the current cube plus all cube labels
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CubeCatalog {
    pub cubes: Vec<Label>,
    pub cube: Option<Label>,
    pub measures: Vec<Label>,
    pub dimensions: Vec<DimensionEntry>,
    pub level_predicates: Vec<PredicateEntry>,
    pub base_measure_predicates: Vec<Label>,
    pub aggregate_measure_predicates: Vec<Label>,
}

impl CubeCatalog {
    /// Load the catalog; without a cube only the cube list is filled
    pub fn load(schema: &dyn SchemaLookup, lang: &str, cube: Option<&str>) -> Result<Self, QueryError> {
        let mut catalog = CubeCatalog {
            cubes: schema.cube_labels(lang)?,
            ..CubeCatalog::default()
        };
        let Some(cube) = cube else {
            return Ok(catalog);
        };

        catalog.cube = catalog.cubes.iter().find(|c| c.uri == cube).cloned();
        catalog.measures = schema.labels_by_lang_and_cube(lang, cube, ElementType::Measure)?;
        catalog.base_measure_predicates =
            schema.labels_by_lang_and_cube(lang, cube, ElementType::BaseMeasurePredicate)?;
        catalog.aggregate_measure_predicates =
            schema.labels_by_lang_and_cube(lang, cube, ElementType::AggregateMeasurePredicate)?;

        for top in schema.top_level_labels_by_lang_and_cube(lang, cube)? {
            let levels = schema.level_labels_by_lang_and_dimension(lang, cube, &top.dimension)?;
            let mut members = BTreeMap::new();
            for level in &levels {
                members.insert(
                    level.uri.clone(),
                    schema.member_labels_by_lang_and_level(lang, cube, &level.uri)?,
                );
            }
            catalog.dimensions.push(DimensionEntry {
                uri: top.dimension,
                label: top.dimension_label,
                levels,
                members,
            });
        }

        for label in schema.labels_by_lang_and_cube(lang, cube, ElementType::LevelPredicate)? {
            let dimension = schema
                .level_and_dimension_for_predicate(&label.uri)?
                .into_iter()
                .find(|l| l.part.is_none())
                .map(|l| l.dimension);
            match dimension {
                Some(dimension) => catalog.level_predicates.push(PredicateEntry { dimension, label }),
                None => tracing::warn!(predicate = %label.uri, "Level predicate without dimension"),
            }
        }

        tracing::debug!(
            cube,
            measures = catalog.measures.len(),
            dimensions = catalog.dimensions.len(),
            "Loaded cube catalog"
        );
        Ok(catalog)
    }

    pub fn dimension(&self, uri: &str) -> Option<&DimensionEntry> {
        self.dimensions.iter().find(|d| d.uri == uri)
    }

    /// Label of any catalog element, falling back to the IRI
    pub fn label_of(&self, uri: &str) -> String {
        let plain = self
            .cubes
            .iter()
            .chain(&self.measures)
            .chain(&self.base_measure_predicates)
            .chain(&self.aggregate_measure_predicates)
            .chain(self.level_predicates.iter().map(|p| &p.label))
            .find(|l| l.uri == uri)
            .map(|l| l.label.clone());
        plain
            .or_else(|| {
                self.dimensions.iter().find_map(|d| {
                    if d.uri == uri {
                        return Some(d.label.clone());
                    }
                    d.level_label(uri).map(str::to_string).or_else(|| {
                        d.members
                            .values()
                            .flatten()
                            .find(|m| m.uri == uri)
                            .map(|m| m.label.clone())
                    })
                })
            })
            .unwrap_or_else(|| uri.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{InMemorySchema, UnavailableSchema};

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
            members:
              - uri: "ex:linz"
                labels: { en: "linz" }
        level_predicates:
          - uri: "ex:urban"
            labels: { en: "urban districts" }
            level: "ex:doctorDistrict"
"#;

    #[test]
    fn test_load_full_catalog() {
        let schema = InMemorySchema::from_yaml(SCHEMA).unwrap();
        let catalog = CubeCatalog::load(&schema, "en", Some("ex:claims")).unwrap();
        assert_eq!(catalog.cube.as_ref().unwrap().label, "insurance claims");
        assert_eq!(catalog.measures.len(), 1);
        let doctor = catalog.dimension("ex:doctor").unwrap();
        assert_eq!(doctor.level_index("ex:doctorDistrict"), Some(1));
        assert_eq!(doctor.members["ex:doctorDistrict"].len(), 1);
        assert_eq!(catalog.level_predicates[0].dimension, "ex:doctor");
        assert_eq!(catalog.label_of("ex:linz"), "linz");
        assert_eq!(catalog.label_of("ex:doctor"), "doctor");
        assert_eq!(catalog.label_of("ex:unknown"), "ex:unknown");
    }

    #[test]
    fn test_load_without_cube() {
        let schema = InMemorySchema::from_yaml(SCHEMA).unwrap();
        let catalog = CubeCatalog::load(&schema, "en", None).unwrap();
        assert_eq!(catalog.cubes.len(), 1);
        assert!(catalog.measures.is_empty());
    }

    #[test]
    fn test_unavailable_schema_fails() {
        assert!(CubeCatalog::load(&UnavailableSchema, "en", None).is_err());
    }
}
