//! Value setters
//!
//! Every change produces a new situation; the caller's value stays valid
//! until it decides to replace it. Selecting a cube cascades: each dimension
//! of the cube receives a qualification at its coarsest level.

use super::qualification::{DimensionQualification, ALL_NODES, TOP_LEVEL};
use super::situation::AnalysisSituation;
use crate::schema::SchemaLookup;
use serde::{Deserialize, Serialize};

/// A single value committed by a navigation operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "change", rename_all = "snake_case")]
pub enum ValueChange {
    SelectCube { cube: String },
    AddMeasure { measure: String },
    DropMeasure { measure: String },
    RefocusMeasure { from: String, to: String },
    /// Drill-down and roll-up both land here
    Granularity { dimension: String, level: String },
    /// Dice node moves; moving above the top resets to all nodes
    DiceNode {
        dimension: String,
        level: String,
        node: String,
    },
    NarrowSliceCondition { dimension: String, predicate: String },
    BroadenSliceCondition { dimension: String, predicate: String },
    RefocusSliceCondition {
        dimension: String,
        from: String,
        to: String,
    },
    NarrowFilter { predicate: String },
    BroadenFilter { predicate: String },
    RefocusFilter { from: String, to: String },
    NarrowBaseMeasureCondition { predicate: String },
    BroadenBaseMeasureCondition { predicate: String },
    RefocusBaseMeasureCondition { from: String, to: String },
}

impl ValueChange {
    /// Dice change back to the top level and all nodes
    pub fn undice(dimension: impl Into<String>) -> Self {
        ValueChange::DiceNode {
            dimension: dimension.into(),
            level: TOP_LEVEL.to_string(),
            node: ALL_NODES.to_string(),
        }
    }
}

/// Applies value changes against a schema
pub struct ValueSetter<'a> {
    schema: &'a dyn SchemaLookup,
    lang: &'a str,
}

impl<'a> ValueSetter<'a> {
    pub fn new(schema: &'a dyn SchemaLookup, lang: &'a str) -> Self {
        Self { schema, lang }
    }

    /// Set the cube and add a top-level qualification per dimension.
    ///
    /// A lookup failure is logged and leaves the cube set without
    /// qualifications.
    pub fn set_cube(&self, situation: &AnalysisSituation, cube: &str) -> AnalysisSituation {
        let mut next = situation.clone();
        self.set_cube_in_place(&mut next, cube);
        next
    }

    pub(crate) fn set_cube_in_place(&self, situation: &mut AnalysisSituation, cube: &str) {
        situation.reset_for_cube(cube);

        match self.schema.top_level_labels_by_lang_and_cube(self.lang, cube) {
            Ok(levels) => {
                for level in levels {
                    let mut dq = DimensionQualification::new(level.dimension);
                    dq.set_granularity_level(Some(&level.uri));
                    situation.add_dimension_qualification(dq);
                }
            }
            Err(err) => {
                tracing::error!(
                    cube,
                    error = %err,
                    "Cannot set dimension qualifications for cube, level query failed"
                );
            }
        }
    }

    /// Apply one change and return the resulting situation
    pub fn apply(&self, situation: &AnalysisSituation, change: &ValueChange) -> AnalysisSituation {
        if let ValueChange::SelectCube { cube } = change {
            return self.set_cube(situation, cube);
        }
        let mut next = situation.clone();
        apply_in_place(&mut next, change);
        next
    }
}

fn replace(set: &mut std::collections::BTreeSet<String>, from: &str, to: &str) {
    set.remove(from);
    set.insert(to.to_string());
}

/// Changes that do not need the schema
fn apply_in_place(s: &mut AnalysisSituation, change: &ValueChange) {
    match change {
        ValueChange::SelectCube { cube } => s.reset_for_cube(cube.as_str()),
        ValueChange::AddMeasure { measure } => {
            s.add_measure(measure.as_str());
        }
        ValueChange::DropMeasure { measure } => {
            s.remove_measure(measure);
        }
        ValueChange::RefocusMeasure { from, to } => replace(&mut s.measures, from, to),
        ValueChange::Granularity { dimension, level } => {
            s.qualification_mut(dimension).set_granularity_level(Some(level));
        }
        ValueChange::DiceNode {
            dimension,
            level,
            node,
        } => {
            let dq = s.qualification_mut(dimension);
            dq.set_dice_level(Some(level));
            dq.set_dice_node(Some(node));
        }
        ValueChange::NarrowSliceCondition {
            dimension,
            predicate,
        } => {
            s.qualification_mut(dimension).add_slice_condition(predicate.as_str());
        }
        ValueChange::BroadenSliceCondition {
            dimension,
            predicate,
        } => {
            s.qualification_mut(dimension).remove_slice_condition(predicate);
        }
        ValueChange::RefocusSliceCondition {
            dimension,
            from,
            to,
        } => replace(&mut s.qualification_mut(dimension).slice_conditions, from, to),
        ValueChange::NarrowFilter { predicate } => {
            s.add_filter_condition(predicate.as_str());
        }
        ValueChange::BroadenFilter { predicate } => {
            s.remove_filter_condition(predicate);
        }
        ValueChange::RefocusFilter { from, to } => replace(&mut s.filter_conditions, from, to),
        ValueChange::NarrowBaseMeasureCondition { predicate } => {
            s.add_base_measure_condition(predicate.as_str());
        }
        ValueChange::BroadenBaseMeasureCondition { predicate } => {
            s.remove_base_measure_condition(predicate);
        }
        ValueChange::RefocusBaseMeasureCondition { from, to } => {
            replace(&mut s.base_measure_conditions, from, to)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{InMemorySchema, UnavailableSchema};

    const SCHEMA: &str = r#"
cubes:
  - uri: "ex:claims"
    dimensions:
      - uri: "ex:doctor"
        levels:
          - uri: "ex:doctorState"
          - uri: "ex:doctorDistrict"
      - uri: "ex:time"
        levels:
          - uri: "ex:year"
"#;

    fn claims() -> AnalysisSituation {
        let schema = InMemorySchema::from_yaml(SCHEMA).unwrap();
        ValueSetter::new(&schema, "en").set_cube(&AnalysisSituation::new(), "ex:claims")
    }

    #[test]
    fn test_set_cube_cascades_top_levels() {
        let s = claims();
        assert_eq!(s.cube.as_deref(), Some("ex:claims"));
        assert_eq!(s.dimension_qualifications.len(), 2);
        assert_eq!(
            s.dimension_qualification("ex:doctor").unwrap().granularity_level,
            "ex:doctorState"
        );
    }

    #[test]
    fn test_set_cube_survives_lookup_failure() {
        let schema = UnavailableSchema;
        let s = ValueSetter::new(&schema, "en").set_cube(&AnalysisSituation::new(), "ex:claims");
        assert_eq!(s.cube.as_deref(), Some("ex:claims"));
        assert!(s.dimension_qualifications.is_empty());
    }

    #[test]
    fn test_apply_leaves_input_untouched() {
        let schema = UnavailableSchema;
        let setter = ValueSetter::new(&schema, "en");
        let before = claims();
        let after = setter.apply(
            &before,
            &ValueChange::AddMeasure {
                measure: "ex:totalCosts".into(),
            },
        );
        assert!(before.measures.is_empty());
        assert!(after.measures.contains("ex:totalCosts"));
    }

    #[test]
    fn test_refocus_and_dice() {
        let schema = UnavailableSchema;
        let setter = ValueSetter::new(&schema, "en");
        let mut s = claims();
        s.add_measure("ex:totalCosts");

        let s = setter.apply(
            &s,
            &ValueChange::RefocusMeasure {
                from: "ex:totalCosts".into(),
                to: "ex:claimCount".into(),
            },
        );
        assert_eq!(s.measures.iter().collect::<Vec<_>>(), vec!["ex:claimCount"]);

        let s = setter.apply(
            &s,
            &ValueChange::DiceNode {
                dimension: "ex:doctor".into(),
                level: "ex:doctorDistrict".into(),
                node: "ex:linz".into(),
            },
        );
        assert!(s.dimension_qualification("ex:doctor").unwrap().is_diced());

        let s = setter.apply(&s, &ValueChange::undice("ex:doctor"));
        assert!(!s.dimension_qualification("ex:doctor").unwrap().is_diced());
    }

    #[test]
    fn test_slice_conditions_narrow_and_broaden() {
        let schema = UnavailableSchema;
        let setter = ValueSetter::new(&schema, "en");
        let narrowed = setter.apply(
            &claims(),
            &ValueChange::NarrowSliceCondition {
                dimension: "ex:doctor".into(),
                predicate: "ex:urban".into(),
            },
        );
        assert_eq!(narrowed.slice_conditions().count(), 1);
        let broadened = setter.apply(
            &narrowed,
            &ValueChange::BroadenSliceCondition {
                dimension: "ex:doctor".into(),
                predicate: "ex:urban".into(),
            },
        );
        assert_eq!(broadened.slice_conditions().count(), 0);
    }
}
