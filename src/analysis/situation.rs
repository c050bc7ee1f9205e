//! Non-comparative analysis situation

use super::qualification::DimensionQualification;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// The cube query under construction.
///
/// Every element referenced belongs to `cube`; changing the cube through
/// [`AnalysisSituation::reset_for_cube`] drops everything else.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisSituation {
    pub cube: Option<String>,
    #[serde(default)]
    pub measures: BTreeSet<String>,
    /// Keyed by dimension IRI
    #[serde(default)]
    pub dimension_qualifications: BTreeMap<String, DimensionQualification>,
    #[serde(default)]
    pub base_measure_conditions: BTreeSet<String>,
    #[serde(default)]
    pub filter_conditions: BTreeSet<String>,
}

impl AnalysisSituation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_cube_defined(&self) -> bool {
        self.cube.as_deref().is_some_and(|c| !c.trim().is_empty())
    }

    /// Set the cube. A different cube clears all cube-specific content.
    pub fn reset_for_cube(&mut self, cube: impl Into<String>) {
        let cube = cube.into();
        if self.cube.as_deref() != Some(cube.as_str()) {
            *self = Self {
                cube: Some(cube),
                ..Self::default()
            };
        }
    }

    pub fn add_measure(&mut self, measure: impl Into<String>) -> bool {
        self.measures.insert(measure.into())
    }

    pub fn remove_measure(&mut self, measure: &str) -> bool {
        self.measures.remove(measure)
    }

    pub fn set_measures(&mut self, measures: impl IntoIterator<Item = String>) {
        self.measures = measures.into_iter().collect();
    }

    /// Add a qualification unless the dimension already has one
    pub fn add_dimension_qualification(&mut self, dq: DimensionQualification) -> bool {
        if self.dimension_qualifications.contains_key(&dq.dimension) {
            return false;
        }
        self.dimension_qualifications.insert(dq.dimension.clone(), dq);
        true
    }

    pub fn dimension_qualification(&self, dimension: &str) -> Option<&DimensionQualification> {
        self.dimension_qualifications.get(dimension)
    }

    /// Qualification of a dimension, created with defaults when missing
    pub fn qualification_mut(&mut self, dimension: &str) -> &mut DimensionQualification {
        self.dimension_qualifications
            .entry(dimension.to_string())
            .or_insert_with(|| DimensionQualification::new(dimension))
    }

    pub fn add_base_measure_condition(&mut self, predicate: impl Into<String>) -> bool {
        self.base_measure_conditions.insert(predicate.into())
    }

    pub fn remove_base_measure_condition(&mut self, predicate: &str) -> bool {
        self.base_measure_conditions.remove(predicate)
    }

    pub fn add_filter_condition(&mut self, predicate: impl Into<String>) -> bool {
        self.filter_conditions.insert(predicate.into())
    }

    pub fn remove_filter_condition(&mut self, predicate: &str) -> bool {
        self.filter_conditions.remove(predicate)
    }

    /// Slice conditions over all dimensions as (dimension, predicate)
    pub fn slice_conditions(&self) -> impl Iterator<Item = (&str, &str)> {
        self.dimension_qualifications.values().flat_map(|dq| {
            dq.slice_conditions
                .iter()
                .map(move |p| (dq.dimension.as_str(), p.as_str()))
        })
    }

    /// Cube defined, at least one measure, every qualification filled
    pub fn is_executable(&self) -> bool {
        self.is_cube_defined()
            && !self.measures.is_empty()
            && self
                .dimension_qualifications
                .values()
                .all(DimensionQualification::is_filled)
    }

    /// Every IRI the situation references, for label lookup
    pub fn all_elements(&self) -> BTreeSet<String> {
        let mut out: BTreeSet<String> = self.cube.iter().cloned().collect();
        out.extend(self.measures.iter().cloned());
        out.extend(self.base_measure_conditions.iter().cloned());
        out.extend(self.filter_conditions.iter().cloned());
        for dq in self.dimension_qualifications.values() {
            out.insert(dq.dimension.clone());
            out.insert(dq.granularity_level.clone());
            out.insert(dq.dice_level.clone());
            out.insert(dq.dice_node.clone());
            out.extend(dq.slice_conditions.iter().cloned());
        }
        out
    }
}
