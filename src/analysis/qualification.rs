//! Dimension qualifications

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Pseudo level above the coarsest real level of every dimension
pub const TOP_LEVEL: &str = "http://dke.jku.at/ida/constants#top";

/// Dice node selecting every member
pub const ALL_NODES: &str = "http://dke.jku.at/ida/constants#all";

/// How one dimension of the cube is grouped, diced and sliced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DimensionQualification {
    pub dimension: String,
    pub granularity_level: String,
    pub dice_level: String,
    pub dice_node: String,
    #[serde(default)]
    pub slice_conditions: BTreeSet<String>,
}

impl DimensionQualification {
    /// Qualification at the top level with every node selected
    pub fn new(dimension: impl Into<String>) -> Self {
        Self {
            dimension: dimension.into(),
            granularity_level: TOP_LEVEL.to_string(),
            dice_level: TOP_LEVEL.to_string(),
            dice_node: ALL_NODES.to_string(),
            slice_conditions: BTreeSet::new(),
        }
    }

    /// Set the granularity level; `None` restores the top level
    pub fn set_granularity_level(&mut self, level: Option<&str>) {
        self.granularity_level = level.unwrap_or(TOP_LEVEL).to_string();
    }

    /// Set the dice level; `None` restores the top level
    pub fn set_dice_level(&mut self, level: Option<&str>) {
        self.dice_level = level.unwrap_or(TOP_LEVEL).to_string();
    }

    /// Set the dice node; `None` selects all nodes again
    pub fn set_dice_node(&mut self, node: Option<&str>) {
        self.dice_node = node.unwrap_or(ALL_NODES).to_string();
    }

    pub fn add_slice_condition(&mut self, predicate: impl Into<String>) -> bool {
        self.slice_conditions.insert(predicate.into())
    }

    pub fn remove_slice_condition(&mut self, predicate: &str) -> bool {
        self.slice_conditions.remove(predicate)
    }

    pub fn is_diced(&self) -> bool {
        self.dice_node != ALL_NODES
    }

    /// True when no required field is blank
    pub fn is_filled(&self) -> bool {
        [
            &self.dimension,
            &self.granularity_level,
            &self.dice_level,
            &self.dice_node,
        ]
        .iter()
        .all(|v| !v.trim().is_empty())
    }
}
