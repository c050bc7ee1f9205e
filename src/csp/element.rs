//! Candidate bundles for one analysis-situation field

use cube_types::CubeSimilarity;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// An unordered set of similarities proposed together for one field.
///
/// Score is the product of the member scores. An empty bundle scores 0 and
/// stands for "field not set".
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AnalysisSituationElement {
    elements: BTreeSet<CubeSimilarity>,
}

impl AnalysisSituationElement {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn elements(&self) -> &BTreeSet<CubeSimilarity> {
        &self.elements
    }

    pub fn iter(&self) -> impl Iterator<Item = &CubeSimilarity> {
        self.elements.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn insert(&mut self, similarity: CubeSimilarity) -> bool {
        self.elements.insert(similarity)
    }

    /// Copy of the bundle without one member
    pub fn without(&self, similarity: &CubeSimilarity) -> Self {
        let mut elements = self.elements.clone();
        elements.remove(similarity);
        Self { elements }
    }

    pub fn score(&self) -> f64 {
        if self.elements.is_empty() {
            return 0.0;
        }
        self.elements.iter().map(|s| s.score).product()
    }

    /// Distinct cubes of the members
    pub fn cubes(&self) -> BTreeSet<&str> {
        self.elements.iter().map(|s| s.cube.as_str()).collect()
    }

    /// Distinct element IRIs of the members
    pub fn element_ids(&self) -> BTreeSet<&str> {
        self.elements.iter().map(|s| s.element.as_str()).collect()
    }
}

impl FromIterator<CubeSimilarity> for AnalysisSituationElement {
    fn from_iter<T: IntoIterator<Item = CubeSimilarity>>(iter: T) -> Self {
        Self {
            elements: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a AnalysisSituationElement {
    type Item = &'a CubeSimilarity;
    type IntoIter = std::collections::btree_set::Iter<'a, CubeSimilarity>;

    fn into_iter(self) -> Self::IntoIter {
        self.elements.iter()
    }
}
