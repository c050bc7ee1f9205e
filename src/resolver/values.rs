//! Value display and value determination
//!
//! After a navigation operation is chosen the user picks the value(s) it
//! applies to. Refocus operations show two lists: the values currently in
//! use on the left and their replacements on the right.
//!
//! ```text
//!   Event + situation + catalog ──▶ ValueLists ──▶ Display
//!   user input + ValueLists     ──▶ ValueSelection ──▶ Vec<ValueChange>
//! ```

use super::catalog::{CubeCatalog, DimensionEntry};
use super::confidence::{rank, ConfidenceResult};
use super::events::Event;
use super::numbering::{numbered_labels, parse_number, parse_two_numbers, ListSide};
use super::text_similarity::similarity;
use crate::analysis::{AnalysisSituation, ValueChange, ALL_NODES, TOP_LEVEL};
use crate::nlp::normalize::tokenize_with_positions;
use crate::nlp::WordGroupExtractor;
use crate::schema::SimilaritySource;
use cube_types::{Label, WordGroup};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// One selectable value
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ValueChoice {
    pub uri: String,
    pub label: String,
    #[serde(default)]
    pub dimension: Option<String>,
    /// Level of a dice node
    #[serde(default)]
    pub level: Option<String>,
}

impl ValueChoice {
    pub fn new(uri: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            label: label.into(),
            dimension: None,
            level: None,
        }
    }

    pub fn in_dimension(mut self, dimension: impl Into<String>) -> Self {
        self.dimension = Some(dimension.into());
        self
    }

    pub fn on_level(mut self, level: impl Into<String>) -> Self {
        self.level = Some(level.into());
        self
    }

    fn from_label(label: &Label) -> Self {
        Self::new(label.uri.clone(), label.label.clone())
    }
}

/// Values offered for one operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "lists", rename_all = "snake_case")]
pub enum ValueLists {
    Single { values: Vec<ValueChoice> },
    Two { left: Vec<ValueChoice>, right: Vec<ValueChoice> },
}

impl ValueLists {
    /// True when nothing can be selected
    pub fn is_empty(&self) -> bool {
        match self {
            ValueLists::Single { values } => values.is_empty(),
            ValueLists::Two { left, right } => left.is_empty() || right.is_empty(),
        }
    }
}

/// What the user selected
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ValueSelection {
    Single(ValueChoice),
    Pair(ValueChoice, ValueChoice),
}

// ============================================================================
// Value display
// ============================================================================

fn labels_in(labels: &[Label], used: &BTreeSet<String>, in_use: bool) -> Vec<ValueChoice> {
    labels
        .iter()
        .filter(|l| used.contains(&l.uri) == in_use)
        .map(ValueChoice::from_label)
        .collect()
}

/// Used values, labelled from the catalog
fn used_values(used: &BTreeSet<String>, catalog: &CubeCatalog) -> Vec<ValueChoice> {
    used.iter()
        .map(|uri| ValueChoice::new(uri.clone(), catalog.label_of(uri)))
        .collect()
}

fn current_index(dim: &DimensionEntry, level: &str) -> Option<usize> {
    dim.level_index(level)
}

fn granularity_of<'a>(situation: &'a AnalysisSituation, dim: &DimensionEntry) -> &'a str {
    situation
        .dimension_qualification(&dim.uri)
        .map_or(TOP_LEVEL, |dq| dq.granularity_level.as_str())
}

fn drill_down(situation: &AnalysisSituation, catalog: &CubeCatalog) -> Vec<ValueChoice> {
    catalog
        .dimensions
        .iter()
        .filter_map(|dim| {
            let next = current_index(dim, granularity_of(situation, dim)).map_or(0, |i| i + 1);
            dim.levels
                .get(next)
                .map(|l| ValueChoice::new(l.uri.clone(), l.label.clone()).in_dimension(dim.uri.clone()))
        })
        .collect()
}

fn roll_up(situation: &AnalysisSituation, catalog: &CubeCatalog) -> Vec<ValueChoice> {
    catalog
        .dimensions
        .iter()
        .filter_map(|dim| match current_index(dim, granularity_of(situation, dim))? {
            0 => Some(
                ValueChoice::new(TOP_LEVEL, format!("{} (all)", dim.label)).in_dimension(dim.uri.clone()),
            ),
            i => dim.levels.get(i - 1).map(|l| {
                ValueChoice::new(l.uri.clone(), l.label.clone()).in_dimension(dim.uri.clone())
            }),
        })
        .collect()
}

fn members_of(dim: &DimensionEntry, level_index: usize, exclude: &str) -> Vec<ValueChoice> {
    let Some(level) = dim.levels.get(level_index) else {
        return Vec::new();
    };
    dim.members
        .get(&level.uri)
        .into_iter()
        .flatten()
        .filter(|m| m.uri != exclude)
        .map(|m| {
            ValueChoice::new(m.uri.clone(), m.label.clone())
                .in_dimension(dim.uri.clone())
                .on_level(level.uri.clone())
        })
        .collect()
}

fn dice_down(situation: &AnalysisSituation, catalog: &CubeCatalog) -> Vec<ValueChoice> {
    catalog
        .dimensions
        .iter()
        .flat_map(|dim| {
            let (level, node) = situation
                .dimension_qualification(&dim.uri)
                .map_or((TOP_LEVEL, ALL_NODES), |dq| (dq.dice_level.as_str(), dq.dice_node.as_str()));
            let next = current_index(dim, level).map_or(0, |i| i + 1);
            members_of(dim, next, node)
        })
        .collect()
}

fn dice_up(situation: &AnalysisSituation, catalog: &CubeCatalog) -> Vec<ValueChoice> {
    catalog
        .dimensions
        .iter()
        .flat_map(|dim| {
            let Some(dq) = situation
                .dimension_qualification(&dim.uri)
                .filter(|dq| dq.is_diced())
            else {
                return Vec::new();
            };
            match current_index(dim, &dq.dice_level) {
                Some(i) if i > 0 => members_of(dim, i - 1, &dq.dice_node),
                _ => vec![ValueChoice::new(ALL_NODES, format!("all {}", dim.label))
                    .in_dimension(dim.uri.clone())
                    .on_level(TOP_LEVEL)],
            }
        })
        .collect()
}

fn slice_conditions(situation: &AnalysisSituation, catalog: &CubeCatalog, in_use: bool) -> Vec<ValueChoice> {
    catalog
        .level_predicates
        .iter()
        .filter(|p| {
            let applied = situation
                .dimension_qualification(&p.dimension)
                .is_some_and(|dq| dq.slice_conditions.contains(&p.label.uri));
            applied == in_use
        })
        .map(|p| ValueChoice::from_label(&p.label).in_dimension(p.dimension.clone()))
        .collect()
}

fn applied_slice_conditions(situation: &AnalysisSituation, catalog: &CubeCatalog) -> Vec<ValueChoice> {
    situation
        .slice_conditions()
        .map(|(dimension, predicate)| {
            ValueChoice::new(predicate, catalog.label_of(predicate)).in_dimension(dimension)
        })
        .collect()
}

/// Values selectable for a navigation event
pub fn value_lists(event: Event, situation: &AnalysisSituation, catalog: &CubeCatalog) -> ValueLists {
    let single = |values| ValueLists::Single { values };
    let two = |left, right| ValueLists::Two { left, right };

    match event {
        Event::SelectCube => single(catalog.cubes.iter().map(ValueChoice::from_label).collect()),
        Event::AddMeasure => single(labels_in(&catalog.measures, &situation.measures, false)),
        Event::DropMeasure => single(used_values(&situation.measures, catalog)),
        Event::RefocusMeasure => two(
            used_values(&situation.measures, catalog),
            labels_in(&catalog.measures, &situation.measures, false),
        ),
        Event::DrillDown => single(drill_down(situation, catalog)),
        Event::RollUp => single(roll_up(situation, catalog)),
        Event::MoveDownDiceNode => single(dice_down(situation, catalog)),
        Event::MoveUpDiceNode => single(dice_up(situation, catalog)),
        Event::NarrowSliceCondition => single(slice_conditions(situation, catalog, false)),
        Event::BroadenSliceCondition => single(applied_slice_conditions(situation, catalog)),
        Event::RefocusSliceCondition => two(
            applied_slice_conditions(situation, catalog),
            slice_conditions(situation, catalog, false),
        ),
        Event::NarrowFilter => single(labels_in(
            &catalog.aggregate_measure_predicates,
            &situation.filter_conditions,
            false,
        )),
        Event::BroadenFilter => single(used_values(&situation.filter_conditions, catalog)),
        Event::RefocusFilter => two(
            used_values(&situation.filter_conditions, catalog),
            labels_in(
                &catalog.aggregate_measure_predicates,
                &situation.filter_conditions,
                false,
            ),
        ),
        Event::NarrowBaseMeasureCondition => single(labels_in(
            &catalog.base_measure_predicates,
            &situation.base_measure_conditions,
            false,
        )),
        Event::BroadenBaseMeasureCondition => {
            single(used_values(&situation.base_measure_conditions, catalog))
        }
        Event::RefocusBaseMeasureCondition => two(
            used_values(&situation.base_measure_conditions, catalog),
            labels_in(
                &catalog.base_measure_predicates,
                &situation.base_measure_conditions,
                false,
            ),
        ),
        other => {
            tracing::warn!(event = %other, "No values for non-navigation event");
            single(Vec::new())
        }
    }
}

// ============================================================================
// Value setting
// ============================================================================

fn dimension_of(choice: &ValueChoice) -> String {
    choice.dimension.clone().unwrap_or_default()
}

/// Changes that apply a selection for `event`
pub fn changes_for(event: Event, selection: &ValueSelection) -> Vec<ValueChange> {
    match (event, selection) {
        (Event::SelectCube, ValueSelection::Single(v)) => {
            vec![ValueChange::SelectCube { cube: v.uri.clone() }]
        }
        (Event::AddMeasure, ValueSelection::Single(v)) => {
            vec![ValueChange::AddMeasure { measure: v.uri.clone() }]
        }
        (Event::DropMeasure, ValueSelection::Single(v)) => {
            vec![ValueChange::DropMeasure { measure: v.uri.clone() }]
        }
        (Event::RefocusMeasure, ValueSelection::Pair(from, to)) => vec![ValueChange::RefocusMeasure {
            from: from.uri.clone(),
            to: to.uri.clone(),
        }],
        (Event::DrillDown | Event::RollUp, ValueSelection::Single(v)) => vec![ValueChange::Granularity {
            dimension: dimension_of(v),
            level: v.uri.clone(),
        }],
        (Event::MoveUpDiceNode, ValueSelection::Single(v)) if v.uri == ALL_NODES => {
            vec![ValueChange::undice(dimension_of(v))]
        }
        (Event::MoveUpDiceNode | Event::MoveDownDiceNode, ValueSelection::Single(v)) => {
            vec![ValueChange::DiceNode {
                dimension: dimension_of(v),
                level: v.level.clone().unwrap_or_else(|| TOP_LEVEL.to_string()),
                node: v.uri.clone(),
            }]
        }
        (Event::NarrowSliceCondition, ValueSelection::Single(v)) => {
            vec![ValueChange::NarrowSliceCondition {
                dimension: dimension_of(v),
                predicate: v.uri.clone(),
            }]
        }
        (Event::BroadenSliceCondition, ValueSelection::Single(v)) => {
            vec![ValueChange::BroadenSliceCondition {
                dimension: dimension_of(v),
                predicate: v.uri.clone(),
            }]
        }
        (Event::RefocusSliceCondition, ValueSelection::Pair(from, to)) if from.dimension == to.dimension => {
            vec![ValueChange::RefocusSliceCondition {
                dimension: dimension_of(from),
                from: from.uri.clone(),
                to: to.uri.clone(),
            }]
        }
        (Event::RefocusSliceCondition, ValueSelection::Pair(from, to)) => vec![
            ValueChange::BroadenSliceCondition {
                dimension: dimension_of(from),
                predicate: from.uri.clone(),
            },
            ValueChange::NarrowSliceCondition {
                dimension: dimension_of(to),
                predicate: to.uri.clone(),
            },
        ],
        (Event::NarrowFilter, ValueSelection::Single(v)) => {
            vec![ValueChange::NarrowFilter { predicate: v.uri.clone() }]
        }
        (Event::BroadenFilter, ValueSelection::Single(v)) => {
            vec![ValueChange::BroadenFilter { predicate: v.uri.clone() }]
        }
        (Event::RefocusFilter, ValueSelection::Pair(from, to)) => vec![ValueChange::RefocusFilter {
            from: from.uri.clone(),
            to: to.uri.clone(),
        }],
        (Event::NarrowBaseMeasureCondition, ValueSelection::Single(v)) => {
            vec![ValueChange::NarrowBaseMeasureCondition { predicate: v.uri.clone() }]
        }
        (Event::BroadenBaseMeasureCondition, ValueSelection::Single(v)) => {
            vec![ValueChange::BroadenBaseMeasureCondition { predicate: v.uri.clone() }]
        }
        (Event::RefocusBaseMeasureCondition, ValueSelection::Pair(from, to)) => {
            vec![ValueChange::RefocusBaseMeasureCondition {
                from: from.uri.clone(),
                to: to.uri.clone(),
            }]
        }
        (event, selection) => {
            tracing::warn!(event = %event, ?selection, "Selection does not fit the operation");
            Vec::new()
        }
    }
}

// ============================================================================
// Value determination
// ============================================================================

/// Resolves user input against displayed values
pub struct ValueResolver<'a> {
    extractor: &'a dyn WordGroupExtractor,
    similarity_source: Option<&'a dyn SimilaritySource>,
    lang: &'a str,
    cube: Option<&'a str>,
    min_confidence: f64,
}

impl<'a> ValueResolver<'a> {
    pub fn new(extractor: &'a dyn WordGroupExtractor, lang: &'a str, min_confidence: f64) -> Self {
        Self {
            extractor,
            similarity_source: None,
            lang,
            cube: None,
            min_confidence,
        }
    }

    /// Also score word groups against the schema, restricted to `cube`
    pub fn with_schema_similarity(mut self, source: &'a dyn SimilaritySource, cube: Option<&'a str>) -> Self {
        self.similarity_source = Some(source);
        self.cube = cube;
        self
    }

    /// Best selection for the input, `None` when nothing is close enough
    pub fn determine(&self, input: &str, lists: &ValueLists) -> Option<ConfidenceResult<ValueSelection>> {
        match lists {
            ValueLists::Single { values } => {
                if let Some(n) = parse_number(input) {
                    return pick(values, n)
                        .map(|v| ConfidenceResult::new(ValueSelection::Single(v.clone()), 1.0));
                }
                let best = self.ranked(input, values, None).into_iter().next()?;
                Some(ConfidenceResult {
                    value: ValueSelection::Single(best.value),
                    confidence: best.confidence,
                    term: best.term,
                })
            }
            ValueLists::Two { left, right } => {
                if let Some((l, r)) = parse_two_numbers(input) {
                    let pair = ValueSelection::Pair(pick(left, l)?.clone(), pick(right, r)?.clone());
                    return Some(ConfidenceResult::new(pair, 1.0));
                }
                let best_left = self.ranked(input, left, Some(ListSide::Left)).into_iter().next()?;
                let left_tokens = best_left
                    .term
                    .as_ref()
                    .map(|t| t.token_indices.clone())
                    .unwrap_or_default();
                let best_right = self
                    .ranked(input, right, Some(ListSide::Right))
                    .into_iter()
                    .find(|r| {
                        r.term
                            .as_ref()
                            .map_or(true, |t| t.token_indices.is_disjoint(&left_tokens))
                    })?;
                Some(ConfidenceResult::new(
                    ValueSelection::Pair(best_left.value, best_right.value),
                    best_left.confidence.min(best_right.confidence),
                ))
            }
        }
    }

    /// Fuzzy candidates above the confidence floor, best first
    fn ranked(
        &self,
        input: &str,
        values: &[ValueChoice],
        side: Option<ListSide>,
    ) -> Vec<ConfidenceResult<ValueChoice>> {
        let mut terms: Vec<WordGroup> = self.extractor.extract(self.lang, input).into_iter().collect();
        let tokens = tokenize_with_positions(input);
        if !tokens.is_empty() {
            let full = tokens.iter().map(|t| t.text.as_str()).collect::<Vec<_>>().join(" ");
            terms.push(WordGroup::with_indices(full, 0..tokens.len()).from_expression(input.trim()));
        }

        let mut results = Vec::new();
        for (i, value) in values.iter().enumerate() {
            let mut labels = vec![value.label.clone()];
            labels.extend(numbered_labels(i + 1, side));
            for term in &terms {
                let score = labels
                    .iter()
                    .map(|l| similarity(&term.text, l))
                    .fold(0.0, f64::max);
                if score >= self.min_confidence {
                    results.push(ConfidenceResult::new(value.clone(), score).with_term(term.clone()));
                }
            }
        }

        if let Some(source) = self.similarity_source {
            for term in &terms {
                match source.word_similarity(self.lang, &term.text, self.cube) {
                    Ok(sims) => {
                        for sim in sims.into_iter().filter(|s| s.score >= self.min_confidence) {
                            results.extend(values.iter().filter(|v| v.uri == sim.element).map(|v| {
                                ConfidenceResult::new(v.clone(), sim.score).with_term(term.clone())
                            }));
                        }
                    }
                    Err(err) => tracing::error!(error = %err, "Schema similarity query failed"),
                }
            }
        }

        rank(&mut results);
        results
    }
}

/// Entry at 1-based position `n`
fn pick(values: &[ValueChoice], n: usize) -> Option<&ValueChoice> {
    n.checked_sub(1).and_then(|i| values.get(i))
}
