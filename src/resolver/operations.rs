//! Operation display and operation determination
//!
//! The display agenda decides which operations the current situation
//! allows. Determination then maps free text onto one of them:
//!
//! ```text
//!   "2"                 ──▶ operation at position 2       (confidence 1.0)
//!   "1,3"               ──▶ invalidInput                  (value syntax)
//!   "drill down please" ──▶ fuzzy over labels, synonyms and numbered labels
//!                           ──▶ best event, term removed from the input
//! ```

use super::catalog::CubeCatalog;
use super::confidence::{best_per_value, ConfidenceResult};
use super::events::Event;
use super::numbering::{numbered_labels, parse_number, parse_two_numbers};
use super::text_similarity::similarity;
use super::values::value_lists;
use crate::analysis::AnalysisSituation;
use crate::nlp::normalize::tokenize_with_positions;
use crate::nlp::WordGroupExtractor;
use crate::rules::Agenda;
use cube_types::WordGroup;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// An operation offered to the user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Operation {
    pub event: Event,
    pub display_name: String,
    pub position: usize,
}

impl Operation {
    pub fn new(event: Event, position: usize) -> Self {
        Self {
            event,
            display_name: event.display_label().to_string(),
            position,
        }
    }
}

// ============================================================================
// Operation display
// ============================================================================

/// What the display rules look at
#[derive(Debug, Clone, Default)]
pub struct OperationFacts {
    pub cube_defined: bool,
    pub executable: bool,
    /// Navigation events with at least one selectable value
    pub available: BTreeSet<Event>,
}

impl OperationFacts {
    pub fn collect(situation: &AnalysisSituation, catalog: &CubeCatalog) -> Self {
        let available = Event::ALL
            .into_iter()
            .filter(Event::is_navigation)
            .filter(|event| !value_lists(*event, situation, catalog).is_empty())
            .collect();
        Self {
            cube_defined: situation.is_cube_defined(),
            executable: situation.is_executable(),
            available,
        }
    }
}

/// Rules for the operation list, highest salience shown first
pub fn display_agenda() -> Agenda<OperationFacts, Event> {
    let mut agenda = Agenda::new("operation-display")
        .when(
            "select-cube-first",
            100,
            |f: &OperationFacts| !f.cube_defined && f.available.contains(&Event::SelectCube),
            |_, out| out.push(Event::SelectCube),
        )
        .when(
            "execute-when-executable",
            80,
            |f: &OperationFacts| f.executable,
            |_, out| out.push(Event::ExecuteQuery),
        );

    for event in Event::ALL
        .into_iter()
        .filter(|e| e.is_navigation() && *e != Event::SelectCube)
    {
        agenda = agenda.when(
            event.name(),
            50,
            move |f: &OperationFacts| f.cube_defined && f.available.contains(&event),
            move |_, out| out.push(event),
        );
    }

    agenda
        .when(
            "change-cube",
            10,
            |f: &OperationFacts| f.cube_defined && f.available.contains(&Event::SelectCube),
            |_, out| out.push(Event::SelectCube),
        )
        .when(
            "enter-text",
            5,
            |f: &OperationFacts| f.cube_defined,
            |_, out| out.push(Event::UserInput),
        )
        .when("exit", 0, |_| true, |_, out| out.push(Event::Exit))
}

/// Operations for the situation, numbered from 1
pub fn possible_operations(situation: &AnalysisSituation, catalog: &CubeCatalog) -> Vec<Operation> {
    let facts = OperationFacts::collect(situation, catalog);
    let operations: Vec<Operation> = display_agenda()
        .fire(&facts)
        .into_iter()
        .enumerate()
        .map(|(i, event)| Operation::new(event, i + 1))
        .collect();
    tracing::debug!(count = operations.len(), "Possible operations");
    operations
}

// ============================================================================
// Operation determination
// ============================================================================

/// Determined event and the part of the input left for the value pass
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationResolution {
    pub result: ConfidenceResult<Event>,
    pub remainder: String,
}

impl OperationResolution {
    pub fn event(&self) -> Event {
        self.result.value
    }

    fn invalid(input: &str) -> Self {
        Self {
            result: ConfidenceResult::new(Event::InvalidInput, 0.0),
            remainder: input.trim().to_string(),
        }
    }
}

pub struct OperationResolver<'a> {
    extractor: &'a dyn WordGroupExtractor,
    lang: &'a str,
    min_confidence: f64,
}

impl<'a> OperationResolver<'a> {
    pub fn new(extractor: &'a dyn WordGroupExtractor, lang: &'a str, min_confidence: f64) -> Self {
        Self {
            extractor,
            lang,
            min_confidence,
        }
    }

    /// Pick the operation the input refers to, or `invalidInput`
    pub fn determine(&self, input: &str, operations: &[Operation]) -> OperationResolution {
        if let Some(n) = parse_number(input) {
            return match operations.iter().find(|op| op.position == n) {
                Some(op) => OperationResolution {
                    result: ConfidenceResult::new(op.event, 1.0),
                    remainder: String::new(),
                },
                None => OperationResolution::invalid(input),
            };
        }
        if parse_two_numbers(input).is_some() {
            return OperationResolution::invalid(input);
        }

        match self.ranked(input, operations).into_iter().next() {
            Some(best) => {
                let remainder = best
                    .term
                    .as_ref()
                    .map_or_else(|| input.trim().to_string(), |t| remainder_without(input, t));
                tracing::debug!(
                    event = %best.value,
                    confidence = best.confidence,
                    remainder = %remainder,
                    "Operation determined"
                );
                OperationResolution {
                    result: best,
                    remainder,
                }
            }
            None => {
                tracing::debug!(input, "No operation above the confidence floor");
                OperationResolution::invalid(input)
            }
        }
    }

    /// One result per event above the confidence floor, best first
    pub fn ranked(&self, input: &str, operations: &[Operation]) -> Vec<ConfidenceResult<Event>> {
        let mut terms: Vec<WordGroup> = self.extractor.extract(self.lang, input).into_iter().collect();
        let tokens = tokenize_with_positions(input);
        if !tokens.is_empty() {
            let full = tokens.iter().map(|t| t.text.as_str()).collect::<Vec<_>>().join(" ");
            terms.push(WordGroup::with_indices(full, 0..tokens.len()).from_expression(input.trim()));
        }

        let mut results = Vec::new();
        for op in operations {
            let mut labels = vec![op.display_name.clone(), op.event.display_label().to_string()];
            labels.extend(op.event.synonyms().iter().map(|s| s.to_string()));
            labels.extend(numbered_labels(op.position, None));

            for term in &terms {
                let score = labels
                    .iter()
                    .map(|l| similarity(&term.text, l))
                    .fold(0.0, f64::max);
                if score >= self.min_confidence {
                    results.push(ConfidenceResult::new(op.event, score).with_term(term.clone()));
                }
            }
        }
        best_per_value(results)
    }
}

/// Input with the tokens of `term` cut out
fn remainder_without(input: &str, term: &WordGroup) -> String {
    tokenize_with_positions(input)
        .iter()
        .enumerate()
        .filter(|(i, _)| !term.token_indices.contains(i))
        .map(|(_, t)| &input[t.start..t.end])
        .collect::<Vec<_>>()
        .join(" ")
}
