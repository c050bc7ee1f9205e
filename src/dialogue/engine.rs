//! Dialogue engine
//!
//! One call to [`DialogueEngine::handle_input`] is one turn. The engine is
//! synchronous and owns no session state; it reads the session value it is
//! given and returns the next one.
//!
//! ```text
//!   DeterminingIntent  word groups ─▶ similarities ─▶ DisambiguationService
//!   SelectingCube      cube list   ─▶ ValueResolver
//!   ChoosingOperation  operations  ─▶ OperationResolver ─▶ (remainder ─▶ ValueResolver)
//!   Navigating(event)  value lists ─▶ ValueResolver ─▶ ValueSetter
//! ```

use super::display::Display;
use super::session::DialogueSession;
use super::state::DialogueState;
use crate::analysis::{AnalysisSituation, EngineSituation, ValueSetter, ALL_NODES, TOP_LEVEL};
use crate::config::DialogueConfig;
use crate::csp::{DisambiguationService, FillOutcome};
use crate::error::{DialogueError, Result};
use crate::nlp::normalize::normalize_text;
use crate::nlp::{NgramWordGroups, WordGroupExtractor};
use crate::resolver::{
    changes_for, possible_operations, value_lists, CubeCatalog, Event, Operation, OperationResolver,
    ValueLists, ValueResolver, ValueSelection,
};
use crate::schema::{InMemorySchema, SchemaLookup, SimilaritySource};
use cube_types::CubeSimilarity;
use std::sync::Arc;

/// Result of one turn
#[derive(Debug, Clone)]
pub struct Turn {
    pub session: DialogueSession,
    pub event: Event,
    pub displays: Vec<Display>,
}

/// Event, situation and notices produced by one state handler
struct Step {
    event: Event,
    situation: EngineSituation,
    notices: Vec<Display>,
}

impl Step {
    fn new(event: Event, situation: EngineSituation) -> Self {
        Self {
            event,
            situation,
            notices: Vec::new(),
        }
    }

    fn notice(mut self, display: Display) -> Self {
        self.notices.push(display);
        self
    }
}

pub struct DialogueEngine {
    schema: Arc<dyn SchemaLookup>,
    similarity: Arc<dyn SimilaritySource>,
    extractor: Arc<dyn WordGroupExtractor>,
    config: DialogueConfig,
}

impl DialogueEngine {
    pub fn new(
        schema: Arc<dyn SchemaLookup>,
        similarity: Arc<dyn SimilaritySource>,
        extractor: Arc<dyn WordGroupExtractor>,
        config: DialogueConfig,
    ) -> Self {
        Self {
            schema,
            similarity,
            extractor,
            config,
        }
    }

    /// Engine over a static schema with n-gram word groups
    pub fn in_memory(schema: InMemorySchema, config: DialogueConfig) -> Self {
        let schema = Arc::new(schema);
        Self::new(
            schema.clone(),
            schema,
            Arc::new(NgramWordGroups::default()),
            config,
        )
    }

    pub fn config(&self) -> &DialogueConfig {
        &self.config
    }

    fn lang(&self) -> &str {
        &self.config.language
    }

    /// Process one user input
    pub fn handle_input(&self, session: &DialogueSession, input: &str) -> Result<Turn> {
        let span = tracing::info_span!("turn", session_id = %session.id, state = %session.state);
        let _enter = span.enter();

        let step = match session.state {
            DialogueState::Finished => return Err(DialogueError::SessionFinished(session.id)),
            DialogueState::DeterminingIntent => self.determine_intent(session, input)?,
            DialogueState::SelectingCube => self.select_cube(session, input)?,
            DialogueState::ChoosingOperation | DialogueState::Executed => {
                self.choose_operation(session, input)?
            }
            DialogueState::Navigating(event) => self.navigate(session, event, input)?,
        };

        let next = session.advance(step.event, step.situation);
        tracing::info!(event = %step.event, next_state = %next.state, "Turn completed");

        let mut displays = step.notices;
        displays.extend(self.prompt(&next)?);
        Ok(Turn {
            session: next,
            event: step.event,
            displays,
        })
    }

    /// What to show for the session's current state
    pub fn prompt(&self, session: &DialogueSession) -> Result<Vec<Display>> {
        let displays = match session.state {
            DialogueState::DeterminingIntent => {
                vec![Display::message("Describe the analysis you are interested in.")]
            }
            DialogueState::SelectingCube => {
                let catalog = CubeCatalog::load(self.schema.as_ref(), self.lang(), None)?;
                let lists = value_lists(Event::SelectCube, &AnalysisSituation::new(), &catalog);
                vec![Display::values("Select a cube", &lists)]
            }
            DialogueState::ChoosingOperation => vec![Display::operations(
                "What would you like to do?",
                &self.operations(session)?,
            )],
            DialogueState::Navigating(event) => {
                let (_, lists) = self.value_lists_for(session, event)?;
                vec![Display::values(event.display_label(), &lists)]
            }
            DialogueState::Executed => vec![
                Display::message(self.describe(&session.situation)?),
                Display::operations("What next?", &self.operations(session)?),
            ],
            DialogueState::Finished => vec![Display::message("Goodbye.")],
        };
        Ok(displays)
    }

    /// Operations offered in the session's state
    pub fn operations(&self, session: &DialogueSession) -> Result<Vec<Operation>> {
        let numbered = |events: Vec<Event>| {
            events
                .into_iter()
                .enumerate()
                .map(|(i, event)| Operation::new(event, i + 1))
                .collect::<Vec<_>>()
        };

        match (&session.state, &session.situation) {
            (DialogueState::Executed, _) => Ok(numbered(vec![
                Event::ReviseQuery,
                Event::UserInput,
                Event::Exit,
            ])),
            (_, EngineSituation::NonComparative(situation)) => {
                let catalog =
                    CubeCatalog::load(self.schema.as_ref(), self.lang(), situation.cube.as_deref())?;
                Ok(possible_operations(situation, &catalog))
            }
            (_, EngineSituation::Comparative(comparative)) => {
                let mut events = Vec::new();
                if comparative.is_executable() {
                    events.push(Event::ExecuteQuery);
                }
                events.extend([Event::UserInput, Event::Exit]);
                Ok(numbered(events))
            }
        }
    }

    // ========================================================================
    // State handlers
    // ========================================================================

    fn determine_intent(&self, session: &DialogueSession, input: &str) -> Result<Step> {
        if let Some(event) = exact_event(input, &[Event::Exit]) {
            return Ok(Step::new(event, session.situation.clone()));
        }

        let similarities = self.similarities(input);
        let base = session
            .situation
            .as_non_comparative()
            .cloned()
            .unwrap_or_default();
        let service = DisambiguationService::new(self.schema.as_ref(), &self.config.solver);

        match service.fill(self.lang(), &base, &similarities)? {
            FillOutcome::Determined {
                situation, score, ..
            } => {
                tracing::info!(soft = score.soft, hard = score.hard, "Intent determined");
                Ok(Step::new(Event::Determined, situation))
            }
            FillOutcome::Undetermined => Ok(Step::new(Event::InvalidInput, session.situation.clone())
                .notice(Display::error(
                    "No query could be determined from the input. Please select a cube.",
                ))),
        }
    }

    fn select_cube(&self, session: &DialogueSession, input: &str) -> Result<Step> {
        if let Some(event) = exact_event(input, &[Event::Exit, Event::Abort]) {
            return Ok(Step::new(event, session.situation.clone()));
        }

        let catalog = CubeCatalog::load(self.schema.as_ref(), self.lang(), None)?;
        let lists = value_lists(Event::SelectCube, &AnalysisSituation::new(), &catalog);
        let resolver = ValueResolver::new(
            self.extractor.as_ref(),
            self.lang(),
            self.config.resolver.value_min_confidence,
        )
        .with_schema_similarity(self.similarity.as_ref(), None);

        match resolver.determine(input, &lists) {
            Some(result) => {
                let base = session
                    .situation
                    .as_non_comparative()
                    .cloned()
                    .unwrap_or_default();
                let next = self.apply(&base, Event::SelectCube, &result.value);
                Ok(Step::new(Event::Determined, EngineSituation::NonComparative(next)))
            }
            None => Ok(Step::new(Event::InvalidInput, session.situation.clone())
                .notice(Display::error("No cube matches the input."))),
        }
    }

    fn choose_operation(&self, session: &DialogueSession, input: &str) -> Result<Step> {
        let operations = self.operations(session)?;
        let resolver = OperationResolver::new(
            self.extractor.as_ref(),
            self.lang(),
            self.config.resolver.min_confidence,
        );
        let resolution = resolver.determine(input, &operations);
        let event = resolution.event();

        if event == Event::InvalidInput {
            return Ok(Step::new(event, session.situation.clone())
                .notice(Display::error("The input does not match any operation.")));
        }

        // Operation and value in one sentence, e.g. "add measure number of claims"
        if event.is_navigation() && event != Event::SelectCube && !resolution.remainder.is_empty() {
            if let EngineSituation::NonComparative(situation) = &session.situation {
                let (catalog, lists) = self.value_lists_for(session, event)?;
                if let Some(result) = self
                    .value_resolver(situation)
                    .determine(&resolution.remainder, &lists)
                {
                    let next = self.apply(situation, event, &result.value);
                    let chosen = selection_label(&result.value, &catalog);
                    return Ok(Step::new(Event::Determined, EngineSituation::NonComparative(next))
                        .notice(Display::message(format!("{}: {chosen}", event.display_label()))));
                }
            }
        }

        Ok(Step::new(event, session.situation.clone()))
    }

    fn navigate(&self, session: &DialogueSession, event: Event, input: &str) -> Result<Step> {
        if let Some(control) = exact_event(input, &[Event::Exit, Event::Abort]) {
            return Ok(Step::new(control, session.situation.clone()));
        }
        let EngineSituation::NonComparative(situation) = &session.situation else {
            return Ok(Step::new(Event::Abort, session.situation.clone())
                .notice(Display::error("Comparative analyses cannot be navigated.")));
        };

        let (_, lists) = self.value_lists_for(session, event)?;
        match self.value_resolver(situation).determine(input, &lists) {
            Some(result) => {
                let next = self.apply(situation, event, &result.value);
                Ok(Step::new(Event::Determined, EngineSituation::NonComparative(next)))
            }
            None => Ok(Step::new(Event::InvalidInput, session.situation.clone())
                .notice(Display::error("No value matches the input."))),
        }
    }

    // ========================================================================
    // Helpers
    // ========================================================================

    /// Similarities of every word group, each tagged with its group
    fn similarities(&self, input: &str) -> Vec<CubeSimilarity> {
        let lang = self.lang();
        let mut out = Vec::new();
        for group in self.extractor.extract(lang, input) {
            match self.similarity.word_similarity(lang, &group.text, None) {
                Ok(found) => out.extend(found.into_iter().map(|mut sim| {
                    sim.term = group.clone();
                    sim
                })),
                Err(err) => {
                    tracing::error!(term = %group.text, error = %err, "Similarity lookup failed")
                }
            }
        }
        tracing::debug!(count = out.len(), "Collected similarities");
        out
    }

    fn value_lists_for(&self, session: &DialogueSession, event: Event) -> Result<(CubeCatalog, ValueLists)> {
        let situation = session
            .situation
            .as_non_comparative()
            .cloned()
            .unwrap_or_default();
        let catalog = CubeCatalog::load(self.schema.as_ref(), self.lang(), situation.cube.as_deref())?;
        let lists = value_lists(event, &situation, &catalog);
        Ok((catalog, lists))
    }

    fn value_resolver<'a>(&'a self, situation: &'a AnalysisSituation) -> ValueResolver<'a> {
        ValueResolver::new(
            self.extractor.as_ref(),
            self.lang(),
            self.config.resolver.value_min_confidence,
        )
        .with_schema_similarity(self.similarity.as_ref(), situation.cube.as_deref())
    }

    fn apply(&self, situation: &AnalysisSituation, event: Event, selection: &ValueSelection) -> AnalysisSituation {
        let setter = ValueSetter::new(self.schema.as_ref(), self.lang());
        changes_for(event, selection)
            .iter()
            .fold(situation.clone(), |acc, change| setter.apply(&acc, change))
    }

    /// Readable summary of the situation
    pub fn describe(&self, situation: &EngineSituation) -> Result<String> {
        match situation {
            EngineSituation::NonComparative(s) => {
                let catalog = CubeCatalog::load(self.schema.as_ref(), self.lang(), s.cube.as_deref())?;
                Ok(describe_situation(s, &catalog))
            }
            EngineSituation::Comparative(c) => serde_json::to_string_pretty(c)
                .map_err(|e| DialogueError::invalid_argument(format!("cannot render situation: {e}"))),
        }
    }
}

fn describe_situation(s: &AnalysisSituation, catalog: &CubeCatalog) -> String {
    let labels = |uris: &std::collections::BTreeSet<String>| {
        uris.iter()
            .map(|u| catalog.label_of(u))
            .collect::<Vec<_>>()
            .join(", ")
    };
    let level = |uri: &str| match uri {
        TOP_LEVEL => "top".to_string(),
        ALL_NODES => "all".to_string(),
        other => catalog.label_of(other),
    };

    let mut lines = vec![
        format!(
            "Cube: {}",
            s.cube.as_deref().map(|c| catalog.label_of(c)).unwrap_or_default()
        ),
        format!("Measures: {}", labels(&s.measures)),
    ];
    for dq in s.dimension_qualifications.values() {
        let mut line = format!(
            "{}: granularity {}, dice {} / {}",
            catalog.label_of(&dq.dimension),
            level(&dq.granularity_level),
            level(&dq.dice_level),
            level(&dq.dice_node)
        );
        if !dq.slice_conditions.is_empty() {
            line.push_str(&format!(", slices {}", labels(&dq.slice_conditions)));
        }
        lines.push(line);
    }
    if !s.base_measure_conditions.is_empty() {
        lines.push(format!("Base measure conditions: {}", labels(&s.base_measure_conditions)));
    }
    if !s.filter_conditions.is_empty() {
        lines.push(format!("Filters: {}", labels(&s.filter_conditions)));
    }
    lines.join("\n")
}

fn selection_label(selection: &ValueSelection, catalog: &CubeCatalog) -> String {
    match selection {
        ValueSelection::Single(v) => catalog.label_of(&v.uri),
        ValueSelection::Pair(from, to) => {
            format!("{} -> {}", catalog.label_of(&from.uri), catalog.label_of(&to.uri))
        }
    }
}

/// Control event whose label or synonym equals the input
fn exact_event(input: &str, events: &[Event]) -> Option<Event> {
    let input = normalize_text(input);
    events.iter().copied().find(|event| {
        std::iter::once(event.display_label())
            .chain(event.synonyms().iter().copied())
            .any(|label| normalize_text(label) == input)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCHEMA: &str = r#"
cubes:
  - uri: "ex:claims"
    labels: { en: "insurance claims" }
    measures:
      - uri: "ex:totalCosts"
        labels: { en: "total costs" }
      - uri: "ex:claimCount"
        labels: { en: "number of claims" }
    dimensions:
      - uri: "ex:doctor"
        labels: { en: "doctor" }
        levels:
          - uri: "ex:doctorState"
            labels: { en: "doctor state" }
          - uri: "ex:doctorDistrict"
            labels: { en: "doctor district" }
"#;

    fn engine() -> DialogueEngine {
        DialogueEngine::in_memory(
            InMemorySchema::from_yaml(SCHEMA).unwrap(),
            DialogueConfig::default(),
        )
    }

    #[test]
    fn test_exact_event() {
        assert_eq!(exact_event("Quit", &[Event::Exit]), Some(Event::Exit));
        assert_eq!(exact_event("cancel", &[Event::Exit, Event::Abort]), Some(Event::Abort));
        assert_eq!(exact_event("quit now", &[Event::Exit]), None);
    }

    #[test]
    fn test_intent_then_operation_with_value() {
        let engine = engine();
        let session = DialogueSession::new();

        let turn = engine.handle_input(&session, "total costs per doctor district").unwrap();
        assert_eq!(turn.event, Event::Determined);
        assert_eq!(turn.session.state, DialogueState::ChoosingOperation);
        let situation = turn.session.situation.as_non_comparative().unwrap().clone();
        assert_eq!(situation.cube.as_deref(), Some("ex:claims"));
        assert_eq!(
            situation.dimension_qualification("ex:doctor").unwrap().granularity_level,
            "ex:doctorDistrict"
        );

        let turn = engine
            .handle_input(&turn.session, "add measure number of claims")
            .unwrap();
        assert_eq!(turn.event, Event::Determined);
        assert_eq!(turn.session.state, DialogueState::ChoosingOperation);
        let situation = turn.session.situation.as_non_comparative().unwrap();
        assert!(situation.measures.contains("ex:claimCount"));
        assert!(situation.measures.contains("ex:totalCosts"));
        // original session value untouched
        assert!(session.situation.as_non_comparative().unwrap().cube.is_none());
    }

    #[test]
    fn test_finished_session_rejects_input() {
        let engine = engine();
        let turn = engine.handle_input(&DialogueSession::new(), "exit").unwrap();
        assert!(turn.session.is_finished());
        let err = engine.handle_input(&turn.session, "hello").unwrap_err();
        assert!(matches!(err, DialogueError::SessionFinished(_)));
    }

    #[test]
    fn test_describe_uses_labels() {
        let engine = engine();
        let turn = engine
            .handle_input(&DialogueSession::new(), "total costs per doctor district")
            .unwrap();
        let text = engine.describe(&turn.session.situation).unwrap();
        assert!(text.contains("Cube: insurance claims"));
        assert!(text.contains("Measures: total costs"));
        assert!(text.contains("doctor: granularity doctor district, dice top / all"));
    }
}
