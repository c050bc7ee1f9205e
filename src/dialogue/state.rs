//! Dialogue states and the transition table
//!
//! ```text
//! DETERMINING_INTENT ── determined ──────────► CHOOSING_OPERATION ◄──────────┐
//!        │                                        │    │    │                 │
//!        └── invalidInput ─► SELECTING_CUBE ──────┘    │    └─ navigate.* ─► NAVIGATING(event)
//!                                 ▲  determined        │                      │ determined / abort
//!                                 └── selectCube ──────┤                      ┘
//!                                                      └─ executeQuery ─► EXECUTED
//!                                                                          │ reviseQuery / userInput
//! any state ── exit ──► FINISHED
//! ```

use crate::resolver::Event;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "event", rename_all = "snake_case")]
pub enum DialogueState {
    /// Free text describing the query
    #[default]
    DeterminingIntent,
    SelectingCube,
    /// Operation list shown
    ChoosingOperation,
    /// Value list of a navigation operation shown
    Navigating(Event),
    Executed,
    Finished,
}

impl DialogueState {
    pub fn is_finished(&self) -> bool {
        matches!(self, DialogueState::Finished)
    }

    /// State after `event`
    pub fn next(self, event: Event) -> DialogueState {
        use DialogueState::*;

        match (self, event) {
            (Finished, _) => Finished,
            (_, Event::Exit) => Finished,
            (DeterminingIntent, Event::Determined) => ChoosingOperation,
            (DeterminingIntent, Event::InvalidInput) => SelectingCube,
            (SelectingCube, Event::Determined) => ChoosingOperation,
            (SelectingCube, Event::Abort) => DeterminingIntent,
            (ChoosingOperation, Event::SelectCube) => SelectingCube,
            (ChoosingOperation, Event::ExecuteQuery) => Executed,
            (ChoosingOperation, Event::UserInput) => DeterminingIntent,
            (ChoosingOperation, e) if e.is_navigation() => Navigating(e),
            (Navigating(_), Event::Determined | Event::Abort) => ChoosingOperation,
            (Executed, Event::ReviseQuery) => ChoosingOperation,
            (Executed, Event::UserInput) => DeterminingIntent,
            (state, _) => state,
        }
    }
}

impl fmt::Display for DialogueState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DialogueState::DeterminingIntent => f.write_str("determining intent"),
            DialogueState::SelectingCube => f.write_str("selecting cube"),
            DialogueState::ChoosingOperation => f.write_str("choosing operation"),
            DialogueState::Navigating(event) => write!(f, "navigating ({event})"),
            DialogueState::Executed => f.write_str("executed"),
            DialogueState::Finished => f.write_str("finished"),
        }
    }
}
