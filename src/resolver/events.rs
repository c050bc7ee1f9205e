//! Dialogue events
//!
//! Every user turn ends in exactly one event. Navigation events name the
//! OLAP operation to apply next; the remaining events steer the dialogue
//! itself.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Event {
    #[serde(rename = "exit")]
    Exit,
    #[serde(rename = "abort")]
    Abort,
    #[serde(rename = "userInput")]
    UserInput,
    #[serde(rename = "moreInformation")]
    MoreInformation,
    #[serde(rename = "invalidInput")]
    InvalidInput,
    #[serde(rename = "determined")]
    Determined,
    #[serde(rename = "executeQuery")]
    ExecuteQuery,
    #[serde(rename = "reviseQuery")]
    ReviseQuery,
    #[serde(rename = "navigate.selectCube")]
    SelectCube,
    #[serde(rename = "navigate.addMeasure")]
    AddMeasure,
    #[serde(rename = "navigate.refocusMeasure")]
    RefocusMeasure,
    #[serde(rename = "navigate.dropMeasure")]
    DropMeasure,
    #[serde(rename = "navigate.drillDown")]
    DrillDown,
    #[serde(rename = "navigate.rollUp")]
    RollUp,
    #[serde(rename = "navigate.moveUpDiceNode")]
    MoveUpDiceNode,
    #[serde(rename = "navigate.moveDownDiceNode")]
    MoveDownDiceNode,
    #[serde(rename = "navigate.narrowSliceCondition")]
    NarrowSliceCondition,
    #[serde(rename = "navigate.broadenSliceCondition")]
    BroadenSliceCondition,
    #[serde(rename = "navigate.refocusSliceCondition")]
    RefocusSliceCondition,
    #[serde(rename = "navigate.narrowFilter")]
    NarrowFilter,
    #[serde(rename = "navigate.broadenFilter")]
    BroadenFilter,
    #[serde(rename = "navigate.refocusFilter")]
    RefocusFilter,
    #[serde(rename = "navigate.narrowBaseMeasureCondition")]
    NarrowBaseMeasureCondition,
    #[serde(rename = "navigate.broadenBaseMeasureCondition")]
    BroadenBaseMeasureCondition,
    #[serde(rename = "navigate.refocusBaseMeasureCondition")]
    RefocusBaseMeasureCondition,
}

impl Event {
    pub const ALL: [Event; 25] = [
        Event::Exit,
        Event::Abort,
        Event::UserInput,
        Event::MoreInformation,
        Event::InvalidInput,
        Event::Determined,
        Event::ExecuteQuery,
        Event::ReviseQuery,
        Event::SelectCube,
        Event::AddMeasure,
        Event::RefocusMeasure,
        Event::DropMeasure,
        Event::DrillDown,
        Event::RollUp,
        Event::MoveUpDiceNode,
        Event::MoveDownDiceNode,
        Event::NarrowSliceCondition,
        Event::BroadenSliceCondition,
        Event::RefocusSliceCondition,
        Event::NarrowFilter,
        Event::BroadenFilter,
        Event::RefocusFilter,
        Event::NarrowBaseMeasureCondition,
        Event::BroadenBaseMeasureCondition,
        Event::RefocusBaseMeasureCondition,
    ];

    /// Wire name, e.g. `navigate.addMeasure`
    pub fn name(&self) -> &'static str {
        match self {
            Event::Exit => "exit",
            Event::Abort => "abort",
            Event::UserInput => "userInput",
            Event::MoreInformation => "moreInformation",
            Event::InvalidInput => "invalidInput",
            Event::Determined => "determined",
            Event::ExecuteQuery => "executeQuery",
            Event::ReviseQuery => "reviseQuery",
            Event::SelectCube => "navigate.selectCube",
            Event::AddMeasure => "navigate.addMeasure",
            Event::RefocusMeasure => "navigate.refocusMeasure",
            Event::DropMeasure => "navigate.dropMeasure",
            Event::DrillDown => "navigate.drillDown",
            Event::RollUp => "navigate.rollUp",
            Event::MoveUpDiceNode => "navigate.moveUpDiceNode",
            Event::MoveDownDiceNode => "navigate.moveDownDiceNode",
            Event::NarrowSliceCondition => "navigate.narrowSliceCondition",
            Event::BroadenSliceCondition => "navigate.broadenSliceCondition",
            Event::RefocusSliceCondition => "navigate.refocusSliceCondition",
            Event::NarrowFilter => "navigate.narrowFilter",
            Event::BroadenFilter => "navigate.broadenFilter",
            Event::RefocusFilter => "navigate.refocusFilter",
            Event::NarrowBaseMeasureCondition => "navigate.narrowBaseMeasureCondition",
            Event::BroadenBaseMeasureCondition => "navigate.broadenBaseMeasureCondition",
            Event::RefocusBaseMeasureCondition => "navigate.refocusBaseMeasureCondition",
        }
    }

    /// English label shown in operation lists
    pub fn display_label(&self) -> &'static str {
        match self {
            Event::Exit => "Exit",
            Event::Abort => "Abort",
            Event::UserInput => "Enter text",
            Event::MoreInformation => "More information",
            Event::InvalidInput => "Invalid input",
            Event::Determined => "Determined",
            Event::ExecuteQuery => "Execute query",
            Event::ReviseQuery => "Revise query",
            Event::SelectCube => "Select cube",
            Event::AddMeasure => "Add measure",
            Event::RefocusMeasure => "Refocus measure",
            Event::DropMeasure => "Drop measure",
            Event::DrillDown => "Drill down",
            Event::RollUp => "Roll up",
            Event::MoveUpDiceNode => "Move dice node up",
            Event::MoveDownDiceNode => "Move dice node down",
            Event::NarrowSliceCondition => "Narrow slice condition",
            Event::BroadenSliceCondition => "Broaden slice condition",
            Event::RefocusSliceCondition => "Refocus slice condition",
            Event::NarrowFilter => "Narrow filter",
            Event::BroadenFilter => "Broaden filter",
            Event::RefocusFilter => "Refocus filter",
            Event::NarrowBaseMeasureCondition => "Narrow base measure condition",
            Event::BroadenBaseMeasureCondition => "Broaden base measure condition",
            Event::RefocusBaseMeasureCondition => "Refocus base measure condition",
        }
    }

    /// Alternative English phrasings
    pub fn synonyms(&self) -> &'static [&'static str] {
        match self {
            Event::Exit => &["quit", "bye", "stop", "end"],
            Event::Abort => &["cancel"],
            Event::ExecuteQuery => &["execute", "run query", "show result", "run"],
            Event::ReviseQuery => &["revise", "change query", "modify query"],
            Event::SelectCube => &["choose cube", "change cube"],
            Event::AddMeasure => &["new measure", "also show"],
            Event::RefocusMeasure => &["replace measure", "change measure", "swap measure"],
            Event::DropMeasure => &["remove measure", "delete measure"],
            Event::DrillDown => &["more detail", "finer", "drill"],
            Event::RollUp => &["less detail", "coarser", "aggregate"],
            Event::MoveUpDiceNode => &["zoom out", "broaden dice"],
            Event::MoveDownDiceNode => &["zoom in", "dice", "focus on"],
            Event::NarrowSliceCondition => &["add slice condition", "restrict"],
            Event::BroadenSliceCondition => &["remove slice condition"],
            Event::RefocusSliceCondition => &["change slice condition"],
            Event::NarrowFilter => &["add filter"],
            Event::BroadenFilter => &["remove filter"],
            Event::RefocusFilter => &["change filter"],
            Event::NarrowBaseMeasureCondition => &["add base measure condition"],
            Event::BroadenBaseMeasureCondition => &["remove base measure condition"],
            Event::RefocusBaseMeasureCondition => &["change base measure condition"],
            Event::UserInput
            | Event::MoreInformation
            | Event::InvalidInput
            | Event::Determined => &[],
        }
    }

    pub fn is_navigation(&self) -> bool {
        self.name().starts_with("navigate.")
    }

    /// Navigation events that replace one value by another
    pub fn is_refocus(&self) -> bool {
        matches!(
            self,
            Event::RefocusMeasure
                | Event::RefocusSliceCondition
                | Event::RefocusFilter
                | Event::RefocusBaseMeasureCondition
        )
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Event {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Event::ALL
            .iter()
            .copied()
            .find(|e| e.name() == s)
            .ok_or_else(|| format!("unknown event: {s}"))
    }
}
