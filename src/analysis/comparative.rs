//! Comparative analysis situations

use super::situation::AnalysisSituation;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Two contexts compared against each other.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComparativeAnalysisSituation {
    pub context_of_interest: AnalysisSituation,
    pub context_of_comparison: AnalysisSituation,
    #[serde(default)]
    pub join_conditions: BTreeSet<String>,
    /// Comparative measures
    #[serde(default)]
    pub scores: BTreeSet<String>,
    #[serde(default)]
    pub score_filters: BTreeSet<String>,
}

impl ComparativeAnalysisSituation {
    pub fn is_executable(&self) -> bool {
        self.context_of_interest.is_executable()
            && self.context_of_comparison.is_executable()
            && !self.join_conditions.is_empty()
            && !self.scores.is_empty()
    }
}

/// The situation a session is working on
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EngineSituation {
    NonComparative(AnalysisSituation),
    Comparative(ComparativeAnalysisSituation),
}

impl Default for EngineSituation {
    fn default() -> Self {
        EngineSituation::NonComparative(AnalysisSituation::default())
    }
}

impl EngineSituation {
    pub fn is_executable(&self) -> bool {
        match self {
            EngineSituation::NonComparative(s) => s.is_executable(),
            EngineSituation::Comparative(c) => c.is_executable(),
        }
    }

    pub fn is_comparative(&self) -> bool {
        matches!(self, EngineSituation::Comparative(_))
    }

    pub fn as_non_comparative(&self) -> Option<&AnalysisSituation> {
        match self {
            EngineSituation::NonComparative(s) => Some(s),
            EngineSituation::Comparative(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn executable(cube: &str) -> AnalysisSituation {
        let mut s = AnalysisSituation::new();
        s.reset_for_cube(cube);
        s.add_measure("ex:totalCosts");
        s
    }

    #[test]
    fn test_comparative_needs_join_and_score() {
        let mut c = ComparativeAnalysisSituation {
            context_of_interest: executable("ex:claims"),
            context_of_comparison: executable("ex:claims"),
            ..Default::default()
        };
        assert!(!c.is_executable());
        c.join_conditions.insert("ex:sameDistrict".into());
        assert!(!c.is_executable());
        c.scores.insert("ex:costRatio".into());
        assert!(c.is_executable());
    }

    #[test]
    fn test_engine_situation_serializes_tagged() {
        let s = EngineSituation::default();
        let json = serde_json::to_value(&s).unwrap();
        assert_eq!(json["type"], "non_comparative");
        assert!(!s.is_comparative());
    }
}
