//! Rule agendas
//!
//! A rule pairs a condition over a fact with an action that emits results.
//! An agenda holds the rules of one decision, such as which operations to
//! offer, and fires them in a fixed order:
//!
//! 1. higher `salience` first
//! 2. equal salience in declaration order
//!
//! An exclusive agenda stops after the first rule whose condition holds.
//!
//! ```text
//!   fact ──▶ [rule 100] ──▶ [rule 50] ──▶ [rule 50] ──▶ [rule 0] ──▶ results
//!              when?          when?         when?         when?
//!              then ─┐        then ─┐       then ─┐       then ─┐
//!                    └────────────┴────────────┴─────────────┴──▶ Vec<R>
//! ```

use std::fmt;

// ============================================================================
// Types
// ============================================================================

type Condition<F> = Box<dyn Fn(&F) -> bool + Send + Sync>;
type Action<F, R> = Box<dyn Fn(&F, &mut Vec<R>) + Send + Sync>;

/// A named condition/action pair
pub struct Rule<F, R> {
    pub name: String,
    /// Firing priority; higher fires first
    pub salience: i32,
    when: Condition<F>,
    then: Action<F, R>,
}

impl<F, R> Rule<F, R> {
    pub fn new(
        name: impl Into<String>,
        salience: i32,
        when: impl Fn(&F) -> bool + Send + Sync + 'static,
        then: impl Fn(&F, &mut Vec<R>) + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            salience,
            when: Box::new(when),
            then: Box::new(then),
        }
    }

    pub fn matches(&self, fact: &F) -> bool {
        (self.when)(fact)
    }
}

impl<F, R> fmt::Debug for Rule<F, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rule")
            .field("name", &self.name)
            .field("salience", &self.salience)
            .finish_non_exhaustive()
    }
}

/// Ordered group of rules evaluated against one fact
pub struct Agenda<F, R> {
    name: String,
    rules: Vec<Rule<F, R>>,
    halt_on_first: bool,
}

impl<F, R> Agenda<F, R> {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            rules: Vec::new(),
            halt_on_first: false,
        }
    }

    /// Agenda that fires at most one rule
    pub fn exclusive(name: impl Into<String>) -> Self {
        Self {
            halt_on_first: true,
            ..Self::new(name)
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Add a rule, keeping salience order stable for equal priorities
    pub fn rule(mut self, rule: Rule<F, R>) -> Self {
        let at = self
            .rules
            .iter()
            .position(|r| r.salience < rule.salience)
            .unwrap_or(self.rules.len());
        self.rules.insert(at, rule);
        self
    }

    /// Shorthand for [`Agenda::rule`] with [`Rule::new`]
    pub fn when(
        self,
        name: impl Into<String>,
        salience: i32,
        when: impl Fn(&F) -> bool + Send + Sync + 'static,
        then: impl Fn(&F, &mut Vec<R>) + Send + Sync + 'static,
    ) -> Self {
        self.rule(Rule::new(name, salience, when, then))
    }

    /// Fire every matching rule and collect what the actions emit
    pub fn fire(&self, fact: &F) -> Vec<R> {
        let mut out = Vec::new();
        for rule in &self.rules {
            if !rule.matches(fact) {
                continue;
            }
            tracing::debug!(agenda = %self.name, rule = %rule.name, "Rule fired");
            (rule.then)(fact, &mut out);
            if self.halt_on_first {
                break;
            }
        }
        out
    }

    /// Names of the rules that would fire, in firing order
    pub fn matching(&self, fact: &F) -> Vec<&str> {
        let mut names = Vec::new();
        for rule in self.rules.iter().filter(|r| r.matches(fact)) {
            names.push(rule.name.as_str());
            if self.halt_on_first {
                break;
            }
        }
        names
    }
}

impl<F, R> fmt::Debug for Agenda<F, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Agenda")
            .field("name", &self.name)
            .field("rules", &self.rules)
            .field("halt_on_first", &self.halt_on_first)
            .finish()
    }
}
