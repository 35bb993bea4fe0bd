//! Fuzzy rules: ANDed antecedents mapped to one output term

use std::fmt;

use serde::Serialize;

/// A `variable is term` clause
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Clause {
    /// Variable name
    pub variable: String,
    /// Term name (fuzzy set)
    pub term: String,
}

impl Clause {
    pub fn new(variable: impl Into<String>, term: impl Into<String>) -> Self {
        Self {
            variable: variable.into(),
            term: term.into(),
        }
    }
}

impl fmt::Display for Clause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} is {}", self.variable, self.term)
    }
}

/// A fuzzy rule
///
/// ```rust
/// use fanfuzz::fuzzy::FuzzyRule;
///
/// let rule = FuzzyRule::when("temperature", "high")
///     .and("humidity", "high")
///     .then("speed", "rapid");
/// assert_eq!(
///     rule.to_string(),
///     "IF temperature is high AND humidity is high THEN speed is rapid"
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FuzzyRule {
    /// Antecedents (ANDed together)
    pub antecedents: Vec<Clause>,
    /// Consequent
    pub consequent: Clause,
}

impl FuzzyRule {
    /// Start a rule from its first antecedent
    pub fn when(variable: &str, term: &str) -> RuleDraft {
        RuleDraft {
            antecedents: vec![Clause::new(variable, term)],
        }
    }

    /// Label used in logs and explanations: 1-based position in the rule base
    pub fn label(&self, index: usize) -> String {
        format!("rule{}", index + 1)
    }
}

impl fmt::Display for FuzzyRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "IF ")?;
        for (i, clause) in self.antecedents.iter().enumerate() {
            if i > 0 {
                write!(f, " AND ")?;
            }
            write!(f, "{}", clause)?;
        }
        write!(f, " THEN {}", self.consequent)
    }
}

/// Antecedents collected so far by [`FuzzyRule::when`]
#[derive(Debug, Clone)]
pub struct RuleDraft {
    antecedents: Vec<Clause>,
}

impl RuleDraft {
    pub fn and(mut self, variable: &str, term: &str) -> Self {
        self.antecedents.push(Clause::new(variable, term));
        self
    }

    pub fn then(self, variable: &str, term: &str) -> FuzzyRule {
        FuzzyRule {
            antecedents: self.antecedents,
            consequent: Clause::new(variable, term),
        }
    }
}
