//! Linguistic variables and their terms

use serde::Serialize;

use super::membership::{FuzzyValue, Triangle};
use crate::error::{ErrorCode, FanResult};
use crate::fan_ensure;

/// Upper bound on the number of points in a sampled universe
pub const MAX_SAMPLES: usize = 1_000_000;

/// Number of points `lo, lo + step, ...` that fit in `universe`.
///
/// The step must be positive and no wider than the universe, and may not
/// produce more than [`MAX_SAMPLES`] points.
pub fn grid_size(universe: (f64, f64), step: f64) -> FanResult<usize> {
    let (lo, hi) = universe;
    let span = hi - lo;
    fan_ensure!(
        step.is_finite() && step > 0.0,
        ErrorCode::ConfigurationError,
        "sample step must be positive, got {}",
        step
    );
    fan_ensure!(
        step <= span,
        ErrorCode::ConfigurationError,
        "sample step {} is wider than the universe ({}, {})",
        step,
        lo,
        hi
    );
    let intervals = (span / step + 1e-9).floor();
    fan_ensure!(
        intervals < MAX_SAMPLES as f64,
        ErrorCode::ConfigurationError,
        "sample step {} gives more than {} points over ({}, {})",
        step,
        MAX_SAMPLES,
        lo,
        hi
    );
    Ok(intervals as usize + 1)
}

/// A labelled fuzzy set over a variable's universe (e.g. "low", "rapid")
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FuzzySet {
    /// Term label
    pub name: String,
    /// The membership function
    pub membership: Triangle,
}

impl FuzzySet {
    pub fn new(name: impl Into<String>, membership: Triangle) -> Self {
        Self {
            name: name.into(),
            membership,
        }
    }

    pub fn membership_of(&self, x: f64) -> FuzzyValue {
        self.membership.membership(x)
    }
}

/// A named scalar domain partitioned into terms.
///
/// Terms keep their declaration order so that fuzzification output and
/// explanations are stable.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LinguisticVariable {
    /// Variable name (e.g. "temperature")
    pub name: String,
    /// Universe of discourse
    pub universe: (f64, f64),
    /// Terms in declaration order
    pub terms: Vec<FuzzySet>,
}

impl LinguisticVariable {
    pub fn new(name: impl Into<String>, universe: (f64, f64)) -> FanResult<Self> {
        let name = name.into();
        fan_ensure!(
            universe.0.is_finite() && universe.1.is_finite() && universe.0 < universe.1,
            ErrorCode::ConfigurationError,
            "variable '{}' has an empty universe ({}, {})",
            name,
            universe.0,
            universe.1
        );
        Ok(Self {
            name,
            universe,
            terms: Vec::new(),
        })
    }

    /// Add a triangular term; a repeated label is a configuration error.
    pub fn with_term(mut self, name: &str, a: f64, b: f64, c: f64) -> FanResult<Self> {
        fan_ensure!(
            self.term(name).is_none(),
            ErrorCode::ConfigurationError,
            "variable '{}' already defines term '{}'",
            self.name,
            name
        );
        let membership = Triangle::new(a, b, c)
            .map_err(|e| e.with_context("variable", self.name.as_str()).with_context("term", name))?;
        self.terms.push(FuzzySet::new(name, membership));
        Ok(self)
    }

    pub fn term(&self, name: &str) -> Option<&FuzzySet> {
        self.terms.iter().find(|t| t.name == name)
    }

    pub fn term_index(&self, name: &str) -> Option<usize> {
        self.terms.iter().position(|t| t.name == name)
    }

    /// Membership of `value` in every term, in declaration order
    pub fn fuzzify(&self, value: f64) -> Vec<(String, FuzzyValue)> {
        self.terms
            .iter()
            .map(|t| (t.name.clone(), t.membership_of(value)))
            .collect()
    }

    /// Sample points `lo, lo + step, ...` up to and including `hi` when the
    /// step divides the universe evenly.
    pub fn sample_points(&self, step: f64) -> FanResult<Vec<f64>> {
        let count = grid_size(self.universe, step)
            .map_err(|e| e.with_context("variable", self.name.as_str()))?;
        let lo = self.universe.0;
        Ok((0..count).map(|i| lo + i as f64 * step).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn humidity() -> LinguisticVariable {
        LinguisticVariable::new("humidity", (0.0, 100.0))
            .and_then(|v| v.with_term("low", 0.0, 0.0, 50.0))
            .and_then(|v| v.with_term("medium", 25.0, 50.0, 75.0))
            .and_then(|v| v.with_term("high", 50.0, 100.0, 100.0))
            .unwrap()
    }

    #[test]
    fn test_fuzzify_keeps_declaration_order() {
        let degrees = humidity().fuzzify(60.0);
        let names: Vec<&str> = degrees.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["low", "medium", "high"]);

        assert_eq!(degrees[0].1.value(), 0.0);
        assert!((degrees[1].1.value() - 0.6).abs() < 1e-12);
        assert!((degrees[2].1.value() - 0.2).abs() < 1e-12);
    }

    #[test]
    fn test_term_lookup() {
        let var = humidity();
        assert!(var.term("medium").is_some());
        assert_eq!(var.term_index("high"), Some(2));
        assert!(var.term("soggy").is_none());
    }

    #[test]
    fn test_duplicate_term_rejected() {
        let err = humidity().with_term("low", 0.0, 10.0, 20.0).unwrap_err();
        assert_eq!(err.code, ErrorCode::ConfigurationError);
    }

    #[test]
    fn test_bad_breakpoints_carry_term_context() {
        let err = LinguisticVariable::new("speed", (0.0, 100.0))
            .and_then(|v| v.with_term("slow", 50.0, 0.0, 0.0))
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidMembership);
        let fields = err.context.unwrap().fields;
        assert_eq!(fields.get("term"), Some(&"slow".to_string()));
    }

    #[test]
    fn test_empty_universe_rejected() {
        assert!(LinguisticVariable::new("speed", (10.0, 10.0)).is_err());
    }

    #[test]
    fn test_sample_points() {
        let var = humidity();
        let points = var.sample_points(1.0).unwrap();
        assert_eq!(points.len(), 101);
        assert_eq!(points[0], 0.0);
        assert_eq!(points[100], 100.0);

        let coarse = var.sample_points(30.0).unwrap();
        assert_eq!(coarse, vec![0.0, 30.0, 60.0, 90.0]);

        assert_eq!(var.sample_points(100.0).unwrap(), vec![0.0, 100.0]);
    }

    #[test]
    fn test_grid_size_bounds() {
        assert_eq!(grid_size((0.0, 100.0), 0.5).unwrap(), 201);
        assert_eq!(grid_size((0.0, 100.0), 1e-3).unwrap(), 100_001);

        for step in [0.0, -1.0, f64::NAN, f64::INFINITY, 100.5, 1000.0, 1e-5, 1e-20] {
            let err = grid_size((0.0, 100.0), step).unwrap_err();
            assert_eq!(err.code, ErrorCode::ConfigurationError, "step {}", step);
        }
    }

    #[test]
    fn test_sample_points_reject_unusable_step() {
        let err = humidity().sample_points(1e-20).unwrap_err();
        assert_eq!(err.code, ErrorCode::ConfigurationError);
        let fields = err.context.unwrap().fields;
        assert_eq!(fields.get("variable"), Some(&"humidity".to_string()));
    }
}
