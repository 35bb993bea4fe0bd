//! Triangular membership functions

use serde::{Deserialize, Serialize};

use crate::error::{ErrorCode, FanResult};
use crate::fan_ensure;

/// A fuzzy truth value in [0, 1]
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FuzzyValue(f64);

impl FuzzyValue {
    pub const ZERO: FuzzyValue = FuzzyValue(0.0);
    pub const ONE: FuzzyValue = FuzzyValue(1.0);

    /// Clamp into [0, 1]; NaN counts as no membership.
    pub fn new(value: f64) -> Self {
        if value.is_nan() {
            return Self::ZERO;
        }
        Self(value.clamp(0.0, 1.0))
    }

    pub fn value(&self) -> f64 {
        self.0
    }

    /// Fuzzy AND (t-norm) - minimum
    pub fn and(&self, other: &Self) -> Self {
        Self(self.0.min(other.0))
    }

    /// Fuzzy OR (t-conorm) - maximum
    pub fn or(&self, other: &Self) -> Self {
        Self(self.0.max(other.0))
    }

    /// Mamdani implication: clip `other` at this degree
    pub fn implies(&self, other: &Self) -> Self {
        self.and(other)
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0.0
    }
}

impl From<f64> for FuzzyValue {
    fn from(v: f64) -> Self {
        Self::new(v)
    }
}

/// Triangular membership function with breakpoints `a <= b <= c`.
///
/// Membership rises linearly from 0 at `a` to 1 at the peak `b`, then falls
/// back to 0 at `c`. `a == b` or `b == c` give open shoulders; the peak is
/// always exactly 1.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Triangle {
    a: f64,
    b: f64,
    c: f64,
}

impl Triangle {
    /// Build a triangle, rejecting non-finite or decreasing breakpoints.
    pub fn new(a: f64, b: f64, c: f64) -> FanResult<Self> {
        fan_ensure!(
            a.is_finite() && b.is_finite() && c.is_finite(),
            ErrorCode::InvalidMembership,
            "breakpoints ({}, {}, {}) must be finite",
            a,
            b,
            c
        );
        fan_ensure!(
            a <= b && b <= c,
            ErrorCode::InvalidMembership,
            "breakpoints ({}, {}, {}) must be non-decreasing",
            a,
            b,
            c
        );
        Ok(Self { a, b, c })
    }

    /// Degree of membership of `x`; zero outside `[a, c]`, NaN included
    pub fn membership(&self, x: f64) -> FuzzyValue {
        let Triangle { a, b, c } = *self;
        let degree = if !(a..=c).contains(&x) {
            0.0
        } else if x == b {
            1.0
        } else if x < b {
            (x - a) / (b - a)
        } else {
            (c - x) / (c - b)
        };
        FuzzyValue::new(degree)
    }
}
