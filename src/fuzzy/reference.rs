//! The fan controller's variables and rule base
//!
//! | # | temperature | humidity | speed  |
//! |---|-------------|----------|--------|
//! | 1 | low         | low      | slow   |
//! | 2 | low         | medium   | slow   |
//! | 3 | medium      | low      | medium |
//! | 4 | medium      | high     | rapid  |
//! | 5 | high        | medium   | rapid  |
//! | 6 | high        | high     | rapid  |
//!
//! Only six of the nine temperature × humidity pairings are encoded. Inputs
//! that only activate the missing pairings (cold and very humid, hot and very
//! dry, or exactly 20 °C at 50 %) produce an empty output set and fail with
//! [`ErrorCode::UndefinedInference`](crate::error::ErrorCode::UndefinedInference).

use once_cell::sync::Lazy;
use tracing::debug;

use super::controller::{ControllerBuilder, FuzzyController, Inference, DEFAULT_STEP};
use super::rule::FuzzyRule;
use super::variable::LinguisticVariable;
use crate::error::FanResult;

pub const TEMPERATURE: &str = "temperature";
pub const HUMIDITY: &str = "humidity";
pub const SPEED: &str = "speed";

/// Temperature domain in °C
pub const TEMPERATURE_RANGE: (f64, f64) = (0.0, 40.0);
/// Relative humidity domain in %
pub const HUMIDITY_RANGE: (f64, f64) = (0.0, 100.0);
/// Fan speed domain in %
pub const SPEED_RANGE: (f64, f64) = (0.0, 100.0);

type TermTable = [(&'static str, [f64; 3]); 3];

const TEMPERATURE_TERMS: TermTable = [
    ("low", [0.0, 0.0, 20.0]),
    ("medium", [10.0, 20.0, 30.0]),
    ("high", [20.0, 40.0, 40.0]),
];

const HUMIDITY_TERMS: TermTable = [
    ("low", [0.0, 0.0, 50.0]),
    ("medium", [25.0, 50.0, 75.0]),
    ("high", [50.0, 100.0, 100.0]),
];

const SPEED_TERMS: TermTable = [
    ("slow", [0.0, 0.0, 50.0]),
    ("medium", [25.0, 50.0, 75.0]),
    ("rapid", [50.0, 100.0, 100.0]),
];

/// (temperature term, humidity term, speed term)
const RULES: [(&str, &str, &str); 6] = [
    ("low", "low", "slow"),
    ("low", "medium", "slow"),
    ("medium", "low", "medium"),
    ("medium", "high", "rapid"),
    ("high", "medium", "rapid"),
    ("high", "high", "rapid"),
];

static REFERENCE: Lazy<FanResult<FuzzyController>> = Lazy::new(|| build(DEFAULT_STEP));

fn variable(name: &str, universe: (f64, f64), terms: &TermTable) -> FanResult<LinguisticVariable> {
    terms
        .iter()
        .try_fold(LinguisticVariable::new(name, universe)?, |var, (term, [a, b, c])| {
            var.with_term(term, *a, *b, *c)
        })
}

/// The six reference rules in order
pub fn reference_rules() -> Vec<FuzzyRule> {
    RULES
        .iter()
        .map(|(temperature, humidity, speed)| {
            FuzzyRule::when(TEMPERATURE, temperature)
                .and(HUMIDITY, humidity)
                .then(SPEED, speed)
        })
        .collect()
}

fn build(step: f64) -> FanResult<FuzzyController> {
    ControllerBuilder::new()
        .input(variable(TEMPERATURE, TEMPERATURE_RANGE, &TEMPERATURE_TERMS)?)
        .input(variable(HUMIDITY, HUMIDITY_RANGE, &HUMIDITY_TERMS)?)
        .output(variable(SPEED, SPEED_RANGE, &SPEED_TERMS)?)
        .rules(reference_rules())
        .step(step)
        .build()
}

impl FuzzyController {
    /// The shared fan controller sampled at integer speed percentages
    pub fn reference() -> FanResult<&'static FuzzyController> {
        REFERENCE.as_ref().map_err(Clone::clone)
    }

    /// An independent fan controller sampled every `step` speed percent
    pub fn reference_with_step(step: f64) -> FanResult<FuzzyController> {
        build(step)
    }

    /// Recommended fan speed for a temperature (°C) and relative humidity (%).
    ///
    /// Range checks belong to the caller; see [`crate::api::Reading`].
    pub fn evaluate(&self, temperature: f64, humidity: f64) -> FanResult<f64> {
        let speed = self.infer(temperature, humidity)?.output;
        debug!(temperature, humidity, speed, "fan speed evaluated");
        Ok(speed)
    }

    /// Like [`evaluate`](Self::evaluate) but keeps the whole session
    pub fn infer(&self, temperature: f64, humidity: f64) -> FanResult<Inference> {
        self.infer_readings(&[(TEMPERATURE, temperature), (HUMIDITY, humidity)])
    }
}
