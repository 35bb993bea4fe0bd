//! Trait seams between the request layer and the inference engine
//!
//! The request layer only needs "two readings in, one speed out". Keeping that
//! behind [`SpeedController`] lets callers swap the reference fuzzy controller
//! for a differently tuned one, or a recording double in tests.

use std::fmt::Debug;

use crate::error::FanResult;
use crate::fuzzy::FuzzyController;

/// Computes a recommended fan speed from validated readings
///
/// Implementations must be pure: the same readings always produce the same
/// result, and concurrent calls need no coordination.
pub trait SpeedController: Send + Sync + Debug {
    /// Crisp fan speed (%) for temperature (°C) and relative humidity (%)
    fn evaluate(&self, temperature: f64, humidity: f64) -> FanResult<f64>;
}

impl SpeedController for FuzzyController {
    fn evaluate(&self, temperature: f64, humidity: f64) -> FanResult<f64> {
        FuzzyController::evaluate(self, temperature, humidity)
    }
}
