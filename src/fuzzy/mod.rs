//! Mamdani fuzzy inference
//!
//! - [`membership`]: fuzzy truth values and triangular membership functions
//! - [`variable`]: linguistic variables partitioned into labelled terms
//! - [`rule`]: `IF a is x AND b is y THEN out is z` rules
//! - [`controller`]: validated controller and the inference pipeline
//!   (fuzzification, min-AND firing, clipping, max aggregation, centroid)
//! - [`reference`]: the temperature/humidity fan controller
//!
//! # Example
//!
//! ```rust
//! use fanfuzz::fuzzy::FuzzyController;
//!
//! let controller = FuzzyController::reference().unwrap();
//! let speed = controller.evaluate(0.0, 0.0).unwrap();
//! assert!(speed < 50.0);
//! ```

pub mod controller;
pub mod membership;
pub mod reference;
pub mod rule;
pub mod variable;

pub use controller::{
    ControllerBuilder, FuzzyController, Inference, InferenceSession, RuleActivation,
    VariableDegrees, DEFAULT_STEP,
};
pub use membership::{FuzzyValue, Triangle};
pub use reference::{
    reference_rules, HUMIDITY, HUMIDITY_RANGE, SPEED, SPEED_RANGE, TEMPERATURE, TEMPERATURE_RANGE,
};
pub use rule::{Clause, FuzzyRule, RuleDraft};
pub use variable::{grid_size, FuzzySet, LinguisticVariable, MAX_SAMPLES};
