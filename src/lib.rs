//! fanfuzz - fuzzy-logic fan speed controller
//!
//! Recommends a fan speed (0-100 %) from a temperature (0-40 °C) and a
//! relative humidity (0-100 %) reading using Mamdani inference.
//!
//! # Architecture
//!
//! - [`fuzzy`] - membership functions, linguistic variables, rules and the
//!   inference pipeline, plus the fixed reference rule base
//! - [`core::SpeedController`] - the seam between callers and the engine
//! - [`api`] - validation and JSON request/response shaping
//! - [`config`] - TOML and environment configuration
//! - [`error`] - structured errors separating bad input from internal failure
//!
//! # Example
//!
//! ```rust
//! use fanfuzz::{FuzzyController, Reading};
//!
//! let reading = Reading::new(40.0, 100.0).unwrap();
//! let controller = FuzzyController::reference().unwrap();
//! let speed = controller
//!     .evaluate(reading.temperature(), reading.humidity())
//!     .unwrap();
//! assert!(speed > 80.0);
//! ```

pub mod core;
pub mod config;
pub mod error;
pub mod fuzzy;
pub mod api;
pub mod logging;

// Re-export core traits
pub use crate::core::SpeedController;

// Re-export inference types
pub use fuzzy::{
    ControllerBuilder, FuzzyController, FuzzyRule, FuzzyValue, Inference, InferenceSession,
    LinguisticVariable, Triangle,
};

// Re-export request layer types
pub use api::{round_to, ApiReply, Reading, SpeedRequest, SpeedResponse, SpeedService};

// Re-export configuration types
pub use config::{ConfigError, FanConfig, LogLevel, OutputFormat};

// Re-export error types
pub use error::{ErrorCode, ErrorResponse, FanError, FanResult};
