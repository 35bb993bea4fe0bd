//! Structured error handling for fanfuzz
//!
//! Every failure surfaced by the crate is a [`FanError`] carrying:
//! - an [`ErrorCode`] for programmatic handling
//! - a human-readable message
//! - optional key/value context and a resolution hint
//!
//! # Error Categories
//!
//! - Validation (`5xxx`) - caller-level input problems, reported as 400
//! - Inference (`2xxx`) - the controller could not produce a crisp value, 500
//! - Configuration (`7xxx`) - malformed variables, terms, rules or config files, 500
//! - Internal (`9xxx`) - anything else, 500
//!
//! The split lets a caller tell "bad input" apart from "internal computation
//! failure" with [`FanError::is_client_error`] / [`FanError::is_server_error`].
//!
//! # Example
//!
//! ```rust
//! use fanfuzz::error::{ErrorCode, FanError};
//!
//! let err = FanError::out_of_domain("temperature", 41.0, (0.0, 40.0));
//! assert_eq!(err.code, ErrorCode::InputOutOfDomain);
//! assert_eq!(err.http_status(), 400);
//! ```

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

// ============================================================================
// Error Codes
// ============================================================================

/// Stable error codes, grouped by family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Inference errors (2xxx)
    /// Aggregated output set is empty, centroid is 0/0
    UndefinedInference = 2001,

    // Validation errors (5xxx)
    /// Invalid format (e.g. malformed JSON)
    InvalidFormat = 5003,
    /// Missing required field
    MissingRequired = 5004,
    /// Invalid value (not a number)
    InvalidValue = 5005,
    /// Reading outside its declared domain
    InputOutOfDomain = 5007,

    // Config errors (7xxx)
    /// Generic configuration error
    ConfigurationError = 7000,
    /// Config file not found
    ConfigNotFound = 7001,
    /// Invalid config syntax
    InvalidConfigSyntax = 7002,
    /// Rule references a variable that was never declared
    UnknownVariable = 7005,
    /// Rule references a term missing from its variable
    UnknownTerm = 7006,
    /// Membership function breakpoints are not ordered or not finite
    InvalidMembership = 7007,

    // Internal errors (9xxx)
    /// Internal error
    InternalError = 9000,
}

impl ErrorCode {
    /// Numeric value of the code
    pub fn code(&self) -> u32 {
        *self as u32
    }

    /// Short label for the code
    pub fn description(&self) -> &'static str {
        match self {
            ErrorCode::UndefinedInference => "Undefined inference",

            ErrorCode::InvalidFormat => "Invalid format",
            ErrorCode::MissingRequired => "Missing required field",
            ErrorCode::InvalidValue => "Invalid value",
            ErrorCode::InputOutOfDomain => "Input out of domain",

            ErrorCode::ConfigurationError => "Configuration error",
            ErrorCode::ConfigNotFound => "Configuration file not found",
            ErrorCode::InvalidConfigSyntax => "Invalid configuration syntax",
            ErrorCode::UnknownVariable => "Unknown variable",
            ErrorCode::UnknownTerm => "Unknown term",
            ErrorCode::InvalidMembership => "Invalid membership function",

            ErrorCode::InternalError => "Internal error",
        }
    }

    /// Status an HTTP endpoint would answer with
    pub fn http_status(&self) -> u16 {
        match self {
            ErrorCode::InvalidFormat
            | ErrorCode::MissingRequired
            | ErrorCode::InvalidValue
            | ErrorCode::InputOutOfDomain => 400,

            ErrorCode::UndefinedInference
            | ErrorCode::ConfigurationError
            | ErrorCode::ConfigNotFound
            | ErrorCode::InvalidConfigSyntax
            | ErrorCode::UnknownVariable
            | ErrorCode::UnknownTerm
            | ErrorCode::InvalidMembership
            | ErrorCode::InternalError => 500,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.description())
    }
}

// ============================================================================
// Error Context
// ============================================================================

/// Structured details attached to a [`FanError`]
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ErrorContext {
    /// Offending field names, values and ranges
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub fields: HashMap<String, String>,
    /// `file:line` of the raising site
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

impl ErrorContext {
    pub fn new() -> Self {
        Self::default()
    }
}

// ============================================================================
// Main Error Type
// ============================================================================

/// The main error type for fanfuzz
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FanError {
    /// Machine-readable code
    pub code: ErrorCode,
    /// Message suitable for end users
    pub message: String,
    /// Additional context
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<ErrorContext>,
    /// How to fix it, when known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

impl FanError {
    /// Error with the given code and message
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            context: None,
            hint: None,
        }
    }

    // ========================================================================
    // Factory methods for common error types
    // ========================================================================

    /// A required request field is absent
    pub fn missing(field: &str) -> Self {
        Self::new(
            ErrorCode::MissingRequired,
            format!("Missing parameter: {}", field),
        )
        .with_context("field", field)
    }

    /// A request field is present but not numeric
    pub fn invalid_value(field: &str, raw: impl fmt::Display) -> Self {
        Self::new(
            ErrorCode::InvalidValue,
            format!("Invalid {}: {} is not a number", field, raw),
        )
        .with_context("field", field)
    }

    /// A reading lies outside the declared domain of its variable
    pub fn out_of_domain(field: &str, value: f64, range: (f64, f64)) -> Self {
        Self::new(
            ErrorCode::InputOutOfDomain,
            format!("{} out of range ({}-{}): {}", capitalize(field), range.0, range.1, value),
        )
        .with_context("field", field)
        .with_context("value", value.to_string())
    }

    /// Centroid defuzzification has a zero denominator
    pub fn undefined_inference(readings: &[(String, f64)]) -> Self {
        let shown: Vec<String> = readings
            .iter()
            .map(|(name, value)| format!("{}={}", name, value))
            .collect();
        let mut err = Self::new(
            ErrorCode::UndefinedInference,
            format!(
                "No rule fires for {}; the aggregated output set is empty",
                shown.join(", ")
            ),
        );
        for (name, value) in readings {
            err = err.with_context(name.as_str(), value.to_string());
        }
        err.with_hint("The rule base does not cover this combination of inputs")
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ConfigurationError, message)
    }

    /// A rule references a term its variable does not define
    pub fn unknown_term(variable: &str, term: &str) -> Self {
        Self::new(
            ErrorCode::UnknownTerm,
            format!("Variable '{}' has no term '{}'", variable, term),
        )
        .with_context("variable", variable)
        .with_context("term", term)
    }

    /// A rule references a variable that was never declared
    pub fn unknown_variable(variable: &str) -> Self {
        Self::new(
            ErrorCode::UnknownVariable,
            format!("Variable '{}' is not declared", variable),
        )
        .with_context("variable", variable)
    }

    /// Unexpected failure inside the crate
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }

    // ========================================================================
    // Builder methods
    // ========================================================================

    /// Attach a key/value pair to the error
    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let ctx = self.context.get_or_insert_with(ErrorContext::new);
        ctx.fields.insert(key.into(), value.into());
        self
    }

    /// Record where the error was raised
    pub fn at(mut self, location: impl Into<String>) -> Self {
        let ctx = self.context.get_or_insert_with(ErrorContext::new);
        ctx.location = Some(location.into());
        self
    }

    /// Attach a suggestion shown after the message
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// Status an HTTP endpoint would answer with
    pub fn http_status(&self) -> u16 {
        self.code.http_status()
    }

    /// True when the caller sent bad input (4xx)
    pub fn is_client_error(&self) -> bool {
        (400..500).contains(&self.http_status())
    }

    /// True when the controller itself failed (5xx)
    pub fn is_server_error(&self) -> bool {
        (500..600).contains(&self.http_status())
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

impl fmt::Display for FanError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code.code(), self.message)?;

        if let Some(ref ctx) = self.context {
            if let Some(ref loc) = ctx.location {
                write!(f, " at {}", loc)?;
            }
        }

        if let Some(ref hint) = self.hint {
            write!(f, "\nHint: {}", hint)?;
        }

        Ok(())
    }
}

impl std::error::Error for FanError {}

// ============================================================================
// Conversions from other error types
// ============================================================================

impl From<serde_json::Error> for FanError {
    fn from(err: serde_json::Error) -> Self {
        FanError::new(ErrorCode::InvalidFormat, err.to_string()).with_context("format", "JSON")
    }
}

impl From<crate::config::ConfigError> for FanError {
    fn from(err: crate::config::ConfigError) -> Self {
        use crate::config::ConfigError;
        let code = match &err {
            ConfigError::Io { .. } => ErrorCode::ConfigNotFound,
            ConfigError::Parse { .. } => ErrorCode::InvalidConfigSyntax,
            ConfigError::Serialize(_) | ConfigError::InvalidValue { .. } => {
                ErrorCode::ConfigurationError
            }
        };
        FanError::new(code, err.to_string())
    }
}

// ============================================================================
// Result type alias
// ============================================================================

/// A Result type using FanError
pub type FanResult<T> = Result<T, FanError>;

// ============================================================================
// Error response for request/response callers
// ============================================================================

/// Structured error body returned by the request layer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Message suitable for end users
    pub error: String,
    /// Error code (string form)
    pub code: String,
    /// Numeric error code
    pub code_num: u32,
    /// HTTP-equivalent status code
    pub status: u16,
    /// Additional details
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<HashMap<String, String>>,
    /// Hint for resolution
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

impl From<&FanError> for ErrorResponse {
    fn from(err: &FanError) -> Self {
        Self {
            error: err.message.clone(),
            code: format!("{:?}", err.code),
            code_num: err.code.code(),
            status: err.http_status(),
            details: err.context.as_ref().map(|c| c.fields.clone()),
            hint: err.hint.clone(),
        }
    }
}

impl From<FanError> for ErrorResponse {
    fn from(err: FanError) -> Self {
        Self::from(&err)
    }
}

// ============================================================================
// Macros for convenient error creation
// ============================================================================

/// Create a FanError with context from the current location
#[macro_export]
macro_rules! fan_error {
    ($code:expr, $msg:expr) => {
        $crate::error::FanError::new($code, $msg)
            .at(format!("{}:{}", file!(), line!()))
    };
    ($code:expr, $fmt:expr, $($arg:tt)*) => {
        $crate::error::FanError::new($code, format!($fmt, $($arg)*))
            .at(format!("{}:{}", file!(), line!()))
    };
}

/// Return early with a [`FanError`]
#[macro_export]
macro_rules! fan_bail {
    ($code:expr, $msg:expr) => {
        return Err($crate::fan_error!($code, $msg))
    };
    ($code:expr, $fmt:expr, $($arg:tt)*) => {
        return Err($crate::fan_error!($code, $fmt, $($arg)*))
    };
}

/// Return a [`FanError`] unless the condition holds
#[macro_export]
macro_rules! fan_ensure {
    ($cond:expr, $code:expr, $msg:expr) => {
        if !$cond {
            $crate::fan_bail!($code, $msg);
        }
    };
    ($cond:expr, $code:expr, $fmt:expr, $($arg:tt)*) => {
        if !$cond {
            $crate::fan_bail!($code, $fmt, $($arg)*);
        }
    };
}

// ============================================================================
// Tests
// ============================================================================
