//! Request layer around the fan controller
//!
//! Transport-free equivalent of a `POST /speed` endpoint: a JSON body goes in,
//! a status code and JSON body come out.
//!
//! - Input problems (missing field, non-numeric value, reading outside its
//!   domain, malformed JSON) are answered with **400** and the controller is
//!   never called.
//! - Controller failures (e.g. no rule fires) are answered with **500**.
//! - Success is **200** with the speed rounded for presentation.
//!
//! # Example
//!
//! ```rust
//! use fanfuzz::api::SpeedService;
//! use fanfuzz::fuzzy::FuzzyController;
//!
//! let controller = FuzzyController::reference().unwrap();
//! let service = SpeedService::new(controller);
//!
//! let reply = service.handle_json(r#"{"temperature": 40, "humidity": 100}"#);
//! assert_eq!(reply.status, 200);
//! assert_eq!(reply.body["recommended_speed"], 83.67);
//!
//! let reply = service.handle_json(r#"{"temperature": 41, "humidity": 50}"#);
//! assert_eq!(reply.status, 400);
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, error, warn};

use crate::core::SpeedController;
use crate::error::{ErrorResponse, FanError, FanResult};
use crate::fuzzy::{HUMIDITY, HUMIDITY_RANGE, TEMPERATURE, TEMPERATURE_RANGE};

/// Decimal places used when presenting a speed
pub const DEFAULT_PRECISION: u32 = 2;

/// Largest precision accepted for presentation rounding
pub const MAX_PRECISION: u32 = 10;

// ============================================================================
// Validated input
// ============================================================================

/// A temperature/humidity pair known to lie inside both domains
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Reading {
    temperature: f64,
    humidity: f64,
}

impl Reading {
    /// Check both readings against their domains (bounds inclusive).
    ///
    /// Temperature is checked first. NaN is never inside a domain.
    pub fn new(temperature: f64, humidity: f64) -> FanResult<Self> {
        check_range(TEMPERATURE, temperature, TEMPERATURE_RANGE)?;
        check_range(HUMIDITY, humidity, HUMIDITY_RANGE)?;
        Ok(Self {
            temperature,
            humidity,
        })
    }

    pub fn temperature(&self) -> f64 {
        self.temperature
    }

    pub fn humidity(&self) -> f64 {
        self.humidity
    }
}

fn check_range(field: &str, value: f64, range: (f64, f64)) -> FanResult<()> {
    if (range.0..=range.1).contains(&value) {
        Ok(())
    } else {
        Err(FanError::out_of_domain(field, value, range))
    }
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// JSON request body
///
/// Values may be JSON numbers or numeric strings. The Spanish keys
/// `temperatura` and `humedad` are accepted as aliases.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SpeedRequest {
    #[serde(default, alias = "temperatura")]
    pub temperature: Option<Value>,
    #[serde(default, alias = "humedad")]
    pub humidity: Option<Value>,
}

impl SpeedRequest {
    pub fn new(temperature: f64, humidity: f64) -> Self {
        Self {
            temperature: Some(Value::from(temperature)),
            humidity: Some(Value::from(humidity)),
        }
    }

    /// Presence first, then numeric conversion, then domain checks
    pub fn validate(&self) -> FanResult<Reading> {
        let raw_temperature = self
            .temperature
            .as_ref()
            .ok_or_else(|| FanError::missing(TEMPERATURE))?;
        let raw_humidity = self
            .humidity
            .as_ref()
            .ok_or_else(|| FanError::missing(HUMIDITY))?;

        let temperature = numeric(TEMPERATURE, raw_temperature)?;
        let humidity = numeric(HUMIDITY, raw_humidity)?;
        Reading::new(temperature, humidity)
    }
}

fn numeric(field: &str, value: &Value) -> FanResult<f64> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.ok_or_else(|| FanError::invalid_value(field, value))
}

/// Successful response body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeedResponse {
    pub temperature: f64,
    pub humidity: f64,
    /// Speed rounded to the service precision
    pub recommended_speed: f64,
}

/// Status code plus JSON body
#[derive(Debug, Clone, PartialEq)]
pub struct ApiReply {
    pub status: u16,
    pub body: Value,
}

impl ApiReply {
    fn ok(response: &SpeedResponse) -> Self {
        Self {
            status: 200,
            body: serde_json::to_value(response).unwrap_or(Value::Null),
        }
    }

    fn error(err: &FanError) -> Self {
        let response = ErrorResponse::from(err);
        Self {
            status: response.status,
            body: serde_json::to_value(&response).unwrap_or(Value::Null),
        }
    }
}

/// Round for presentation only; `places` is capped at [`MAX_PRECISION`]
pub fn round_to(value: f64, places: u32) -> f64 {
    let factor = 10f64.powi(places.min(MAX_PRECISION) as i32);
    (value * factor).round() / factor
}

// ============================================================================
// Service
// ============================================================================

/// Validates readings, calls the controller and shapes the reply
#[derive(Debug)]
pub struct SpeedService<'a, C: SpeedController + ?Sized> {
    controller: &'a C,
    precision: u32,
}

impl<'a, C: SpeedController + ?Sized> SpeedService<'a, C> {
    pub fn new(controller: &'a C) -> Self {
        Self {
            controller,
            precision: DEFAULT_PRECISION,
        }
    }

    /// Decimal places kept in `recommended_speed`, at most [`MAX_PRECISION`]
    pub fn with_precision(mut self, precision: u32) -> Self {
        self.precision = precision.min(MAX_PRECISION);
        self
    }

    /// Evaluate an already validated reading
    pub fn recommend(&self, reading: Reading) -> FanResult<SpeedResponse> {
        let speed = self
            .controller
            .evaluate(reading.temperature(), reading.humidity())?;
        Ok(SpeedResponse {
            temperature: reading.temperature(),
            humidity: reading.humidity(),
            recommended_speed: round_to(speed, self.precision),
        })
    }

    pub fn process(&self, request: &SpeedRequest) -> FanResult<SpeedResponse> {
        let reading = request.validate()?;
        self.recommend(reading)
    }

    pub fn handle(&self, request: &SpeedRequest) -> ApiReply {
        match self.process(request) {
            Ok(response) => {
                debug!(
                    temperature = response.temperature,
                    humidity = response.humidity,
                    speed = response.recommended_speed,
                    "speed request served"
                );
                ApiReply::ok(&response)
            }
            Err(err) => {
                let reply = ApiReply::error(&err);
                if err.is_client_error() {
                    warn!(status = reply.status, code = ?err.code, "{}", err.message);
                } else {
                    error!(status = reply.status, code = ?err.code, "{}", err.message);
                }
                reply
            }
        }
    }

    pub fn handle_json(&self, body: &str) -> ApiReply {
        match serde_json::from_str::<SpeedRequest>(body) {
            Ok(request) => self.handle(&request),
            Err(e) => {
                let err = FanError::from(e);
                warn!(status = err.http_status(), "malformed request body");
                ApiReply::error(&err)
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::fuzzy::FuzzyController;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Returns a fixed speed and counts calls
    #[derive(Debug, Default)]
    struct Recording {
        calls: AtomicUsize,
        fail: bool,
    }

    impl SpeedController for Recording {
        fn evaluate(&self, _temperature: f64, _humidity: f64) -> FanResult<f64> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                Err(FanError::undefined_inference(&[]))
            } else {
                Ok(42.4242)
            }
        }
    }

    #[test]
    fn test_reading_bounds_are_inclusive() {
        assert!(Reading::new(0.0, 0.0).is_ok());
        assert!(Reading::new(40.0, 100.0).is_ok());
    }

    #[test]
    fn test_reading_rejects_out_of_range() {
        let err = Reading::new(41.0, 50.0).unwrap_err();
        assert_eq!(err.code, ErrorCode::InputOutOfDomain);
        assert!(err.message.starts_with("Temperature out of range"));

        let err = Reading::new(20.0, -1.0).unwrap_err();
        assert_eq!(err.code, ErrorCode::InputOutOfDomain);
        assert!(err.message.starts_with("Humidity out of range"));

        let err = Reading::new(f64::NAN, 50.0).unwrap_err();
        assert_eq!(err.code, ErrorCode::InputOutOfDomain);
    }

    #[test]
    fn test_out_of_range_never_reaches_controller() {
        let controller = Recording::default();
        let service = SpeedService::new(&controller);

        let reply = service.handle(&SpeedRequest::new(41.0, 50.0));
        assert_eq!(reply.status, 400);
        assert_eq!(reply.body["code"], "InputOutOfDomain");

        let reply = service.handle(&SpeedRequest::new(20.0, -1.0));
        assert_eq!(reply.status, 400);

        assert_eq!(controller.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_missing_fields() {
        let controller = Recording::default();
        let service = SpeedService::new(&controller);

        let reply = service.handle_json(r#"{"humidity": 50}"#);
        assert_eq!(reply.status, 400);
        assert_eq!(reply.body["error"], "Missing parameter: temperature");

        let reply = service.handle_json(r#"{"temperature": 20, "humidity": null}"#);
        assert_eq!(reply.status, 400);
        assert_eq!(reply.body["error"], "Missing parameter: humidity");

        // temperature is reported first when both are absent
        let reply = service.handle_json("{}");
        assert_eq!(reply.body["error"], "Missing parameter: temperature");

        assert_eq!(controller.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_non_numeric_values() {
        let controller = Recording::default();
        let service = SpeedService::new(&controller);

        let reply = service.handle_json(r#"{"temperature": "warm", "humidity": 50}"#);
        assert_eq!(reply.status, 400);
        assert_eq!(reply.body["code"], "InvalidValue");

        let reply = service.handle_json(r#"{"temperature": 20, "humidity": [1]}"#);
        assert_eq!(reply.status, 400);
        assert_eq!(reply.body["code"], "InvalidValue");

        assert_eq!(controller.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_numeric_strings_and_aliases() {
        let controller = Recording::default();
        let service = SpeedService::new(&controller);

        let reply = service.handle_json(r#"{"temperatura": " 25.5 ", "humedad": "60"}"#);
        assert_eq!(reply.status, 200);
        assert_eq!(reply.body["temperature"], 25.5);
        assert_eq!(reply.body["humidity"], 60.0);
        assert_eq!(controller.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_malformed_body() {
        let controller = Recording::default();
        let service = SpeedService::new(&controller);

        let reply = service.handle_json("{not json");
        assert_eq!(reply.status, 400);
        assert_eq!(reply.body["code"], "InvalidFormat");
        assert_eq!(controller.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_speed_is_rounded() {
        let controller = Recording::default();
        let reply = SpeedService::new(&controller).handle(&SpeedRequest::new(20.0, 30.0));
        assert_eq!(reply.status, 200);
        assert_eq!(reply.body["recommended_speed"], 42.42);

        let reply = SpeedService::new(&controller)
            .with_precision(1)
            .handle(&SpeedRequest::new(20.0, 30.0));
        assert_eq!(reply.body["recommended_speed"], 42.4);
    }

    #[test]
    fn test_precision_is_capped() {
        let controller = Recording::default();
        let reply = SpeedService::new(&controller)
            .with_precision(u32::MAX)
            .handle(&SpeedRequest::new(20.0, 30.0));
        assert_eq!(reply.status, 200);
        assert_eq!(reply.body["recommended_speed"], round_to(42.4242, MAX_PRECISION));
    }

    #[test]
    fn test_controller_failure_is_server_error() {
        let controller = Recording {
            fail: true,
            ..Default::default()
        };
        let reply = SpeedService::new(&controller).handle(&SpeedRequest::new(20.0, 50.0));
        assert_eq!(reply.status, 500);
        assert_eq!(reply.body["code"], "UndefinedInference");
    }

    #[test]
    fn test_reference_controller_end_to_end() {
        let controller = FuzzyController::reference().unwrap();
        let service = SpeedService::new(controller);

        let reply = service.handle_json(r#"{"temperature": 0, "humidity": 0}"#);
        assert_eq!(reply.status, 200);
        assert_eq!(reply.body["recommended_speed"], 16.33);

        // no rule covers cold and saturated air
        let reply = service.handle_json(r#"{"temperature": 0, "humidity": 100}"#);
        assert_eq!(reply.status, 500);
        assert_eq!(reply.body["code"], "UndefinedInference");
    }

    #[test]
    fn test_round_to() {
        assert_eq!(round_to(16.333333, 2), 16.33);
        assert_eq!(round_to(83.666666, 2), 83.67);
        assert_eq!(round_to(83.666666, 0), 84.0);
        assert_eq!(round_to(83.666666, u32::MAX), round_to(83.666666, MAX_PRECISION));
    }
}
