//! Property-based tests for the reference controller using proptest

use fanfuzz::{ErrorCode, FuzzyController, SpeedRequest, SpeedService};
use proptest::prelude::*;

/// Readings for which no rule of the reference base fires
fn uncovered(t: f64, h: f64) -> bool {
    (t <= 10.0 && h >= 75.0) || (t >= 30.0 && h <= 25.0) || (t == 20.0 && h == 50.0)
}

fn controller() -> &'static FuzzyController {
    FuzzyController::reference().expect("reference controller builds")
}

/// Whole-number readings hit the breakpoints of every triangle
fn grid_reading() -> impl Strategy<Value = (f64, f64)> {
    (0u32..=40, 0u32..=100).prop_map(|(t, h)| (t as f64, h as f64))
}

proptest! {
    #[test]
    fn speed_stays_in_universe(t in 0.0f64..=40.0, h in 0.0f64..=100.0) {
        if let Ok(speed) = controller().evaluate(t, h) {
            prop_assert!((0.0..=100.0).contains(&speed));
        }
    }

    #[test]
    fn evaluation_is_deterministic(t in 0.0f64..=40.0, h in 0.0f64..=100.0) {
        let first = controller().evaluate(t, h).ok().map(f64::to_bits);
        let second = controller().evaluate(t, h).ok().map(f64::to_bits);
        prop_assert_eq!(first, second);
    }

    #[test]
    fn failures_match_rule_gaps(t in 0.0f64..=40.0, h in 0.0f64..=100.0) {
        match controller().evaluate(t, h) {
            Ok(_) => prop_assert!(!uncovered(t, h)),
            Err(err) => {
                prop_assert!(uncovered(t, h));
                prop_assert_eq!(err.code, ErrorCode::UndefinedInference);
            }
        }
    }

    #[test]
    fn grid_failures_match_rule_gaps((t, h) in grid_reading()) {
        prop_assert_eq!(controller().evaluate(t, h).is_err(), uncovered(t, h));
    }

    #[test]
    fn out_of_range_requests_are_rejected(t in 40.001f64..1000.0, h in 0.0f64..=100.0) {
        let service = SpeedService::new(controller());
        let reply = service.handle(&SpeedRequest::new(t, h));
        prop_assert_eq!(reply.status, 400);
    }

    #[test]
    fn request_status_tracks_coverage((t, h) in grid_reading()) {
        let service = SpeedService::new(controller());
        let reply = service.handle(&SpeedRequest::new(t, h));
        let expected = if uncovered(t, h) { 500 } else { 200 };
        prop_assert_eq!(reply.status, expected);
    }
}
