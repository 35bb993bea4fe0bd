//! Tracing initialization
//!
//! `FANFUZZ_LOG` takes precedence over the configured [`LogLevel`], using the
//! usual `EnvFilter` syntax (e.g. `FANFUZZ_LOG=fanfuzz::fuzzy=trace`).

use std::sync::Once;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::config::LogLevel;

static INIT: Once = Once::new();

/// Environment variable holding an explicit filter
pub const LOG_ENV: &str = "FANFUZZ_LOG";

/// Install the global subscriber; later calls are no-ops.
///
/// Logs go to stderr so stdout stays reserved for results.
pub fn init_tracing(level: LogLevel) {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_env(LOG_ENV)
            .unwrap_or_else(|_| EnvFilter::new(level.filter_directive()));

        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(level == LogLevel::Debug),
            )
            .with(filter)
            .init();
    });
}
