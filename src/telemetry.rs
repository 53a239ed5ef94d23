//! Telemetry initialization.
//!
//! Controlled by `SEAM_LOG` (an `EnvFilter` directive string, default
//! `info`). Events go to stderr so they never mix with structured output
//! on stdout. `SEAM_LOG_FORMAT=json` switches the stderr events to JSON
//! for log collectors.

use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt as _;
use tracing_subscriber::util::SubscriberInitExt as _;

/// Initialize the stderr tracing subscriber. Call once, from `main`.
pub fn init() {
    let filter = EnvFilter::try_from_env("SEAM_LOG").unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    let json = std::env::var("SEAM_LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));
    if json {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(false)
                    .without_time()
                    .with_writer(std::io::stderr),
            )
            .init();
    }
}
