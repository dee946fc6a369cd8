//! Tracing init. Call at process startup.
//!
//! CLAWSCAN_LOG controls the filter (default: clawscan=warn so scan output
//! stays clean); CLAWSCAN_LOG_JSON=1 switches to JSON lines on stderr.

use std::env;

use tracing_subscriber::{prelude::*, EnvFilter};

pub fn init_tracing() {
    let level = env::var("CLAWSCAN_LOG").unwrap_or_else(|_| "clawscan=warn".to_string());
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let json = env::var("CLAWSCAN_LOG_JSON")
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
        .unwrap_or(false);

    let _ = if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr)
                    .with_target(true),
            )
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(true),
            )
            .try_init()
    };
}
