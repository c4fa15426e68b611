//! Centralized logging initialization with environment variable support.
//!
//! Library code in `relocate-engine` never touches a global subscriber; only
//! binaries and integration tests that embed the engine should call
//! [`init_logging`].

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize a process-wide tracing subscriber.
///
/// `RUST_LOG` is honored via [`EnvFilter`] and takes precedence; if unset the
/// filter defaults to `info`. Pass `json = true` for machine-readable output
/// (useful when the embedding process already emits structured logs).
///
/// Writes to stderr so stdout stays free for any line-oriented output a
/// caller may want to produce.
pub fn init_logging(json: bool) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    if json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

/// Create a span carrying the move being processed, for context propagation
/// across the scan/rewrite/barrel stages of a single plan entry.
pub fn move_span(source: &str, target: &str) -> tracing::Span {
    tracing::info_span!("move", source = %source, target = %target)
}
