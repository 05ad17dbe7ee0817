//! Logging setup for sshvault.
//!
//! Diagnostics go to stderr so command output on stdout stays clean.
//! `RUST_LOG` overrides the configured level.

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Default log level.
pub const DEFAULT_LOG_LEVEL: &str = "warn";

/// Normalizes a configured log level string.
#[must_use]
pub fn parse_level(value: &str) -> &'static str {
    match value.trim().to_lowercase().as_str() {
        "trace" => "trace",
        "debug" => "debug",
        "info" => "info",
        "warn" | "warning" => "warn",
        "error" => "error",
        "off" | "none" | "disabled" => "off",
        _ => DEFAULT_LOG_LEVEL,
    }
}

/// Initializes the global subscriber.
///
/// Calling this more than once is harmless; later calls are ignored.
pub fn init_logging(level: &str) {
    let level = parse_level(level);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_line_number(false);

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .try_init();

    tracing::debug!("logging initialized at level {}", level);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_level() {
        assert_eq!(parse_level("debug"), "debug");
        assert_eq!(parse_level("DEBUG"), "debug");
        assert_eq!(parse_level("warning"), "warn");
        assert_eq!(parse_level("none"), "off");
        assert_eq!(parse_level("invalid"), DEFAULT_LOG_LEVEL);
    }

    #[test]
    fn test_init_twice() {
        init_logging("off");
        init_logging("debug");
    }
}
