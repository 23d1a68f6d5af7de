//! Tracing subscriber setup for the `stepper` binary.
//!
//! The library only emits `tracing` events; hosts embedding the engine install
//! their own subscriber. Output goes to stderr so stdout stays reserved for
//! outcome JSON.

use std::env;

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Environment variable holding filter directives. Takes precedence over
/// `RUST_LOG`.
pub const LOG_ENV: &str = "STEPPER_LOG";

const DEFAULT_DIRECTIVES: &str = "warn";

/// Install the stderr subscriber. A second call is a no-op.
///
/// ```bash
/// STEPPER_LOG=stepper=debug stepper run chain --history history.json
/// ```
pub fn init() {
    let directives = env::var(LOG_ENV).or_else(|_| env::var("RUST_LOG")).ok();
    let _ = tracing_subscriber::registry()
        .with(filter(directives.as_deref()))
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .compact(),
        )
        .try_init();
}

/// Build the filter from `directives`, using `warn` when they are absent,
/// blank or unparsable.
fn filter(directives: Option<&str>) -> EnvFilter {
    directives
        .map(str::trim)
        .filter(|directives| !directives.is_empty())
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_DIRECTIVES))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_or_blank_directives_default_to_warn() {
        assert_eq!(filter(None).to_string(), "warn");
        assert_eq!(filter(Some("   ")).to_string(), "warn");
    }

    #[test]
    fn explicit_directives_are_kept() {
        assert_eq!(filter(Some("stepper=debug")).to_string(), "stepper=debug");
    }
}
