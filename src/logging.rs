//! Logging setup using tracing.
//!
//! Logs go to stderr so that `--json` output on stdout stays clean. The
//! level is controlled by the `MODEL_COMPARE_LOG` environment variable,
//! falling back to the configured filter.
//!
//! ```bash
//! MODEL_COMPARE_LOG=debug model-compare a.txt b.txt
//! MODEL_COMPARE_LOG=model_compare::registry=trace model-compare --web a.txt
//! ```

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Environment variable consulted before the configured filter.
pub const LOG_ENV: &str = "MODEL_COMPARE_LOG";

/// Build the filter: environment first, then `fallback`, then `warn`.
pub fn env_filter(fallback: &str) -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_new(fallback))
        .unwrap_or_else(|_| EnvFilter::new("warn"))
}

/// Install the global subscriber. Calling it twice is harmless.
pub fn init(fallback: &str) {
    let result = tracing_subscriber::registry()
        .with(env_filter(fallback))
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_line_number(true),
        )
        .try_init();

    if result.is_ok() {
        tracing::debug!(version = env!("CARGO_PKG_VERSION"), "logging initialised");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_fallback_does_not_panic() {
        let _ = env_filter("model_compare=[[[");
    }

    #[test]
    fn test_init_twice() {
        init("model_compare=info");
        init("model_compare=info");
    }
}
