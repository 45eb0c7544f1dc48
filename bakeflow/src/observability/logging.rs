//! Log subscriber setup.
//!
//! Two profiles: a readable development console at `info`, and a JSON
//! production stream on stderr at `warn`. `RUST_LOG` overrides the default
//! directive in both.

use std::sync::Once;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

static INIT: Once = Once::new();

/// Logging profile.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogProfile {
    /// Human-readable output at `info`.
    #[default]
    Development,
    /// JSON output on stderr at `warn`.
    Production,
}

impl LogProfile {
    /// Default filter directive when `RUST_LOG` is unset.
    #[must_use]
    pub fn default_directive(self) -> &'static str {
        match self {
            Self::Development => "info",
            Self::Production => "warn",
        }
    }
}

/// Initializes the global subscriber.
///
/// Safe to call multiple times; subsequent calls are no-ops.
pub fn init_logging(profile: LogProfile) {
    INIT.call_once(|| {
        let env_filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(profile.default_directive()));

        match profile {
            LogProfile::Development => {
                let _ = tracing_subscriber::registry()
                    .with(env_filter)
                    .with(fmt::layer().with_target(true))
                    .try_init();
            }
            LogProfile::Production => {
                let _ = tracing_subscriber::registry()
                    .with(env_filter)
                    .with(
                        fmt::layer()
                            .json()
                            .flatten_event(true)
                            .with_writer(std::io::stderr),
                    )
                    .try_init();
            }
        }
    });
}

/// Initializes test logging. Output is captured by the test harness.
pub fn init_test_logging() {
    let _ = fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("bakeflow=debug")),
        )
        .with_test_writer()
        .try_init();
}
