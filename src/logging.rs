//! Logging setup shared by the workspace binaries.
//!
//! The library itself only emits `tracing` events; binaries call
//! [`init_logging`] once at start-up. The filter comes from `RUST_LOG` and
//! falls back to the given default directive.

use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::{SubscriberInitExt, TryInitError};

/// Install a stdout subscriber filtered by `RUST_LOG` (or `default_filter`).
///
/// # Errors
///
/// Returns an error if a global subscriber has already been installed.
pub fn init_logging(default_filter: &str) -> Result<(), TryInitError> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    let stdout_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stdout)
        .with_target(false);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(stdout_layer)
        .try_init()
}
