//! Tracing subscriber setup
//!
//! The registries only emit `tracing` events; installing a subscriber is
//! left to the host. These helpers cover the common cases.

use tracing_subscriber::{fmt, EnvFilter};

fn filter(default_directive: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive))
}

/// Install a human-readable subscriber writing to stderr
///
/// `RUST_LOG` wins over `default_directive`. Returns `false` if a global
/// subscriber was already installed, so repeated calls are harmless.
pub fn init_tracing(default_directive: &str) -> bool {
    fmt()
        .with_env_filter(filter(default_directive))
        .with_target(true)
        .with_level(true)
        .with_writer(std::io::stderr)
        .try_init()
        .is_ok()
}

/// Install a JSON subscriber writing to stderr
///
/// Same filter rules as [`init_tracing`].
pub fn init_json_tracing(default_directive: &str) -> bool {
    fmt()
        .json()
        .with_env_filter(filter(default_directive))
        .with_writer(std::io::stderr)
        .try_init()
        .is_ok()
}
