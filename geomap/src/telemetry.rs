//! Tracing subscriber bootstrap.
//!
//! Embedding hosts usually install their own subscriber; these helpers
//! exist for examples, tests and headless tools that want the crate's
//! `tracing` output on stderr with `RUST_LOG` filtering.

use tracing_subscriber::EnvFilter;

/// Install a formatting subscriber, if none is set yet.
///
/// The filter comes from `RUST_LOG`, defaulting to `info`.
pub fn try_init() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(Into::into)
}

/// Install a formatting subscriber, ignoring an already-installed one.
pub fn init() {
    let _ = try_init();
}
