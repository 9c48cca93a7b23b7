//! Structured logging initialization.
//!
//! Console `tracing` output filtered by the `BATCH_LOG` environment
//! variable. Initialization is idempotent and defers to any subscriber the
//! embedding host already installed.

use std::sync::OnceLock;

use tracing_subscriber::EnvFilter;

static LOGGER_INITIALIZED: OnceLock<()> = OnceLock::new();

/// Install the default console subscriber once per process.
pub fn init_logging() {
    LOGGER_INITIALIZED.get_or_init(|| {
        let filter = EnvFilter::try_from_env("BATCH_LOG")
            .unwrap_or_else(|_| EnvFilter::new("info"));

        if tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .try_init()
            .is_err()
        {
            tracing::debug!("global tracing subscriber already installed, keeping it");
        }
    });
}
