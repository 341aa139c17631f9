// src/utils/logging.rs
use tracing_subscriber::{fmt, EnvFilter};

const DEFAULT_FILTER: &str = "info";

/// Initializes the tracing subscriber for the whole process.
/// Log levels come from `RUST_LOG`; without it everything runs at INFO.
pub fn setup_logging() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    fmt().with_env_filter(filter).init();

    tracing::debug!("Logging setup complete.");
}
