//! Logging and tracing initialization.

use crate::config::LoggingConfig;

/// Install the global tracing subscriber. `RUST_LOG` overrides the configured level.
///
/// Later calls are ignored once a subscriber is installed.
pub fn init_logging(config: &LoggingConfig) {
    use tracing_subscriber::{EnvFilter, fmt};

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    if config.json {
        let subscriber = fmt::Subscriber::builder()
            .with_env_filter(env_filter)
            .json()
            .finish();
        tracing::subscriber::set_global_default(subscriber).ok();
    } else {
        let subscriber = fmt::Subscriber::builder()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_writer(std::io::stderr)
            .finish();
        tracing::subscriber::set_global_default(subscriber).ok();
    }
}

/// Install a test-friendly subscriber writing through the test harness capture.
pub fn init_test_logging() {
    use tracing_subscriber::{EnvFilter, fmt};

    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("mixplay=debug")),
        )
        .with_test_writer()
        .finish();
    tracing::subscriber::set_global_default(subscriber).ok();
}
