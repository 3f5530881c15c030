//! Tracing setup

use tracing_subscriber::EnvFilter;

use crate::config::Config;

/// Initialize JSON-formatted tracing from the configured log level
pub fn init_tracing(config: &Config) {
    tracing_subscriber::fmt()
        .json()
        .with_env_filter(
            EnvFilter::try_new(&config.service.log_level)
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    tracing::info!("Tracing initialized for service: {}", config.service.name);
}
