//! Tracing subscriber setup

use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

use crate::config::{LogFormat, LoggingConfig};

/// `RUST_LOG` wins over the configured level
fn build_filter(config: &LoggingConfig) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level))
}

/// Install the global subscriber. Fails if one is already installed.
pub fn init_logging(config: &LoggingConfig) -> anyhow::Result<()> {
    let filter = build_filter(config);

    match config.format {
        LogFormat::Json => tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_span_events(FmtSpan::CLOSE))
            .try_init()?,
        LogFormat::Pretty => tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .pretty()
                    .with_target(true)
                    .with_span_events(FmtSpan::CLOSE),
            )
            .try_init()?,
    }

    tracing::info!(level = %config.level, format = ?config.format, "Logging initialized");
    Ok(())
}
