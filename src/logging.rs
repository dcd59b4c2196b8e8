//! Structured logging setup.
//!
//! The library only emits `tracing` events; hosts that have no subscriber of
//! their own can install one with [`init`]. The filter is taken from
//! `RUST_LOG` and defaults to `info`.

use strum::{Display, EnumString};
use tracing_subscriber::util::{SubscriberInitExt, TryInitError};
use tracing_subscriber::{EnvFilter, Layer, fmt, layer::SubscriberExt};

/// Log output format.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Default, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum LogFormat {
    /// JSON structured logging
    Json,
    /// Human-readable output
    #[default]
    Pretty,
}

/// Installs a global fmt subscriber writing to stderr.
///
/// Fails if a global subscriber is already set, which makes repeated calls
/// harmless.
pub fn init(format: LogFormat) -> Result<(), TryInitError> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let fmt_layer = match format {
        LogFormat::Json => fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_current_span(true)
            .boxed(),
        LogFormat::Pretty => fmt::layer()
            .pretty()
            .with_writer(std::io::stderr)
            .with_target(true)
            .boxed(),
    };

    tracing_subscriber::registry()
        .with(fmt_layer.with_filter(env_filter))
        .try_init()?;

    tracing::debug!(%format, "logging initialized");
    Ok(())
}
