//! Tracing Setup
//!
//! Installs a `tracing-subscriber` fmt subscriber configured from
//! [`LoggingConfig`]. `RUST_LOG` takes precedence over the configured level.
//!
//! # Usage
//!
//! ```rust,ignore
//! use margin_engine::{config::LoggingConfig, telemetry::init_tracing};
//!
//! init_tracing(&LoggingConfig::default());
//! ```

use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::format::FmtSpan;

use crate::config::LoggingConfig;

/// Initialize console tracing.
///
/// Returns false if a global subscriber was already installed, in which case the
/// existing one is kept.
pub fn init_tracing(config: &LoggingConfig) -> bool {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));
    let span_events = if config.include_spans {
        FmtSpan::NEW | FmtSpan::CLOSE
    } else {
        FmtSpan::NONE
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_span_events(span_events)
        .with_writer(std::io::stderr);

    let installed = match config.format.as_str() {
        "pretty" => builder.pretty().try_init().is_ok(),
        "compact" => builder.compact().try_init().is_ok(),
        _ => builder.json().try_init().is_ok(),
    };

    if installed {
        tracing::debug!(
            level = %config.level,
            format = %config.format,
            "Tracing initialized"
        );
    }
    installed
}
