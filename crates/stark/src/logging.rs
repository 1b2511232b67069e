//! Process-wide log setup.
//!
//! Library code logs through both the `log` facade and `tracing`; this
//! installs a single `tracing-subscriber` pipeline and bridges `log` records
//! into it.

use std::str::FromStr;

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::EnvFilter;

use crate::error::{Result, StarkError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "text" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            other => Err(format!("unknown log format '{}', expected text or json", other)),
        }
    }
}

/// Installs the global subscriber. `RUST_LOG` takes precedence over
/// `default_filter`. Fails if a subscriber or logger is already installed.
pub fn init(default_filter: &str, format: LogFormat) -> Result<()> {
    let registry = tracing_subscriber::registry().with(resolve_filter(default_filter)?);
    let installed = match format {
        LogFormat::Text => {
            tracing::subscriber::set_global_default(registry.with(tracing_subscriber::fmt::layer()))
        }
        LogFormat::Json => tracing::subscriber::set_global_default(
            registry.with(tracing_subscriber::fmt::layer().json()),
        ),
    };
    installed.map_err(|e| StarkError::Logging(e.to_string()))?;

    tracing_log::LogTracer::init().map_err(|e| StarkError::Logging(e.to_string()))
}

/// `RUST_LOG` when it is set and parses, `default_filter` otherwise.
fn resolve_filter(default_filter: &str) -> Result<EnvFilter> {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_filter))
        .map_err(|e| StarkError::Logging(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    // RUST_LOG is process-wide, hence the serial tests below.

    #[test]
    #[serial]
    fn test_rust_log_overrides_default_filter() {
        std::env::set_var("RUST_LOG", "stark=trace");
        let filter = resolve_filter("warn").unwrap();
        std::env::remove_var("RUST_LOG");

        assert_eq!(filter.to_string(), "stark=trace");
    }

    #[test]
    #[serial]
    fn test_default_filter_used_without_rust_log() {
        std::env::remove_var("RUST_LOG");
        assert_eq!(resolve_filter("stark=debug").unwrap().to_string(), "stark=debug");

        let err = resolve_filter("stark=loudest").unwrap_err();
        assert!(matches!(err, StarkError::Logging(_)));
    }

    #[test]
    fn test_log_format_from_str() {
        assert_eq!("text".parse::<LogFormat>(), Ok(LogFormat::Text));
        assert_eq!("JSON".parse::<LogFormat>(), Ok(LogFormat::Json));
        assert!("yaml".parse::<LogFormat>().is_err());
    }
}
