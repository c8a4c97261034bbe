//! Tracing/logging initialization.
//!
//! `RUST_LOG` wins over the configured filter, so operators can raise verbosity
//! without touching application config.

use anyhow::Context;
use tracing_subscriber::EnvFilter;

pub const DEFAULT_FILTER: &str = "info";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable lines, for local runs.
    #[default]
    Pretty,
    /// One JSON object per line, for log shipping.
    Json,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TracingSettings {
    /// `EnvFilter` directives used when `RUST_LOG` is not set.
    pub filter: String,
    pub format: LogFormat,
}

impl Default for TracingSettings {
    fn default() -> Self {
        Self {
            filter: DEFAULT_FILTER.to_string(),
            format: LogFormat::default(),
        }
    }
}

impl TracingSettings {
    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = filter.into();
        self
    }

    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    fn env_filter(&self) -> anyhow::Result<EnvFilter> {
        match EnvFilter::try_from_default_env() {
            Ok(filter) => Ok(filter),
            Err(_) => EnvFilter::try_new(&self.filter)
                .with_context(|| format!("invalid log filter '{}'", self.filter)),
        }
    }
}

/// Initialize tracing/logging for the process.
///
/// Safe to call multiple times (subsequent calls are no-ops). Fails only on an
/// unparsable filter.
pub fn init(settings: &TracingSettings) -> anyhow::Result<()> {
    let filter = settings.env_filter()?;
    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(false);

    // A subscriber may already be installed (tests, embedding hosts).
    let _ = match settings.format {
        LogFormat::Json => builder
            .json()
            .with_timer(tracing_subscriber::fmt::time::SystemTime)
            .try_init(),
        LogFormat::Pretty => builder.try_init(),
    };
    Ok(())
}

/// [`init`] with [`TracingSettings::default`].
pub fn init_default() -> anyhow::Result<()> {
    init(&TracingSettings::default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_twice_is_harmless() {
        assert!(init_default().is_ok());
        assert!(init_default().is_ok());
        assert!(init(&TracingSettings::default().with_format(LogFormat::Json)).is_ok());
    }

    #[test]
    fn builders_override_defaults() {
        let settings = TracingSettings::default()
            .with_filter("crmsync_infra=debug")
            .with_format(LogFormat::Json);
        assert_eq!(settings.filter, "crmsync_infra=debug");
        assert_eq!(settings.format, LogFormat::Json);
    }
}
