//! Configuration loading and representation.
//!
//! Values come from the process environment, after an optional `.env` file has
//! been loaded:
//!
//! | Variable | Meaning | Default |
//! |---|---|---|
//! | `CRMSYNC_LOG_FILTER` | tracing filter directives | `info` |
//! | `CRMSYNC_LOG_JSON` | JSON log lines instead of pretty output | `false` |
//! | `CRMSYNC_SYNC_ENABLED` | new LDC accounts sync by default | `true` |
//! | `CRMSYNC_SYNC_INTERVAL_MINUTES` | sync interval | `60` |
//! | `CRMSYNC_SYNC_MAX_RETRIES` | retries per cycle | `3` |
//! | `CRMSYNC_SYNC_TIMEOUT_SECONDS` | per-attempt timeout | `300` |

use std::str::FromStr;

use anyhow::Context;
use thiserror::Error;
use tracing::debug;

use crmsync_core::DomainError;
use crmsync_ldc::SyncConfiguration;
use crmsync_ldc::sync_configuration::{
    DEFAULT_INTERVAL_MINUTES, DEFAULT_MAX_RETRIES, DEFAULT_TIMEOUT_SECONDS,
};
use crmsync_observability::{LogFormat, TracingSettings};

pub const LOG_FILTER: &str = "CRMSYNC_LOG_FILTER";
pub const LOG_JSON: &str = "CRMSYNC_LOG_JSON";
pub const SYNC_ENABLED: &str = "CRMSYNC_SYNC_ENABLED";
pub const SYNC_INTERVAL_MINUTES: &str = "CRMSYNC_SYNC_INTERVAL_MINUTES";
pub const SYNC_MAX_RETRIES: &str = "CRMSYNC_SYNC_MAX_RETRIES";
pub const SYNC_TIMEOUT_SECONDS: &str = "CRMSYNC_SYNC_TIMEOUT_SECONDS";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{key} has invalid value '{value}'")]
    InvalidValue { key: &'static str, value: String },

    #[error("default sync configuration rejected: {0}")]
    InvalidSyncConfiguration(#[from] DomainError),
}

/// Process configuration for the infrastructure layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InfraConfig {
    pub tracing: TracingSettings,
    /// Configuration given to LDC accounts created without an explicit one.
    pub default_sync: SyncConfiguration,
}

impl Default for InfraConfig {
    fn default() -> Self {
        Self {
            tracing: TracingSettings::default(),
            default_sync: SyncConfiguration::create_default(),
        }
    }
}

impl InfraConfig {
    /// Load `.env` (if present), then read the process environment.
    pub fn from_env() -> anyhow::Result<Self> {
        let _ = dotenvy::dotenv();
        let config = Self::from_lookup(|key| std::env::var(key).ok())
            .context("failed to load crmsync configuration from environment")?;
        debug!(
            log_filter = %config.tracing.filter,
            sync_enabled = config.default_sync.is_enabled(),
            sync_interval_minutes = config.default_sync.interval_minutes(),
            "configuration loaded"
        );
        Ok(config)
    }

    /// Build from an arbitrary key lookup. Unset keys keep their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut tracing = TracingSettings::default();
        if let Some(filter) = lookup(LOG_FILTER).filter(|f| !f.trim().is_empty()) {
            tracing = tracing.with_filter(filter.trim());
        }
        if parse_or(&lookup, LOG_JSON, false)? {
            tracing = tracing.with_format(LogFormat::Json);
        }

        let default_sync = SyncConfiguration::create(
            parse_or(&lookup, SYNC_ENABLED, true)?,
            parse_or(&lookup, SYNC_INTERVAL_MINUTES, DEFAULT_INTERVAL_MINUTES)?,
            parse_or(&lookup, SYNC_MAX_RETRIES, DEFAULT_MAX_RETRIES)?,
            parse_or(&lookup, SYNC_TIMEOUT_SECONDS, DEFAULT_TIMEOUT_SECONDS)?,
        )?;

        Ok(Self {
            tracing,
            default_sync,
        })
    }

    pub fn with_tracing(mut self, tracing: TracingSettings) -> Self {
        self.tracing = tracing;
        self
    }

    pub fn with_default_sync(mut self, default_sync: SyncConfiguration) -> Self {
        self.default_sync = default_sync;
        self
    }
}

fn parse_or<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
            key,
            value: raw,
        }),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use crmsync_ldc::sync_configuration::errors as sync_errors;

    use super::*;

    fn from_pairs(pairs: &[(&str, &str)]) -> Result<InfraConfig, ConfigError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        InfraConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn empty_environment_yields_defaults() {
        assert_eq!(from_pairs(&[]).unwrap(), InfraConfig::default());
    }

    #[test]
    fn reads_every_key() {
        let config = from_pairs(&[
            (LOG_FILTER, "crmsync_infra=debug"),
            (LOG_JSON, "true"),
            (SYNC_ENABLED, "false"),
            (SYNC_INTERVAL_MINUTES, "15"),
            (SYNC_MAX_RETRIES, "5"),
            (SYNC_TIMEOUT_SECONDS, " 120 "),
        ])
        .unwrap();

        assert_eq!(config.tracing.filter, "crmsync_infra=debug");
        assert_eq!(config.tracing.format, LogFormat::Json);
        assert_eq!(
            config.default_sync,
            SyncConfiguration::create(false, 15, 5, 120).unwrap()
        );
    }

    #[test]
    fn unparsable_values_name_the_key() {
        let err = from_pairs(&[(SYNC_MAX_RETRIES, "lots")]).unwrap_err();
        assert_eq!(
            err,
            ConfigError::InvalidValue {
                key: SYNC_MAX_RETRIES,
                value: "lots".to_string()
            }
        );
    }

    #[test]
    fn sync_values_go_through_domain_validation() {
        match from_pairs(&[(SYNC_INTERVAL_MINUTES, "2")]).unwrap_err() {
            ConfigError::InvalidSyncConfiguration(e) => {
                assert_eq!(e.code(), sync_errors::INTERVAL_TOO_SHORT)
            }
            other => panic!("expected InvalidSyncConfiguration, got {other:?}"),
        }
    }
}
