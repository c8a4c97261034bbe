//! Sync policy for an LDC account.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crmsync_core::{DomainError, DomainResult, ValueObject};

pub const MIN_INTERVAL_MINUTES: i32 = 5;
pub const MAX_INTERVAL_MINUTES: i32 = 1440;
pub const MAX_RETRIES: i32 = 10;

pub const DEFAULT_INTERVAL_MINUTES: i32 = 60;
pub const DEFAULT_MAX_RETRIES: i32 = 3;
pub const DEFAULT_TIMEOUT_SECONDS: i32 = 300;

pub mod errors {
    use crmsync_core::DomainError;

    pub const INTERVAL_TOO_SHORT: &str = "SyncConfiguration.IntervalTooShort";
    pub const INTERVAL_TOO_LONG: &str = "SyncConfiguration.IntervalTooLong";
    pub const NEGATIVE_RETRIES: &str = "SyncConfiguration.NegativeRetries";
    pub const TOO_MANY_RETRIES: &str = "SyncConfiguration.TooManyRetries";
    pub const INVALID_TIMEOUT: &str = "SyncConfiguration.InvalidTimeout";

    pub(crate) fn rejected(code: &'static str, message: String) -> DomainError {
        DomainError::new(code, message)
    }
}

/// How often, how persistently and how patiently an account is synced.
///
/// Immutable: every change produces a new value. Inputs are signed because they
/// usually come from untrusted configuration; once validated, accessors hand
/// out unsigned values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawSyncConfiguration")]
pub struct SyncConfiguration {
    is_enabled: bool,
    interval_minutes: u32,
    max_retries: u32,
    timeout_seconds: u32,
}

#[derive(Deserialize)]
struct RawSyncConfiguration {
    is_enabled: bool,
    interval_minutes: i32,
    max_retries: i32,
    timeout_seconds: i32,
}

impl TryFrom<RawSyncConfiguration> for SyncConfiguration {
    type Error = DomainError;

    fn try_from(raw: RawSyncConfiguration) -> Result<Self, Self::Error> {
        Self::create(
            raw.is_enabled,
            raw.interval_minutes,
            raw.max_retries,
            raw.timeout_seconds,
        )
    }
}

impl SyncConfiguration {
    /// Validate and build. Checks run in order and stop at the first failure:
    /// interval bounds, retry bounds, then timeout.
    pub fn create(
        is_enabled: bool,
        interval_minutes: i32,
        max_retries: i32,
        timeout_seconds: i32,
    ) -> DomainResult<Self> {
        if interval_minutes < MIN_INTERVAL_MINUTES {
            return Err(errors::rejected(
                errors::INTERVAL_TOO_SHORT,
                format!("sync interval must be at least {MIN_INTERVAL_MINUTES} minutes"),
            ));
        }
        if interval_minutes > MAX_INTERVAL_MINUTES {
            return Err(errors::rejected(
                errors::INTERVAL_TOO_LONG,
                format!("sync interval must be at most {MAX_INTERVAL_MINUTES} minutes"),
            ));
        }
        if max_retries < 0 {
            return Err(errors::rejected(
                errors::NEGATIVE_RETRIES,
                "max retries cannot be negative".to_string(),
            ));
        }
        if max_retries > MAX_RETRIES {
            return Err(errors::rejected(
                errors::TOO_MANY_RETRIES,
                format!("max retries must be at most {MAX_RETRIES}"),
            ));
        }
        if timeout_seconds <= 0 {
            return Err(errors::rejected(
                errors::INVALID_TIMEOUT,
                "timeout must be greater than zero seconds".to_string(),
            ));
        }

        Ok(Self {
            is_enabled,
            interval_minutes: interval_minutes.unsigned_abs(),
            max_retries: max_retries.unsigned_abs(),
            timeout_seconds: timeout_seconds.unsigned_abs(),
        })
    }

    /// Enabled, hourly, 3 retries, 5 minute timeout.
    pub const fn create_default() -> Self {
        Self::preset(true)
    }

    /// Same policy as the default, switched off.
    pub const fn create_disabled() -> Self {
        Self::preset(false)
    }

    const fn preset(is_enabled: bool) -> Self {
        Self {
            is_enabled,
            interval_minutes: DEFAULT_INTERVAL_MINUTES.unsigned_abs(),
            max_retries: DEFAULT_MAX_RETRIES.unsigned_abs(),
            timeout_seconds: DEFAULT_TIMEOUT_SECONDS.unsigned_abs(),
        }
    }

    /// Copy with the enabled flag replaced; the other fields are kept.
    pub const fn with_enabled(self, is_enabled: bool) -> Self {
        Self { is_enabled, ..self }
    }

    pub const fn is_enabled(&self) -> bool {
        self.is_enabled
    }

    pub const fn interval_minutes(&self) -> u32 {
        self.interval_minutes
    }

    pub const fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_minutes as u64 * 60)
    }

    pub const fn max_retries(&self) -> u32 {
        self.max_retries
    }

    pub const fn timeout_seconds(&self) -> u32 {
        self.timeout_seconds
    }

    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds as u64)
    }

    /// True when both values share interval, retries and timeout (the enabled
    /// flag is ignored).
    pub fn same_policy(&self, other: &Self) -> bool {
        self.with_enabled(true) == other.with_enabled(true)
    }
}

impl Default for SyncConfiguration {
    fn default() -> Self {
        Self::create_default()
    }
}

impl ValueObject for SyncConfiguration {}

#[cfg(test)]
mod tests {
    use super::*;

    fn code(result: DomainResult<SyncConfiguration>) -> String {
        result.unwrap_err().code().to_string()
    }

    #[test]
    fn boundaries() {
        assert_eq!(code(SyncConfiguration::create(true, 4, 3, 300)), errors::INTERVAL_TOO_SHORT);
        assert_eq!(code(SyncConfiguration::create(true, 1441, 3, 300)), errors::INTERVAL_TOO_LONG);
        assert_eq!(code(SyncConfiguration::create(true, 60, -1, 300)), errors::NEGATIVE_RETRIES);
        assert_eq!(code(SyncConfiguration::create(true, 60, 11, 300)), errors::TOO_MANY_RETRIES);
        assert_eq!(code(SyncConfiguration::create(true, 60, 3, 0)), errors::INVALID_TIMEOUT);

        for enabled in [true, false] {
            let config = SyncConfiguration::create(enabled, 5, 0, 1).unwrap();
            assert_eq!(config.is_enabled(), enabled);
            assert_eq!(config.interval_minutes(), 5);
            assert_eq!(config.max_retries(), 0);
            assert_eq!(config.timeout(), Duration::from_secs(1));
        }
        assert!(SyncConfiguration::create(true, 1440, 10, 1).is_ok());
    }

    #[test]
    fn validation_short_circuits_in_order() {
        assert_eq!(code(SyncConfiguration::create(true, 0, 99, 0)), errors::INTERVAL_TOO_SHORT);
        assert_eq!(code(SyncConfiguration::create(true, 60, 99, 0)), errors::TOO_MANY_RETRIES);
    }

    #[test]
    fn presets() {
        let default = SyncConfiguration::create_default();
        assert!(default.is_enabled());
        assert_eq!(default.interval(), Duration::from_secs(3600));
        assert_eq!(default.max_retries(), 3);
        assert_eq!(default.timeout_seconds(), 300);

        let disabled = SyncConfiguration::create_disabled();
        assert!(!disabled.is_enabled());
        assert!(disabled.same_policy(&default));
        assert_eq!(disabled.with_enabled(true), default);
        assert_eq!(SyncConfiguration::default(), default);
    }

    #[test]
    fn deserialization_is_validated() {
        let ok: SyncConfiguration = serde_json::from_str(
            r#"{"is_enabled":true,"interval_minutes":15,"max_retries":2,"timeout_seconds":30}"#,
        )
        .unwrap();
        assert_eq!(ok.interval_minutes(), 15);

        let too_short = r#"{"is_enabled":true,"interval_minutes":1,"max_retries":2,"timeout_seconds":30}"#;
        assert!(serde_json::from_str::<SyncConfiguration>(too_short).is_err());
    }

    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            /// Property: every in-range combination is accepted unchanged.
            #[test]
            fn in_range_values_are_accepted(
                enabled in any::<bool>(),
                interval in MIN_INTERVAL_MINUTES..=MAX_INTERVAL_MINUTES,
                retries in 0..=MAX_RETRIES,
                timeout in 1..=i32::MAX,
            ) {
                let config = SyncConfiguration::create(enabled, interval, retries, timeout).unwrap();
                prop_assert_eq!(i64::from(config.interval_minutes()), i64::from(interval));
                prop_assert_eq!(i64::from(config.max_retries()), i64::from(retries));
                prop_assert_eq!(i64::from(config.timeout_seconds()), i64::from(timeout));
            }
        }
    }
}
