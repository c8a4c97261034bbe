//! Strongly-typed identifiers used across the domain.

use core::str::FromStr;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{DomainError, DomainResult};

/// Identifier of a tenant (multi-tenant boundary).
///
/// Never nil: every constructor except [`TenantId::new`] goes through
/// validation, including deserialization.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "Uuid", into = "Uuid")]
pub struct TenantId(Uuid);

/// Identifier of a `Customer` aggregate.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CustomerId(Uuid);

/// Identifier of a `UtilityAccount` entity (unique across customers).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UtilityAccountId(Uuid);

/// Identifier of an `LdcAccount` aggregate.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LdcAccountId(Uuid);

/// Error codes raised while building a [`TenantId`].
pub mod errors {
    use crate::DomainError;

    pub const EMPTY: &str = "TenantId.Empty";
    pub const INVALID_FORMAT: &str = "TenantId.InvalidFormat";

    pub(crate) fn empty() -> DomainError {
        DomainError::new(EMPTY, "tenant id must not be empty")
    }

    pub(crate) fn invalid_format(input: &str) -> DomainError {
        DomainError::new(INVALID_FORMAT, format!("'{input}' is not a valid tenant id"))
    }
}

impl TenantId {
    /// Mint a fresh tenant identifier (UUIDv7).
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Validated constructor from a raw UUID. The nil UUID is rejected.
    pub fn from_uuid(uuid: Uuid) -> DomainResult<Self> {
        if uuid.is_nil() {
            return Err(errors::empty());
        }
        Ok(Self(uuid))
    }

    /// Parse a tenant id from text.
    ///
    /// Accepts the hyphenated, braced, upper-case and hyphen-less forms
    /// (surrounding whitespace is ignored). Blank input and the nil UUID fail
    /// with `TenantId.Empty`; anything else unparsable fails with
    /// `TenantId.InvalidFormat`.
    pub fn create(input: &str) -> DomainResult<Self> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(errors::empty());
        }
        let uuid = Uuid::parse_str(trimmed).map_err(|_| errors::invalid_format(trimmed))?;
        Self::from_uuid(uuid)
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for TenantId {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Display for TenantId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

impl TryFrom<Uuid> for TenantId {
    type Error = DomainError;

    fn try_from(value: Uuid) -> Result<Self, Self::Error> {
        Self::from_uuid(value)
    }
}

impl From<TenantId> for Uuid {
    fn from(value: TenantId) -> Self {
        value.0
    }
}

impl FromStr for TenantId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::create(s)
    }
}

macro_rules! impl_uuid_newtype {
    ($t:ty, $name:literal) => {
        impl $t {
            /// Create a new identifier (UUIDv7, time-ordered).
            pub fn new() -> Self {
                Self(Uuid::now_v7())
            }

            pub fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl Default for $t {
            fn default() -> Self {
                Self::new()
            }
        }

        impl core::fmt::Display for $t {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                core::fmt::Display::fmt(&self.0, f)
            }
        }

        impl From<Uuid> for $t {
            fn from(value: Uuid) -> Self {
                Self(value)
            }
        }

        impl From<$t> for Uuid {
            fn from(value: $t) -> Self {
                value.0
            }
        }

        impl FromStr for $t {
            type Err = DomainError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let uuid = Uuid::parse_str(s.trim()).map_err(|e| {
                    DomainError::new(
                        concat!($name, ".InvalidFormat"),
                        format!("{}: {}", $name, e),
                    )
                })?;
                Ok(Self(uuid))
            }
        }
    };
}

impl_uuid_newtype!(CustomerId, "CustomerId");
impl_uuid_newtype!(UtilityAccountId, "UtilityAccountId");
impl_uuid_newtype!(LdcAccountId, "LdcAccountId");
