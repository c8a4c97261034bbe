//! Domain error model.
//!
//! Every validating operation in the domain returns a [`DomainResult`]. A
//! failure carries a stable, hierarchical code (`"<Entity>.<Reason>"`, e.g.
//! `"LdcAccount.InvalidUsername"`) plus a human-readable message. Callers
//! dispatch on the code; the message is for people.

use std::borrow::Cow;

use thiserror::Error;

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// Domain-level error: a `(code, message)` pair.
///
/// Keep this focused on deterministic, business/domain failures (validation,
/// invariants, conflicts). Infrastructure concerns belong elsewhere.
#[derive(Debug, Error, Clone, PartialEq, Eq, Hash)]
#[error("{code}: {message}")]
pub struct DomainError {
    code: Cow<'static, str>,
    message: String,
}

impl DomainError {
    pub fn new(code: impl Into<Cow<'static, str>>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }

    /// Stable, dotted error code (`"<Entity>.<Reason>"`).
    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns `true` if this error carries `code`.
    pub fn is(&self, code: &str) -> bool {
        self.code == code
    }

    /// The entity segment of the code (`"UtilityAccount"` for
    /// `"UtilityAccount.Duplicate"`).
    pub fn entity(&self) -> &str {
        self.code
            .split_once('.')
            .map_or(self.code.as_ref(), |(entity, _)| entity)
    }
}
