use thiserror::Error;

use crate::EventEnvelope;

/// Failure reported by an event handler.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct HandlerError(String);

impl HandlerError {
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }
}

/// Reacts to dispatched domain events (CRM push, notifications, read models...).
///
/// Handlers run after the aggregate has been saved, so a failing handler never
/// rolls anything back; the dispatcher reports the failure and moves on.
pub trait EventHandler<E>: Send + Sync {
    /// Name used in logs and failure reports.
    fn name(&self) -> &str;

    fn handle(&self, envelope: &EventEnvelope<E>) -> Result<(), HandlerError>;
}

/// Adapts a closure into an [`EventHandler`].
pub struct FnHandler<F> {
    name: String,
    f: F,
}

impl<F> FnHandler<F> {
    pub fn new(name: impl Into<String>, f: F) -> Self {
        Self {
            name: name.into(),
            f,
        }
    }
}

impl<F> core::fmt::Debug for FnHandler<F> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("FnHandler").field("name", &self.name).finish()
    }
}

impl<E, F> EventHandler<E> for FnHandler<F>
where
    F: Fn(&EventEnvelope<E>) -> Result<(), HandlerError> + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn handle(&self, envelope: &EventEnvelope<E>) -> Result<(), HandlerError> {
        (self.f)(envelope)
    }
}
