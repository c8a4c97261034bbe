//! Event dispatching (mechanics only).
//!
//! Aggregates buffer domain events; once an aggregate has been saved the caller
//! drains the buffer (see [`crate::collect_events`]) and hands the envelopes to
//! an [`EventDispatcher`].
//!
//! ## Delivery Guarantees
//!
//! - **Ordered**: envelopes are delivered in the order they were handed in,
//!   which is the order the aggregate raised them.
//! - **Deduplicated on success**: an envelope is remembered only once every
//!   handler accepted it. Re-dispatching it later is skipped; an envelope with
//!   a failed handler is delivered again to all handlers on the next dispatch,
//!   so handlers must tolerate repeats of a failed event.
//! - **Failure isolation**: a failing handler does not stop delivery to the
//!   remaining handlers or events; failures are collected in the
//!   [`DispatchReport`].
//! - **Tenant consistency**: an envelope whose payload belongs to a different
//!   tenant than the envelope itself is never delivered.
//!
//! Handlers run with no dispatcher lock held. A panicking handler cannot wedge
//! the dispatcher, and a handler may itself register handlers or dispatch.
//! Two threads dispatching the same envelope at the same moment may both
//! deliver it.
//!
//! Remembered ids are kept in a bounded window (oldest evicted first, see
//! [`InMemoryEventDispatcher::with_dedup_capacity`]). Duplicates older than the
//! window are delivered again.

use std::collections::{HashSet, VecDeque};
use std::sync::{Arc, Mutex, RwLock};

use thiserror::Error;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::{Event, EventEnvelope, EventHandler, HandlerError};

/// Default number of delivered event ids remembered for deduplication.
pub const DEFAULT_DEDUP_CAPACITY: usize = 10_000;

/// A handler failure for one envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandlerFailure {
    pub handler: String,
    pub event_id: Uuid,
    pub event_type: &'static str,
    pub error: HandlerError,
}

/// Outcome of a dispatch call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchReport {
    /// Envelopes handed to handlers by this call, failed or not.
    pub delivered: usize,
    /// Envelopes skipped because they had already been dispatched cleanly.
    pub skipped: usize,
    /// Ids of envelopes refused because envelope and payload tenants differ.
    pub rejected: Vec<Uuid>,
    pub failures: Vec<HandlerFailure>,
}

impl DispatchReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty() && self.rejected.is_empty()
    }
}

#[derive(Debug, Error)]
pub enum DispatchError {
    /// Internal lock poisoning.
    #[error("dispatcher state is poisoned")]
    Poisoned,
}

/// Delivers dispatched envelopes to handlers.
///
/// The trait requires `Send + Sync`, so a dispatcher can be shared between the
/// request threads that save aggregates.
pub trait EventDispatcher<E>: Send + Sync {
    type Error: core::fmt::Debug + Send + Sync + 'static;

    fn dispatch(&self, envelopes: Vec<EventEnvelope<E>>) -> Result<DispatchReport, Self::Error>;
}

impl<E, D> EventDispatcher<E> for Arc<D>
where
    D: EventDispatcher<E> + ?Sized,
{
    type Error = D::Error;

    fn dispatch(&self, envelopes: Vec<EventEnvelope<E>>) -> Result<DispatchReport, Self::Error> {
        (**self).dispatch(envelopes)
    }
}

/// Bounded set of cleanly dispatched event ids, evicting the oldest first.
#[derive(Debug)]
struct DeliveredIds {
    ids: HashSet<Uuid>,
    order: VecDeque<Uuid>,
    capacity: usize,
}

impl DeliveredIds {
    fn new(capacity: usize) -> Self {
        Self {
            ids: HashSet::new(),
            order: VecDeque::new(),
            capacity,
        }
    }

    fn contains(&self, id: &Uuid) -> bool {
        self.ids.contains(id)
    }

    fn remember(&mut self, id: Uuid) {
        if self.capacity == 0 || !self.ids.insert(id) {
            return;
        }
        self.order.push_back(id);
        while self.order.len() > self.capacity {
            if let Some(oldest) = self.order.pop_front() {
                self.ids.remove(&oldest);
            }
        }
    }

    fn len(&self) -> usize {
        self.order.len()
    }
}

/// In-process dispatcher for tests/dev and single-node deployments.
///
/// - No IO / no async
/// - Handlers run synchronously, in registration order
/// - Cleanly dispatched event ids are remembered for deduplication
pub struct InMemoryEventDispatcher<E> {
    handlers: RwLock<Vec<Arc<dyn EventHandler<E>>>>,
    delivered: Mutex<DeliveredIds>,
}

impl<E> InMemoryEventDispatcher<E> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remember at most `capacity` delivered ids. Zero disables deduplication.
    pub fn with_dedup_capacity(capacity: usize) -> Self {
        Self {
            handlers: RwLock::new(Vec::new()),
            delivered: Mutex::new(DeliveredIds::new(capacity)),
        }
    }

    /// Register a handler. Handlers see every event dispatched after they are
    /// registered.
    pub fn register(&self, handler: Arc<dyn EventHandler<E>>) -> Result<(), DispatchError> {
        let mut handlers = self.handlers.write().map_err(|_| DispatchError::Poisoned)?;
        debug!(handler = handler.name(), "registering event handler");
        handlers.push(handler);
        Ok(())
    }

    pub fn handler_count(&self) -> usize {
        self.handlers.read().map(|h| h.len()).unwrap_or(0)
    }

    /// Number of event ids currently remembered for deduplication.
    pub fn remembered_count(&self) -> usize {
        self.delivered.lock().map(|d| d.len()).unwrap_or(0)
    }

    fn already_delivered(&self, id: &Uuid) -> Result<bool, DispatchError> {
        let delivered = self.delivered.lock().map_err(|_| DispatchError::Poisoned)?;
        Ok(delivered.contains(id))
    }

    fn remember(&self, id: Uuid) -> Result<(), DispatchError> {
        let mut delivered = self.delivered.lock().map_err(|_| DispatchError::Poisoned)?;
        delivered.remember(id);
        Ok(())
    }
}

impl<E> Default for InMemoryEventDispatcher<E> {
    fn default() -> Self {
        Self::with_dedup_capacity(DEFAULT_DEDUP_CAPACITY)
    }
}

impl<E> core::fmt::Debug for InMemoryEventDispatcher<E> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("InMemoryEventDispatcher")
            .field("handlers", &self.handler_count())
            .field("remembered", &self.remembered_count())
            .finish()
    }
}

impl<E> EventDispatcher<E> for InMemoryEventDispatcher<E>
where
    E: Event,
{
    type Error = DispatchError;

    fn dispatch(&self, envelopes: Vec<EventEnvelope<E>>) -> Result<DispatchReport, Self::Error> {
        let handlers: Vec<Arc<dyn EventHandler<E>>> = self
            .handlers
            .read()
            .map_err(|_| DispatchError::Poisoned)?
            .clone();
        let mut report = DispatchReport::default();

        for envelope in &envelopes {
            if envelope.payload().tenant_id() != envelope.tenant_id() {
                warn!(
                    event_id = %envelope.event_id(),
                    event_type = envelope.event_type(),
                    envelope_tenant = %envelope.tenant_id(),
                    payload_tenant = %envelope.payload().tenant_id(),
                    "refusing event with mismatched tenant"
                );
                report.rejected.push(envelope.event_id());
                continue;
            }

            if self.already_delivered(&envelope.event_id())? {
                debug!(event_id = %envelope.event_id(), "skipping already dispatched event");
                report.skipped += 1;
                continue;
            }

            let mut clean = true;
            for handler in &handlers {
                if let Err(error) = handler.handle(envelope) {
                    let failure = HandlerFailure {
                        handler: handler.name().to_string(),
                        event_id: envelope.event_id(),
                        event_type: envelope.event_type(),
                        error,
                    };
                    warn!(
                        handler = %failure.handler,
                        event_type = failure.event_type,
                        event_id = %failure.event_id,
                        error = %failure.error,
                        "event handler failed"
                    );
                    report.failures.push(failure);
                    clean = false;
                }
            }
            if clean {
                self.remember(envelope.event_id())?;
            }
            report.delivered += 1;
        }

        debug!(
            delivered = report.delivered,
            skipped = report.skipped,
            rejected = report.rejected.len(),
            failures = report.failures.len(),
            "dispatched events"
        );
        Ok(report)
    }
}
