//! Aggregate roots and their domain-event buffer.

use crate::entity::Entity;
use crate::id::TenantId;

/// Aggregate root: the sole entry point for mutating itself and the entities it
/// owns.
///
/// Mutating methods record domain events in the aggregate's [`EventBuffer`].
/// Nothing is published from inside the domain: once the aggregate has been
/// saved, the caller drains the buffer with [`AggregateRoot::take_events`] and
/// hands the events to an event dispatcher.
pub trait AggregateRoot: Entity {
    /// Domain events raised by this aggregate.
    type Event: Clone + core::fmt::Debug;

    /// Stable aggregate type name (e.g. `"customer"`), used when routing events.
    const AGGREGATE_TYPE: &'static str;

    /// Tenant this aggregate belongs to.
    fn tenant_id(&self) -> TenantId;

    /// Events raised since the buffer was last drained, in the order raised.
    fn pending_events(&self) -> &[Self::Event];

    /// Drain buffered events, leaving the buffer empty.
    fn take_events(&mut self) -> Vec<Self::Event>;

    /// Number of events drained from this aggregate so far.
    ///
    /// Lets a dispatcher continue per-aggregate sequence numbers across
    /// several save/dispatch cycles.
    fn committed_event_count(&self) -> u64;
}

/// Ordered, append-only buffer of domain events owned by an aggregate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventBuffer<E> {
    pending: Vec<E>,
    drained: u64,
}

impl<E> EventBuffer<E> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a newly raised event.
    pub fn record(&mut self, event: E) {
        self.pending.push(event);
    }

    pub fn pending(&self) -> &[E] {
        &self.pending
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Remove and return every pending event.
    pub fn take(&mut self) -> Vec<E> {
        let events = std::mem::take(&mut self.pending);
        self.drained += events.len() as u64;
        events
    }

    /// Total number of events handed out by [`EventBuffer::take`].
    pub fn drained(&self) -> u64 {
        self.drained
    }
}

impl<E> Default for EventBuffer<E> {
    fn default() -> Self {
        Self {
            pending: Vec::new(),
            drained: 0,
        }
    }
}
