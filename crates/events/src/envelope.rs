use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crmsync_core::{AggregateRoot, TenantId};

use crate::Event;

/// Envelope for a domain event on its way to handlers.
///
/// Notes:
/// - **Multi-tenancy** travels with the event via `tenant_id`.
/// - `sequence_number` is 1-based and monotonically increasing per aggregate,
///   continuing across save/dispatch cycles.
/// - `event_id` is what dispatchers deduplicate on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventEnvelope<E> {
    event_id: Uuid,
    tenant_id: TenantId,

    aggregate_id: Uuid,
    aggregate_type: String,

    sequence_number: u64,

    payload: E,
}

impl<E> EventEnvelope<E> {
    pub fn new(
        event_id: Uuid,
        tenant_id: TenantId,
        aggregate_id: Uuid,
        aggregate_type: impl Into<String>,
        sequence_number: u64,
        payload: E,
    ) -> Self {
        Self {
            event_id,
            tenant_id,
            aggregate_id,
            aggregate_type: aggregate_type.into(),
            sequence_number,
            payload,
        }
    }

    pub fn event_id(&self) -> Uuid {
        self.event_id
    }

    pub fn tenant_id(&self) -> TenantId {
        self.tenant_id
    }

    pub fn aggregate_id(&self) -> Uuid {
        self.aggregate_id
    }

    pub fn aggregate_type(&self) -> &str {
        &self.aggregate_type
    }

    pub fn sequence_number(&self) -> u64 {
        self.sequence_number
    }

    pub fn payload(&self) -> &E {
        &self.payload
    }

    pub fn into_payload(self) -> E {
        self.payload
    }
}

impl<E: Event> EventEnvelope<E> {
    pub fn event_type(&self) -> &'static str {
        self.payload.event_type()
    }
}

/// Drain an aggregate's buffered events and wrap them in envelopes, in the
/// order they were raised.
///
/// Call this only after the aggregate has been saved: draining is what marks
/// the events as handed off.
pub fn collect_events<A>(aggregate: &mut A) -> Vec<EventEnvelope<A::Event>>
where
    A: AggregateRoot,
    A::Id: Into<Uuid>,
{
    let tenant_id = aggregate.tenant_id();
    let aggregate_id: Uuid = aggregate.id().clone().into();
    let first_sequence = aggregate.committed_event_count() + 1;

    aggregate
        .take_events()
        .into_iter()
        .zip(first_sequence..)
        .map(|(payload, sequence_number)| {
            EventEnvelope::new(
                Uuid::now_v7(),
                tenant_id,
                aggregate_id,
                A::AGGREGATE_TYPE,
                sequence_number,
                payload,
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use crmsync_core::{CustomerId, Entity, EventBuffer};

    use super::*;

    #[derive(Debug)]
    struct Counter {
        id: CustomerId,
        tenant_id: TenantId,
        events: EventBuffer<&'static str>,
    }

    impl Entity for Counter {
        type Id = CustomerId;

        fn id(&self) -> &Self::Id {
            &self.id
        }
    }

    impl AggregateRoot for Counter {
        type Event = &'static str;
        const AGGREGATE_TYPE: &'static str = "counter";

        fn tenant_id(&self) -> TenantId {
            self.tenant_id
        }

        fn pending_events(&self) -> &[Self::Event] {
            self.events.pending()
        }

        fn take_events(&mut self) -> Vec<Self::Event> {
            self.events.take()
        }

        fn committed_event_count(&self) -> u64 {
            self.events.drained()
        }
    }

    #[test]
    fn collect_events_wraps_in_order_and_continues_sequence() {
        let mut counter = Counter {
            id: CustomerId::new(),
            tenant_id: TenantId::new(),
            events: EventBuffer::new(),
        };
        counter.events.record("a");
        counter.events.record("b");

        let first = collect_events(&mut counter);
        assert_eq!(first.len(), 2);
        assert!(counter.pending_events().is_empty());
        assert_eq!(first[0].payload(), &"a");
        assert_eq!(first[0].sequence_number(), 1);
        assert_eq!(first[1].sequence_number(), 2);
        assert_eq!(first[1].aggregate_type(), "counter");
        assert_eq!(first[1].aggregate_id(), *counter.id.as_uuid());
        assert_eq!(first[1].tenant_id(), counter.tenant_id);
        assert_ne!(first[0].event_id(), first[1].event_id());

        counter.events.record("c");
        let second = collect_events(&mut counter);
        assert_eq!(second.len(), 1);
        assert_eq!(second[0].sequence_number(), 3);

        assert!(collect_events(&mut counter).is_empty());
    }
}
