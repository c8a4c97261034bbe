//! Save-then-dispatch unit of work.
//!
//! ```text
//! aggregate mutation (events buffered)
//!   ↓
//! 1. Persist through the repository (tenant-checked)
//!   ↓
//! 2. Drain the event buffer into envelopes (sequence numbers continue)
//!   ↓
//! 3. Dispatch envelopes to handlers
//! ```
//!
//! Events are drained only once the repository accepted the write, so a
//! rejected save leaves them buffered on the aggregate.

use std::marker::PhantomData;

use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use crmsync_core::AggregateRoot;
use crmsync_events::{DispatchReport, EventDispatcher, collect_events};

use crate::repository::{Repository, RepositoryError};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Repository(#[from] RepositoryError),

    /// The write succeeded; delivering its events did not. The envelopes
    /// have already been drained from the aggregate.
    #[error("events persisted but dispatch failed: {0}")]
    Dispatch(String),
}

/// Persists aggregates of one type and publishes what they raised.
#[derive(Debug)]
pub struct AggregateStore<T, R, D> {
    repository: R,
    dispatcher: D,
    _aggregate: PhantomData<fn() -> T>,
}

impl<T, R, D> AggregateStore<T, R, D> {
    pub fn new(repository: R, dispatcher: D) -> Self {
        Self {
            repository,
            dispatcher,
            _aggregate: PhantomData,
        }
    }

    pub fn repository(&self) -> &R {
        &self.repository
    }

    pub fn dispatcher(&self) -> &D {
        &self.dispatcher
    }

    pub fn into_parts(self) -> (R, D) {
        (self.repository, self.dispatcher)
    }
}

impl<T, R, D> AggregateStore<T, R, D>
where
    T: AggregateRoot,
    T::Id: Into<Uuid>,
    R: Repository<T>,
    D: EventDispatcher<T::Event>,
{
    /// Persist a newly created aggregate, then dispatch its events.
    pub fn save_new(&self, aggregate: &mut T) -> Result<DispatchReport, StoreError> {
        self.repository.add(aggregate)?;
        self.publish(aggregate)
    }

    /// Persist changes to an existing aggregate, then dispatch its events.
    pub fn save(&self, aggregate: &mut T) -> Result<DispatchReport, StoreError> {
        self.repository.update(aggregate)?;
        self.publish(aggregate)
    }

    fn publish(&self, aggregate: &mut T) -> Result<DispatchReport, StoreError> {
        let envelopes = collect_events(aggregate);
        if envelopes.is_empty() {
            return Ok(DispatchReport::default());
        }

        let count = envelopes.len();
        let report = self
            .dispatcher
            .dispatch(envelopes)
            .map_err(|e| StoreError::Dispatch(format!("{e:?}")))?;

        if report.is_clean() {
            info!(
                aggregate_type = T::AGGREGATE_TYPE,
                tenant = %aggregate.tenant_id(),
                events = count,
                "saved aggregate"
            );
        } else {
            warn!(
                aggregate_type = T::AGGREGATE_TYPE,
                tenant = %aggregate.tenant_id(),
                events = count,
                failures = report.failures.len(),
                "saved aggregate; some event handlers failed"
            );
        }
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use crmsync_core::{Entity, LdcProvider, TenantId};
    use crmsync_events::{EventEnvelope, EventHandler, FnHandler, InMemoryEventDispatcher};
    use crmsync_ldc::{LdcAccount, LdcAccountEvent};

    use super::*;
    use crate::InMemoryRepository;

    type LdcStore = AggregateStore<
        LdcAccount,
        InMemoryRepository<LdcAccount>,
        Arc<InMemoryEventDispatcher<LdcAccountEvent>>,
    >;

    fn store() -> (LdcStore, Arc<Mutex<Vec<u64>>>) {
        let dispatcher = Arc::new(InMemoryEventDispatcher::new());
        let sequences = Arc::new(Mutex::new(Vec::new()));
        let seen = Arc::clone(&sequences);
        let handler: Arc<dyn EventHandler<LdcAccountEvent>> = Arc::new(FnHandler::new(
            "sequence-recorder",
            move |env: &EventEnvelope<LdcAccountEvent>| {
                seen.lock().unwrap().push(env.sequence_number());
                Ok(())
            },
        ));
        dispatcher.register(handler).unwrap();
        (
            AggregateStore::new(InMemoryRepository::new(), dispatcher),
            sequences,
        )
    }

    fn account() -> LdcAccount {
        LdcAccount::create(TenantId::new(), LdcProvider::Sce, "SCE", "user", "secret", None)
            .unwrap()
    }

    #[test]
    fn sequence_numbers_continue_across_saves() {
        let (store, sequences) = store();
        let mut account = account();

        store.save_new(&mut account).unwrap();
        account.disable_sync().unwrap();
        account.mark_as_synced();
        let report = store.save(&mut account).unwrap();

        assert_eq!(report.delivered, 2);
        assert_eq!(*sequences.lock().unwrap(), vec![1, 2, 3]);
        assert!(account.pending_events().is_empty());
    }

    #[test]
    fn rejected_write_keeps_events_buffered() {
        let (store, sequences) = store();
        let mut account = account();

        let err = store.save(&mut account).unwrap_err();

        assert!(matches!(err, StoreError::Repository(RepositoryError::NotFound { .. })));
        assert_eq!(account.pending_events().len(), 1);
        assert!(sequences.lock().unwrap().is_empty());
        assert!(store.repository().get(account.tenant_id(), account.id()).unwrap().is_none());
    }

    #[test]
    fn saving_without_changes_dispatches_nothing() {
        let (store, sequences) = store();
        let mut account = account();
        store.save_new(&mut account).unwrap();

        let report = store.save(&mut account).unwrap();
        assert_eq!(report, DispatchReport::default());
        assert_eq!(sequences.lock().unwrap().len(), 1);
    }
}
