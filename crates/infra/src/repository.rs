//! Tenant-isolated aggregate persistence.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use thiserror::Error;
use tracing::debug;

use crmsync_core::{AggregateRoot, Specification, TenantId};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RepositoryError {
    /// The aggregate exists but belongs to another tenant.
    #[error("tenant isolation violation: {0}")]
    TenantIsolation(String),

    #[error("{aggregate_type} {id} already exists")]
    AlreadyExists { aggregate_type: &'static str, id: String },

    #[error("{aggregate_type} {id} not found")]
    NotFound { aggregate_type: &'static str, id: String },

    /// Internal lock poisoning.
    #[error("repository state is poisoned")]
    Poisoned,
}

/// Persistence for one aggregate type.
///
/// Every call is scoped to a tenant: reads never return another tenant's
/// aggregates and writes never touch them. Queries take a [`Specification`],
/// which an implementation translates into its own filtering and eager loads.
///
/// A write persists the aggregate's state; its pending events are considered
/// committed by that write (see `AggregateStore`).
pub trait Repository<T: AggregateRoot>: Send + Sync {
    fn add(&self, aggregate: &T) -> Result<(), RepositoryError>;

    fn update(&self, aggregate: &T) -> Result<(), RepositoryError>;

    fn remove(&self, tenant_id: TenantId, id: &T::Id) -> Result<(), RepositoryError>;

    fn get(&self, tenant_id: TenantId, id: &T::Id) -> Result<Option<T>, RepositoryError>;

    fn list(
        &self,
        tenant_id: TenantId,
        spec: &dyn Specification<T>,
    ) -> Result<Vec<T>, RepositoryError>;

    fn count(
        &self,
        tenant_id: TenantId,
        spec: &dyn Specification<T>,
    ) -> Result<usize, RepositoryError>;
}

impl<T, R> Repository<T> for Arc<R>
where
    T: AggregateRoot,
    R: Repository<T> + ?Sized,
{
    fn add(&self, aggregate: &T) -> Result<(), RepositoryError> {
        (**self).add(aggregate)
    }

    fn update(&self, aggregate: &T) -> Result<(), RepositoryError> {
        (**self).update(aggregate)
    }

    fn remove(&self, tenant_id: TenantId, id: &T::Id) -> Result<(), RepositoryError> {
        (**self).remove(tenant_id, id)
    }

    fn get(&self, tenant_id: TenantId, id: &T::Id) -> Result<Option<T>, RepositoryError> {
        (**self).get(tenant_id, id)
    }

    fn list(
        &self,
        tenant_id: TenantId,
        spec: &dyn Specification<T>,
    ) -> Result<Vec<T>, RepositoryError> {
        (**self).list(tenant_id, spec)
    }

    fn count(
        &self,
        tenant_id: TenantId,
        spec: &dyn Specification<T>,
    ) -> Result<usize, RepositoryError> {
        (**self).count(tenant_id, spec)
    }
}

/// In-memory repository for tests/dev.
///
/// Stores committed snapshots: the copy kept here never carries pending
/// events. Specifications are evaluated in memory; eager-load hints are
/// irrelevant since aggregates are stored whole.
#[derive(Debug)]
pub struct InMemoryRepository<T: AggregateRoot> {
    inner: RwLock<HashMap<T::Id, T>>,
}

impl<T: AggregateRoot> InMemoryRepository<T> {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(HashMap::new()),
        }
    }

    /// Total number of stored aggregates across all tenants.
    pub fn len(&self) -> usize {
        self.inner.read().map(|m| m.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T: AggregateRoot> Default for InMemoryRepository<T> {
    fn default() -> Self {
        Self::new()
    }
}

fn not_found<T: AggregateRoot>(id: &T::Id) -> RepositoryError {
    RepositoryError::NotFound {
        aggregate_type: T::AGGREGATE_TYPE,
        id: format!("{id:?}"),
    }
}

fn snapshot<T: AggregateRoot + Clone>(aggregate: &T) -> T {
    let mut committed = aggregate.clone();
    committed.take_events();
    committed
}

impl<T> Repository<T> for InMemoryRepository<T>
where
    T: AggregateRoot + Clone + Send + Sync,
    T::Id: Send + Sync,
{
    fn add(&self, aggregate: &T) -> Result<(), RepositoryError> {
        let mut map = self.inner.write().map_err(|_| RepositoryError::Poisoned)?;
        let id = aggregate.id();
        if map.contains_key(id) {
            return Err(RepositoryError::AlreadyExists {
                aggregate_type: T::AGGREGATE_TYPE,
                id: format!("{id:?}"),
            });
        }

        debug!(
            aggregate_type = T::AGGREGATE_TYPE,
            tenant = %aggregate.tenant_id(),
            id = ?id,
            "adding aggregate"
        );
        map.insert(id.clone(), snapshot(aggregate));
        Ok(())
    }

    fn update(&self, aggregate: &T) -> Result<(), RepositoryError> {
        let mut map = self.inner.write().map_err(|_| RepositoryError::Poisoned)?;
        let id = aggregate.id();
        let stored = map.get_mut(id).ok_or_else(|| not_found::<T>(id))?;

        if stored.tenant_id() != aggregate.tenant_id() {
            return Err(RepositoryError::TenantIsolation(format!(
                "{} {id:?} belongs to another tenant",
                T::AGGREGATE_TYPE
            )));
        }

        debug!(
            aggregate_type = T::AGGREGATE_TYPE,
            tenant = %aggregate.tenant_id(),
            id = ?id,
            "updating aggregate"
        );
        *stored = snapshot(aggregate);
        Ok(())
    }

    fn remove(&self, tenant_id: TenantId, id: &T::Id) -> Result<(), RepositoryError> {
        let mut map = self.inner.write().map_err(|_| RepositoryError::Poisoned)?;

        // Another tenant's aggregate is reported as missing.
        if !map.get(id).is_some_and(|stored| stored.tenant_id() == tenant_id) {
            return Err(not_found::<T>(id));
        }

        map.remove(id);
        debug!(
            aggregate_type = T::AGGREGATE_TYPE,
            tenant = %tenant_id,
            id = ?id,
            "removed aggregate"
        );
        Ok(())
    }

    fn get(&self, tenant_id: TenantId, id: &T::Id) -> Result<Option<T>, RepositoryError> {
        let map = self.inner.read().map_err(|_| RepositoryError::Poisoned)?;
        Ok(map
            .get(id)
            .filter(|stored| stored.tenant_id() == tenant_id)
            .cloned())
    }

    fn list(
        &self,
        tenant_id: TenantId,
        spec: &dyn Specification<T>,
    ) -> Result<Vec<T>, RepositoryError> {
        let map = self.inner.read().map_err(|_| RepositoryError::Poisoned)?;
        Ok(map
            .values()
            .filter(|a| a.tenant_id() == tenant_id && spec.is_satisfied_by(a))
            .cloned()
            .collect())
    }

    fn count(
        &self,
        tenant_id: TenantId,
        spec: &dyn Specification<T>,
    ) -> Result<usize, RepositoryError> {
        let map = self.inner.read().map_err(|_| RepositoryError::Poisoned)?;
        Ok(map
            .values()
            .filter(|a| a.tenant_id() == tenant_id && spec.is_satisfied_by(a))
            .count())
    }
}

#[cfg(test)]
mod tests {
    use crmsync_core::{BaseSpecification, CustomerId, Entity, SyncStatus};
    use crmsync_customers::specifications::customers_with_sync_status;
    use crmsync_customers::{Customer, CustomerName, EmailAddress};

    use super::*;

    fn customer(tenant_id: TenantId, name: &str) -> Customer {
        Customer::create(
            tenant_id,
            CustomerName::create(name).unwrap(),
            EmailAddress::create("someone@example.com").unwrap(),
            None,
            None,
        )
    }

    fn everything() -> BaseSpecification<Customer> {
        BaseSpecification::new()
    }

    /// Minimal aggregate whose id and tenant can be chosen freely.
    #[derive(Debug, Clone)]
    struct Note {
        id: CustomerId,
        tenant_id: TenantId,
    }

    impl Entity for Note {
        type Id = CustomerId;

        fn id(&self) -> &Self::Id {
            &self.id
        }
    }

    impl AggregateRoot for Note {
        type Event = ();
        const AGGREGATE_TYPE: &'static str = "note";

        fn tenant_id(&self) -> TenantId {
            self.tenant_id
        }

        fn pending_events(&self) -> &[Self::Event] {
            &[]
        }

        fn take_events(&mut self) -> Vec<Self::Event> {
            Vec::new()
        }

        fn committed_event_count(&self) -> u64 {
            0
        }
    }

    #[test]
    fn add_get_and_duplicate_add() {
        let repo = InMemoryRepository::new();
        let tenant = TenantId::new();
        let jane = customer(tenant, "Jane");

        repo.add(&jane).unwrap();
        let err = repo.add(&jane).unwrap_err();
        assert!(matches!(
            err,
            RepositoryError::AlreadyExists { aggregate_type: "customer", .. }
        ));

        let loaded = repo.get(tenant, jane.id()).unwrap().unwrap();
        assert_eq!(loaded.name().as_str(), "Jane");
        assert!(loaded.pending_events().is_empty());
        assert_eq!(loaded.committed_event_count(), 1);
    }

    #[test]
    fn reads_are_tenant_scoped() {
        let repo = InMemoryRepository::new();
        let (a, b) = (TenantId::new(), TenantId::new());
        let jane = customer(a, "Jane");
        repo.add(&jane).unwrap();
        repo.add(&customer(b, "Bob")).unwrap();

        assert!(repo.get(b, jane.id()).unwrap().is_none());
        assert_eq!(repo.list(a, &everything()).unwrap().len(), 1);
        assert_eq!(repo.count(b, &everything()).unwrap(), 1);
        assert_eq!(repo.len(), 2);
    }

    #[test]
    fn update_requires_an_existing_aggregate() {
        let repo = InMemoryRepository::new();
        let tenant = TenantId::new();
        let mut jane = customer(tenant, "Jane");

        assert!(matches!(
            repo.update(&jane),
            Err(RepositoryError::NotFound { .. })
        ));

        repo.add(&jane).unwrap();
        jane.mark_as_synced();
        repo.update(&jane).unwrap();
        assert_eq!(
            repo.get(tenant, jane.id()).unwrap().unwrap().sync_status(),
            SyncStatus::Synced
        );
    }

    #[test]
    fn cross_tenant_update_is_rejected() {
        let repo = InMemoryRepository::new();
        let id = CustomerId::new();
        repo.add(&Note {
            id,
            tenant_id: TenantId::new(),
        })
        .unwrap();

        let forged = Note {
            id,
            tenant_id: TenantId::new(),
        };
        assert!(matches!(
            repo.update(&forged),
            Err(RepositoryError::TenantIsolation(_))
        ));
        assert!(matches!(
            repo.add(&forged),
            Err(RepositoryError::AlreadyExists { aggregate_type: "note", .. })
        ));
    }

    #[test]
    fn remove_is_tenant_scoped() {
        let repo = InMemoryRepository::new();
        let tenant = TenantId::new();
        let jane = customer(tenant, "Jane");
        repo.add(&jane).unwrap();

        assert!(matches!(
            repo.remove(TenantId::new(), jane.id()),
            Err(RepositoryError::NotFound { .. })
        ));
        repo.remove(tenant, jane.id()).unwrap();
        assert!(repo.is_empty());
    }

    #[test]
    fn list_applies_the_specification() {
        let repo = InMemoryRepository::new();
        let tenant = TenantId::new();
        let mut synced = customer(tenant, "Synced");
        synced.mark_as_synced();
        repo.add(&synced).unwrap();
        repo.add(&customer(tenant, "Pending")).unwrap();

        let spec = customers_with_sync_status(tenant, SyncStatus::Synced);
        let found = repo.list(tenant, &spec).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name().as_str(), "Synced");
        assert_eq!(repo.count(tenant, &spec).unwrap(), 1);
    }
}
