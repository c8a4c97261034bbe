//! Utility account entity, owned by a [`crate::Customer`].

use chrono::{DateTime, Utc};
use serde::Serialize;

use crmsync_core::{CustomerId, Entity, LdcProvider, SyncStatus, UtilityAccountId};

use crate::value_objects::{AccountNumber, Address, MeterNumber};

/// Error codes raised for utility accounts (through the owning customer).
pub mod errors {
    use crmsync_core::{DomainError, UtilityAccountId};

    use crate::value_objects::AccountNumber;

    pub const DUPLICATE: &str = "UtilityAccount.Duplicate";
    pub const NOT_FOUND: &str = "UtilityAccount.NotFound";

    pub(crate) fn duplicate(account_number: &AccountNumber) -> DomainError {
        DomainError::new(
            DUPLICATE,
            format!("utility account {account_number} already exists for this customer"),
        )
    }

    pub(crate) fn not_found(id: UtilityAccountId) -> DomainError {
        DomainError::new(NOT_FOUND, format!("utility account {id} was not found"))
    }
}

/// One utility account held by a customer.
///
/// Only the owning `Customer` can create, remove or transition it; outside the
/// crate it is read-only. It serializes for read models but has no
/// `Deserialize`, so it cannot be built around the customer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UtilityAccount {
    id: UtilityAccountId,
    customer_id: CustomerId,
    account_number: AccountNumber,
    provider: LdcProvider,
    meter_number: Option<MeterNumber>,
    service_address: Option<Address>,
    sync_status: SyncStatus,
    last_sync_error: Option<String>,
    added_at: DateTime<Utc>,
    last_synced_at: Option<DateTime<Utc>>,
}

impl UtilityAccount {
    pub(crate) fn create(
        customer_id: CustomerId,
        account_number: AccountNumber,
        provider: LdcProvider,
        meter_number: Option<MeterNumber>,
        service_address: Option<Address>,
        added_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: UtilityAccountId::new(),
            customer_id,
            account_number,
            provider,
            meter_number,
            service_address,
            sync_status: SyncStatus::Pending,
            last_sync_error: None,
            added_at,
            last_synced_at: None,
        }
    }

    pub fn id_typed(&self) -> UtilityAccountId {
        self.id
    }

    pub fn customer_id(&self) -> CustomerId {
        self.customer_id
    }

    pub fn account_number(&self) -> &AccountNumber {
        &self.account_number
    }

    pub fn provider(&self) -> LdcProvider {
        self.provider
    }

    pub fn meter_number(&self) -> Option<&MeterNumber> {
        self.meter_number.as_ref()
    }

    pub fn service_address(&self) -> Option<&Address> {
        self.service_address.as_ref()
    }

    pub fn sync_status(&self) -> SyncStatus {
        self.sync_status
    }

    pub fn last_sync_error(&self) -> Option<&str> {
        self.last_sync_error.as_deref()
    }

    pub fn added_at(&self) -> DateTime<Utc> {
        self.added_at
    }

    pub fn last_synced_at(&self) -> Option<DateTime<Utc>> {
        self.last_synced_at
    }

    pub fn is_synced(&self) -> bool {
        self.sync_status == SyncStatus::Synced
    }

    pub(crate) fn mark_as_synced(&mut self, at: DateTime<Utc>) {
        self.sync_status = SyncStatus::Synced;
        self.last_synced_at = Some(at);
        self.last_sync_error = None;
    }

    pub(crate) fn mark_sync_as_failed(&mut self, reason: &str) {
        self.sync_status = SyncStatus::Failed;
        self.last_sync_error = Some(reason.to_string());
    }

    pub(crate) fn mark_sync_as_in_progress(&mut self) {
        self.sync_status = SyncStatus::InProgress;
    }
}

impl Entity for UtilityAccount {
    type Id = UtilityAccountId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}
