use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crmsync_core::{
    AggregateRoot, CustomerId, DomainResult, Entity, EventBuffer, LdcProvider, SyncStatus,
    TenantId, UtilityAccountId,
};
use crmsync_events::Event;

use crate::utility_account::{self, UtilityAccount};
use crate::value_objects::{
    AccountNumber, Address, CustomerName, EmailAddress, MeterNumber, PhoneNumber,
};

/// Reason recorded when every utility account of a customer failed to sync.
pub const ALL_ACCOUNTS_FAILED: &str = "all utility accounts failed to sync";

// ─────────────────────────────────────────────────────────────────────────────
// Aggregate
// ─────────────────────────────────────────────────────────────────────────────

/// Aggregate root: a tenant's enrolled customer and the utility accounts they
/// hold.
///
/// Invariants:
/// - account numbers are unique within the customer
/// - utility accounts are only added, removed or transitioned through here
#[derive(Debug, Clone)]
pub struct Customer {
    id: CustomerId,
    tenant_id: TenantId,
    name: CustomerName,
    email: EmailAddress,
    phone: Option<PhoneNumber>,
    address: Option<Address>,
    sync_status: SyncStatus,
    last_sync_error: Option<String>,
    created_at: DateTime<Utc>,
    modified_at: Option<DateTime<Utc>>,
    last_synced_at: Option<DateTime<Utc>>,
    utility_accounts: Vec<UtilityAccount>,
    events: EventBuffer<CustomerEvent>,
}

impl Customer {
    /// Enroll a new customer. Starts `Pending` and raises `CustomerCreated`.
    pub fn create(
        tenant_id: TenantId,
        name: CustomerName,
        email: EmailAddress,
        phone: Option<PhoneNumber>,
        address: Option<Address>,
    ) -> Self {
        let now = Utc::now();
        let mut customer = Self {
            id: CustomerId::new(),
            tenant_id,
            name,
            email,
            phone,
            address,
            sync_status: SyncStatus::Pending,
            last_sync_error: None,
            created_at: now,
            modified_at: None,
            last_synced_at: None,
            utility_accounts: Vec::new(),
            events: EventBuffer::new(),
        };

        customer.events.record(CustomerEvent::CustomerCreated(CustomerCreated {
            tenant_id,
            customer_id: customer.id,
            name: customer.name.clone(),
            email: customer.email.clone(),
            occurred_at: now,
        }));
        customer
    }

    pub fn id_typed(&self) -> CustomerId {
        self.id
    }

    pub fn name(&self) -> &CustomerName {
        &self.name
    }

    pub fn email(&self) -> &EmailAddress {
        &self.email
    }

    pub fn phone(&self) -> Option<&PhoneNumber> {
        self.phone.as_ref()
    }

    pub fn address(&self) -> Option<&Address> {
        self.address.as_ref()
    }

    pub fn sync_status(&self) -> SyncStatus {
        self.sync_status
    }

    pub fn last_sync_error(&self) -> Option<&str> {
        self.last_sync_error.as_deref()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn modified_at(&self) -> Option<DateTime<Utc>> {
        self.modified_at
    }

    pub fn last_synced_at(&self) -> Option<DateTime<Utc>> {
        self.last_synced_at
    }

    /// Read-only view of the owned utility accounts, in insertion order.
    pub fn utility_accounts(&self) -> &[UtilityAccount] {
        &self.utility_accounts
    }

    pub fn utility_account(&self, id: UtilityAccountId) -> Option<&UtilityAccount> {
        self.utility_accounts.iter().find(|a| a.id_typed() == id)
    }

    pub fn find_utility_account(&self, account_number: &AccountNumber) -> Option<&UtilityAccount> {
        self.utility_accounts
            .iter()
            .find(|a| a.account_number() == account_number)
    }

    pub fn has_utility_accounts(&self) -> bool {
        !self.utility_accounts.is_empty()
    }

    pub fn synced_account_count(&self) -> usize {
        self.count_accounts_with(SyncStatus::Synced)
    }

    pub fn failed_account_count(&self) -> usize {
        self.count_accounts_with(SyncStatus::Failed)
    }

    /// True only when there is at least one account and every account is synced.
    pub fn are_all_accounts_synced(&self) -> bool {
        self.has_utility_accounts() && self.utility_accounts.iter().all(UtilityAccount::is_synced)
    }

    /// Status implied by the owned accounts (`None` without accounts).
    pub fn derived_sync_status(&self) -> Option<SyncStatus> {
        SyncStatus::combine(self.utility_accounts.iter().map(UtilityAccount::sync_status))
    }

    fn count_accounts_with(&self, status: SyncStatus) -> usize {
        self.utility_accounts
            .iter()
            .filter(|a| a.sync_status() == status)
            .count()
    }

    // ── utility accounts ────────────────────────────────────────────────────

    /// Add a utility account. Fails with `UtilityAccount.Duplicate` if the
    /// account number is already held by this customer.
    pub fn add_utility_account(
        &mut self,
        account_number: AccountNumber,
        provider: LdcProvider,
        meter_number: Option<MeterNumber>,
        service_address: Option<Address>,
    ) -> DomainResult<&UtilityAccount> {
        if self.find_utility_account(&account_number).is_some() {
            return Err(utility_account::errors::duplicate(&account_number));
        }

        let now = Utc::now();
        let account = UtilityAccount::create(
            self.id,
            account_number,
            provider,
            meter_number,
            service_address,
            now,
        );

        self.events
            .record(CustomerEvent::UtilityAccountAdded(UtilityAccountAdded {
                tenant_id: self.tenant_id,
                customer_id: self.id,
                utility_account_id: account.id_typed(),
                account_number: account.account_number().clone(),
                provider,
                occurred_at: now,
            }));
        self.modified_at = Some(now);

        let index = self.utility_accounts.len();
        self.utility_accounts.push(account);
        Ok(&self.utility_accounts[index])
    }

    /// Remove a utility account. Fails with `UtilityAccount.NotFound` if this
    /// customer holds no account with that id.
    pub fn remove_utility_account(&mut self, id: UtilityAccountId) -> DomainResult<()> {
        let position = self
            .utility_accounts
            .iter()
            .position(|a| a.id_typed() == id)
            .ok_or_else(|| utility_account::errors::not_found(id))?;

        let removed = self.utility_accounts.remove(position);
        let now = Utc::now();
        self.events
            .record(CustomerEvent::UtilityAccountRemoved(UtilityAccountRemoved {
                tenant_id: self.tenant_id,
                customer_id: self.id,
                utility_account_id: id,
                account_number: removed.account_number().clone(),
                occurred_at: now,
            }));
        self.modified_at = Some(now);
        Ok(())
    }

    pub fn mark_utility_account_as_synced(&mut self, id: UtilityAccountId) -> DomainResult<()> {
        self.account_mut(id)?.mark_as_synced(Utc::now());
        Ok(())
    }

    pub fn mark_utility_account_sync_as_failed(
        &mut self,
        id: UtilityAccountId,
        reason: &str,
    ) -> DomainResult<()> {
        self.account_mut(id)?.mark_sync_as_failed(reason);
        Ok(())
    }

    pub fn mark_utility_account_sync_as_in_progress(
        &mut self,
        id: UtilityAccountId,
    ) -> DomainResult<()> {
        self.account_mut(id)?.mark_sync_as_in_progress();
        Ok(())
    }

    fn account_mut(&mut self, id: UtilityAccountId) -> DomainResult<&mut UtilityAccount> {
        self.utility_accounts
            .iter_mut()
            .find(|a| a.id_typed() == id)
            .ok_or_else(|| utility_account::errors::not_found(id))
    }

    // ── details ─────────────────────────────────────────────────────────────

    /// Update contact details. `None` keeps the current value; values equal to
    /// the current ones are ignored.
    ///
    /// Raises a single `CustomerContactInfoUpdated` when anything changed and
    /// returns `Ok(true)`; a call that changes nothing returns `Ok(false)` and
    /// raises nothing.
    pub fn update_contact_info(
        &mut self,
        email: Option<EmailAddress>,
        phone: Option<PhoneNumber>,
        address: Option<Address>,
    ) -> DomainResult<bool> {
        let mut changed = false;

        if let Some(email) = email.filter(|e| *e != self.email) {
            self.email = email;
            changed = true;
        }
        if let Some(phone) = phone.filter(|p| self.phone.as_ref() != Some(p)) {
            self.phone = Some(phone);
            changed = true;
        }
        if let Some(address) = address.filter(|a| self.address.as_ref() != Some(a)) {
            self.address = Some(address);
            changed = true;
        }

        if changed {
            let now = Utc::now();
            self.modified_at = Some(now);
            self.events.record(CustomerEvent::CustomerContactInfoUpdated(
                CustomerContactInfoUpdated {
                    tenant_id: self.tenant_id,
                    customer_id: self.id,
                    email: self.email.clone(),
                    phone: self.phone.clone(),
                    address: self.address.clone(),
                    occurred_at: now,
                },
            ));
        }
        Ok(changed)
    }

    /// Rename the customer. Same-name calls are a no-op returning `Ok(false)`.
    pub fn rename(&mut self, name: CustomerName) -> DomainResult<bool> {
        if name == self.name {
            return Ok(false);
        }

        let now = Utc::now();
        self.name = name;
        self.modified_at = Some(now);
        self.events.record(CustomerEvent::CustomerRenamed(CustomerRenamed {
            tenant_id: self.tenant_id,
            customer_id: self.id,
            name: self.name.clone(),
            occurred_at: now,
        }));
        Ok(true)
    }

    // ── sync status ─────────────────────────────────────────────────────────

    /// Mark the customer as mirrored to the CRM. Raises `CustomerSynced`.
    pub fn mark_as_synced(&mut self) {
        let now = Utc::now();
        self.sync_status = SyncStatus::Synced;
        self.last_synced_at = Some(now);
        self.last_sync_error = None;
        self.events.record(CustomerEvent::CustomerSynced(CustomerSynced {
            tenant_id: self.tenant_id,
            customer_id: self.id,
            occurred_at: now,
        }));
    }

    /// Mark the last sync attempt as failed. Raises `CustomerSyncFailed`.
    pub fn mark_sync_as_failed(&mut self, reason: impl Into<String>) {
        let reason = reason.into();
        self.sync_status = SyncStatus::Failed;
        self.last_sync_error = Some(reason.clone());
        self.events.record(CustomerEvent::CustomerSyncFailed(CustomerSyncFailed {
            tenant_id: self.tenant_id,
            customer_id: self.id,
            reason,
            occurred_at: Utc::now(),
        }));
    }

    /// Mark a sync attempt as started. Raises no event.
    pub fn mark_sync_as_in_progress(&mut self) {
        self.sync_status = SyncStatus::InProgress;
    }

    /// Bring the customer's status in line with its accounts.
    ///
    /// Goes through the regular mark methods, so reaching `Synced` or `Failed`
    /// raises the usual event. Nothing happens when the customer already has
    /// the derived status, has no accounts, or its accounts are still pending.
    pub fn reconcile_sync_status(&mut self) -> SyncStatus {
        let Some(derived) = self.derived_sync_status() else {
            return self.sync_status;
        };
        if derived == self.sync_status {
            return self.sync_status;
        }

        match derived {
            SyncStatus::Synced => self.mark_as_synced(),
            SyncStatus::Failed => self.mark_sync_as_failed(ALL_ACCOUNTS_FAILED),
            SyncStatus::InProgress => self.mark_sync_as_in_progress(),
            SyncStatus::PartiallySuccessful => {
                self.sync_status = SyncStatus::PartiallySuccessful;
            }
            SyncStatus::Pending => {}
        }
        self.sync_status
    }
}

impl Entity for Customer {
    type Id = CustomerId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

impl AggregateRoot for Customer {
    type Event = CustomerEvent;
    const AGGREGATE_TYPE: &'static str = "customer";

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

// ─────────────────────────────────────────────────────────────────────────────
// Events
// ─────────────────────────────────────────────────────────────────────────────

/// Event: CustomerCreated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerCreated {
    pub tenant_id: TenantId,
    pub customer_id: CustomerId,
    pub name: CustomerName,
    pub email: EmailAddress,
    pub occurred_at: DateTime<Utc>,
}

/// Event: UtilityAccountAdded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UtilityAccountAdded {
    pub tenant_id: TenantId,
    pub customer_id: CustomerId,
    pub utility_account_id: UtilityAccountId,
    pub account_number: AccountNumber,
    pub provider: LdcProvider,
    pub occurred_at: DateTime<Utc>,
}

/// Event: UtilityAccountRemoved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UtilityAccountRemoved {
    pub tenant_id: TenantId,
    pub customer_id: CustomerId,
    pub utility_account_id: UtilityAccountId,
    pub account_number: AccountNumber,
    pub occurred_at: DateTime<Utc>,
}

/// Event: CustomerContactInfoUpdated (carries the full contact state after the change).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerContactInfoUpdated {
    pub tenant_id: TenantId,
    pub customer_id: CustomerId,
    pub email: EmailAddress,
    pub phone: Option<PhoneNumber>,
    pub address: Option<Address>,
    pub occurred_at: DateTime<Utc>,
}

/// Event: CustomerRenamed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerRenamed {
    pub tenant_id: TenantId,
    pub customer_id: CustomerId,
    pub name: CustomerName,
    pub occurred_at: DateTime<Utc>,
}

/// Event: CustomerSynced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerSynced {
    pub tenant_id: TenantId,
    pub customer_id: CustomerId,
    pub occurred_at: DateTime<Utc>,
}

/// Event: CustomerSyncFailed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerSyncFailed {
    pub tenant_id: TenantId,
    pub customer_id: CustomerId,
    pub reason: String,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CustomerEvent {
    CustomerCreated(CustomerCreated),
    UtilityAccountAdded(UtilityAccountAdded),
    UtilityAccountRemoved(UtilityAccountRemoved),
    CustomerContactInfoUpdated(CustomerContactInfoUpdated),
    CustomerRenamed(CustomerRenamed),
    CustomerSynced(CustomerSynced),
    CustomerSyncFailed(CustomerSyncFailed),
}

impl Event for CustomerEvent {
    fn event_type(&self) -> &'static str {
        match self {
            CustomerEvent::CustomerCreated(_) => "customers.customer.created",
            CustomerEvent::UtilityAccountAdded(_) => "customers.utility_account.added",
            CustomerEvent::UtilityAccountRemoved(_) => "customers.utility_account.removed",
            CustomerEvent::CustomerContactInfoUpdated(_) => "customers.customer.contact_info_updated",
            CustomerEvent::CustomerRenamed(_) => "customers.customer.renamed",
            CustomerEvent::CustomerSynced(_) => "customers.customer.synced",
            CustomerEvent::CustomerSyncFailed(_) => "customers.customer.sync_failed",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            CustomerEvent::CustomerCreated(e) => e.occurred_at,
            CustomerEvent::UtilityAccountAdded(e) => e.occurred_at,
            CustomerEvent::UtilityAccountRemoved(e) => e.occurred_at,
            CustomerEvent::CustomerContactInfoUpdated(e) => e.occurred_at,
            CustomerEvent::CustomerRenamed(e) => e.occurred_at,
            CustomerEvent::CustomerSynced(e) => e.occurred_at,
            CustomerEvent::CustomerSyncFailed(e) => e.occurred_at,
        }
    }

    fn tenant_id(&self) -> TenantId {
        match self {
            CustomerEvent::CustomerCreated(e) => e.tenant_id,
            CustomerEvent::UtilityAccountAdded(e) => e.tenant_id,
            CustomerEvent::UtilityAccountRemoved(e) => e.tenant_id,
            CustomerEvent::CustomerContactInfoUpdated(e) => e.tenant_id,
            CustomerEvent::CustomerRenamed(e) => e.tenant_id,
            CustomerEvent::CustomerSynced(e) => e.tenant_id,
            CustomerEvent::CustomerSyncFailed(e) => e.tenant_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utility_account::errors as account_errors;

    fn test_tenant_id() -> TenantId {
        TenantId::new()
    }

    fn jane() -> Customer {
        Customer::create(
            test_tenant_id(),
            CustomerName::create("Jane Doe").unwrap(),
            EmailAddress::create("jane@example.com").unwrap(),
            None,
            None,
        )
    }

    fn acc(number: &str) -> AccountNumber {
        AccountNumber::create(number).unwrap()
    }

    fn event_types(customer: &Customer) -> Vec<&'static str> {
        customer.pending_events().iter().map(Event::event_type).collect()
    }

    #[test]
    fn create_starts_pending_and_raises_customer_created() {
        let tenant_id = test_tenant_id();
        let customer = Customer::create(
            tenant_id,
            CustomerName::create("Jane Doe").unwrap(),
            EmailAddress::create("jane@example.com").unwrap(),
            Some(PhoneNumber::create("415-555-0100").unwrap()),
            None,
        );

        assert_eq!(customer.sync_status(), SyncStatus::Pending);
        assert_eq!(customer.tenant_id(), tenant_id);
        assert!(!customer.has_utility_accounts());
        assert!(customer.last_synced_at().is_none());
        assert_eq!(customer.pending_events().len(), 1);

        match &customer.pending_events()[0] {
            CustomerEvent::CustomerCreated(e) => {
                assert_eq!(e.tenant_id, tenant_id);
                assert_eq!(e.customer_id, customer.id_typed());
                assert_eq!(e.name.as_str(), "Jane Doe");
                assert_eq!(e.email.as_str(), "jane@example.com");
            }
            other => panic!("Expected CustomerCreated event, got {other:?}"),
        }
    }

    #[test]
    fn end_to_end_jane_doe_scenario() {
        let mut customer = jane();
        assert_eq!(customer.sync_status(), SyncStatus::Pending);
        assert_eq!(customer.pending_events().len(), 1);

        let account = customer
            .add_utility_account(acc("ACC-100"), LdcProvider::Pge, None, None)
            .unwrap();
        assert_eq!(account.sync_status(), SyncStatus::Pending);
        assert_eq!(account.provider(), LdcProvider::Pge);
        assert_eq!(customer.pending_events().len(), 2);

        let err = customer
            .add_utility_account(acc("ACC-100"), LdcProvider::Pge, None, None)
            .unwrap_err();
        assert_eq!(err.code(), account_errors::DUPLICATE);
        assert_eq!(customer.pending_events().len(), 2);
        assert_eq!(customer.utility_accounts().len(), 1);

        customer.mark_as_synced();
        assert_eq!(customer.sync_status(), SyncStatus::Synced);
        assert!(customer.last_synced_at().is_some());
        assert_eq!(
            event_types(&customer),
            vec![
                "customers.customer.created",
                "customers.utility_account.added",
                "customers.customer.synced",
            ]
        );
    }

    #[test]
    fn duplicate_detection_uses_normalized_account_numbers() {
        let mut customer = jane();
        customer
            .add_utility_account(acc("acc-100"), LdcProvider::Pge, None, None)
            .unwrap();
        let err = customer
            .add_utility_account(acc("ACC-100"), LdcProvider::Sce, None, None)
            .unwrap_err();
        assert_eq!(err.code(), account_errors::DUPLICATE);
    }

    #[test]
    fn remove_utility_account_raises_event_and_shrinks_collection() {
        let mut customer = jane();
        let id = customer
            .add_utility_account(acc("ACC-1"), LdcProvider::Pge, None, None)
            .unwrap()
            .id_typed();
        customer
            .add_utility_account(acc("ACC-2"), LdcProvider::Pge, None, None)
            .unwrap();

        customer.remove_utility_account(id).unwrap();

        assert_eq!(customer.utility_accounts().len(), 1);
        assert!(customer.utility_account(id).is_none());
        match customer.pending_events().last() {
            Some(CustomerEvent::UtilityAccountRemoved(e)) => {
                assert_eq!(e.utility_account_id, id);
                assert_eq!(e.account_number.as_str(), "ACC-1");
            }
            other => panic!("Expected UtilityAccountRemoved event, got {other:?}"),
        }
    }

    #[test]
    fn remove_unknown_account_fails_without_side_effects() {
        let mut customer = jane();
        customer
            .add_utility_account(acc("ACC-1"), LdcProvider::Pge, None, None)
            .unwrap();
        let before = customer.pending_events().len();

        let err = customer
            .remove_utility_account(UtilityAccountId::new())
            .unwrap_err();

        assert_eq!(err.code(), account_errors::NOT_FOUND);
        assert_eq!(customer.utility_accounts().len(), 1);
        assert_eq!(customer.pending_events().len(), before);
    }

    #[test]
    fn removed_number_can_be_added_again() {
        let mut customer = jane();
        let id = customer
            .add_utility_account(acc("ACC-1"), LdcProvider::Pge, None, None)
            .unwrap()
            .id_typed();
        customer.remove_utility_account(id).unwrap();

        assert!(customer
            .add_utility_account(acc("ACC-1"), LdcProvider::Pge, None, None)
            .is_ok());
    }

    #[test]
    fn update_contact_info_raises_one_event_for_several_changes() {
        let mut customer = jane();
        let changed = customer
            .update_contact_info(
                Some(EmailAddress::create("jane.doe@example.com").unwrap()),
                Some(PhoneNumber::create("4155550100").unwrap()),
                Some(Address::create("1 Market St", "San Francisco", "CA", "94105").unwrap()),
            )
            .unwrap();

        assert!(changed);
        assert_eq!(customer.email().as_str(), "jane.doe@example.com");
        assert!(customer.modified_at().is_some());
        assert_eq!(
            event_types(&customer),
            vec!["customers.customer.created", "customers.customer.contact_info_updated"]
        );
    }

    #[test]
    fn update_contact_info_with_equal_or_absent_values_is_silent() {
        let mut customer = jane();

        assert!(!customer.update_contact_info(None, None, None).unwrap());
        assert!(!customer
            .update_contact_info(Some(EmailAddress::create("JANE@example.com").unwrap()), None, None)
            .unwrap());

        assert_eq!(customer.pending_events().len(), 1);
        assert!(customer.modified_at().is_none());
    }

    #[test]
    fn update_contact_info_only_touches_changed_fields() {
        let mut customer = jane();
        let phone = PhoneNumber::create("4155550100").unwrap();
        customer.update_contact_info(None, Some(phone.clone()), None).unwrap();

        customer.update_contact_info(None, Some(phone.clone()), None).unwrap();

        assert_eq!(customer.phone(), Some(&phone));
        assert_eq!(customer.email().as_str(), "jane@example.com");
        assert_eq!(customer.pending_events().len(), 2);
    }

    #[test]
    fn rename_is_a_no_op_for_the_same_name() {
        let mut customer = jane();
        assert!(!customer.rename(CustomerName::create(" Jane Doe ").unwrap()).unwrap());
        assert!(customer.rename(CustomerName::create("Jane Smith").unwrap()).unwrap());
        assert_eq!(customer.name().as_str(), "Jane Smith");
        assert_eq!(customer.pending_events().len(), 2);
    }

    #[test]
    fn sync_transitions_and_event_asymmetry() {
        let mut customer = jane();

        customer.mark_sync_as_in_progress();
        assert_eq!(customer.sync_status(), SyncStatus::InProgress);
        assert_eq!(customer.pending_events().len(), 1);

        customer.mark_sync_as_failed("CRM returned 503");
        assert_eq!(customer.sync_status(), SyncStatus::Failed);
        assert_eq!(customer.last_sync_error(), Some("CRM returned 503"));
        match customer.pending_events().last() {
            Some(CustomerEvent::CustomerSyncFailed(e)) => assert_eq!(e.reason, "CRM returned 503"),
            other => panic!("Expected CustomerSyncFailed event, got {other:?}"),
        }

        customer.mark_as_synced();
        assert_eq!(customer.sync_status(), SyncStatus::Synced);
        assert_eq!(customer.last_sync_error(), None);
        assert_eq!(customer.pending_events().len(), 3);
    }

    #[test]
    fn derived_queries_follow_account_states() {
        let mut customer = jane();
        assert!(!customer.are_all_accounts_synced());
        assert_eq!(customer.derived_sync_status(), None);

        let a = customer
            .add_utility_account(acc("A-1"), LdcProvider::Pge, None, None)
            .unwrap()
            .id_typed();
        let b = customer
            .add_utility_account(acc("B-1"), LdcProvider::Sce, None, None)
            .unwrap()
            .id_typed();

        customer.mark_utility_account_as_synced(a).unwrap();
        assert_eq!(customer.synced_account_count(), 1);
        assert!(!customer.are_all_accounts_synced());

        customer.mark_utility_account_sync_as_failed(b, "bad password").unwrap();
        assert_eq!(customer.failed_account_count(), 1);
        assert_eq!(customer.derived_sync_status(), Some(SyncStatus::PartiallySuccessful));

        customer.mark_utility_account_as_synced(b).unwrap();
        assert!(customer.are_all_accounts_synced());
        assert_eq!(customer.failed_account_count(), 0);

        let err = customer
            .mark_utility_account_sync_as_in_progress(UtilityAccountId::new())
            .unwrap_err();
        assert_eq!(err.code(), account_errors::NOT_FOUND);
    }

    #[test]
    fn reconcile_sync_status_goes_through_mark_methods() {
        let mut customer = jane();
        assert_eq!(customer.reconcile_sync_status(), SyncStatus::Pending);

        let a = customer
            .add_utility_account(acc("A-1"), LdcProvider::Pge, None, None)
            .unwrap()
            .id_typed();
        let b = customer
            .add_utility_account(acc("B-1"), LdcProvider::Pge, None, None)
            .unwrap()
            .id_typed();
        customer.take_events();

        customer.mark_utility_account_sync_as_in_progress(a).unwrap();
        assert_eq!(customer.reconcile_sync_status(), SyncStatus::InProgress);
        assert!(customer.pending_events().is_empty());

        customer.mark_utility_account_sync_as_failed(a, "timeout").unwrap();
        customer.mark_utility_account_sync_as_failed(b, "timeout").unwrap();
        assert_eq!(customer.reconcile_sync_status(), SyncStatus::Failed);
        assert_eq!(customer.last_sync_error(), Some(ALL_ACCOUNTS_FAILED));

        customer.mark_utility_account_as_synced(a).unwrap();
        assert_eq!(customer.reconcile_sync_status(), SyncStatus::PartiallySuccessful);

        customer.mark_utility_account_as_synced(b).unwrap();
        assert_eq!(customer.reconcile_sync_status(), SyncStatus::Synced);
        assert_eq!(
            event_types(&customer),
            vec!["customers.customer.sync_failed", "customers.customer.synced"]
        );

        // Already in line: nothing new.
        assert_eq!(customer.reconcile_sync_status(), SyncStatus::Synced);
        assert_eq!(customer.pending_events().len(), 2);
    }

    #[test]
    fn one_failed_and_one_pending_account_is_not_partial() {
        let mut customer = jane();
        let a = customer
            .add_utility_account(acc("A-1"), LdcProvider::Pge, None, None)
            .unwrap()
            .id_typed();
        customer
            .add_utility_account(acc("B-1"), LdcProvider::Pge, None, None)
            .unwrap();
        customer.take_events();

        customer.mark_utility_account_sync_as_failed(a, "timeout").unwrap();
        assert_eq!(customer.derived_sync_status(), Some(SyncStatus::Pending));
        assert_eq!(customer.reconcile_sync_status(), SyncStatus::Pending);
        assert_eq!(customer.synced_account_count(), 0);
        assert!(customer.pending_events().is_empty());
    }

    #[test]
    fn take_events_drains_the_buffer() {
        let mut customer = jane();
        customer.mark_as_synced();

        let events = customer.take_events();
        assert_eq!(events.len(), 2);
        assert!(customer.pending_events().is_empty());
        assert_eq!(customer.committed_event_count(), 2);
    }

    #[test]
    fn events_serialize_with_validated_value_objects() {
        let customer = jane();
        let json = serde_json::to_value(&customer.pending_events()[0]).unwrap();
        assert_eq!(json["CustomerCreated"]["email"], "jane@example.com");
        assert_eq!(json["CustomerCreated"]["name"], "Jane Doe");

        let back: CustomerEvent = serde_json::from_value(json).unwrap();
        assert_eq!(&back, &customer.pending_events()[0]);
    }
}
