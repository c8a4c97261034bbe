//! Ready-made customer queries.
//!
//! Every query is tenant-scoped and eager-loads the utility accounts, so a
//! store can return fully hydrated aggregates.

use crmsync_core::{AggregateRoot, BaseSpecification, Include, SyncStatus, TenantId};

use crate::customer::Customer;
use crate::value_objects::EmailAddress;

/// Eager-load selector for a customer's utility accounts.
pub const UTILITY_ACCOUNTS: Include<Customer> = Include::new("utility_accounts");

/// All customers of a tenant.
pub fn customers_by_tenant(tenant_id: TenantId) -> BaseSpecification<Customer> {
    BaseSpecification::new()
        .where_(move |c: &Customer| c.tenant_id() == tenant_id)
        .include(UTILITY_ACCOUNTS)
}

pub fn customers_with_sync_status(
    tenant_id: TenantId,
    status: SyncStatus,
) -> BaseSpecification<Customer> {
    BaseSpecification::new()
        .where_(move |c: &Customer| c.tenant_id() == tenant_id && c.sync_status() == status)
        .include(UTILITY_ACCOUNTS)
}

/// Customers with at least one utility account in `Failed`.
pub fn customers_with_failed_accounts(tenant_id: TenantId) -> BaseSpecification<Customer> {
    BaseSpecification::new()
        .where_(move |c: &Customer| c.tenant_id() == tenant_id && c.failed_account_count() > 0)
        .include(UTILITY_ACCOUNTS)
        .include_path("utility_accounts.service_address")
}

pub fn customer_by_email(tenant_id: TenantId, email: &EmailAddress) -> BaseSpecification<Customer> {
    let email = email.clone();
    BaseSpecification::new()
        .where_(move |c: &Customer| c.tenant_id() == tenant_id && *c.email() == email)
        .include(UTILITY_ACCOUNTS)
}

#[cfg(test)]
mod tests {
    use crmsync_core::{LdcProvider, Specification, SpecificationExt};

    use super::*;
    use crate::value_objects::{AccountNumber, CustomerName};

    fn customer(tenant_id: TenantId, email: &str) -> Customer {
        Customer::create(
            tenant_id,
            CustomerName::create("Test Customer").unwrap(),
            EmailAddress::create(email).unwrap(),
            None,
            None,
        )
    }

    #[test]
    fn tenant_scope_excludes_other_tenants() {
        let tenant = TenantId::new();
        let ours = customer(tenant, "a@example.com");
        let theirs = customer(TenantId::new(), "a@example.com");

        let spec = customers_by_tenant(tenant);
        assert!(spec.is_satisfied_by(&ours));
        assert!(!spec.is_satisfied_by(&theirs));
        assert_eq!(spec.includes(), &[UTILITY_ACCOUNTS]);
    }

    #[test]
    fn email_lookup_is_case_insensitive_through_normalization() {
        let tenant = TenantId::new();
        let jane = customer(tenant, "jane@example.com");
        let spec = customer_by_email(tenant, &EmailAddress::create("JANE@Example.com").unwrap());
        assert!(spec.is_satisfied_by(&jane));
    }

    #[test]
    fn failed_accounts_and_status_queries_compose() {
        let tenant = TenantId::new();
        let mut failing = customer(tenant, "f@example.com");
        let id = failing
            .add_utility_account(AccountNumber::create("F-1").unwrap(), LdcProvider::Duke, None, None)
            .unwrap()
            .id_typed();
        failing.mark_utility_account_sync_as_failed(id, "locked out").unwrap();

        let mut synced = customer(tenant, "s@example.com");
        synced.mark_as_synced();

        let pending = customer(tenant, "p@example.com");

        let all = [failing, synced, pending];
        let with_failures = customers_with_failed_accounts(tenant);
        assert_eq!(with_failures.filter(all.iter()).len(), 1);

        let not_synced = customers_with_sync_status(tenant, SyncStatus::Synced).not();
        let matched = customers_by_tenant(tenant).and(&not_synced).filter(all.iter());
        let emails: Vec<&str> = matched.iter().map(|c| c.email().as_str()).collect();
        assert_eq!(emails, vec!["f@example.com", "p@example.com"]);
    }
}
