//! Ready-made LDC account queries.

use chrono::{DateTime, Utc};

use crmsync_core::{AggregateRoot, BaseSpecification, LdcProvider, TenantId};

use crate::ldc_account::LdcAccount;

pub fn ldc_accounts_by_tenant(tenant_id: TenantId) -> BaseSpecification<LdcAccount> {
    BaseSpecification::new().where_(move |a: &LdcAccount| a.tenant_id() == tenant_id)
}

pub fn ldc_accounts_by_provider(
    tenant_id: TenantId,
    provider: LdcProvider,
) -> BaseSpecification<LdcAccount> {
    BaseSpecification::new()
        .where_(move |a: &LdcAccount| a.tenant_id() == tenant_id && a.provider() == provider)
}

/// Accounts a sync worker may pick up (enabled, credentials present).
pub fn ldc_accounts_ready_for_sync(tenant_id: TenantId) -> BaseSpecification<LdcAccount> {
    BaseSpecification::new()
        .where_(move |a: &LdcAccount| a.tenant_id() == tenant_id && a.is_ready_for_sync())
}

/// Ready accounts whose next cycle is due at or before `now`.
pub fn ldc_accounts_due_for_sync(
    tenant_id: TenantId,
    now: DateTime<Utc>,
) -> BaseSpecification<LdcAccount> {
    BaseSpecification::new().where_(move |a: &LdcAccount| {
        a.tenant_id() == tenant_id
            && a.is_ready_for_sync()
            && a.next_sync_due_at().is_some_and(|due| due <= now)
    })
}
