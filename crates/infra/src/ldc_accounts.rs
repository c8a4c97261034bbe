//! Enrolment of LDC portal accounts.
//!
//! New accounts without an explicit sync configuration get the configured
//! default ([`InfraConfig::default_sync`]) instead of the built-in preset.

use thiserror::Error;
use tracing::debug;

use crmsync_core::{AggregateRoot, DomainError, LdcProvider, TenantId};
use crmsync_events::{DispatchReport, EventDispatcher};
use crmsync_ldc::{LdcAccount, LdcAccountEvent, SyncConfiguration};

use crate::config::InfraConfig;
use crate::repository::Repository;
use crate::store::{AggregateStore, StoreError};

#[derive(Debug, Error)]
pub enum EnrolmentError {
    #[error("ldc account rejected: {0}")]
    Rejected(#[from] DomainError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Creates LDC accounts and saves them through an [`AggregateStore`].
#[derive(Debug)]
pub struct LdcAccountEnrolment<R, D> {
    store: AggregateStore<LdcAccount, R, D>,
    default_sync: SyncConfiguration,
}

impl<R, D> LdcAccountEnrolment<R, D> {
    pub fn new(store: AggregateStore<LdcAccount, R, D>, default_sync: SyncConfiguration) -> Self {
        Self {
            store,
            default_sync,
        }
    }

    pub fn from_config(config: &InfraConfig, store: AggregateStore<LdcAccount, R, D>) -> Self {
        Self::new(store, config.default_sync)
    }

    pub fn default_sync(&self) -> SyncConfiguration {
        self.default_sync
    }

    pub fn store(&self) -> &AggregateStore<LdcAccount, R, D> {
        &self.store
    }
}

impl<R, D> LdcAccountEnrolment<R, D>
where
    R: Repository<LdcAccount>,
    D: EventDispatcher<LdcAccountEvent>,
{
    /// Create and persist an account. `sync_configuration` overrides the
    /// configured default.
    pub fn enrol(
        &self,
        tenant_id: TenantId,
        provider: LdcProvider,
        account_name: &str,
        username: &str,
        encrypted_password: &str,
        sync_configuration: Option<SyncConfiguration>,
    ) -> Result<(LdcAccount, DispatchReport), EnrolmentError> {
        let mut account = LdcAccount::create(
            tenant_id,
            provider,
            account_name,
            username,
            encrypted_password,
            Some(sync_configuration.unwrap_or(self.default_sync)),
        )?;
        let report = self.store.save_new(&mut account)?;
        debug!(
            tenant = %account.tenant_id(),
            provider = %provider,
            sync_enabled = account.sync_configuration().is_enabled(),
            "enrolled ldc account"
        );
        Ok((account, report))
    }
}
