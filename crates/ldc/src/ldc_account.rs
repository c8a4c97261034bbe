use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

use crmsync_core::{
    AggregateRoot, DomainResult, Entity, EventBuffer, LdcAccountId, LdcProvider, SyncStatus,
    TenantId,
};
use crmsync_events::Event;

use crate::password::EncryptedPassword;
use crate::sync_configuration::SyncConfiguration;

pub const ACCOUNT_NAME_MAX_LEN: usize = 200;
pub const USERNAME_MAX_LEN: usize = 100;

pub mod errors {
    use crmsync_core::DomainError;

    pub const INVALID_ACCOUNT_NAME: &str = "LdcAccount.InvalidAccountName";
    pub const ACCOUNT_NAME_TOO_LONG: &str = "LdcAccount.AccountNameTooLong";
    pub const INVALID_USERNAME: &str = "LdcAccount.InvalidUsername";
    pub const USERNAME_TOO_LONG: &str = "LdcAccount.UsernameTooLong";
    pub const INVALID_PASSWORD: &str = "LdcAccount.InvalidPassword";
    pub const SYNC_ALREADY_ENABLED: &str = "LdcAccount.SyncAlreadyEnabled";
    pub const SYNC_ALREADY_DISABLED: &str = "LdcAccount.SyncAlreadyDisabled";

    pub(crate) fn invalid_account_name() -> DomainError {
        DomainError::new(INVALID_ACCOUNT_NAME, "account name is required")
    }

    pub(crate) fn account_name_too_long(max: usize) -> DomainError {
        DomainError::new(
            ACCOUNT_NAME_TOO_LONG,
            format!("account name must be at most {max} characters"),
        )
    }

    pub(crate) fn invalid_username() -> DomainError {
        DomainError::new(INVALID_USERNAME, "username is required")
    }

    pub(crate) fn username_too_long(max: usize) -> DomainError {
        DomainError::new(
            USERNAME_TOO_LONG,
            format!("username must be at most {max} characters"),
        )
    }

    pub(crate) fn invalid_password() -> DomainError {
        DomainError::new(INVALID_PASSWORD, "password is required")
    }

    pub(crate) fn sync_already_enabled() -> DomainError {
        DomainError::new(SYNC_ALREADY_ENABLED, "sync is already enabled")
    }

    pub(crate) fn sync_already_disabled() -> DomainError {
        DomainError::new(SYNC_ALREADY_DISABLED, "sync is already disabled")
    }
}

fn validate_account_name(value: &str) -> DomainResult<String> {
    let name = value.trim();
    if name.is_empty() {
        return Err(errors::invalid_account_name());
    }
    if name.chars().count() > ACCOUNT_NAME_MAX_LEN {
        return Err(errors::account_name_too_long(ACCOUNT_NAME_MAX_LEN));
    }
    Ok(name.to_string())
}

fn validate_username(value: &str) -> DomainResult<String> {
    let username = value.trim();
    if username.is_empty() {
        return Err(errors::invalid_username());
    }
    if username.chars().count() > USERNAME_MAX_LEN {
        return Err(errors::username_too_long(USERNAME_MAX_LEN));
    }
    Ok(username.to_string())
}

/// Aggregate root: a tenant's login and sync policy for one utility provider
/// portal.
///
/// Invariants:
/// - account name, username and password are never blank
/// - the sync configuration is always valid (see [`SyncConfiguration::create`])
#[derive(Debug, Clone)]
pub struct LdcAccount {
    id: LdcAccountId,
    tenant_id: TenantId,
    provider: LdcProvider,
    account_name: String,
    username: String,
    encrypted_password: EncryptedPassword,
    sync_configuration: SyncConfiguration,
    sync_status: SyncStatus,
    last_sync_error: Option<String>,
    created_at: DateTime<Utc>,
    modified_at: Option<DateTime<Utc>>,
    last_synced_at: Option<DateTime<Utc>>,
    events: EventBuffer<LdcAccountEvent>,
}

impl LdcAccount {
    /// Register provider credentials for a tenant.
    ///
    /// Validates account name, username and password in that order. Without
    /// an explicit configuration the account gets
    /// [`SyncConfiguration::create_default`]. Raises `LdcAccountCreated`.
    pub fn create(
        tenant_id: TenantId,
        provider: LdcProvider,
        account_name: &str,
        username: &str,
        encrypted_password: &str,
        sync_configuration: Option<SyncConfiguration>,
    ) -> DomainResult<Self> {
        let account_name = validate_account_name(account_name)?;
        let username = validate_username(username)?;
        let encrypted_password = EncryptedPassword::create(encrypted_password)?;
        let sync_configuration = sync_configuration.unwrap_or_default();

        let now = Utc::now();
        let mut account = Self {
            id: LdcAccountId::new(),
            tenant_id,
            provider,
            account_name,
            username,
            encrypted_password,
            sync_configuration,
            sync_status: SyncStatus::Pending,
            last_sync_error: None,
            created_at: now,
            modified_at: None,
            last_synced_at: None,
            events: EventBuffer::new(),
        };

        account.events.record(LdcAccountEvent::LdcAccountCreated(LdcAccountCreated {
            tenant_id,
            ldc_account_id: account.id,
            provider,
            account_name: account.account_name.clone(),
            username: account.username.clone(),
            sync_configuration,
            occurred_at: now,
        }));
        Ok(account)
    }

    pub fn id_typed(&self) -> LdcAccountId {
        self.id
    }

    pub fn provider(&self) -> LdcProvider {
        self.provider
    }

    pub fn account_name(&self) -> &str {
        &self.account_name
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn encrypted_password(&self) -> &EncryptedPassword {
        &self.encrypted_password
    }

    pub fn sync_configuration(&self) -> SyncConfiguration {
        self.sync_configuration
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

    /// Sync may run: enabled, with credentials present (guaranteed non-blank
    /// by construction).
    pub fn is_ready_for_sync(&self) -> bool {
        self.sync_configuration.is_enabled()
            && !self.username.is_empty()
            && !self.encrypted_password.expose_ciphertext().trim().is_empty()
    }

    /// When the next sync cycle is due. `None` while sync is disabled; an
    /// account that never synced is due from its creation.
    pub fn next_sync_due_at(&self) -> Option<DateTime<Utc>> {
        if !self.sync_configuration.is_enabled() {
            return None;
        }
        let Some(last) = self.last_synced_at else {
            return Some(self.created_at);
        };
        let interval = TimeDelta::minutes(i64::from(self.sync_configuration.interval_minutes()));
        Some(last + interval)
    }

    /// Replace the portal credentials. Same validation as [`LdcAccount::create`].
    pub fn update_credentials(&mut self, username: &str, encrypted_password: &str) -> DomainResult<()> {
        let username = validate_username(username)?;
        let encrypted_password = EncryptedPassword::create(encrypted_password)?;

        let now = Utc::now();
        self.username = username;
        self.encrypted_password = encrypted_password;
        self.modified_at = Some(now);
        self.events.record(LdcAccountEvent::LdcAccountCredentialsUpdated(
            LdcAccountCredentialsUpdated {
                tenant_id: self.tenant_id,
                ldc_account_id: self.id,
                username: self.username.clone(),
                occurred_at: now,
            },
        ));
        Ok(())
    }

    pub fn enable_sync(&mut self) -> DomainResult<()> {
        if self.sync_configuration.is_enabled() {
            return Err(errors::sync_already_enabled());
        }
        self.switch_sync(true);
        Ok(())
    }

    pub fn disable_sync(&mut self) -> DomainResult<()> {
        if !self.sync_configuration.is_enabled() {
            return Err(errors::sync_already_disabled());
        }
        self.switch_sync(false);
        Ok(())
    }

    /// Replace the whole configuration.
    ///
    /// An enabled-flag transition raises `LdcAccountSyncEnabled` or
    /// `LdcAccountSyncDisabled` (never both); a change to interval, retries or
    /// timeout raises `LdcAccountSyncConfigurationUpdated`. Replacing a
    /// configuration with an equal one raises nothing.
    pub fn update_sync_configuration(&mut self, configuration: SyncConfiguration) {
        let previous = self.sync_configuration;
        if previous == configuration {
            return;
        }

        let now = Utc::now();
        self.sync_configuration = configuration;
        self.modified_at = Some(now);

        if previous.is_enabled() != configuration.is_enabled() {
            self.record_sync_switch(configuration.is_enabled(), now);
        }
        if !previous.same_policy(&configuration) {
            self.events.record(LdcAccountEvent::LdcAccountSyncConfigurationUpdated(
                LdcAccountSyncConfigurationUpdated {
                    tenant_id: self.tenant_id,
                    ldc_account_id: self.id,
                    sync_configuration: configuration,
                    occurred_at: now,
                },
            ));
        }
    }

    fn switch_sync(&mut self, enabled: bool) {
        let now = Utc::now();
        self.sync_configuration = self.sync_configuration.with_enabled(enabled);
        self.modified_at = Some(now);
        self.record_sync_switch(enabled, now);
    }

    fn record_sync_switch(&mut self, enabled: bool, occurred_at: DateTime<Utc>) {
        let (tenant_id, ldc_account_id) = (self.tenant_id, self.id);
        self.events.record(if enabled {
            LdcAccountEvent::LdcAccountSyncEnabled(LdcAccountSyncEnabled {
                tenant_id,
                ldc_account_id,
                occurred_at,
            })
        } else {
            LdcAccountEvent::LdcAccountSyncDisabled(LdcAccountSyncDisabled {
                tenant_id,
                ldc_account_id,
                occurred_at,
            })
        });
    }

    /// Raises `LdcAccountSynced`.
    pub fn mark_as_synced(&mut self) {
        let now = Utc::now();
        self.sync_status = SyncStatus::Synced;
        self.last_synced_at = Some(now);
        self.last_sync_error = None;
        self.events.record(LdcAccountEvent::LdcAccountSynced(LdcAccountSynced {
            tenant_id: self.tenant_id,
            ldc_account_id: self.id,
            occurred_at: now,
        }));
    }

    /// Raises `LdcAccountSyncFailed`.
    pub fn mark_sync_as_failed(&mut self, reason: impl Into<String>) {
        let reason = reason.into();
        self.sync_status = SyncStatus::Failed;
        self.last_sync_error = Some(reason.clone());
        self.events.record(LdcAccountEvent::LdcAccountSyncFailed(LdcAccountSyncFailed {
            tenant_id: self.tenant_id,
            ldc_account_id: self.id,
            reason,
            occurred_at: Utc::now(),
        }));
    }

    /// No event.
    pub fn mark_sync_as_in_progress(&mut self) {
        self.sync_status = SyncStatus::InProgress;
    }
}

impl Entity for LdcAccount {
    type Id = LdcAccountId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

impl AggregateRoot for LdcAccount {
    type Event = LdcAccountEvent;
    const AGGREGATE_TYPE: &'static str = "ldc_account";

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

// Events never carry the password, encrypted or not.

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LdcAccountCreated {
    pub tenant_id: TenantId,
    pub ldc_account_id: LdcAccountId,
    pub provider: LdcProvider,
    pub account_name: String,
    pub username: String,
    pub sync_configuration: SyncConfiguration,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LdcAccountCredentialsUpdated {
    pub tenant_id: TenantId,
    pub ldc_account_id: LdcAccountId,
    pub username: String,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LdcAccountSyncEnabled {
    pub tenant_id: TenantId,
    pub ldc_account_id: LdcAccountId,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LdcAccountSyncDisabled {
    pub tenant_id: TenantId,
    pub ldc_account_id: LdcAccountId,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LdcAccountSyncConfigurationUpdated {
    pub tenant_id: TenantId,
    pub ldc_account_id: LdcAccountId,
    pub sync_configuration: SyncConfiguration,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LdcAccountSynced {
    pub tenant_id: TenantId,
    pub ldc_account_id: LdcAccountId,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LdcAccountSyncFailed {
    pub tenant_id: TenantId,
    pub ldc_account_id: LdcAccountId,
    pub reason: String,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LdcAccountEvent {
    LdcAccountCreated(LdcAccountCreated),
    LdcAccountCredentialsUpdated(LdcAccountCredentialsUpdated),
    LdcAccountSyncEnabled(LdcAccountSyncEnabled),
    LdcAccountSyncDisabled(LdcAccountSyncDisabled),
    LdcAccountSyncConfigurationUpdated(LdcAccountSyncConfigurationUpdated),
    LdcAccountSynced(LdcAccountSynced),
    LdcAccountSyncFailed(LdcAccountSyncFailed),
}

impl Event for LdcAccountEvent {
    fn event_type(&self) -> &'static str {
        match self {
            LdcAccountEvent::LdcAccountCreated(_) => "ldc.account.created",
            LdcAccountEvent::LdcAccountCredentialsUpdated(_) => "ldc.account.credentials_updated",
            LdcAccountEvent::LdcAccountSyncEnabled(_) => "ldc.account.sync_enabled",
            LdcAccountEvent::LdcAccountSyncDisabled(_) => "ldc.account.sync_disabled",
            LdcAccountEvent::LdcAccountSyncConfigurationUpdated(_) => {
                "ldc.account.sync_configuration_updated"
            }
            LdcAccountEvent::LdcAccountSynced(_) => "ldc.account.synced",
            LdcAccountEvent::LdcAccountSyncFailed(_) => "ldc.account.sync_failed",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            LdcAccountEvent::LdcAccountCreated(e) => e.occurred_at,
            LdcAccountEvent::LdcAccountCredentialsUpdated(e) => e.occurred_at,
            LdcAccountEvent::LdcAccountSyncEnabled(e) => e.occurred_at,
            LdcAccountEvent::LdcAccountSyncDisabled(e) => e.occurred_at,
            LdcAccountEvent::LdcAccountSyncConfigurationUpdated(e) => e.occurred_at,
            LdcAccountEvent::LdcAccountSynced(e) => e.occurred_at,
            LdcAccountEvent::LdcAccountSyncFailed(e) => e.occurred_at,
        }
    }

    fn tenant_id(&self) -> TenantId {
        match self {
            LdcAccountEvent::LdcAccountCreated(e) => e.tenant_id,
            LdcAccountEvent::LdcAccountCredentialsUpdated(e) => e.tenant_id,
            LdcAccountEvent::LdcAccountSyncEnabled(e) => e.tenant_id,
            LdcAccountEvent::LdcAccountSyncDisabled(e) => e.tenant_id,
            LdcAccountEvent::LdcAccountSyncConfigurationUpdated(e) => e.tenant_id,
            LdcAccountEvent::LdcAccountSynced(e) => e.tenant_id,
            LdcAccountEvent::LdcAccountSyncFailed(e) => e.tenant_id,
        }
    }
}
