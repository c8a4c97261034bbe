//! LDC (local distribution company) accounts: the credentials and sync policy a
//! tenant holds for one utility provider portal.
//!
//! Pure domain logic. Passwords arrive already encrypted and never leave the
//! aggregate through events or formatting.

pub mod ldc_account;
pub mod password;
pub mod specifications;
pub mod sync_configuration;

pub use ldc_account::{
    LdcAccount, LdcAccountCreated, LdcAccountCredentialsUpdated, LdcAccountEvent,
    LdcAccountSyncConfigurationUpdated, LdcAccountSyncDisabled, LdcAccountSyncEnabled,
    LdcAccountSyncFailed, LdcAccountSynced,
};
pub use password::EncryptedPassword;
pub use sync_configuration::SyncConfiguration;
