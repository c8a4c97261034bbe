//! Customers domain: the `Customer` aggregate, its utility accounts and the
//! value objects they are built from.
//!
//! Pure domain logic (no IO, no storage). Mutations buffer `CustomerEvent`s
//! that the caller drains after a successful save.

pub mod customer;
pub mod specifications;
pub mod utility_account;
pub mod value_objects;

pub use customer::{
    ALL_ACCOUNTS_FAILED, Customer, CustomerContactInfoUpdated, CustomerCreated, CustomerEvent,
    CustomerRenamed, CustomerSyncFailed, CustomerSynced, UtilityAccountAdded,
    UtilityAccountRemoved,
};
pub use utility_account::UtilityAccount;
pub use value_objects::{
    AccountNumber, Address, CustomerName, EmailAddress, MeterNumber, PhoneNumber,
};
