//! `crmsync-core`: domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns):
//! the outcome/error type, identifiers, entity and aggregate-root traits, the
//! shared sync status, and the specification engine used to express queries.

pub mod aggregate;
pub mod entity;
pub mod error;
pub mod id;
pub mod provider;
pub mod specification;
pub mod sync;
pub mod value_object;

pub use aggregate::{AggregateRoot, EventBuffer};
pub use entity::{Entity, same_identity};
pub use error::{DomainError, DomainResult};
pub use id::{CustomerId, LdcAccountId, TenantId, UtilityAccountId};
pub use provider::LdcProvider;
pub use specification::{
    AndSpecification, BaseSpecification, Criteria, Include, NotSpecification, OrSpecification,
    Specification, SpecificationExt,
};
pub use sync::SyncStatus;
pub use value_object::ValueObject;
