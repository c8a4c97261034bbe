//! Value object trait: equality by value, not identity.
//!
//! Value objects are domain objects that have **no identity** - they are defined entirely
//! by their attribute values. Two value objects with the same values are considered equal.

/// Marker trait for value objects.
///
/// Value objects are **immutable** and **compared by value**. To "modify" one,
/// build a new one through its validating factory (every value object in this
/// workspace exposes a `create` that returns a `DomainResult`).
///
/// ## Value Object vs Entity
///
/// - **Value Object**: No identity (`EmailAddress("jane@example.com")` equals any
///   other `EmailAddress("jane@example.com")`)
/// - **Entity**: Has identity (two utility accounts with the same id are the same
///   account, even if one of them has since been marked as synced)
///
/// The trait requires `Eq + Hash` on top of `Clone + Debug` so value objects can be
/// used as lookup keys (e.g. account numbers within a customer).
pub trait ValueObject: Clone + PartialEq + Eq + core::hash::Hash + core::fmt::Debug {}
