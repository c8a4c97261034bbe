//! Entity trait: identity + continuity across state changes.

/// Entity marker + minimal interface.
///
/// Two entities are the same entity when their identifiers are equal, no
/// matter how the rest of their state differs. Use [`same_identity`] instead of
/// `==` when that is the question being asked.
pub trait Entity {
    /// Strongly-typed entity identifier.
    type Id: Clone + Eq + core::hash::Hash + core::fmt::Debug;

    /// Returns the entity identifier.
    fn id(&self) -> &Self::Id;
}

/// Identity equality for entities.
pub fn same_identity<E: Entity>(a: &E, b: &E) -> bool {
    a.id() == b.id()
}
