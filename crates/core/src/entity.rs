//! Entity trait: identity + continuity across state changes.

/// Entity marker + minimal interface.
///
/// Used for objects that live inside an aggregate and are addressed by a
/// local identifier (e.g. order lines and receipt lines by line number).
pub trait Entity {
    /// Strongly-typed entity identifier.
    type Id: Clone + Eq + core::hash::Hash + core::fmt::Debug;

    /// Returns the entity identifier.
    fn id(&self) -> &Self::Id;
}
