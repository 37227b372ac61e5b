//! Value object trait: equality by value, not identity.

/// Marker trait for immutable domain values compared by their attributes.
///
/// Configuration snapshots (expiry policies, purchase line references) are
/// value objects: two with the same attribute values are interchangeable.
/// To "modify" one, build a new value.
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}
