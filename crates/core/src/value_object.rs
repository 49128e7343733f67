//! Value object trait: equality by value, not identity.

/// Marker trait for value objects.
///
/// Value objects are immutable and compared by their attribute values. To
/// "modify" one, build a new value. `Quantity` and `Direction` in the
/// inventory crate are the canonical examples.
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}
