//! Value object marker: equality by value, not identity.

/// Marker trait for value objects.
///
/// Form records embedded in a draft (owner, address, vehicle data) have no
/// lifecycle of their own; two records with the same fields are the same
/// value. Implementors are immutable from the domain's point of view: a step
/// replaces a slice wholesale instead of patching it.
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}
