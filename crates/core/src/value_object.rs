//! Value object trait: equality by value, not identity.

/// Marker trait for value objects.
///
/// Value objects are immutable and compared by their attribute values; two
/// value objects with the same values are the same value. To "modify" one,
/// construct a new one.
///
/// ## Value Object vs Entity
///
/// - **Value Object**: no identity (`Shortfall`, `OrderLine`)
/// - **Entity**: has identity (`Order`, `Customer`)
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}
