//! Value object trait: equality by value, not identity.

/// Marker trait for value objects.
///
/// Value objects are immutable and compared by their attribute values. A return
/// policy term is one: it only exists inside the policy that owns it, and two
/// terms with the same reason, window and shipping rule are interchangeable.
///
/// ```ignore
/// #[derive(Debug, Clone, PartialEq, Eq)]
/// struct Window {
///     days: u32,
///     anchor: WindowAnchor,
/// }
///
/// impl ValueObject for Window {}
/// ```
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}
