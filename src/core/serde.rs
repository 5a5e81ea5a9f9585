/// Serde helper functions for custom serialization/deserialization
/// Skip serializing if Option is None (for use with skip_serializing_if)
pub fn is_none<T>(value: &Option<T>) -> bool {
    value.is_none()
}

/// Skip serializing if Vec is empty (for use with skip_serializing_if)
pub fn is_empty_vec<T>(value: &[T]) -> bool {
    value.is_empty()
}

/// Skip serializing if value is false
pub fn is_false(value: &bool) -> bool {
    !(*value)
}
