//! Binding construction macros.
//!
//! This module provides a declarative macro for building [`Bindings`](crate::models::Bindings)
//! maps inline, so call sites read like the named placeholders they fill.

/// Build a [`Bindings`](crate::models::Bindings) map from `name => value` pairs.
///
/// Each value is converted with `SqlValue::from`, so any type with a `From`
/// conversion can be used directly.
///
/// # Example
///
/// ```
/// use db_access_layer::{bindings, SqlValue};
///
/// let b = bindings! { "id" => 5, "name" => "alice" };
/// assert_eq!(b["id"], SqlValue::Int(5));
/// assert_eq!(b["name"], SqlValue::from("alice"));
/// ```
#[macro_export]
macro_rules! bindings {
    () => {
        $crate::models::Bindings::new()
    };
    ($($name:expr => $value:expr),+ $(,)?) => {{
        let mut map = $crate::models::Bindings::new();
        $(
            map.insert(
                ::std::string::String::from($name),
                $crate::models::SqlValue::from($value),
            );
        )+
        map
    }};
}
