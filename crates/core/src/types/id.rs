//! Newtype IDs for type-safe entity references.
//!
//! Use the `define_id!` macro to create type-safe ID wrappers that prevent
//! accidentally mixing IDs from different entity types. Order and artisan
//! identifiers are opaque strings (e.g. `ORD001`), so the wrappers hold a
//! `String` rather than an integer.

/// Macro to define a type-safe string ID wrapper.
///
/// Creates a newtype wrapper around `String` with:
/// - `Serialize`/`Deserialize` with `#[serde(transparent)]`
/// - `Debug`, `Clone`, `PartialEq`, `Eq`, `Hash`, `PartialOrd`, `Ord`
/// - Conversion methods: `new()`, `as_str()`
/// - `From<&str>`, `From<String>` and `Display` implementations
///
/// # Example
///
/// ```rust
/// # use kalakar_core::define_id;
/// define_id!(ArtisanId);
/// define_id!(OrderId);
///
/// let artisan = ArtisanId::new("artisan-7");
/// let order = OrderId::new("ORD001");
///
/// // These are different types, so this won't compile:
/// // let _: ArtisanId = order;
/// ```
#[macro_export]
macro_rules! define_id {
    ($name:ident) => {
        #[derive(
            Debug,
            Clone,
            PartialEq,
            Eq,
            Hash,
            PartialOrd,
            Ord,
            ::serde::Serialize,
            ::serde::Deserialize
        )]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Create a new ID from any string-like value.
            #[must_use]
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Borrow the underlying identifier.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_owned())
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

define_id!(OrderId);
define_id!(ArtisanId);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_display_and_as_str() {
        let id = OrderId::new("ORD001");
        assert_eq!(id.as_str(), "ORD001");
        assert_eq!(id.to_string(), "ORD001");
    }

    #[test]
    fn test_id_serializes_transparently() {
        let id = ArtisanId::from("artisan-42");
        let json = serde_json::to_string(&id).expect("serialize");
        assert_eq!(json, "\"artisan-42\"");

        let back: ArtisanId = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, id);
    }
}
