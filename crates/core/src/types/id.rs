//! Newtype IDs for type-safe entity references.
//!
//! Wix identifies every entity with an opaque string (usually a GUID). Use the
//! `define_id!` macro to wrap those strings so IDs from different entity types
//! cannot be mixed up.

/// Macro to define a type-safe, string-backed ID wrapper.
///
/// Creates a newtype wrapper around `String` with:
/// - `Serialize`/`Deserialize` with `#[serde(transparent)]`
/// - `Debug`, `Clone`, `PartialEq`, `Eq`, `Hash`
/// - `new()`, `as_str()`, `into_inner()`
/// - `Display`, `From<String>`, `From<&str>`
///
/// # Example
///
/// ```rust
/// # use mon_core::define_id;
/// define_id!(ShirtId);
/// define_id!(SockId);
///
/// let shirt = ShirtId::new("b6c1e9f0");
/// assert_eq!(shirt.as_str(), "b6c1e9f0");
///
/// // These are different types, so this won't compile:
/// // let _: SockId = shirt;
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

            /// Get the underlying string.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consume the ID and return the inner string.
            #[must_use]
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_owned())
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

define_id!(ProductId);
define_id!(VariantId);
define_id!(LineItemId);
define_id!(CollectionId);
define_id!(MemberId);
define_id!(ContactId);
define_id!(OrderId);
define_id!(CheckoutId);

impl VariantId {
    /// Variant ID Wix uses for products without option choices.
    pub const DEFAULT: &'static str = "00000000-0000-0000-0000-000000000000";

    /// Whether this is the placeholder variant of a product with no options.
    #[must_use]
    pub fn is_default(&self) -> bool {
        self.0 == Self::DEFAULT
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_id_serializes_as_plain_string() {
        let id = ProductId::new("df19c1f7-07d8-a265-42f8-e8dfa824cc6e");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"df19c1f7-07d8-a265-42f8-e8dfa824cc6e\"");

        let back: ProductId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn test_default_variant() {
        assert!(VariantId::new(VariantId::DEFAULT).is_default());
        assert!(!VariantId::new("a1b2").is_default());
    }

    #[test]
    fn test_display() {
        let id = LineItemId::from("line-1");
        assert_eq!(id.to_string(), "line-1");
    }
}
