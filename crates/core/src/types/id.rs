//! Identifier types for cart and catalog entities.
//!
//! Two kinds of ids live here:
//!
//! - [`CatalogId`] - the string form of a numeric catalog item id, optionally
//!   carrying a `-sample` suffix that marks a sample-size variant of the same
//!   item. Carts are unique by this id.
//! - `UserId` - the numeric account id that keys the remote cart store,
//!   defined via the `define_id!` macro.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Macro to define a type-safe numeric ID wrapper.
///
/// Creates a newtype wrapper around `i32` with:
/// - `Serialize`/`Deserialize` with `#[serde(transparent)]`
/// - `Debug`, `Clone`, `Copy`, `PartialEq`, `Eq`, `Hash`
/// - Conversion methods: `new()`, `as_i32()`
/// - `From<i32>` and `Into<i32>` implementations
/// - `sqlx` `Type`, `Encode`, and `Decode` implementations (with `postgres` feature)
#[macro_export]
macro_rules! define_id {
    ($name:ident) => {
        #[derive(
            Debug,
            Clone,
            Copy,
            PartialEq,
            Eq,
            Hash,
            ::serde::Serialize,
            ::serde::Deserialize
        )]
        #[serde(transparent)]
        pub struct $name(i32);

        impl $name {
            /// Create a new ID from an i32 value.
            #[must_use]
            pub const fn new(id: i32) -> Self {
                Self(id)
            }

            /// Get the underlying i32 value.
            #[must_use]
            pub const fn as_i32(&self) -> i32 {
                self.0
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<i32> for $name {
            fn from(id: i32) -> Self {
                Self(id)
            }
        }

        impl From<$name> for i32 {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        #[cfg(feature = "postgres")]
        impl ::sqlx::Type<::sqlx::Postgres> for $name {
            fn type_info() -> ::sqlx::postgres::PgTypeInfo {
                <i32 as ::sqlx::Type<::sqlx::Postgres>>::type_info()
            }

            fn compatible(ty: &::sqlx::postgres::PgTypeInfo) -> bool {
                <i32 as ::sqlx::Type<::sqlx::Postgres>>::compatible(ty)
            }
        }

        #[cfg(feature = "postgres")]
        impl<'r> ::sqlx::Decode<'r, ::sqlx::Postgres> for $name {
            fn decode(
                value: ::sqlx::postgres::PgValueRef<'r>,
            ) -> ::core::result::Result<Self, ::sqlx::error::BoxDynError> {
                let id = <i32 as ::sqlx::Decode<::sqlx::Postgres>>::decode(value)?;
                Ok(Self(id))
            }
        }

        #[cfg(feature = "postgres")]
        impl ::sqlx::Encode<'_, ::sqlx::Postgres> for $name {
            fn encode_by_ref(
                &self,
                buf: &mut ::sqlx::postgres::PgArgumentBuffer,
            ) -> ::std::result::Result<::sqlx::encode::IsNull, ::sqlx::error::BoxDynError> {
                <i32 as ::sqlx::Encode<::sqlx::Postgres>>::encode_by_ref(&self.0, buf)
            }
        }
    };
}

define_id!(UserId);

/// The id of a catalog item as carried on a cart line.
///
/// Stored as the string form of the numeric catalog id. A `-sample` suffix
/// marks the sample-size variant of the same catalog item; the full-size and
/// sample variants are distinct cart lines.
///
/// Remote rows and older local carts sometimes carry the id as a raw number
/// instead of a string; [`CatalogId::from_numeric`] is the single place where
/// that is normalized to the stable string form.
///
/// ## Examples
///
/// ```
/// use calder_core::CatalogId;
///
/// let full = CatalogId::from_numeric(42);
/// let sample = full.sample_variant();
///
/// assert_eq!(full.as_str(), "42");
/// assert_eq!(sample.as_str(), "42-sample");
/// assert!(sample.is_sample());
/// assert_eq!(sample.base_id(), "42");
/// assert_ne!(full, sample);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct CatalogId(String);

impl CatalogId {
    /// Suffix marking the sample-size variant of a catalog item.
    pub const SAMPLE_SUFFIX: &'static str = "-sample";

    /// Create a `CatalogId` from an already-normalized string.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Normalize a raw numeric catalog id to its stable string form.
    #[must_use]
    pub fn from_numeric(id: i64) -> Self {
        Self(id.to_string())
    }

    /// The sample-size variant of this catalog item.
    ///
    /// Idempotent: the sample variant of a sample id is itself.
    #[must_use]
    pub fn sample_variant(&self) -> Self {
        if self.is_sample() {
            self.clone()
        } else {
            Self(format!("{}{}", self.0, Self::SAMPLE_SUFFIX))
        }
    }

    /// Whether this id refers to a sample-size variant.
    #[must_use]
    pub fn is_sample(&self) -> bool {
        self.0.ends_with(Self::SAMPLE_SUFFIX)
    }

    /// The id of the underlying catalog item, with any sample suffix removed.
    #[must_use]
    pub fn base_id(&self) -> &str {
        self.0
            .strip_suffix(Self::SAMPLE_SUFFIX)
            .unwrap_or(self.0.as_str())
    }

    /// Returns the id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the `CatalogId` and returns its inner string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for CatalogId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for CatalogId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

impl From<String> for CatalogId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl AsRef<str> for CatalogId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_from_numeric() {
        assert_eq!(CatalogId::from_numeric(7).as_str(), "7");
        assert_eq!(CatalogId::from_numeric(123_456).as_str(), "123456");
    }

    #[test]
    fn test_sample_variant() {
        let id = CatalogId::from_numeric(7);
        let sample = id.sample_variant();
        assert_eq!(sample.as_str(), "7-sample");
        assert!(sample.is_sample());
        assert!(!id.is_sample());
    }

    #[test]
    fn test_sample_variant_idempotent() {
        let sample = CatalogId::new("7-sample");
        assert_eq!(sample.sample_variant(), sample);
    }

    #[test]
    fn test_base_id() {
        assert_eq!(CatalogId::new("7-sample").base_id(), "7");
        assert_eq!(CatalogId::new("7").base_id(), "7");
    }

    #[test]
    fn test_full_and_sample_are_distinct() {
        let full = CatalogId::from_numeric(7);
        assert_ne!(full, full.sample_variant());
    }

    #[test]
    fn test_serde_transparent() {
        let id = CatalogId::new("42-sample");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"42-sample\"");

        let parsed: CatalogId = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, id);
    }

    #[test]
    fn test_user_id() {
        let id = UserId::new(9);
        assert_eq!(id.as_i32(), 9);
        assert_eq!(format!("{id}"), "9");
    }
}
