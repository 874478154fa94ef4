//! Newtype IDs for type-safe entity references.
//!
//! WooCommerce and CiviCRM both identify records by positive integers, but
//! they live in different id spaces: a WordPress user id and a CiviCRM contact
//! id for the same person are unrelated numbers. The `define_id!` macro keeps
//! them apart at the type level.
//!
//! CiviCRM's APIv3 returns ids as JSON strings (`"id": "12"`) while
//! WooCommerce returns numbers, so every id deserializes from either form.

/// Macro to define a type-safe ID wrapper.
///
/// Creates a newtype wrapper around `i64` with:
/// - `Serialize` as a plain number
/// - `Deserialize` from a number or a numeric string
/// - `Debug`, `Clone`, `Copy`, `PartialEq`, `Eq`, `Hash`, `Ord`
/// - Conversion methods: `new()`, `as_i64()`, `is_set()`
/// - `From<i64>`, `Into<i64>` and `FromStr` implementations
///
/// # Example
///
/// ```rust
/// # use woo_civi_core::define_id;
/// define_id!(UserId);
/// define_id!(ContactId);
///
/// let user_id = UserId::new(1);
/// let contact_id = ContactId::new(1);
///
/// // These are different types, so this won't compile:
/// // let _: UserId = contact_id;
/// ```
#[macro_export]
macro_rules! define_id {
    ($name:ident) => {
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, ::serde::Serialize,
        )]
        #[serde(transparent)]
        pub struct $name(i64);

        impl $name {
            /// Create a new ID from an i64 value.
            #[must_use]
            pub const fn new(id: i64) -> Self {
                Self(id)
            }

            /// Get the underlying i64 value.
            #[must_use]
            pub const fn as_i64(&self) -> i64 {
                self.0
            }

            /// Whether this id refers to a record (remote ids start at 1).
            #[must_use]
            pub const fn is_set(&self) -> bool {
                self.0 > 0
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<i64> for $name {
            fn from(id: i64) -> Self {
                Self(id)
            }
        }

        impl From<$name> for i64 {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl ::core::str::FromStr for $name {
            type Err = ::core::num::ParseIntError;

            fn from_str(s: &str) -> ::core::result::Result<Self, Self::Err> {
                s.trim().parse::<i64>().map(Self)
            }
        }

        impl<'de> ::serde::Deserialize<'de> for $name {
            fn deserialize<D>(deserializer: D) -> ::core::result::Result<Self, D::Error>
            where
                D: ::serde::Deserializer<'de>,
            {
                $crate::types::id::deserialize_lenient_i64(deserializer).map(Self)
            }
        }
    };
}

// WooCommerce ids
define_id!(OrderId);
define_id!(OrderItemId);
define_id!(ProductId);
define_id!(UserId);

// CiviCRM ids
define_id!(ContactId);
define_id!(ContributionId);
define_id!(EmailId);
define_id!(FinancialTypeId);
define_id!(LineItemId);
define_id!(LocationTypeId);
define_id!(PriceFieldId);
define_id!(PriceSetId);

/// Deserialize an integer that may arrive as a JSON number or a numeric string.
///
/// Used by the `define_id!` macro; public so the macro can reach it from other
/// crates.
///
/// # Errors
///
/// Returns an error if the value is neither an integer nor a string holding one.
#[doc(hidden)]
pub fn deserialize_lenient_i64<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: serde::Deserializer<'de>,
{
    struct LenientI64;

    impl serde::de::Visitor<'_> for LenientI64 {
        type Value = i64;

        fn expecting(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
            f.write_str("an integer or a numeric string")
        }

        fn visit_i64<E: serde::de::Error>(self, v: i64) -> Result<i64, E> {
            Ok(v)
        }

        fn visit_u64<E: serde::de::Error>(self, v: u64) -> Result<i64, E> {
            i64::try_from(v).map_err(E::custom)
        }

        fn visit_str<E: serde::de::Error>(self, v: &str) -> Result<i64, E> {
            v.trim().parse().map_err(E::custom)
        }
    }

    deserializer.deserialize_any(LenientI64)
}
