//! Newtype IDs for type-safe entity references.
//!
//! Identifiers are assigned by the hosted backend (UUID primary keys), so
//! the wrappers only carry and compare them. Use `define_id!` to add more.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Macro to define a type-safe UUID wrapper.
///
/// Creates a newtype wrapper around [`uuid::Uuid`] with:
/// - `Serialize`/`Deserialize` with `#[serde(transparent)]`
/// - `Debug`, `Clone`, `Copy`, `PartialEq`, `Eq`, `Hash`
/// - `new()`, `as_uuid()`, `Display` and `FromStr`
///
/// # Example
///
/// ```rust
/// # use stitchtrack_core::define_id;
/// define_id!(FabricId);
///
/// let id: FabricId = "5f0c3c2e-9a39-4d0e-a3c1-8f0d9a6c1b11".parse().unwrap();
/// assert_eq!(id.to_string(), "5f0c3c2e-9a39-4d0e-a3c1-8f0d9a6c1b11");
/// ```
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
        pub struct $name(::uuid::Uuid);

        impl $name {
            /// Wrap an existing UUID.
            #[must_use]
            pub const fn new(id: ::uuid::Uuid) -> Self {
                Self(id)
            }

            /// Get the underlying UUID.
            #[must_use]
            pub const fn as_uuid(&self) -> &::uuid::Uuid {
                &self.0
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl ::core::str::FromStr for $name {
            type Err = ::uuid::Error;

            fn from_str(s: &str) -> ::core::result::Result<Self, Self::Err> {
                ::uuid::Uuid::parse_str(s).map(Self)
            }
        }

        impl From<::uuid::Uuid> for $name {
            fn from(id: ::uuid::Uuid) -> Self {
                Self(id)
            }
        }
    };
}

define_id!(OrderId);
define_id!(UserId);

/// Sequential, human-facing order number assigned by the backend.
///
/// This is what customers type into the tracking page; the UUID never
/// leaves the admin side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderNumber(i64);

impl OrderNumber {
    /// Create an order number.
    #[must_use]
    pub const fn new(number: i64) -> Self {
        Self(number)
    }

    /// Get the underlying value.
    #[must_use]
    pub const fn as_i64(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for OrderNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for OrderNumber {
    type Err = std::num::ParseIntError;

    /// Accepts `42` as well as the `#42` form printed on receipts.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let digits = trimmed.strip_prefix('#').unwrap_or(trimmed);
        digits.parse::<i64>().map(Self)
    }
}

impl From<i64> for OrderNumber {
    fn from(number: i64) -> Self {
        Self(number)
    }
}
