//! Typed record identifiers.
//!
//! Ids are assigned by the owning service's store and are plain positive
//! integers on the wire. Wrapping them keeps a user id from being passed
//! where a catalog item id is expected.

use std::num::ParseIntError;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

macro_rules! record_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(i64);

        impl $name {
            /// Wraps a raw id value.
            pub const fn new(id: i64) -> Self {
                Self(id)
            }

            /// Returns the raw id value.
            pub const fn as_i64(&self) -> i64 {
                self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
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

        impl FromStr for $name {
            type Err = ParseIntError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                s.trim().parse::<i64>().map(Self)
            }
        }
    };
}

record_id!(
    /// Identifier of a user owned by the user authority.
    UserId
);

record_id!(
    /// Identifier of a catalog item owned by the catalog authority.
    CatalogItemId
);

record_id!(
    /// Identifier of an order owned by the order service.
    OrderId
);
