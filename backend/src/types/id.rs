//! Typed ID wrappers for compile-time type safety.
//!
//! Every table uses a `BIGSERIAL` key; these wrappers keep a location id from
//! being passed where a stage id is expected.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::num::ParseIntError;
use std::str::FromStr;
use utoipa::ToSchema;

/// Macro to generate typed ID wrappers with common trait implementations.
macro_rules! typed_id {
    ($name:ident, $doc:literal) => {
        #[doc = $doc]
        #[derive(
            Debug,
            Clone,
            Copy,
            PartialEq,
            Eq,
            PartialOrd,
            Ord,
            Hash,
            Serialize,
            Deserialize,
            sqlx::Type,
            ToSchema,
        )]
        #[serde(transparent)]
        #[sqlx(transparent)]
        pub struct $name(i64);

        impl $name {
            /// Wraps a raw database key.
            pub const fn new(value: i64) -> Self {
                Self(value)
            }

            /// Returns the raw database key.
            pub const fn get(self) -> i64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = ParseIntError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                s.trim().parse::<i64>().map(Self)
            }
        }

        impl From<i64> for $name {
            fn from(value: i64) -> Self {
                Self(value)
            }
        }

        impl From<$name> for i64 {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

typed_id!(UserId, "Unique identifier for a user.");
typed_id!(PurchaseOrderId, "Unique identifier for a purchase order.");
typed_id!(InvoiceId, "Unique identifier for an invoice.");
typed_id!(SiteId, "Unique identifier for a construction site.");
typed_id!(LocationId, "Unique identifier for a location within a site.");
typed_id!(StageId, "Unique identifier for a project stage.");
typed_id!(SupplierId, "Unique identifier for a supplier.");
typed_id!(AuditLogId, "Unique identifier for an audit log entry.");
