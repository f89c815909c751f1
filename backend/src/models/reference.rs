//! Reference entities a purchase order points at: sites, locations, stages
//! and suppliers. All four can be merged.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use utoipa::ToSchema;
use validator::Validate;

use crate::models::audit_log::AuditTable;
use crate::types::{LocationId, SiteId, StageId, SupplierId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub enum ReferenceKind {
    #[serde(rename = "sites")]
    Site,
    #[serde(rename = "locations")]
    Location,
    #[serde(rename = "stages")]
    Stage,
    #[serde(rename = "suppliers")]
    Supplier,
}

impl ReferenceKind {
    pub const ALL: [ReferenceKind; 4] = [
        ReferenceKind::Site,
        ReferenceKind::Location,
        ReferenceKind::Stage,
        ReferenceKind::Supplier,
    ];

    pub fn table(&self) -> &'static str {
        match self {
            ReferenceKind::Site => "sites",
            ReferenceKind::Location => "locations",
            ReferenceKind::Stage => "stages",
            ReferenceKind::Supplier => "suppliers",
        }
    }

    pub fn audit_table(&self) -> AuditTable {
        match self {
            ReferenceKind::Site => AuditTable::Sites,
            ReferenceKind::Location => AuditTable::Locations,
            ReferenceKind::Stage => AuditTable::Stages,
            ReferenceKind::Supplier => AuditTable::Suppliers,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ReferenceKind::Site => "Site",
            ReferenceKind::Location => "Location",
            ReferenceKind::Stage => "Stage",
            ReferenceKind::Supplier => "Supplier",
        }
    }
}

impl fmt::Display for ReferenceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.table())
    }
}

/// A `(table, column)` pair holding a foreign key to a reference entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub struct ForeignKeyRef {
    #[schema(value_type = String)]
    pub table: &'static str,
    #[schema(value_type = String)]
    pub column: &'static str,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Site {
    pub id: SiteId,
    pub name: String,
    pub address: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct SitePayload {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    #[validate(length(max = 500))]
    pub address: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Location {
    pub id: LocationId,
    pub site_id: SiteId,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct LocationPayload {
    pub site_id: SiteId,
    #[validate(length(min = 1, max = 200))]
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Stage {
    pub id: StageId,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct StagePayload {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    #[validate(length(max = 1000))]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Supplier {
    pub id: SupplierId,
    pub name: String,
    pub contact_email: Option<String>,
    pub phone: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct SupplierPayload {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    #[validate(email)]
    pub contact_email: Option<String>,
    #[validate(length(max = 50))]
    pub phone: Option<String>,
}
