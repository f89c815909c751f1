use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sqlx::{types::Json, FromRow};
use std::str::FromStr;
use utoipa::ToSchema;

use crate::types::{AuditLogId, UserId};

/// Before/after image of a row: a JSON object keyed by column name.
pub type Snapshot = Map<String, Value>;

/// Tables whose mutations are recorded in the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "TEXT", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum AuditTable {
    PurchaseOrders,
    Invoices,
    Sites,
    Locations,
    Stages,
    Suppliers,
    Users,
}

impl AuditTable {
    pub const ALL: [AuditTable; 7] = [
        AuditTable::PurchaseOrders,
        AuditTable::Invoices,
        AuditTable::Sites,
        AuditTable::Locations,
        AuditTable::Stages,
        AuditTable::Suppliers,
        AuditTable::Users,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AuditTable::PurchaseOrders => "purchase_orders",
            AuditTable::Invoices => "invoices",
            AuditTable::Sites => "sites",
            AuditTable::Locations => "locations",
            AuditTable::Stages => "stages",
            AuditTable::Suppliers => "suppliers",
            AuditTable::Users => "users",
        }
    }
}

impl FromStr for AuditTable {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AuditTable::ALL
            .into_iter()
            .find(|table| table.as_str() == s)
            .ok_or(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "TEXT", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum AuditAction {
    Create,
    Update,
    Delete,
    Merge,
    Cancel,
    Login,
}

impl AuditAction {
    pub const ALL: [AuditAction; 6] = [
        AuditAction::Create,
        AuditAction::Update,
        AuditAction::Delete,
        AuditAction::Merge,
        AuditAction::Cancel,
        AuditAction::Login,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AuditAction::Create => "CREATE",
            AuditAction::Update => "UPDATE",
            AuditAction::Delete => "DELETE",
            AuditAction::Merge => "MERGE",
            AuditAction::Cancel => "CANCEL",
            AuditAction::Login => "LOGIN",
        }
    }
}

impl FromStr for AuditAction {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AuditAction::ALL
            .into_iter()
            .find(|action| action.as_str() == s)
            .ok_or(())
    }
}

/// Ledger row. Written once, never updated.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct AuditLog {
    pub id: AuditLogId,
    pub table_name: AuditTable,
    pub record_id: i64,
    pub action: AuditAction,
    pub old_values: Option<Json<Snapshot>>,
    pub new_values: Option<Json<Snapshot>>,
    pub performed_by: UserId,
    pub performed_by_name: String,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Values for a ledger insert; `id` and `created_at` come from the database.
#[derive(Debug, Clone, PartialEq)]
pub struct NewAuditLog {
    pub table_name: AuditTable,
    pub record_id: i64,
    pub action: AuditAction,
    pub old_values: Option<Snapshot>,
    pub new_values: Option<Snapshot>,
    pub performed_by: UserId,
    pub performed_by_name: String,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AuditLogResponse {
    pub id: AuditLogId,
    pub table_name: AuditTable,
    pub record_id: i64,
    pub action: AuditAction,
    #[schema(value_type = Option<Object>)]
    pub old_values: Option<Snapshot>,
    #[schema(value_type = Option<Object>)]
    pub new_values: Option<Snapshot>,
    pub performed_by: UserId,
    pub performed_by_name: String,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<AuditLog> for AuditLogResponse {
    fn from(log: AuditLog) -> Self {
        Self {
            id: log.id,
            table_name: log.table_name,
            record_id: log.record_id,
            action: log.action,
            old_values: log.old_values.map(|value| value.0),
            new_values: log.new_values.map(|value| value.0),
            performed_by: log.performed_by,
            performed_by_name: log.performed_by_name,
            ip_address: log.ip_address,
            user_agent: log.user_agent,
            created_at: log.created_at,
        }
    }
}
