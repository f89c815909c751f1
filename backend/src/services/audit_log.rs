//! Audit ledger: the single write path for audit records, plus the paginated
//! read path the admin console uses.

use serde::Serialize;
use serde_json::Value;
use sqlx::{PgConnection, PgPool};

use crate::{
    error::AppError,
    models::{
        actor::Actor,
        audit_log::{AuditAction, AuditLog, AuditLogResponse, AuditTable, NewAuditLog, Snapshot},
        user::User,
    },
    repositories::{
        audit_log::{self as audit_log_repo, AuditLogFilters},
        transaction::{begin_read_snapshot, begin_transaction, commit_transaction},
    },
    types::AuditLogId,
    utils::pagination::{PageRequest, Pagination},
};

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum AuditEntryError {
    #[error("audit record for {table} #{record_id} carries no snapshot")]
    MissingSnapshot { table: &'static str, record_id: i64 },
    #[error("LOGIN audit records carry only new values")]
    LoginWithOldValues,
}

impl From<AuditEntryError> for AppError {
    fn from(err: AuditEntryError) -> Self {
        AppError::Validation(err.to_string())
    }
}

/// What happened to which row. Actor and request metadata are attached when
/// the entry is recorded.
#[derive(Debug, Clone, PartialEq)]
pub struct AuditEntry {
    pub table: AuditTable,
    pub record_id: i64,
    pub action: AuditAction,
    pub old_values: Option<Snapshot>,
    pub new_values: Option<Snapshot>,
}

impl AuditEntry {
    pub fn created(table: AuditTable, record_id: i64, new_values: Snapshot) -> Self {
        Self {
            table,
            record_id,
            action: AuditAction::Create,
            old_values: None,
            new_values: Some(new_values),
        }
    }

    pub fn updated(table: AuditTable, record_id: i64, old: Snapshot, new: Snapshot) -> Self {
        Self {
            table,
            record_id,
            action: AuditAction::Update,
            old_values: Some(old),
            new_values: Some(new),
        }
    }

    pub fn deleted(table: AuditTable, record_id: i64, old_values: Snapshot) -> Self {
        Self {
            table,
            record_id,
            action: AuditAction::Delete,
            old_values: Some(old_values),
            new_values: None,
        }
    }

    pub fn cancelled(table: AuditTable, record_id: i64, old: Snapshot, new: Snapshot) -> Self {
        Self {
            table,
            record_id,
            action: AuditAction::Cancel,
            old_values: Some(old),
            new_values: Some(new),
        }
    }

    /// `record_id` is the surviving entity; `source` is the merged-away row.
    pub fn merged(table: AuditTable, record_id: i64, source: Snapshot, target: Snapshot) -> Self {
        Self {
            table,
            record_id,
            action: AuditAction::Merge,
            old_values: Some(source),
            new_values: Some(target),
        }
    }

    pub fn validate(&self) -> Result<(), AuditEntryError> {
        if self.action == AuditAction::Login {
            if self.old_values.is_some() {
                return Err(AuditEntryError::LoginWithOldValues);
            }
            if self.new_values.is_none() {
                return Err(AuditEntryError::MissingSnapshot {
                    table: self.table.as_str(),
                    record_id: self.record_id,
                });
            }
            return Ok(());
        }
        if self.old_values.is_none() && self.new_values.is_none() {
            return Err(AuditEntryError::MissingSnapshot {
                table: self.table.as_str(),
                record_id: self.record_id,
            });
        }
        Ok(())
    }

    fn into_new_log(self, actor: &Actor) -> NewAuditLog {
        NewAuditLog {
            table_name: self.table,
            record_id: self.record_id,
            action: self.action,
            old_values: self.old_values,
            new_values: self.new_values,
            performed_by: actor.id,
            performed_by_name: actor.name.clone(),
            ip_address: actor.meta.ip_address.clone(),
            user_agent: actor.meta.user_agent.clone(),
        }
    }
}

/// Serializes a model into a column-keyed snapshot.
pub fn snapshot<T: Serialize>(value: &T) -> Result<Snapshot, AppError> {
    match serde_json::to_value(value) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(other) => Err(AppError::Storage(anyhow::anyhow!(
            "snapshot must serialize to a JSON object, got {}",
            json_kind(&other)
        ))),
        Err(err) => Err(AppError::Storage(err.into())),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Appends one record on the caller's transaction. If that transaction rolls
/// back, the record goes with it.
pub async fn record(
    conn: &mut PgConnection,
    entry: AuditEntry,
    actor: &Actor,
) -> Result<AuditLog, AppError> {
    entry.validate()?;
    let log = entry.into_new_log(actor);
    let stored = audit_log_repo::insert_audit_log(conn, &log)
        .await
        .map_err(|e| AppError::Storage(e.into()))?;
    tracing::debug!(
        audit_log_id = %stored.id,
        table = stored.table_name.as_str(),
        record_id = stored.record_id,
        action = stored.action.as_str(),
        performed_by = %stored.performed_by,
        "audit record written"
    );
    Ok(stored)
}

/// Records a successful sign-in for the authenticating component.
pub async fn record_login(pool: &PgPool, actor: &Actor, user: &User) -> Result<AuditLog, AppError> {
    let mut new_values = Snapshot::new();
    new_values.insert("username".into(), Value::String(user.username.clone()));
    new_values.insert("full_name".into(), Value::String(user.full_name.clone()));
    let entry = AuditEntry {
        table: AuditTable::Users,
        record_id: user.id.get(),
        action: AuditAction::Login,
        old_values: None,
        new_values: Some(new_values),
    };

    let mut tx = begin_transaction(pool).await?;
    let stored = record(&mut tx, entry, actor).await?;
    commit_transaction(tx).await?;
    Ok(stored)
}

#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct AuditLogPage {
    pub data: Vec<AuditLogResponse>,
    pub pagination: Pagination,
}

pub async fn query(
    pool: &PgPool,
    filters: &AuditLogFilters,
    page: PageRequest,
) -> Result<AuditLogPage, AppError> {
    let mut tx = begin_read_snapshot(pool).await?;
    let (items, total) =
        audit_log_repo::list_audit_logs(&mut tx, filters, page.limit, page.offset())
            .await
            .map_err(|e| AppError::Storage(e.into()))?;
    commit_transaction(tx).await?;
    Ok(AuditLogPage {
        data: items.into_iter().map(AuditLogResponse::from).collect(),
        pagination: Pagination::new(page, total),
    })
}

pub async fn fetch(pool: &PgPool, id: AuditLogId) -> Result<AuditLog, AppError> {
    audit_log_repo::fetch_audit_log(pool, id)
        .await
        .map_err(|e| AppError::Storage(e.into()))?
        .ok_or_else(|| AppError::NotFound(format!("Audit log {} not found", id)))
}
