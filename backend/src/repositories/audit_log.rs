//! Ledger storage. Only inserts and reads exist here; the table itself rejects
//! UPDATE and DELETE.

use sqlx::{types::Json, PgConnection, PgExecutor, Postgres, QueryBuilder};

use crate::models::audit_log::{AuditAction, AuditLog, AuditTable, NewAuditLog};
use crate::repositories::common::push_clause;
use crate::types::{AuditLogId, UserId};

const SELECT_COLUMNS: &str = "id, table_name, record_id, action, old_values, new_values, \
     performed_by, performed_by_name, ip_address, user_agent, created_at";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuditLogFilters {
    pub table: Option<AuditTable>,
    pub action: Option<AuditAction>,
    pub record_id: Option<i64>,
    pub performed_by: Option<UserId>,
}

/// Inserts on the caller's connection, which is normally the transaction
/// carrying the mutation being documented.
pub async fn insert_audit_log(
    conn: &mut PgConnection,
    log: &NewAuditLog,
) -> Result<AuditLog, sqlx::Error> {
    let query = format!(
        "INSERT INTO audit_logs \
         (table_name, record_id, action, old_values, new_values, performed_by, \
         performed_by_name, ip_address, user_agent) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
         RETURNING {}",
        SELECT_COLUMNS
    );
    sqlx::query_as::<_, AuditLog>(&query)
        .bind(log.table_name)
        .bind(log.record_id)
        .bind(log.action)
        .bind(log.old_values.as_ref().map(Json))
        .bind(log.new_values.as_ref().map(Json))
        .bind(log.performed_by)
        .bind(&log.performed_by_name)
        .bind(&log.ip_address)
        .bind(&log.user_agent)
        .fetch_one(conn)
        .await
}

pub async fn fetch_audit_log<'e, E>(
    executor: E,
    id: AuditLogId,
) -> Result<Option<AuditLog>, sqlx::Error>
where
    E: PgExecutor<'e>,
{
    let query = format!("SELECT {} FROM audit_logs WHERE id = $1", SELECT_COLUMNS);
    sqlx::query_as::<_, AuditLog>(&query)
        .bind(id)
        .fetch_optional(executor)
        .await
}

/// One page of matching records, newest first, plus the total match count.
/// Page and total for `filters`. Run it inside a read snapshot so both
/// statements see the same rows.
pub async fn list_audit_logs(
    conn: &mut PgConnection,
    filters: &AuditLogFilters,
    limit: i64,
    offset: i64,
) -> Result<(Vec<AuditLog>, i64), sqlx::Error> {
    let mut builder: QueryBuilder<Postgres> =
        QueryBuilder::new(format!("SELECT {} FROM audit_logs", SELECT_COLUMNS));
    let mut has_clause = false;
    apply_audit_log_filters(&mut builder, &mut has_clause, filters);
    builder
        .push(" ORDER BY created_at DESC, id DESC")
        .push(" LIMIT ")
        .push_bind(limit)
        .push(" OFFSET ")
        .push_bind(offset);
    let items = builder
        .build_query_as::<AuditLog>()
        .fetch_all(&mut *conn)
        .await?;

    let mut count_builder: QueryBuilder<Postgres> =
        QueryBuilder::new("SELECT COUNT(*) FROM audit_logs");
    let mut count_has_clause = false;
    apply_audit_log_filters(&mut count_builder, &mut count_has_clause, filters);
    let total = count_builder
        .build_query_scalar::<i64>()
        .fetch_one(&mut *conn)
        .await?;

    Ok((items, total))
}

fn apply_audit_log_filters(
    builder: &mut QueryBuilder<'_, Postgres>,
    has_clause: &mut bool,
    filters: &AuditLogFilters,
) {
    if let Some(table) = filters.table {
        push_clause(builder, has_clause);
        builder.push("table_name = ").push_bind(table);
    }
    if let Some(action) = filters.action {
        push_clause(builder, has_clause);
        builder.push("action = ").push_bind(action);
    }
    if let Some(record_id) = filters.record_id {
        push_clause(builder, has_clause);
        builder.push("record_id = ").push_bind(record_id);
    }
    if let Some(performed_by) = filters.performed_by {
        push_clause(builder, has_clause);
        builder.push("performed_by = ").push_bind(performed_by);
    }
}
