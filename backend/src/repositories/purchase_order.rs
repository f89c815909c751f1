//! Purchase order storage.

use sqlx::{types::Json, PgConnection, PgExecutor, Postgres, QueryBuilder};

use crate::models::purchase_order::{DocumentStatus, PurchaseOrder, PurchaseOrderValues};
use crate::repositories::common::push_clause;
use crate::types::{LocationId, PurchaseOrderId, SiteId, StageId, SupplierId, UserId};

const TABLE_NAME: &str = "purchase_orders";
const SELECT_COLUMNS: &str = "id, po_number, supplier_id, site_id, location_id, stage_id, \
     description, net_amount, vat_rate, vat_amount, total_amount, status, line_items, \
     created_by, created_at, updated_at";

#[derive(Debug, Clone, Default)]
pub struct PurchaseOrderFilters {
    pub status: Option<DocumentStatus>,
    pub supplier_id: Option<SupplierId>,
    pub site_id: Option<SiteId>,
    pub location_id: Option<LocationId>,
    pub stage_id: Option<StageId>,
}

pub async fn insert_purchase_order(
    conn: &mut PgConnection,
    values: &PurchaseOrderValues,
    created_by: UserId,
) -> Result<PurchaseOrder, sqlx::Error> {
    let query = format!(
        "INSERT INTO {} (po_number, supplier_id, site_id, location_id, stage_id, description, \
         net_amount, vat_rate, vat_amount, total_amount, line_items, created_by) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12) \
         RETURNING {}",
        TABLE_NAME, SELECT_COLUMNS
    );
    sqlx::query_as::<_, PurchaseOrder>(&query)
        .bind(&values.po_number)
        .bind(values.supplier_id)
        .bind(values.site_id)
        .bind(values.location_id)
        .bind(values.stage_id)
        .bind(&values.description)
        .bind(values.net_amount)
        .bind(values.vat_rate)
        .bind(values.vat_amount)
        .bind(values.total_amount)
        .bind(values.line_items.as_ref().map(Json))
        .bind(created_by)
        .fetch_one(conn)
        .await
}

pub async fn find_purchase_order<'e, E>(
    executor: E,
    id: PurchaseOrderId,
) -> Result<Option<PurchaseOrder>, sqlx::Error>
where
    E: PgExecutor<'e>,
{
    let query = format!("SELECT {} FROM {} WHERE id = $1", SELECT_COLUMNS, TABLE_NAME);
    sqlx::query_as::<_, PurchaseOrder>(&query)
        .bind(id)
        .fetch_optional(executor)
        .await
}

/// Row-locks the order for the rest of the transaction.
pub async fn lock_purchase_order(
    conn: &mut PgConnection,
    id: PurchaseOrderId,
) -> Result<Option<PurchaseOrder>, sqlx::Error> {
    let query = format!(
        "SELECT {} FROM {} WHERE id = $1 FOR UPDATE",
        SELECT_COLUMNS, TABLE_NAME
    );
    sqlx::query_as::<_, PurchaseOrder>(&query)
        .bind(id)
        .fetch_optional(conn)
        .await
}

/// Share-locks the order: concurrent invoice writers proceed, a concurrent
/// cancel waits.
pub async fn share_lock_purchase_order(
    conn: &mut PgConnection,
    id: PurchaseOrderId,
) -> Result<Option<PurchaseOrder>, sqlx::Error> {
    let query = format!(
        "SELECT {} FROM {} WHERE id = $1 FOR SHARE",
        SELECT_COLUMNS, TABLE_NAME
    );
    sqlx::query_as::<_, PurchaseOrder>(&query)
        .bind(id)
        .fetch_optional(conn)
        .await
}

pub async fn update_purchase_order(
    conn: &mut PgConnection,
    id: PurchaseOrderId,
    values: &PurchaseOrderValues,
) -> Result<PurchaseOrder, sqlx::Error> {
    let query = format!(
        "UPDATE {} SET po_number = $2, supplier_id = $3, site_id = $4, location_id = $5, \
         stage_id = $6, description = $7, net_amount = $8, vat_rate = $9, vat_amount = $10, \
         total_amount = $11, line_items = $12, updated_at = now() \
         WHERE id = $1 RETURNING {}",
        TABLE_NAME, SELECT_COLUMNS
    );
    sqlx::query_as::<_, PurchaseOrder>(&query)
        .bind(id)
        .bind(&values.po_number)
        .bind(values.supplier_id)
        .bind(values.site_id)
        .bind(values.location_id)
        .bind(values.stage_id)
        .bind(&values.description)
        .bind(values.net_amount)
        .bind(values.vat_rate)
        .bind(values.vat_amount)
        .bind(values.total_amount)
        .bind(values.line_items.as_ref().map(Json))
        .fetch_one(conn)
        .await
}

pub async fn set_purchase_order_status(
    conn: &mut PgConnection,
    id: PurchaseOrderId,
    status: DocumentStatus,
) -> Result<PurchaseOrder, sqlx::Error> {
    let query = format!(
        "UPDATE {} SET status = $2, updated_at = now() WHERE id = $1 RETURNING {}",
        TABLE_NAME, SELECT_COLUMNS
    );
    sqlx::query_as::<_, PurchaseOrder>(&query)
        .bind(id)
        .bind(status)
        .fetch_one(conn)
        .await
}

/// Runs on a connection so callers can read the page and its invoices from
/// one snapshot.
pub async fn list_purchase_orders(
    conn: &mut PgConnection,
    filters: &PurchaseOrderFilters,
    limit: i64,
    offset: i64,
) -> Result<(Vec<PurchaseOrder>, i64), sqlx::Error> {
    let mut builder: QueryBuilder<Postgres> =
        QueryBuilder::new(format!("SELECT {} FROM {}", SELECT_COLUMNS, TABLE_NAME));
    let mut has_clause = false;
    apply_filters(&mut builder, &mut has_clause, filters);
    builder
        .push(" ORDER BY created_at DESC, id DESC LIMIT ")
        .push_bind(limit)
        .push(" OFFSET ")
        .push_bind(offset);
    let items = builder
        .build_query_as::<PurchaseOrder>()
        .fetch_all(&mut *conn)
        .await?;

    let mut count_builder: QueryBuilder<Postgres> =
        QueryBuilder::new(format!("SELECT COUNT(*) FROM {}", TABLE_NAME));
    let mut count_has_clause = false;
    apply_filters(&mut count_builder, &mut count_has_clause, filters);
    let total = count_builder
        .build_query_scalar::<i64>()
        .fetch_one(&mut *conn)
        .await?;

    Ok((items, total))
}

fn apply_filters(
    builder: &mut QueryBuilder<'_, Postgres>,
    has_clause: &mut bool,
    filters: &PurchaseOrderFilters,
) {
    if let Some(status) = filters.status {
        push_clause(builder, has_clause);
        builder.push("status = ").push_bind(status);
    }
    if let Some(supplier_id) = filters.supplier_id {
        push_clause(builder, has_clause);
        builder.push("supplier_id = ").push_bind(supplier_id);
    }
    if let Some(site_id) = filters.site_id {
        push_clause(builder, has_clause);
        builder.push("site_id = ").push_bind(site_id);
    }
    if let Some(location_id) = filters.location_id {
        push_clause(builder, has_clause);
        builder.push("location_id = ").push_bind(location_id);
    }
    if let Some(stage_id) = filters.stage_id {
        push_clause(builder, has_clause);
        builder.push("stage_id = ").push_bind(stage_id);
    }
}
