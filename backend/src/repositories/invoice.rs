//! Invoice storage.

use sqlx::{PgConnection, PgExecutor};

use crate::models::invoice::{Invoice, InvoiceValues};
use crate::models::purchase_order::DocumentStatus;
use crate::types::{InvoiceId, PurchaseOrderId};

const TABLE_NAME: &str = "invoices";
const SELECT_COLUMNS: &str = "id, purchase_order_id, invoice_number, invoice_date, net_amount, \
     vat_rate, vat_amount, total_amount, status, created_at, updated_at";

pub async fn insert_invoice(
    conn: &mut PgConnection,
    purchase_order_id: PurchaseOrderId,
    values: &InvoiceValues,
) -> Result<Invoice, sqlx::Error> {
    let query = format!(
        "INSERT INTO {} (purchase_order_id, invoice_number, invoice_date, net_amount, vat_rate, \
         vat_amount, total_amount) VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING {}",
        TABLE_NAME, SELECT_COLUMNS
    );
    sqlx::query_as::<_, Invoice>(&query)
        .bind(purchase_order_id)
        .bind(&values.invoice_number)
        .bind(values.invoice_date)
        .bind(values.net_amount)
        .bind(values.vat_rate)
        .bind(values.vat_amount)
        .bind(values.total_amount)
        .fetch_one(conn)
        .await
}

pub async fn lock_invoice(
    conn: &mut PgConnection,
    id: InvoiceId,
) -> Result<Option<Invoice>, sqlx::Error> {
    let query = format!(
        "SELECT {} FROM {} WHERE id = $1 FOR UPDATE",
        SELECT_COLUMNS, TABLE_NAME
    );
    sqlx::query_as::<_, Invoice>(&query)
        .bind(id)
        .fetch_optional(conn)
        .await
}

pub async fn update_invoice(
    conn: &mut PgConnection,
    id: InvoiceId,
    values: &InvoiceValues,
) -> Result<Invoice, sqlx::Error> {
    let query = format!(
        "UPDATE {} SET invoice_number = $2, invoice_date = $3, net_amount = $4, vat_rate = $5, \
         vat_amount = $6, total_amount = $7, updated_at = now() WHERE id = $1 RETURNING {}",
        TABLE_NAME, SELECT_COLUMNS
    );
    sqlx::query_as::<_, Invoice>(&query)
        .bind(id)
        .bind(&values.invoice_number)
        .bind(values.invoice_date)
        .bind(values.net_amount)
        .bind(values.vat_rate)
        .bind(values.vat_amount)
        .bind(values.total_amount)
        .fetch_one(conn)
        .await
}

pub async fn set_invoice_status(
    conn: &mut PgConnection,
    id: InvoiceId,
    status: DocumentStatus,
) -> Result<Invoice, sqlx::Error> {
    let query = format!(
        "UPDATE {} SET status = $2, updated_at = now() WHERE id = $1 RETURNING {}",
        TABLE_NAME, SELECT_COLUMNS
    );
    sqlx::query_as::<_, Invoice>(&query)
        .bind(id)
        .bind(status)
        .fetch_one(conn)
        .await
}

/// All invoices of one order, cancelled ones included, oldest first.
pub async fn list_invoices_for_purchase_order<'e, E>(
    executor: E,
    purchase_order_id: PurchaseOrderId,
) -> Result<Vec<Invoice>, sqlx::Error>
where
    E: PgExecutor<'e>,
{
    let query = format!(
        "SELECT {} FROM {} WHERE purchase_order_id = $1 ORDER BY created_at ASC, id ASC",
        SELECT_COLUMNS, TABLE_NAME
    );
    sqlx::query_as::<_, Invoice>(&query)
        .bind(purchase_order_id)
        .fetch_all(executor)
        .await
}

/// Active invoices for a batch of orders, used when reconciling a list page.
pub async fn list_active_invoices_for_purchase_orders<'e, E>(
    executor: E,
    purchase_order_ids: &[PurchaseOrderId],
) -> Result<Vec<Invoice>, sqlx::Error>
where
    E: PgExecutor<'e>,
{
    let ids: Vec<i64> = purchase_order_ids.iter().map(|id| id.get()).collect();
    let query = format!(
        "SELECT {} FROM {} WHERE purchase_order_id = ANY($1) AND status = $2 \
         ORDER BY created_at ASC, id ASC",
        SELECT_COLUMNS, TABLE_NAME
    );
    sqlx::query_as::<_, Invoice>(&query)
        .bind(ids)
        .bind(DocumentStatus::Active)
        .fetch_all(executor)
        .await
}
