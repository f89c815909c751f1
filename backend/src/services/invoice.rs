//! Invoices and credit notes applied against purchase orders.

use sqlx::PgPool;

use crate::{
    error::AppError,
    models::{
        actor::Actor,
        audit_log::AuditTable,
        invoice::{CreateInvoice, Invoice, InvoiceValues, UpdateInvoice},
        purchase_order::DocumentStatus,
    },
    repositories::{
        invoice as invoice_repo, purchase_order as purchase_order_repo,
        transaction::{begin_transaction, commit_transaction},
    },
    services::audit_log::{self, AuditEntry},
    types::{InvoiceId, PurchaseOrderId},
    utils::money,
    validation::Validate,
};

/// Adds an invoice to an active order.
///
/// The order is share-locked so a concurrent cancel cannot slip in between
/// the status check and the insert.
pub async fn create(
    pool: &PgPool,
    purchase_order_id: PurchaseOrderId,
    payload: CreateInvoice,
    actor: &Actor,
) -> Result<Invoice, AppError> {
    payload.validate()?;
    let values = build_values(
        payload.invoice_number,
        payload.invoice_date,
        payload.net_amount,
        payload.vat_rate,
    )?;

    let mut tx = begin_transaction(pool).await?;
    let purchase_order = purchase_order_repo::share_lock_purchase_order(&mut tx, purchase_order_id)
        .await?
        .ok_or_else(|| {
            AppError::NotFound(format!("Purchase order {} not found", purchase_order_id))
        })?;
    if purchase_order.is_cancelled() {
        return Err(AppError::Conflict(format!(
            "Purchase order {} is cancelled",
            purchase_order.po_number
        )));
    }

    let invoice = invoice_repo::insert_invoice(&mut tx, purchase_order_id, &values).await?;
    let entry = AuditEntry::created(
        AuditTable::Invoices,
        invoice.id.get(),
        audit_log::snapshot(&invoice)?,
    );
    audit_log::record(&mut tx, entry, actor).await?;
    commit_transaction(tx).await?;

    tracing::info!(
        invoice_id = %invoice.id,
        purchase_order_id = %purchase_order_id,
        credit_note = invoice.is_credit_note(),
        performed_by = %actor.id,
        "invoice created"
    );
    Ok(invoice)
}

pub async fn update(
    pool: &PgPool,
    id: InvoiceId,
    payload: UpdateInvoice,
    actor: &Actor,
) -> Result<Invoice, AppError> {
    payload.validate()?;

    let mut tx = begin_transaction(pool).await?;
    let existing = invoice_repo::lock_invoice(&mut tx, id)
        .await?
        .ok_or_else(|| not_found(id))?;
    if existing.is_cancelled() {
        return Err(AppError::Conflict(format!(
            "Invoice {} is cancelled",
            existing.invoice_number
        )));
    }

    let values = build_values(
        payload
            .invoice_number
            .unwrap_or_else(|| existing.invoice_number.clone()),
        payload.invoice_date.or(existing.invoice_date),
        payload.net_amount.unwrap_or(existing.net_amount),
        payload.vat_rate.unwrap_or(existing.vat_rate),
    )?;
    let updated = invoice_repo::update_invoice(&mut tx, id, &values).await?;
    let entry = AuditEntry::updated(
        AuditTable::Invoices,
        id.get(),
        audit_log::snapshot(&existing)?,
        audit_log::snapshot(&updated)?,
    );
    audit_log::record(&mut tx, entry, actor).await?;
    commit_transaction(tx).await?;
    Ok(updated)
}

pub async fn cancel(pool: &PgPool, id: InvoiceId, actor: &Actor) -> Result<Invoice, AppError> {
    let mut tx = begin_transaction(pool).await?;
    let existing = invoice_repo::lock_invoice(&mut tx, id)
        .await?
        .ok_or_else(|| not_found(id))?;
    if existing.is_cancelled() {
        return Err(AppError::Conflict(format!(
            "Invoice {} is already cancelled",
            existing.invoice_number
        )));
    }

    let cancelled = invoice_repo::set_invoice_status(&mut tx, id, DocumentStatus::Cancelled).await?;
    let entry = AuditEntry::cancelled(
        AuditTable::Invoices,
        id.get(),
        audit_log::snapshot(&existing)?,
        audit_log::snapshot(&cancelled)?,
    );
    audit_log::record(&mut tx, entry, actor).await?;
    commit_transaction(tx).await?;

    tracing::info!(
        invoice_id = %id,
        purchase_order_id = %cancelled.purchase_order_id,
        performed_by = %actor.id,
        "invoice cancelled"
    );
    Ok(cancelled)
}

/// Every invoice of the order, cancelled ones included.
pub async fn list_for_purchase_order(
    pool: &PgPool,
    purchase_order_id: PurchaseOrderId,
) -> Result<Vec<Invoice>, AppError> {
    if purchase_order_repo::find_purchase_order(pool, purchase_order_id)
        .await?
        .is_none()
    {
        return Err(AppError::NotFound(format!(
            "Purchase order {} not found",
            purchase_order_id
        )));
    }
    Ok(invoice_repo::list_invoices_for_purchase_order(pool, purchase_order_id).await?)
}

fn build_values(
    invoice_number: String,
    invoice_date: Option<chrono::NaiveDate>,
    net_amount: rust_decimal::Decimal,
    vat_rate: rust_decimal::Decimal,
) -> Result<InvoiceValues, AppError> {
    let vat_rate = money::normalize_rate(vat_rate);
    let (vat_amount, total_amount) =
        money::checked_vat_and_gross(net_amount, vat_rate).ok_or_else(|| {
            AppError::Validation(format!(
                "Net amount {} at VAT rate {} exceeds the storable amount range",
                net_amount, vat_rate
            ))
        })?;
    Ok(InvoiceValues {
        invoice_number,
        invoice_date,
        net_amount,
        vat_rate,
        vat_amount,
        total_amount,
    })
}

fn not_found(id: InvoiceId) -> AppError {
    AppError::NotFound(format!("Invoice {} not found", id))
}
