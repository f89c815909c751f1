//! Purchase-order lifecycle. Every write records its audit entry on the same
//! transaction; every read carries a freshly computed reconciliation.

use std::collections::HashMap;

use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool};

use crate::{
    error::AppError,
    models::{
        actor::Actor,
        audit_log::AuditTable,
        invoice::Invoice,
        purchase_order::{
            CreatePurchaseOrder, DocumentStatus, LineItem, PurchaseOrder, PurchaseOrderResponse,
            PurchaseOrderValues, UpdatePurchaseOrder,
        },
        reference::Location,
    },
    repositories::{
        invoice as invoice_repo,
        purchase_order::{self as purchase_order_repo, PurchaseOrderFilters},
        reference as reference_repo,
        transaction::{begin_read_snapshot, begin_transaction, commit_transaction},
    },
    services::{
        audit_log::{self, AuditEntry},
        reconciliation::{self, ReconciliationSource},
    },
    types::{LocationId, PurchaseOrderId, SiteId, StageId, SupplierId},
    utils::{
        money,
        pagination::{PageRequest, Pagination},
    },
    validation::Validate,
};

#[derive(Debug, Clone, serde::Serialize, utoipa::ToSchema)]
pub struct PurchaseOrderPage {
    pub data: Vec<PurchaseOrderResponse>,
    pub pagination: Pagination,
}

pub async fn create(
    pool: &PgPool,
    payload: CreatePurchaseOrder,
    actor: &Actor,
) -> Result<PurchaseOrderResponse, AppError> {
    payload.validate()?;
    let values = build_values(
        payload.po_number,
        payload.supplier_id,
        payload.site_id,
        payload.location_id,
        payload.stage_id,
        payload.description,
        payload.net_amount,
        payload.vat_rate,
        payload.line_items,
    )?;

    let mut tx = begin_transaction(pool).await?;
    ensure_location_on_site(&mut tx, values.location_id, values.site_id).await?;
    let purchase_order =
        purchase_order_repo::insert_purchase_order(&mut tx, &values, actor.id).await?;
    let entry = AuditEntry::created(
        AuditTable::PurchaseOrders,
        purchase_order.id.get(),
        audit_log::snapshot(&purchase_order)?,
    );
    audit_log::record(&mut tx, entry, actor).await?;
    commit_transaction(tx).await?;

    tracing::info!(
        purchase_order_id = %purchase_order.id,
        po_number = %purchase_order.po_number,
        performed_by = %actor.id,
        "purchase order created"
    );
    let reconciliation = reconciliation::reconcile(&purchase_order, &[]);
    Ok(PurchaseOrderResponse::new(purchase_order, reconciliation))
}

pub async fn update(
    pool: &PgPool,
    id: PurchaseOrderId,
    payload: UpdatePurchaseOrder,
    actor: &Actor,
) -> Result<PurchaseOrderResponse, AppError> {
    payload.validate()?;

    let mut tx = begin_transaction(pool).await?;
    let existing = purchase_order_repo::lock_purchase_order(&mut tx, id)
        .await?
        .ok_or_else(|| not_found(id))?;
    if existing.is_cancelled() {
        return Err(AppError::Conflict(format!(
            "Purchase order {} is cancelled",
            existing.po_number
        )));
    }

    let net_amount = payload.net_amount.unwrap_or(existing.net_amount);
    let line_items = match payload.line_items {
        Some(items) => Some(items),
        None => existing.line_items.clone().map(|items| items.0),
    };
    let values = build_values(
        payload.po_number.unwrap_or_else(|| existing.po_number.clone()),
        payload.supplier_id.unwrap_or(existing.supplier_id),
        payload.site_id.unwrap_or(existing.site_id),
        payload.location_id.unwrap_or(existing.location_id),
        payload.stage_id.unwrap_or(existing.stage_id),
        payload.description.or_else(|| existing.description.clone()),
        net_amount,
        payload.vat_rate.unwrap_or(existing.vat_rate),
        line_items,
    )?;
    ensure_location_on_site(&mut tx, values.location_id, values.site_id).await?;

    let updated = purchase_order_repo::update_purchase_order(&mut tx, id, &values).await?;
    let entry = AuditEntry::updated(
        AuditTable::PurchaseOrders,
        id.get(),
        audit_log::snapshot(&existing)?,
        audit_log::snapshot(&updated)?,
    );
    audit_log::record(&mut tx, entry, actor).await?;
    let invoices = invoice_repo::list_active_invoices_for_purchase_orders(&mut *tx, &[id]).await?;
    commit_transaction(tx).await?;

    let reconciliation = reconciliation::reconcile(&updated, &invoices);
    Ok(PurchaseOrderResponse::new(updated, reconciliation))
}

/// Logical delete. Invoices keep their own status.
pub async fn cancel(
    pool: &PgPool,
    id: PurchaseOrderId,
    actor: &Actor,
) -> Result<PurchaseOrderResponse, AppError> {
    let mut tx = begin_transaction(pool).await?;
    let existing = purchase_order_repo::lock_purchase_order(&mut tx, id)
        .await?
        .ok_or_else(|| not_found(id))?;
    if existing.is_cancelled() {
        return Err(AppError::Conflict(format!(
            "Purchase order {} is already cancelled",
            existing.po_number
        )));
    }

    let cancelled =
        purchase_order_repo::set_purchase_order_status(&mut tx, id, DocumentStatus::Cancelled)
            .await?;
    let entry = AuditEntry::cancelled(
        AuditTable::PurchaseOrders,
        id.get(),
        audit_log::snapshot(&existing)?,
        audit_log::snapshot(&cancelled)?,
    );
    audit_log::record(&mut tx, entry, actor).await?;
    let invoices = invoice_repo::list_active_invoices_for_purchase_orders(&mut *tx, &[id]).await?;
    commit_transaction(tx).await?;

    tracing::info!(
        purchase_order_id = %id,
        po_number = %cancelled.po_number,
        performed_by = %actor.id,
        "purchase order cancelled"
    );
    let reconciliation = reconciliation::reconcile(&cancelled, &invoices);
    Ok(PurchaseOrderResponse::new(cancelled, reconciliation))
}

pub async fn get(
    source: &dyn ReconciliationSource,
    id: PurchaseOrderId,
) -> Result<PurchaseOrderResponse, AppError> {
    let (purchase_order, reconciliation) =
        reconciliation::reconcile_purchase_order(source, id).await?;
    Ok(PurchaseOrderResponse::new(purchase_order, reconciliation))
}

pub async fn list(
    pool: &PgPool,
    filters: &PurchaseOrderFilters,
    page: PageRequest,
) -> Result<PurchaseOrderPage, AppError> {
    let mut tx = begin_read_snapshot(pool).await?;
    let (orders, total) =
        purchase_order_repo::list_purchase_orders(&mut tx, filters, page.limit, page.offset())
            .await?;
    let ids: Vec<PurchaseOrderId> = orders.iter().map(|order| order.id).collect();
    let invoices = invoice_repo::list_active_invoices_for_purchase_orders(&mut *tx, &ids).await?;
    commit_transaction(tx).await?;

    let mut by_order: HashMap<PurchaseOrderId, Vec<Invoice>> = HashMap::new();
    for invoice in invoices {
        by_order
            .entry(invoice.purchase_order_id)
            .or_default()
            .push(invoice);
    }

    let data = orders
        .into_iter()
        .map(|order| {
            let invoices = by_order.get(&order.id).map(Vec::as_slice).unwrap_or(&[]);
            let reconciliation = reconciliation::reconcile(&order, invoices);
            PurchaseOrderResponse::new(order, reconciliation)
        })
        .collect();

    Ok(PurchaseOrderPage {
        data,
        pagination: Pagination::new(page, total),
    })
}

#[allow(clippy::too_many_arguments)]
fn build_values(
    po_number: String,
    supplier_id: SupplierId,
    site_id: SiteId,
    location_id: LocationId,
    stage_id: StageId,
    description: Option<String>,
    net_amount: Decimal,
    vat_rate: Decimal,
    line_items: Option<Vec<LineItem>>,
) -> Result<PurchaseOrderValues, AppError> {
    if let Some(items) = &line_items {
        ensure_line_items_sum(items, net_amount)?;
    }
    let vat_rate = money::normalize_rate(vat_rate);
    let (vat_amount, total_amount) = money::checked_vat_and_gross(net_amount, vat_rate)
        .ok_or_else(|| out_of_range(net_amount, vat_rate))?;
    Ok(PurchaseOrderValues {
        po_number,
        supplier_id,
        site_id,
        location_id,
        stage_id,
        description,
        net_amount,
        vat_rate,
        vat_amount,
        total_amount,
        line_items,
    })
}

fn ensure_line_items_sum(items: &[LineItem], net_amount: Decimal) -> Result<(), AppError> {
    let sum = money::checked_sum(items.iter().map(|item| item.amount))
        .ok_or_else(|| AppError::Validation("Line item amounts overflow".into()))?;
    if sum != net_amount {
        return Err(AppError::Validation(format!(
            "Line items sum to {} but net amount is {}",
            sum, net_amount
        )));
    }
    Ok(())
}

async fn ensure_location_on_site(
    conn: &mut PgConnection,
    location_id: LocationId,
    site_id: SiteId,
) -> Result<(), AppError> {
    let location = reference_repo::find_reference::<Location, _>(&mut *conn, location_id.get())
        .await?
        .ok_or_else(|| AppError::Validation(format!("Location {} does not exist", location_id)))?;
    if location.site_id != site_id {
        return Err(AppError::Validation(format!(
            "Location {} does not belong to site {}",
            location_id, site_id
        )));
    }
    Ok(())
}

fn out_of_range(net_amount: Decimal, vat_rate: Decimal) -> AppError {
    AppError::Validation(format!(
        "Net amount {} at VAT rate {} exceeds the storable amount range",
        net_amount, vat_rate
    ))
}

fn not_found(id: PurchaseOrderId) -> AppError {
    AppError::NotFound(format!("Purchase order {} not found", id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::reconciliation::fixtures::d;

    fn item(amount: &str) -> LineItem {
        LineItem {
            description: "Ready-mix concrete".into(),
            quantity: None,
            unit_price: None,
            amount: d(amount),
        }
    }

    fn values(
        net: &str,
        rate: &str,
        items: Option<Vec<LineItem>>,
    ) -> Result<PurchaseOrderValues, AppError> {
        build_values(
            "PO-2025-001".into(),
            SupplierId::new(1),
            SiteId::new(1),
            LocationId::new(1),
            StageId::new(1),
            None,
            d(net),
            d(rate),
            items,
        )
    }

    #[test]
    fn derived_amounts_follow_net_and_rate() {
        let values = values("1000", "0.23", None).expect("values");
        assert_eq!(values.vat_amount, d("230.00"));
        assert_eq!(values.total_amount, d("1230.00"));
    }

    #[test]
    fn line_items_must_sum_to_net() {
        assert!(values("1000", "0.135", Some(vec![item("600"), item("400")])).is_ok());
        let err = values("1000", "0.135", Some(vec![item("600"), item("300")]))
            .expect_err("mismatch");
        assert_eq!(err.code(), "VALIDATION_ERROR");
    }

    #[test]
    fn empty_line_item_list_only_matches_zero_net() {
        assert!(values("0", "0", Some(vec![])).is_ok());
        assert!(values("10", "0", Some(vec![])).is_err());
    }

    #[test]
    fn oversized_net_is_rejected_before_arithmetic() {
        let payload: CreatePurchaseOrder = serde_json::from_value(serde_json::json!({
            "po_number": "PO-2025-900",
            "supplier_id": 1,
            "site_id": 1,
            "location_id": 1,
            "stage_id": 1,
            "net_amount": "50000000000000000000000000000",
            "vat_rate": "1",
        }))
        .expect("deserialize");
        let err = AppError::from(payload.validate().expect_err("out of range"));
        assert_eq!(err.code(), "VALIDATION_ERROR");

        let err = values("50000000000000000000000000000", "1", None).expect_err("overflow");
        assert_eq!(err.code(), "VALIDATION_ERROR");
    }

    #[test]
    fn gross_beyond_column_width_is_a_validation_error() {
        let err = values("999999999999.99", "0.23", None).expect_err("gross too large");
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn overflowing_line_items_are_a_validation_error() {
        let huge = LineItem {
            amount: Decimal::MAX,
            ..item("0")
        };
        let err = values("1000", "0", Some(vec![huge.clone(), huge])).expect_err("overflow");
        assert!(matches!(err, AppError::Validation(_)));
    }
}
