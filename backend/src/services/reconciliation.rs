//! Purchase-order balances, recomputed from current rows on every read.

use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::PgPool;

use crate::{
    error::AppError,
    models::{
        invoice::Invoice,
        purchase_order::PurchaseOrder,
        reconciliation::{BalanceState, Reconciliation},
    },
    repositories::{
        invoice as invoice_repo, purchase_order as purchase_order_repo,
        transaction::{begin_read_snapshot, commit_transaction},
    },
    types::PurchaseOrderId,
    utils::money,
};

/// Computes the balance of `purchase_order` against `invoices`.
///
/// Invoices belonging to another order or in `cancelled` status are ignored,
/// so callers may pass an unfiltered batch. VAT is derived from net and rate
/// rather than read from the stored columns.
pub fn reconcile(purchase_order: &PurchaseOrder, invoices: &[Invoice]) -> Reconciliation {
    let net_amount = purchase_order.net_amount;
    let vat_amount = money::vat_amount(net_amount, purchase_order.vat_rate);
    let total_amount = net_amount + vat_amount;

    let mut invoiced_net = Decimal::ZERO;
    let mut invoiced_gross = Decimal::ZERO;
    let mut invoice_count = 0_i64;
    for invoice in invoices
        .iter()
        .filter(|invoice| invoice.purchase_order_id == purchase_order.id)
        .filter(|invoice| !invoice.is_cancelled())
    {
        invoiced_net += invoice.net_amount;
        invoiced_gross += money::gross_amount(invoice.net_amount, invoice.vat_rate);
        invoice_count += 1;
    }

    let uninvoiced_net = net_amount - invoiced_net;
    let uninvoiced_gross = total_amount - invoiced_gross;
    let state = if uninvoiced_net > Decimal::ZERO {
        BalanceState::Open
    } else if uninvoiced_net.is_zero() {
        BalanceState::Settled
    } else {
        BalanceState::Over
    };

    Reconciliation {
        net_amount,
        vat_amount,
        total_amount,
        invoiced_net,
        invoiced_gross,
        uninvoiced_net,
        uninvoiced_gross,
        invoice_count,
        state,
    }
}

/// Loads an order together with its active invoices from one consistent view.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ReconciliationSource: Send + Sync {
    async fn load(
        &self,
        id: PurchaseOrderId,
    ) -> Result<Option<(PurchaseOrder, Vec<Invoice>)>, AppError>;
}

#[derive(Debug, Clone)]
pub struct PgReconciliationSource {
    pool: PgPool,
}

impl PgReconciliationSource {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ReconciliationSource for PgReconciliationSource {
    async fn load(
        &self,
        id: PurchaseOrderId,
    ) -> Result<Option<(PurchaseOrder, Vec<Invoice>)>, AppError> {
        let mut tx = begin_read_snapshot(&self.pool).await?;
        let Some(purchase_order) = purchase_order_repo::find_purchase_order(&mut *tx, id)
            .await
            .map_err(|e| AppError::Storage(e.into()))?
        else {
            return Ok(None);
        };
        let invoices = invoice_repo::list_active_invoices_for_purchase_orders(&mut *tx, &[id])
            .await
            .map_err(|e| AppError::Storage(e.into()))?;
        commit_transaction(tx).await?;
        Ok(Some((purchase_order, invoices)))
    }
}

pub async fn reconcile_purchase_order(
    source: &dyn ReconciliationSource,
    id: PurchaseOrderId,
) -> Result<(PurchaseOrder, Reconciliation), AppError> {
    let (purchase_order, invoices) = source
        .load(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Purchase order {} not found", id)))?;
    let reconciliation = reconcile(&purchase_order, &invoices);
    Ok((purchase_order, reconciliation))
}

#[cfg(test)]
pub(crate) mod fixtures {
    use chrono::Utc;
    use rust_decimal::Decimal;
    use std::str::FromStr;

    use crate::models::{
        invoice::Invoice,
        purchase_order::{DocumentStatus, PurchaseOrder},
    };
    use crate::types::{
        InvoiceId, LocationId, PurchaseOrderId, SiteId, StageId, SupplierId, UserId,
    };
    use crate::utils::money;

    pub fn d(value: &str) -> Decimal {
        Decimal::from_str(value).expect("decimal literal")
    }

    pub fn purchase_order(id: i64, net: &str, rate: &str) -> PurchaseOrder {
        let net = d(net);
        let rate = d(rate);
        let now = Utc::now();
        PurchaseOrder {
            id: PurchaseOrderId::new(id),
            po_number: format!("PO-{id}"),
            supplier_id: SupplierId::new(1),
            site_id: SiteId::new(1),
            location_id: LocationId::new(1),
            stage_id: StageId::new(1),
            description: None,
            net_amount: net,
            vat_rate: rate,
            vat_amount: money::vat_amount(net, rate),
            total_amount: money::gross_amount(net, rate),
            status: DocumentStatus::Active,
            line_items: None,
            created_by: UserId::new(1),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn invoice(id: i64, po: i64, net: &str, rate: &str) -> Invoice {
        let net = d(net);
        let rate = d(rate);
        let now = Utc::now();
        Invoice {
            id: InvoiceId::new(id),
            purchase_order_id: PurchaseOrderId::new(po),
            invoice_number: format!("INV-{id}"),
            invoice_date: None,
            net_amount: net,
            vat_rate: rate,
            vat_amount: money::vat_amount(net, rate),
            total_amount: money::gross_amount(net, rate),
            status: DocumentStatus::Active,
            created_at: now,
            updated_at: now,
        }
    }
}
