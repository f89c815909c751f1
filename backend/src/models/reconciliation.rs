use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Where a purchase order stands against its invoices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum BalanceState {
    /// Some of the commitment is still uninvoiced.
    Open,
    /// Invoices exactly cover the commitment.
    Settled,
    /// Invoiced beyond the commitment.
    Over,
}

/// Balances computed from the current purchase-order and invoice rows.
/// Never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Reconciliation {
    pub net_amount: Decimal,
    pub vat_amount: Decimal,
    pub total_amount: Decimal,
    pub invoiced_net: Decimal,
    pub invoiced_gross: Decimal,
    pub uninvoiced_net: Decimal,
    pub uninvoiced_gross: Decimal,
    pub invoice_count: i64,
    pub state: BalanceState,
}
