use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

use crate::models::purchase_order::DocumentStatus;
use crate::types::{InvoiceId, PurchaseOrderId};
use crate::validation::rules;

/// Billing document applied against a purchase order. A negative
/// `net_amount` is a credit note.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Invoice {
    pub id: InvoiceId,
    pub purchase_order_id: PurchaseOrderId,
    pub invoice_number: String,
    pub invoice_date: Option<NaiveDate>,
    pub net_amount: Decimal,
    pub vat_rate: Decimal,
    pub vat_amount: Decimal,
    pub total_amount: Decimal,
    pub status: DocumentStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Invoice {
    pub fn is_cancelled(&self) -> bool {
        self.status == DocumentStatus::Cancelled
    }

    pub fn is_credit_note(&self) -> bool {
        self.net_amount < Decimal::ZERO
    }
}

#[derive(Debug, Clone)]
pub struct InvoiceValues {
    pub invoice_number: String,
    pub invoice_date: Option<NaiveDate>,
    pub net_amount: Decimal,
    pub vat_rate: Decimal,
    pub vat_amount: Decimal,
    pub total_amount: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateInvoice {
    #[validate(custom(function = "rules::validate_document_number"))]
    pub invoice_number: String,
    pub invoice_date: Option<NaiveDate>,
    #[validate(custom(function = "rules::validate_amount"))]
    pub net_amount: Decimal,
    #[validate(custom(function = "rules::validate_vat_rate"))]
    pub vat_rate: Decimal,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
pub struct UpdateInvoice {
    #[validate(custom(function = "rules::validate_document_number"))]
    pub invoice_number: Option<String>,
    pub invoice_date: Option<NaiveDate>,
    #[validate(custom(function = "rules::validate_amount"))]
    pub net_amount: Option<Decimal>,
    #[validate(custom(function = "rules::validate_vat_rate"))]
    pub vat_rate: Option<Decimal>,
}
