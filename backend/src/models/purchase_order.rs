use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{types::Json, FromRow};
use utoipa::ToSchema;
use validator::Validate;

use crate::models::reconciliation::Reconciliation;
use crate::types::{LocationId, PurchaseOrderId, SiteId, StageId, SupplierId, UserId};
use crate::validation::rules;

/// Lifecycle of purchase orders and invoices. Deletion is logical.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema, Default)]
#[sqlx(type_name = "TEXT", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum DocumentStatus {
    #[default]
    Active,
    Cancelled,
}

impl DocumentStatus {
    pub const ALL: [DocumentStatus; 2] = [DocumentStatus::Active, DocumentStatus::Cancelled];

    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentStatus::Active => "active",
            DocumentStatus::Cancelled => "cancelled",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate, ToSchema)]
pub struct LineItem {
    #[validate(length(min = 1, max = 500))]
    pub description: String,
    #[serde(default)]
    pub quantity: Option<Decimal>,
    #[serde(default)]
    pub unit_price: Option<Decimal>,
    #[validate(custom(function = "rules::validate_amount"))]
    pub amount: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct PurchaseOrder {
    pub id: PurchaseOrderId,
    pub po_number: String,
    pub supplier_id: SupplierId,
    pub site_id: SiteId,
    pub location_id: LocationId,
    pub stage_id: StageId,
    pub description: Option<String>,
    pub net_amount: Decimal,
    pub vat_rate: Decimal,
    pub vat_amount: Decimal,
    pub total_amount: Decimal,
    pub status: DocumentStatus,
    #[schema(value_type = Option<Vec<LineItem>>)]
    pub line_items: Option<Json<Vec<LineItem>>>,
    pub created_by: UserId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PurchaseOrder {
    pub fn is_cancelled(&self) -> bool {
        self.status == DocumentStatus::Cancelled
    }
}

/// Column values written on insert/update; derived amounts already computed.
#[derive(Debug, Clone)]
pub struct PurchaseOrderValues {
    pub po_number: String,
    pub supplier_id: SupplierId,
    pub site_id: SiteId,
    pub location_id: LocationId,
    pub stage_id: StageId,
    pub description: Option<String>,
    pub net_amount: Decimal,
    pub vat_rate: Decimal,
    pub vat_amount: Decimal,
    pub total_amount: Decimal,
    pub line_items: Option<Vec<LineItem>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreatePurchaseOrder {
    #[validate(custom(function = "rules::validate_document_number"))]
    pub po_number: String,
    pub supplier_id: SupplierId,
    pub site_id: SiteId,
    pub location_id: LocationId,
    pub stage_id: StageId,
    #[validate(length(max = 2000))]
    pub description: Option<String>,
    #[validate(custom(function = "rules::validate_non_negative_amount"))]
    pub net_amount: Decimal,
    #[validate(custom(function = "rules::validate_vat_rate"))]
    pub vat_rate: Decimal,
    #[serde(default)]
    #[validate(nested)]
    pub line_items: Option<Vec<LineItem>>,
}

/// Partial update; absent fields keep their stored value.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
pub struct UpdatePurchaseOrder {
    #[validate(custom(function = "rules::validate_document_number"))]
    pub po_number: Option<String>,
    pub supplier_id: Option<SupplierId>,
    pub site_id: Option<SiteId>,
    pub location_id: Option<LocationId>,
    pub stage_id: Option<StageId>,
    #[validate(length(max = 2000))]
    pub description: Option<String>,
    #[validate(custom(function = "rules::validate_non_negative_amount"))]
    pub net_amount: Option<Decimal>,
    #[validate(custom(function = "rules::validate_vat_rate"))]
    pub vat_rate: Option<Decimal>,
    #[validate(nested)]
    pub line_items: Option<Vec<LineItem>>,
}

/// Every purchase-order read carries freshly computed balances.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PurchaseOrderResponse {
    #[serde(flatten)]
    pub purchase_order: PurchaseOrder,
    pub uninvoiced_net: Decimal,
    pub uninvoiced_gross: Decimal,
    pub reconciliation: Reconciliation,
}

impl PurchaseOrderResponse {
    pub fn new(purchase_order: PurchaseOrder, reconciliation: Reconciliation) -> Self {
        Self {
            uninvoiced_net: reconciliation.uninvoiced_net,
            uninvoiced_gross: reconciliation.uninvoiced_gross,
            purchase_order,
            reconciliation,
        }
    }
}
