use axum::{
    extract::{rejection::JsonRejection, Extension, Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::{
    error::AppError,
    handlers::{json_body, parse_filter, parse_path_id},
    models::{
        actor::Actor,
        invoice::{CreateInvoice, Invoice},
        purchase_order::{
            CreatePurchaseOrder, DocumentStatus, PurchaseOrderResponse, UpdatePurchaseOrder,
        },
    },
    repositories::purchase_order::PurchaseOrderFilters,
    services::{
        invoice as invoice_service,
        purchase_order::{self as purchase_order_service, PurchaseOrderPage},
    },
    state::AppState,
    types::{LocationId, PurchaseOrderId, SiteId, StageId, SupplierId},
    utils::pagination::{PageRequest, DEFAULT_LIMIT, MAX_LIMIT},
};

#[derive(Debug, Default, Deserialize, Serialize, IntoParams, ToSchema)]
pub struct PurchaseOrderListQuery {
    pub status: Option<String>,
    pub supplier_id: Option<String>,
    pub site_id: Option<String>,
    pub location_id: Option<String>,
    pub stage_id: Option<String>,
    pub page: Option<String>,
    pub limit: Option<String>,
}

pub async fn list_purchase_orders(
    State(state): State<AppState>,
    Query(q): Query<PurchaseOrderListQuery>,
) -> Result<Json<PurchaseOrderPage>, AppError> {
    let filters = parse_filters(&q)?;
    let page = PageRequest::parse(q.page.as_deref(), q.limit.as_deref(), DEFAULT_LIMIT, MAX_LIMIT);
    Ok(Json(
        purchase_order_service::list(&state.pool, &filters, page).await?,
    ))
}

pub async fn create_purchase_order(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    payload: Result<Json<CreatePurchaseOrder>, JsonRejection>,
) -> Result<(StatusCode, Json<PurchaseOrderResponse>), AppError> {
    let payload = json_body(payload)?;
    let created = purchase_order_service::create(&state.pool, payload, &actor).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn get_purchase_order(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<PurchaseOrderResponse>, AppError> {
    let id: PurchaseOrderId = parse_path_id(&id, "purchase order")?;
    Ok(Json(
        purchase_order_service::get(state.reconciliation.as_ref(), id).await?,
    ))
}

pub async fn update_purchase_order(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<String>,
    payload: Result<Json<UpdatePurchaseOrder>, JsonRejection>,
) -> Result<Json<PurchaseOrderResponse>, AppError> {
    let id: PurchaseOrderId = parse_path_id(&id, "purchase order")?;
    let payload = json_body(payload)?;
    Ok(Json(
        purchase_order_service::update(&state.pool, id, payload, &actor).await?,
    ))
}

pub async fn cancel_purchase_order(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<String>,
) -> Result<Json<PurchaseOrderResponse>, AppError> {
    let id: PurchaseOrderId = parse_path_id(&id, "purchase order")?;
    Ok(Json(
        purchase_order_service::cancel(&state.pool, id, &actor).await?,
    ))
}

pub async fn list_invoices(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<Invoice>>, AppError> {
    let id: PurchaseOrderId = parse_path_id(&id, "purchase order")?;
    Ok(Json(
        invoice_service::list_for_purchase_order(&state.pool, id).await?,
    ))
}

pub async fn create_invoice(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<String>,
    payload: Result<Json<CreateInvoice>, JsonRejection>,
) -> Result<(StatusCode, Json<Invoice>), AppError> {
    let id: PurchaseOrderId = parse_path_id(&id, "purchase order")?;
    let payload = json_body(payload)?;
    let invoice = invoice_service::create(&state.pool, id, payload, &actor).await?;
    Ok((StatusCode::CREATED, Json(invoice)))
}

fn parse_filters(q: &PurchaseOrderListQuery) -> Result<PurchaseOrderFilters, AppError> {
    let status = match q.status.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        Some(raw) => Some(
            DocumentStatus::ALL
                .into_iter()
                .find(|status| status.as_str() == raw)
                .ok_or_else(|| AppError::Validation(format!("Unknown status filter: {}", raw)))?,
        ),
        None => None,
    };
    Ok(PurchaseOrderFilters {
        status,
        supplier_id: parse_filter::<SupplierId>(q.supplier_id.as_deref(), "supplier_id")?,
        site_id: parse_filter::<SiteId>(q.site_id.as_deref(), "site_id")?,
        location_id: parse_filter::<LocationId>(q.location_id.as_deref(), "location_id")?,
        stage_id: parse_filter::<StageId>(q.stage_id.as_deref(), "stage_id")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_filter_accepts_known_values_only() {
        let q = PurchaseOrderListQuery {
            status: Some("cancelled".into()),
            supplier_id: Some("4".into()),
            ..Default::default()
        };
        let filters = parse_filters(&q).expect("filters");
        assert_eq!(filters.status, Some(DocumentStatus::Cancelled));
        assert_eq!(filters.supplier_id, Some(SupplierId::new(4)));

        for raw in ["draft", "Cancelled"] {
            let q = PurchaseOrderListQuery {
                status: Some(raw.into()),
                ..Default::default()
            };
            assert!(parse_filters(&q).is_err(), "{raw}");
        }
    }
}
