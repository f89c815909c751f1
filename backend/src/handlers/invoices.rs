use axum::{
    extract::{rejection::JsonRejection, Extension, Path, State},
    Json,
};

use crate::{
    error::AppError,
    handlers::{json_body, parse_path_id},
    models::{
        actor::Actor,
        invoice::{Invoice, UpdateInvoice},
    },
    services::invoice as invoice_service,
    state::AppState,
    types::InvoiceId,
};

pub async fn update_invoice(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<String>,
    payload: Result<Json<UpdateInvoice>, JsonRejection>,
) -> Result<Json<Invoice>, AppError> {
    let id: InvoiceId = parse_path_id(&id, "invoice")?;
    let payload = json_body(payload)?;
    Ok(Json(
        invoice_service::update(&state.pool, id, payload, &actor).await?,
    ))
}

pub async fn cancel_invoice(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<String>,
) -> Result<Json<Invoice>, AppError> {
    let id: InvoiceId = parse_path_id(&id, "invoice")?;
    Ok(Json(invoice_service::cancel(&state.pool, id, &actor).await?))
}
