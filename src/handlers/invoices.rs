use axum::{extract::State, response::Json};

use crate::{
    errors::ServiceError,
    services::invoicing::{CreateInvoiceRequest, CreateInvoiceResponse},
    AppState,
};

// POST /api/create-invoice
//
// Thin pass-through to the invoice service; the provider credential never
// leaves the server side of this call.
pub async fn create_invoice(
    State(state): State<AppState>,
    Json(req): Json<CreateInvoiceRequest>,
) -> Result<Json<CreateInvoiceResponse>, ServiceError> {
    let invoice_link = state.services.invoicing.create_invoice_link(&req).await?;
    Ok(Json(CreateInvoiceResponse { invoice_link }))
}
