use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::Json,
};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::{
    errors::ServiceError,
    services::purchases::{ActivityEntry, CommitPurchaseCommand},
    AppState,
};

const MAX_RECENT_LIMIT: u64 = 50;

/// Commit request: `transaction_id` is the idempotency key minted at invoice
/// issuance time; the display fields denormalize onto the ownership record.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct PurchaseRequest {
    #[validate(length(min = 1, max = 64))]
    pub buyer_id: String,
    #[validate(length(min = 1, max = 64))]
    pub gift_id: String,
    #[validate(length(min = 1, max = 64))]
    pub transaction_id: String,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PurchaseResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RecentQuery {
    #[serde(default = "default_recent_limit")]
    pub limit: u64,
}

fn default_recent_limit() -> u64 {
    10
}

// POST /api/purchase
//
// Business-terminal failures (`out_of_stock`, `persistence_error`) keep the
// `{success, error}` body shape so clients can branch on the code; everything
// else surfaces as a structured error response.
pub async fn commit_purchase(
    State(state): State<AppState>,
    Json(req): Json<PurchaseRequest>,
) -> Result<(StatusCode, Json<PurchaseResponse>), ServiceError> {
    req.validate()?;

    let cmd = CommitPurchaseCommand {
        transaction_id: req.transaction_id,
        gift_id: req.gift_id,
        buyer_id: req.buyer_id,
        username: req.username,
        first_name: req.first_name,
        last_name: req.last_name,
    };

    match state.services.purchases.commit(cmd).await {
        Ok(_receipt) => Ok((
            StatusCode::OK,
            Json(PurchaseResponse {
                success: true,
                error: None,
            }),
        )),
        Err(err @ ServiceError::OutOfStock(_)) => Ok((
            StatusCode::OK,
            Json(PurchaseResponse {
                success: false,
                error: Some(err.code().to_string()),
            }),
        )),
        Err(err @ ServiceError::PersistenceError(_)) => Ok((
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(PurchaseResponse {
                success: false,
                error: Some(err.code().to_string()),
            }),
        )),
        Err(err) => Err(err),
    }
}

// GET /api/recent-purchases
pub async fn recent_purchases(
    State(state): State<AppState>,
    Query(query): Query<RecentQuery>,
) -> Result<Json<Vec<ActivityEntry>>, ServiceError> {
    let limit = query.limit.clamp(1, MAX_RECENT_LIMIT);
    let entries = state.services.purchases.recent_purchases(limit).await?;
    Ok(Json(entries))
}
