use axum::{
    extract::{Path, State},
    response::Json,
};
use serde::{Deserialize, Serialize};

use crate::{entities::gift, errors::ServiceError, AppState};

/// Catalog listing entry: `availability` is `[remaining, total]`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GiftResponse {
    pub id: String,
    pub name: String,
    pub price: i64,
    pub availability: [i32; 2],
}

impl From<gift::Model> for GiftResponse {
    fn from(model: gift::Model) -> Self {
        Self {
            availability: model.availability(),
            id: model.id,
            name: model.name,
            price: model.price,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GiftStatusResponse {
    pub remaining_quantity: i32,
    pub total_quantity: i32,
}

// GET /api/gifts
pub async fn list_gifts(
    State(state): State<AppState>,
) -> Result<Json<Vec<GiftResponse>>, ServiceError> {
    let gifts = state.services.catalog.list_gifts().await?;
    Ok(Json(gifts.into_iter().map(GiftResponse::from).collect()))
}

// GET /api/gifts/:id/status
//
// Fresh availability for one gift, for clients whose catalog snapshot may be
// stale (or a display-only fallback) at purchase-modal open time.
pub async fn gift_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<GiftStatusResponse>, ServiceError> {
    let gift = state.services.catalog.gift_status(&id).await?;
    Ok(Json(GiftStatusResponse {
        remaining_quantity: gift.remaining_quantity,
        total_quantity: gift.total_quantity,
    }))
}
