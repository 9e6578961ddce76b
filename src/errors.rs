use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{error, warn};

/// Error body returned by every failing endpoint.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// HTTP status category (e.g., "Not Found", "Bad Gateway")
    pub error: String,
    /// Machine-readable error code (e.g., "out_of_stock")
    pub code: String,
    /// Human-readable error description
    pub message: String,
    /// ISO 8601 timestamp when the error occurred
    pub timestamp: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] sea_orm::error::DbErr),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The commit lost the race for the last unit. Distinct from generic
    /// failures so the client can message "sold out" rather than "error".
    #[error("Out of stock: {0}")]
    OutOfStock(String),

    /// Invoice creation failed, either locally (non-positive price,
    /// unsupported currency) or upstream at the payment provider.
    #[error("Payment provider error: {0}")]
    ProviderError(String),

    /// The ledger write failed after the payment already succeeded upstream.
    /// Must never be collapsed into a generic failure: the buyer has paid.
    /// Replays of an already recorded transaction id are not an error at
    /// all; they resolve to the prior receipt with its duplicate flag set.
    #[error("Persistence error: {0}")]
    PersistenceError(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl From<validator::ValidationErrors> for ServiceError {
    fn from(err: validator::ValidationErrors) -> Self {
        ServiceError::ValidationError(err.to_string())
    }
}

impl ServiceError {
    /// Returns the HTTP status code for this error.
    /// This is the single source of truth for error-to-status mapping.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::ValidationError(_) | Self::InvalidInput(_) => StatusCode::BAD_REQUEST,
            Self::OutOfStock(_) => StatusCode::CONFLICT,
            Self::ProviderError(_) => StatusCode::BAD_GATEWAY,
            Self::DatabaseError(_) | Self::PersistenceError(_) | Self::InternalError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Stable machine-readable code carried in the error body.
    pub fn code(&self) -> &'static str {
        match self {
            Self::DatabaseError(_) => "database_error",
            Self::NotFound(_) => "not_found",
            Self::ValidationError(_) => "validation_error",
            Self::InvalidInput(_) => "invalid_input",
            Self::OutOfStock(_) => "out_of_stock",
            Self::ProviderError(_) => "provider_error",
            Self::PersistenceError(_) => "persistence_error",
            Self::InternalError(_) => "internal_error",
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        if status.is_server_error() {
            error!(code = self.code(), "request failed: {}", self);
        } else {
            warn!(code = self.code(), "request rejected: {}", self);
        }

        let body = Json(json!(ErrorResponse {
            error: status
                .canonical_reason()
                .unwrap_or("Unknown Error")
                .to_string(),
            code: self.code().to_string(),
            message: self.to_string(),
            timestamp: Utc::now().to_rfc3339(),
        }));

        (status, body).into_response()
    }
}
